//! Inventory and sales ledger engine
//!
//! Multi-tenant stock ledger with movement facts, a sale aggregate
//! with derived totals, a credit ledger, sale returns and inventory
//! reconciliation. All mutations run as single atomic transactions
//! keyed on row-level locks.

pub mod config;
pub mod contracts;
pub mod db;
pub mod health;
pub mod money;
pub mod repos;
pub mod routes;
pub mod services;
pub mod validation;
