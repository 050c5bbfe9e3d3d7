//! Business services orchestrating repositories within transactions

pub mod credit_ledger;
pub mod movement_applier;
pub mod reconciliation;
pub mod return_processor;
pub mod sale_finalizer;
pub mod sale_totals;
