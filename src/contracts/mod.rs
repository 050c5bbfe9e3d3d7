//! Versioned request/response contracts for the HTTP API

pub mod credit_entry_v1;
pub mod inventory_check_v1;
pub mod sale_return_v1;
pub mod sale_submit_v1;
pub mod stock_movement_v1;
