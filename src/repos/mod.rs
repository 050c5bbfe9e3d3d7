//! Database repositories

pub mod audit_repo;
pub mod check_repo;
pub mod credit_repo;
pub mod movement_repo;
pub mod return_repo;
pub mod sale_repo;
pub mod stock_repo;
