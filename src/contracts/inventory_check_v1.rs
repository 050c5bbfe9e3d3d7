//! Inventory check contract (v1)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repos::check_repo::{InventoryCheck, InventoryCheckLine};

/// Request to open a counting session for a warehouse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOpenRequestV1 {
    pub tenant_id: String,
    pub warehouse_id: Uuid,
}

/// Request to record one counted line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckLineRequestV1 {
    pub tenant_id: String,
    pub stock_row_id: Uuid,
    pub actual_quantity: i64,
}

/// Tenant scope for check lifecycle actions (complete, apply).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckActionRequestV1 {
    pub tenant_id: String,
    #[serde(default)]
    pub actor_id: Option<Uuid>,
}

/// Tenant scope for check reads.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckQueryV1 {
    pub tenant_id: String,
}

/// Check header with its count lines.
#[derive(Debug, Clone, Serialize)]
pub struct CheckDetailV1 {
    pub check: InventoryCheck,
    pub lines: Vec<InventoryCheckLine>,
}
