//! Stock movement contract (v1)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repos::movement_repo::MovementType;
use crate::repos::stock_repo::{ItemRef, StockRow};

/// Request to apply a stock movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovementRequestV1 {
    pub tenant_id: String,
    pub movement_type: MovementType,
    #[serde(default)]
    pub warehouse_from: Option<Uuid>,
    #[serde(default)]
    pub warehouse_to: Option<Uuid>,
    #[serde(flatten)]
    pub item: ItemRef,
    pub quantity: i64,
    #[serde(default)]
    pub note: Option<String>,
}

/// Result of applying a stock movement: the movement id and the stock
/// rows it touched, post-adjustment.
#[derive(Debug, Clone, Serialize)]
pub struct StockMovementResponseV1 {
    pub movement_id: Uuid,
    pub stock: Vec<StockRow>,
}

/// Tenant scope for stock reads.
#[derive(Debug, Clone, Deserialize)]
pub struct StockQueryV1 {
    pub tenant_id: String,
    #[serde(default)]
    pub warehouse_id: Option<Uuid>,
}
