//! Sale return contract (v1)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One returned line, keyed on the sale item it reverses.
///
/// The refund amounts are optional: when omitted the refund is
/// prorated from the sale item's line total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleReturnItemInputV1 {
    pub sale_item_id: Uuid,
    pub quantity: i64,
    #[serde(default)]
    pub refund_amount_local: Option<Decimal>,
    #[serde(default)]
    pub refund_amount_usd: Option<Decimal>,
}

/// Request to create and process a return against a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleReturnRequestV1 {
    pub tenant_id: String,
    pub sale_id: Uuid,
    #[serde(default)]
    pub return_number: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub actor_id: Option<Uuid>,
    pub items: Vec<SaleReturnItemInputV1>,
}

/// Tenant scope for processing an existing return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnActionRequestV1 {
    pub tenant_id: String,
    #[serde(default)]
    pub actor_id: Option<Uuid>,
}
