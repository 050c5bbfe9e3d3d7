//! Sale submission contract (v1)
//!
//! Request payload for creating and finalizing a sale in one call,
//! and the detail shape returned by sale reads.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repos::sale_repo::{DiscountType, Sale, SaleItem, SalePayment};
use crate::repos::stock_repo::ItemRef;

/// One line item in a sale submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItemInputV1 {
    #[serde(flatten)]
    pub item: ItemRef,
    pub quantity: i64,
    pub unit_price_local: Decimal,
    pub unit_price_usd: Decimal,
    #[serde(default)]
    pub discount_local: Option<Decimal>,
    #[serde(default)]
    pub discount_usd: Option<Decimal>,
}

/// One payment in a sale submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalePaymentInputV1 {
    pub method: String,
    pub amount_local: Decimal,
    pub amount_usd: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub is_change: bool,
}

fn default_currency() -> String {
    "LOCAL".to_string()
}

/// Request to create and finalize a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleSubmitRequestV1 {
    pub tenant_id: String,
    #[serde(default)]
    pub sale_number: Option<String>,
    pub warehouse_id: Uuid,
    #[serde(default)]
    pub customer_id: Option<Uuid>,
    #[serde(default)]
    pub vehicle_id: Option<Uuid>,
    #[serde(default = "default_discount_type")]
    pub discount_type: DiscountType,
    #[serde(default)]
    pub discount_value: Option<Decimal>,
    #[serde(default)]
    pub is_credit_sale: bool,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub actor_id: Option<Uuid>,
    pub items: Vec<SaleItemInputV1>,
    #[serde(default)]
    pub payments: Vec<SalePaymentInputV1>,
}

fn default_discount_type() -> DiscountType {
    DiscountType::None
}

/// Full sale aggregate returned by reads.
#[derive(Debug, Clone, Serialize)]
pub struct SaleDetailV1 {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub payments: Vec<SalePayment>,
}

/// Tenant scope for sale lifecycle actions (finalize, recompute).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleActionRequestV1 {
    pub tenant_id: String,
    #[serde(default)]
    pub actor_id: Option<Uuid>,
}

/// Tenant scope for sale reads.
#[derive(Debug, Clone, Deserialize)]
pub struct SaleQueryV1 {
    pub tenant_id: String,
}
