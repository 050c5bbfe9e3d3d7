//! Repository for the sale aggregate: header, items and payments
//!
//! Computed header fields (subtotal, total, paid, change due, status)
//! are owned by the totals service and written only through
//! `tx_store_totals` / `tx_force_status`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::money::Amounts;
use crate::repos::stock_repo::ItemRef;

/// Lifecycle status of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Draft,
    Open,
    PartiallyPaid,
    Paid,
    Refunded,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Draft => "draft",
            SaleStatus::Open => "open",
            SaleStatus::PartiallyPaid => "partially_paid",
            SaleStatus::Paid => "paid",
            SaleStatus::Refunded => "refunded",
        }
    }
}

/// Sale-level discount policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    None,
    Percent,
    Amount,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::None => "none",
            DiscountType::Percent => "percent",
            DiscountType::Amount => "amount",
        }
    }
}

/// Sale header model
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct Sale {
    pub id: Uuid,
    pub tenant_id: String,
    pub sale_number: String,
    pub warehouse_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub discount_type: String,
    pub discount_value: Decimal,
    pub subtotal_local: Decimal,
    pub subtotal_usd: Decimal,
    pub total_local: Decimal,
    pub total_usd: Decimal,
    pub total_paid_local: Decimal,
    pub total_paid_usd: Decimal,
    pub change_due_local: Decimal,
    pub change_due_usd: Decimal,
    pub status: String,
    pub is_credit_sale: bool,
    pub due_date: Option<NaiveDate>,
    pub note: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sale line item model
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct SaleItem {
    pub id: Uuid,
    pub tenant_id: String,
    pub sale_id: Uuid,
    pub item_kind: String,
    pub item_id: Uuid,
    pub quantity: i64,
    pub unit_price_local: Decimal,
    pub unit_price_usd: Decimal,
    pub discount_local: Decimal,
    pub discount_usd: Decimal,
    pub line_total_local: Decimal,
    pub line_total_usd: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Sale payment model
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct SalePayment {
    pub id: Uuid,
    pub tenant_id: String,
    pub sale_id: Uuid,
    pub method: String,
    pub amount_local: Decimal,
    pub amount_usd: Decimal,
    pub currency: String,
    pub reference: String,
    pub is_change: bool,
    pub paid_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Struct for inserting a sale header
#[derive(Debug, Clone)]
pub struct NewSale {
    pub tenant_id: String,
    pub sale_number: String,
    pub warehouse_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub vehicle_id: Option<Uuid>,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub is_credit_sale: bool,
    pub due_date: Option<NaiveDate>,
    pub note: String,
}

/// Struct for inserting a sale line item
#[derive(Debug, Clone)]
pub struct NewSaleItem {
    pub item: ItemRef,
    pub quantity: i64,
    pub unit_price: Amounts,
    pub discount: Amounts,
}

/// Struct for inserting a sale payment
#[derive(Debug, Clone)]
pub struct NewSalePayment {
    pub method: String,
    pub amount: Amounts,
    pub currency: String,
    pub reference: String,
    pub is_change: bool,
}

/// Insert a sale header within a transaction.
pub async fn tx_insert_sale(
    tx: &mut Transaction<'_, Postgres>,
    sale: &NewSale,
) -> Result<Sale, sqlx::Error> {
    sqlx::query_as::<_, Sale>(
        r#"
        INSERT INTO sales
            (tenant_id, sale_number, warehouse_id, customer_id, vehicle_id,
             discount_type, discount_value, is_credit_sale, due_date, note)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id, tenant_id, sale_number, warehouse_id, customer_id, vehicle_id,
                  discount_type, discount_value,
                  subtotal_local, subtotal_usd, total_local, total_usd,
                  total_paid_local, total_paid_usd, change_due_local, change_due_usd,
                  status, is_credit_sale, due_date, note, completed_at,
                  created_at, updated_at
        "#,
    )
    .bind(&sale.tenant_id)
    .bind(&sale.sale_number)
    .bind(sale.warehouse_id)
    .bind(sale.customer_id)
    .bind(sale.vehicle_id)
    .bind(sale.discount_type.as_str())
    .bind(sale.discount_value)
    .bind(sale.is_credit_sale)
    .bind(sale.due_date)
    .bind(&sale.note)
    .fetch_one(&mut **tx)
    .await
}

/// Insert a sale line item within a transaction.
pub async fn tx_insert_item(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    sale_id: Uuid,
    item: &NewSaleItem,
) -> Result<SaleItem, sqlx::Error> {
    sqlx::query_as::<_, SaleItem>(
        r#"
        INSERT INTO sale_items
            (tenant_id, sale_id, item_kind, item_id, quantity,
             unit_price_local, unit_price_usd, discount_local, discount_usd)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id, tenant_id, sale_id, item_kind, item_id, quantity,
                  unit_price_local, unit_price_usd, discount_local, discount_usd,
                  line_total_local, line_total_usd, created_at
        "#,
    )
    .bind(tenant_id)
    .bind(sale_id)
    .bind(item.item.kind())
    .bind(item.item.id())
    .bind(item.quantity)
    .bind(item.unit_price.local)
    .bind(item.unit_price.usd)
    .bind(item.discount.local)
    .bind(item.discount.usd)
    .fetch_one(&mut **tx)
    .await
}

/// Insert a sale payment within a transaction.
pub async fn tx_insert_payment(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    sale_id: Uuid,
    payment: &NewSalePayment,
) -> Result<SalePayment, sqlx::Error> {
    sqlx::query_as::<_, SalePayment>(
        r#"
        INSERT INTO sale_payments
            (tenant_id, sale_id, method, amount_local, amount_usd,
             currency, reference, is_change)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, tenant_id, sale_id, method, amount_local, amount_usd,
                  currency, reference, is_change, paid_at, created_at
        "#,
    )
    .bind(tenant_id)
    .bind(sale_id)
    .bind(&payment.method)
    .bind(payment.amount.local)
    .bind(payment.amount.usd)
    .bind(&payment.currency)
    .bind(&payment.reference)
    .bind(payment.is_change)
    .fetch_one(&mut **tx)
    .await
}

/// Fetch a sale header by id.
pub async fn find(
    pool: &PgPool,
    tenant_id: &str,
    sale_id: Uuid,
) -> Result<Option<Sale>, sqlx::Error> {
    sqlx::query_as::<_, Sale>(
        r#"
        SELECT id, tenant_id, sale_number, warehouse_id, customer_id, vehicle_id,
               discount_type, discount_value,
               subtotal_local, subtotal_usd, total_local, total_usd,
               total_paid_local, total_paid_usd, change_due_local, change_due_usd,
               status, is_credit_sale, due_date, note, completed_at,
               created_at, updated_at
        FROM sales
        WHERE id = $1 AND tenant_id = $2
        "#,
    )
    .bind(sale_id)
    .bind(tenant_id)
    .fetch_optional(pool)
    .await
}

/// Fetch and lock a sale header within a transaction.
pub async fn find_for_update(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    sale_id: Uuid,
) -> Result<Option<Sale>, sqlx::Error> {
    sqlx::query_as::<_, Sale>(
        r#"
        SELECT id, tenant_id, sale_number, warehouse_id, customer_id, vehicle_id,
               discount_type, discount_value,
               subtotal_local, subtotal_usd, total_local, total_usd,
               total_paid_local, total_paid_usd, change_due_local, change_due_usd,
               status, is_credit_sale, due_date, note, completed_at,
               created_at, updated_at
        FROM sales
        WHERE id = $1 AND tenant_id = $2
        FOR UPDATE
        "#,
    )
    .bind(sale_id)
    .bind(tenant_id)
    .fetch_optional(&mut **tx)
    .await
}

/// Fetch all line items for a sale.
pub async fn items(
    pool: &PgPool,
    tenant_id: &str,
    sale_id: Uuid,
) -> Result<Vec<SaleItem>, sqlx::Error> {
    sqlx::query_as::<_, SaleItem>(ITEMS_SQL)
        .bind(sale_id)
        .bind(tenant_id)
        .fetch_all(pool)
        .await
}

/// Fetch all line items for a sale within a transaction.
pub async fn items_tx(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    sale_id: Uuid,
) -> Result<Vec<SaleItem>, sqlx::Error> {
    sqlx::query_as::<_, SaleItem>(ITEMS_SQL)
        .bind(sale_id)
        .bind(tenant_id)
        .fetch_all(&mut **tx)
        .await
}

const ITEMS_SQL: &str = r#"
    SELECT id, tenant_id, sale_id, item_kind, item_id, quantity,
           unit_price_local, unit_price_usd, discount_local, discount_usd,
           line_total_local, line_total_usd, created_at
    FROM sale_items
    WHERE sale_id = $1 AND tenant_id = $2
    ORDER BY created_at, id
"#;

/// Fetch one sale item by id within a transaction.
pub async fn find_item_tx(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    sale_item_id: Uuid,
) -> Result<Option<SaleItem>, sqlx::Error> {
    sqlx::query_as::<_, SaleItem>(
        r#"
        SELECT id, tenant_id, sale_id, item_kind, item_id, quantity,
               unit_price_local, unit_price_usd, discount_local, discount_usd,
               line_total_local, line_total_usd, created_at
        FROM sale_items
        WHERE id = $1 AND tenant_id = $2
        "#,
    )
    .bind(sale_item_id)
    .bind(tenant_id)
    .fetch_optional(&mut **tx)
    .await
}

/// Fetch all payments for a sale.
pub async fn payments(
    pool: &PgPool,
    tenant_id: &str,
    sale_id: Uuid,
) -> Result<Vec<SalePayment>, sqlx::Error> {
    sqlx::query_as::<_, SalePayment>(PAYMENTS_SQL)
        .bind(sale_id)
        .bind(tenant_id)
        .fetch_all(pool)
        .await
}

/// Fetch all payments for a sale within a transaction.
pub async fn payments_tx(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    sale_id: Uuid,
) -> Result<Vec<SalePayment>, sqlx::Error> {
    sqlx::query_as::<_, SalePayment>(PAYMENTS_SQL)
        .bind(sale_id)
        .bind(tenant_id)
        .fetch_all(&mut **tx)
        .await
}

const PAYMENTS_SQL: &str = r#"
    SELECT id, tenant_id, sale_id, method, amount_local, amount_usd,
           currency, reference, is_change, paid_at, created_at
    FROM sale_payments
    WHERE sale_id = $1 AND tenant_id = $2
    ORDER BY paid_at, id
"#;

/// Computed totals to persist on the sale header.
#[derive(Debug, Clone, Copy)]
pub struct SaleTotalsUpdate {
    pub subtotal: Amounts,
    pub total: Amounts,
    pub total_paid: Amounts,
    pub change_due: Amounts,
    pub status: SaleStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Store recomputed totals on the sale header within a transaction.
///
/// `completed_at` is only ever moved from NULL to a timestamp;
/// COALESCE keeps the first finalization time sticky.
pub async fn tx_store_totals(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    sale_id: Uuid,
    update: &SaleTotalsUpdate,
) -> Result<Sale, sqlx::Error> {
    sqlx::query_as::<_, Sale>(
        r#"
        UPDATE sales
        SET subtotal_local = $3, subtotal_usd = $4,
            total_local = $5, total_usd = $6,
            total_paid_local = $7, total_paid_usd = $8,
            change_due_local = $9, change_due_usd = $10,
            status = $11,
            completed_at = COALESCE(completed_at, $12),
            updated_at = NOW()
        WHERE id = $1 AND tenant_id = $2
        RETURNING id, tenant_id, sale_number, warehouse_id, customer_id, vehicle_id,
                  discount_type, discount_value,
                  subtotal_local, subtotal_usd, total_local, total_usd,
                  total_paid_local, total_paid_usd, change_due_local, change_due_usd,
                  status, is_credit_sale, due_date, note, completed_at,
                  created_at, updated_at
        "#,
    )
    .bind(sale_id)
    .bind(tenant_id)
    .bind(update.subtotal.local)
    .bind(update.subtotal.usd)
    .bind(update.total.local)
    .bind(update.total.usd)
    .bind(update.total_paid.local)
    .bind(update.total_paid.usd)
    .bind(update.change_due.local)
    .bind(update.change_due.usd)
    .bind(update.status.as_str())
    .bind(update.completed_at)
    .fetch_one(&mut **tx)
    .await
}

/// Store a computed line total on a sale item within a transaction.
pub async fn tx_store_line_total(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    sale_item_id: Uuid,
    line_total: Amounts,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE sale_items
        SET line_total_local = $3, line_total_usd = $4
        WHERE id = $1 AND tenant_id = $2
        "#,
    )
    .bind(sale_item_id)
    .bind(tenant_id)
    .bind(line_total.local)
    .bind(line_total.usd)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Force a sale into a terminal status, bypassing totals derivation.
///
/// Used by the return processor to mark a sale refunded.
pub async fn tx_force_status(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    sale_id: Uuid,
    status: SaleStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE sales
        SET status = $3, updated_at = NOW()
        WHERE id = $1 AND tenant_id = $2
        "#,
    )
    .bind(sale_id)
    .bind(tenant_id)
    .bind(status.as_str())
    .execute(&mut **tx)
    .await?;

    Ok(())
}
