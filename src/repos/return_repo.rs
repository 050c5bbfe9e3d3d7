//! Repository for sale returns
//!
//! A return header references one sale; its items reference specific
//! sale items. Completed returns are immutable.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::money::Amounts;

/// Sale return header model
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct SaleReturn {
    pub id: Uuid,
    pub tenant_id: String,
    pub sale_id: Uuid,
    pub return_number: String,
    pub reason: String,
    pub status: String,
    pub total_refunded_local: Decimal,
    pub total_refunded_usd: Decimal,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sale return item model
///
/// Refund amounts are NULL until processing; a caller-supplied refund
/// is stored at creation and honored over the prorated default.
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct SaleReturnItem {
    pub id: Uuid,
    pub tenant_id: String,
    pub sale_return_id: Uuid,
    pub sale_item_id: Uuid,
    pub quantity: i64,
    pub refund_amount_local: Option<Decimal>,
    pub refund_amount_usd: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// Insert a return header within a transaction.
pub async fn tx_insert(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    sale_id: Uuid,
    return_number: &str,
    reason: &str,
) -> Result<SaleReturn, sqlx::Error> {
    sqlx::query_as::<_, SaleReturn>(
        r#"
        INSERT INTO sale_returns (tenant_id, sale_id, return_number, reason)
        VALUES ($1, $2, $3, $4)
        RETURNING id, tenant_id, sale_id, return_number, reason, status,
                  total_refunded_local, total_refunded_usd, processed_at,
                  created_at, updated_at
        "#,
    )
    .bind(tenant_id)
    .bind(sale_id)
    .bind(return_number)
    .bind(reason)
    .fetch_one(&mut **tx)
    .await
}

/// Insert a return item within a transaction. `refund` carries the
/// caller-supplied refund override, if any.
pub async fn tx_insert_item(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    sale_return_id: Uuid,
    sale_item_id: Uuid,
    quantity: i64,
    refund: Option<Amounts>,
) -> Result<SaleReturnItem, sqlx::Error> {
    sqlx::query_as::<_, SaleReturnItem>(
        r#"
        INSERT INTO sale_return_items
            (tenant_id, sale_return_id, sale_item_id, quantity,
             refund_amount_local, refund_amount_usd)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, tenant_id, sale_return_id, sale_item_id, quantity,
                  refund_amount_local, refund_amount_usd, created_at
        "#,
    )
    .bind(tenant_id)
    .bind(sale_return_id)
    .bind(sale_item_id)
    .bind(quantity)
    .bind(refund.map(|r| r.local))
    .bind(refund.map(|r| r.usd))
    .fetch_one(&mut **tx)
    .await
}

/// Fetch a return header by id.
pub async fn find(
    pool: &PgPool,
    tenant_id: &str,
    return_id: Uuid,
) -> Result<Option<SaleReturn>, sqlx::Error> {
    sqlx::query_as::<_, SaleReturn>(
        r#"
        SELECT id, tenant_id, sale_id, return_number, reason, status,
               total_refunded_local, total_refunded_usd, processed_at,
               created_at, updated_at
        FROM sale_returns
        WHERE id = $1 AND tenant_id = $2
        "#,
    )
    .bind(return_id)
    .bind(tenant_id)
    .fetch_optional(pool)
    .await
}

/// Fetch and lock a return header within a transaction.
pub async fn find_for_update(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    return_id: Uuid,
) -> Result<Option<SaleReturn>, sqlx::Error> {
    sqlx::query_as::<_, SaleReturn>(
        r#"
        SELECT id, tenant_id, sale_id, return_number, reason, status,
               total_refunded_local, total_refunded_usd, processed_at,
               created_at, updated_at
        FROM sale_returns
        WHERE id = $1 AND tenant_id = $2
        FOR UPDATE
        "#,
    )
    .bind(return_id)
    .bind(tenant_id)
    .fetch_optional(&mut **tx)
    .await
}

/// Fetch all items for a return within a transaction.
pub async fn items_tx(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    return_id: Uuid,
) -> Result<Vec<SaleReturnItem>, sqlx::Error> {
    sqlx::query_as::<_, SaleReturnItem>(
        r#"
        SELECT id, tenant_id, sale_return_id, sale_item_id, quantity,
               refund_amount_local, refund_amount_usd, created_at
        FROM sale_return_items
        WHERE sale_return_id = $1 AND tenant_id = $2
        ORDER BY created_at, id
        "#,
    )
    .bind(return_id)
    .bind(tenant_id)
    .fetch_all(&mut **tx)
    .await
}

/// Sum quantities already returned against a sale item by completed
/// returns, excluding one return (the one currently being processed).
pub async fn tx_completed_returned_quantity(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    sale_item_id: Uuid,
    excluding_return_id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COALESCE(SUM(sri.quantity), 0)::BIGINT
        FROM sale_return_items sri
        INNER JOIN sale_returns sr ON sr.id = sri.sale_return_id
        WHERE sri.tenant_id = $1
          AND sri.sale_item_id = $2
          AND sr.status = 'completed'
          AND sr.id <> $3
        "#,
    )
    .bind(tenant_id)
    .bind(sale_item_id)
    .bind(excluding_return_id)
    .fetch_one(&mut **tx)
    .await
}

/// Store the computed refund on a return item within a transaction.
pub async fn tx_store_item_refund(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    return_item_id: Uuid,
    refund: Amounts,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE sale_return_items
        SET refund_amount_local = $3, refund_amount_usd = $4
        WHERE id = $1 AND tenant_id = $2
        "#,
    )
    .bind(return_item_id)
    .bind(tenant_id)
    .bind(refund.local)
    .bind(refund.usd)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Mark a return completed with its refund total within a transaction.
pub async fn tx_mark_completed(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    return_id: Uuid,
    total_refunded: Amounts,
) -> Result<SaleReturn, sqlx::Error> {
    sqlx::query_as::<_, SaleReturn>(
        r#"
        UPDATE sale_returns
        SET status = 'completed',
            total_refunded_local = $3,
            total_refunded_usd = $4,
            processed_at = NOW(),
            updated_at = NOW()
        WHERE id = $1 AND tenant_id = $2
        RETURNING id, tenant_id, sale_id, return_number, reason, status,
                  total_refunded_local, total_refunded_usd, processed_at,
                  created_at, updated_at
        "#,
    )
    .bind(return_id)
    .bind(tenant_id)
    .bind(total_refunded.local)
    .bind(total_refunded.usd)
    .fetch_one(&mut **tx)
    .await
}
