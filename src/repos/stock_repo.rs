//! Repository for stock ledger rows
//!
//! A stock row is the quantity-on-hand for one (warehouse, item) pair
//! within a tenant. Rows are created lazily on the first adjustment
//! and never deleted. All quantity changes go through `tx_adjust`,
//! which enforces the non-negative invariant at the database level.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

/// Reference to a sellable item: either a retail product or a spare part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ItemRef {
    Product(Uuid),
    Part(Uuid),
}

impl ItemRef {
    pub fn kind(&self) -> &'static str {
        match self {
            ItemRef::Product(_) => "product",
            ItemRef::Part(_) => "part",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            ItemRef::Product(id) => *id,
            ItemRef::Part(id) => *id,
        }
    }

    /// Rebuild an `ItemRef` from its persisted (kind, id) columns.
    pub fn from_columns(kind: &str, id: Uuid) -> Result<Self, StockError> {
        match kind {
            "product" => Ok(ItemRef::Product(id)),
            "part" => Ok(ItemRef::Part(id)),
            other => Err(StockError::UnknownItemKind(other.to_string())),
        }
    }
}

/// Stock row model
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct StockRow {
    pub id: Uuid,
    pub tenant_id: String,
    pub warehouse_id: Uuid,
    pub item_kind: String,
    pub item_id: Uuid,
    pub quantity: i64,
    pub low_stock_threshold: i64,
    pub reorder_quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Errors that can occur during stock repository operations
#[derive(Debug, Error)]
pub enum StockError {
    #[error("Insufficient stock in warehouse {warehouse_id} for {item_kind} {item_id}: on hand {on_hand}, requested change {delta}")]
    Insufficient {
        warehouse_id: Uuid,
        item_kind: String,
        item_id: Uuid,
        on_hand: i64,
        delta: i64,
    },

    #[error("Unknown item kind: {0}")]
    UnknownItemKind(String),

    #[error("Stock row not found: {0}")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Adjust a stock row by a signed delta within a transaction.
///
/// Creates the row lazily if it does not exist, then applies the delta
/// with a conditional UPDATE that only succeeds when the resulting
/// quantity stays non-negative. The row lock taken by the UPDATE
/// serializes concurrent adjustments to the same row.
pub async fn tx_adjust(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    warehouse_id: Uuid,
    item: ItemRef,
    delta: i64,
) -> Result<StockRow, StockError> {
    sqlx::query(
        r#"
        INSERT INTO stock_rows (tenant_id, warehouse_id, item_kind, item_id)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (tenant_id, warehouse_id, item_kind, item_id) DO NOTHING
        "#,
    )
    .bind(tenant_id)
    .bind(warehouse_id)
    .bind(item.kind())
    .bind(item.id())
    .execute(&mut **tx)
    .await?;

    let updated = sqlx::query_as::<_, StockRow>(
        r#"
        UPDATE stock_rows
        SET quantity = quantity + $5, updated_at = NOW()
        WHERE tenant_id = $1
          AND warehouse_id = $2
          AND item_kind = $3
          AND item_id = $4
          AND quantity + $5 >= 0
        RETURNING id, tenant_id, warehouse_id, item_kind, item_id,
                  quantity, low_stock_threshold, reorder_quantity,
                  created_at, updated_at
        "#,
    )
    .bind(tenant_id)
    .bind(warehouse_id)
    .bind(item.kind())
    .bind(item.id())
    .bind(delta)
    .fetch_optional(&mut **tx)
    .await?;

    match updated {
        Some(row) => Ok(row),
        None => {
            // The conditional UPDATE matched nothing, so the delta would
            // have driven the quantity negative. Re-read for context.
            let on_hand = sqlx::query_scalar::<_, i64>(
                r#"
                SELECT quantity FROM stock_rows
                WHERE tenant_id = $1
                  AND warehouse_id = $2
                  AND item_kind = $3
                  AND item_id = $4
                "#,
            )
            .bind(tenant_id)
            .bind(warehouse_id)
            .bind(item.kind())
            .bind(item.id())
            .fetch_optional(&mut **tx)
            .await?
            .unwrap_or(0);

            Err(StockError::Insufficient {
                warehouse_id,
                item_kind: item.kind().to_string(),
                item_id: item.id(),
                on_hand,
                delta,
            })
        }
    }
}

/// Overwrite a stock row's quantity within a transaction.
///
/// Used by inventory reconciliation to snap a row to the counted
/// quantity. Regular ledger flows must use `tx_adjust` instead.
pub async fn tx_overwrite_quantity(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    stock_row_id: Uuid,
    quantity: i64,
) -> Result<StockRow, StockError> {
    let row = sqlx::query_as::<_, StockRow>(
        r#"
        UPDATE stock_rows
        SET quantity = $3, updated_at = NOW()
        WHERE id = $1 AND tenant_id = $2
        RETURNING id, tenant_id, warehouse_id, item_kind, item_id,
                  quantity, low_stock_threshold, reorder_quantity,
                  created_at, updated_at
        "#,
    )
    .bind(stock_row_id)
    .bind(tenant_id)
    .bind(quantity)
    .fetch_optional(&mut **tx)
    .await?;

    row.ok_or(StockError::NotFound(stock_row_id))
}

/// Find a stock row by its grain (warehouse, item).
pub async fn find(
    pool: &PgPool,
    tenant_id: &str,
    warehouse_id: Uuid,
    item: ItemRef,
) -> Result<Option<StockRow>, StockError> {
    let row = sqlx::query_as::<_, StockRow>(
        r#"
        SELECT id, tenant_id, warehouse_id, item_kind, item_id,
               quantity, low_stock_threshold, reorder_quantity,
               created_at, updated_at
        FROM stock_rows
        WHERE tenant_id = $1
          AND warehouse_id = $2
          AND item_kind = $3
          AND item_id = $4
        "#,
    )
    .bind(tenant_id)
    .bind(warehouse_id)
    .bind(item.kind())
    .bind(item.id())
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Find a stock row by id within a transaction.
pub async fn find_by_id_tx(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    stock_row_id: Uuid,
) -> Result<StockRow, StockError> {
    let row = sqlx::query_as::<_, StockRow>(
        r#"
        SELECT id, tenant_id, warehouse_id, item_kind, item_id,
               quantity, low_stock_threshold, reorder_quantity,
               created_at, updated_at
        FROM stock_rows
        WHERE id = $1 AND tenant_id = $2
        "#,
    )
    .bind(stock_row_id)
    .bind(tenant_id)
    .fetch_optional(&mut **tx)
    .await?;

    row.ok_or(StockError::NotFound(stock_row_id))
}

/// List stock rows for a tenant, optionally scoped to one warehouse.
pub async fn list(
    pool: &PgPool,
    tenant_id: &str,
    warehouse_id: Option<Uuid>,
) -> Result<Vec<StockRow>, StockError> {
    let rows = match warehouse_id {
        Some(wh) => {
            sqlx::query_as::<_, StockRow>(
                r#"
                SELECT id, tenant_id, warehouse_id, item_kind, item_id,
                       quantity, low_stock_threshold, reorder_quantity,
                       created_at, updated_at
                FROM stock_rows
                WHERE tenant_id = $1 AND warehouse_id = $2
                ORDER BY item_kind, item_id
                "#,
            )
            .bind(tenant_id)
            .bind(wh)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, StockRow>(
                r#"
                SELECT id, tenant_id, warehouse_id, item_kind, item_id,
                       quantity, low_stock_threshold, reorder_quantity,
                       created_at, updated_at
                FROM stock_rows
                WHERE tenant_id = $1
                ORDER BY warehouse_id, item_kind, item_id
                "#,
            )
            .bind(tenant_id)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(rows)
}

/// List stock rows at or below their low-stock threshold.
pub async fn list_low(pool: &PgPool, tenant_id: &str) -> Result<Vec<StockRow>, StockError> {
    let rows = sqlx::query_as::<_, StockRow>(
        r#"
        SELECT id, tenant_id, warehouse_id, item_kind, item_id,
               quantity, low_stock_threshold, reorder_quantity,
               created_at, updated_at
        FROM stock_rows
        WHERE tenant_id = $1
          AND quantity <= low_stock_threshold
        ORDER BY warehouse_id, item_kind, item_id
        "#,
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
