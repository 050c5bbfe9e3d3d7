//! Repository for stock movement facts
//!
//! Movements are append-only. Applying one mutates stock rows in the
//! same transaction (see the movement applier service); the rows here
//! are never updated after insert.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::repos::stock_repo::ItemRef;

/// Kind of stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Inbound,
    Outbound,
    Transfer,
    Loss,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Inbound => "inbound",
            MovementType::Outbound => "outbound",
            MovementType::Transfer => "transfer",
            MovementType::Loss => "loss",
        }
    }
}

/// Stock movement model
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct StockMovement {
    pub id: Uuid,
    pub tenant_id: String,
    pub movement_type: String,
    pub warehouse_from: Option<Uuid>,
    pub warehouse_to: Option<Uuid>,
    pub item_kind: String,
    pub item_id: Uuid,
    pub quantity: i64,
    pub note: String,
    pub processed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Struct for inserting a stock movement
#[derive(Debug, Clone)]
pub struct NewStockMovement {
    pub tenant_id: String,
    pub movement_type: MovementType,
    pub warehouse_from: Option<Uuid>,
    pub warehouse_to: Option<Uuid>,
    pub item: ItemRef,
    pub quantity: i64,
    pub note: String,
}

/// Insert a movement fact within a transaction and return its id.
pub async fn tx_insert(
    tx: &mut Transaction<'_, Postgres>,
    movement: &NewStockMovement,
) -> Result<Uuid, sqlx::Error> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO stock_movements
            (tenant_id, movement_type, warehouse_from, warehouse_to,
             item_kind, item_id, quantity, note)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(&movement.tenant_id)
    .bind(movement.movement_type.as_str())
    .bind(movement.warehouse_from)
    .bind(movement.warehouse_to)
    .bind(movement.item.kind())
    .bind(movement.item.id())
    .bind(movement.quantity)
    .bind(&movement.note)
    .fetch_one(&mut **tx)
    .await?;

    Ok(id)
}

/// Fetch one movement by id.
pub async fn find(
    pool: &PgPool,
    tenant_id: &str,
    movement_id: Uuid,
) -> Result<Option<StockMovement>, sqlx::Error> {
    sqlx::query_as::<_, StockMovement>(
        r#"
        SELECT id, tenant_id, movement_type, warehouse_from, warehouse_to,
               item_kind, item_id, quantity, note, processed_at, created_at
        FROM stock_movements
        WHERE id = $1 AND tenant_id = $2
        "#,
    )
    .bind(movement_id)
    .bind(tenant_id)
    .fetch_optional(pool)
    .await
}

/// List movement history for one item, most recent first.
pub async fn list_for_item(
    pool: &PgPool,
    tenant_id: &str,
    item: ItemRef,
) -> Result<Vec<StockMovement>, sqlx::Error> {
    sqlx::query_as::<_, StockMovement>(
        r#"
        SELECT id, tenant_id, movement_type, warehouse_from, warehouse_to,
               item_kind, item_id, quantity, note, processed_at, created_at
        FROM stock_movements
        WHERE tenant_id = $1 AND item_kind = $2 AND item_id = $3
        ORDER BY processed_at DESC
        "#,
    )
    .bind(tenant_id)
    .bind(item.kind())
    .bind(item.id())
    .fetch_all(pool)
    .await
}
