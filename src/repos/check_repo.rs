//! Repository for inventory checks and their count lines
//!
//! The `difference` column on a line is always derived as
//! actual - expected at write time.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Inventory check header model
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct InventoryCheck {
    pub id: Uuid,
    pub tenant_id: String,
    pub warehouse_id: Uuid,
    pub status: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub adjustments_applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inventory check line model
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct InventoryCheckLine {
    pub id: Uuid,
    pub tenant_id: String,
    pub check_id: Uuid,
    pub stock_row_id: Uuid,
    pub expected_quantity: i64,
    pub actual_quantity: i64,
    pub difference: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Open a new check for a warehouse.
pub async fn create(
    pool: &PgPool,
    tenant_id: &str,
    warehouse_id: Uuid,
) -> Result<InventoryCheck, sqlx::Error> {
    sqlx::query_as::<_, InventoryCheck>(
        r#"
        INSERT INTO inventory_checks (tenant_id, warehouse_id, status)
        VALUES ($1, $2, 'in_progress')
        RETURNING id, tenant_id, warehouse_id, status, completed_at,
                  adjustments_applied_at, created_at, updated_at
        "#,
    )
    .bind(tenant_id)
    .bind(warehouse_id)
    .fetch_one(pool)
    .await
}

/// Fetch a check header by id.
pub async fn find(
    pool: &PgPool,
    tenant_id: &str,
    check_id: Uuid,
) -> Result<Option<InventoryCheck>, sqlx::Error> {
    sqlx::query_as::<_, InventoryCheck>(
        r#"
        SELECT id, tenant_id, warehouse_id, status, completed_at,
               adjustments_applied_at, created_at, updated_at
        FROM inventory_checks
        WHERE id = $1 AND tenant_id = $2
        "#,
    )
    .bind(check_id)
    .bind(tenant_id)
    .fetch_optional(pool)
    .await
}

/// Fetch and lock a check header within a transaction.
pub async fn find_for_update(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    check_id: Uuid,
) -> Result<Option<InventoryCheck>, sqlx::Error> {
    sqlx::query_as::<_, InventoryCheck>(
        r#"
        SELECT id, tenant_id, warehouse_id, status, completed_at,
               adjustments_applied_at, created_at, updated_at
        FROM inventory_checks
        WHERE id = $1 AND tenant_id = $2
        FOR UPDATE
        "#,
    )
    .bind(check_id)
    .bind(tenant_id)
    .fetch_optional(&mut **tx)
    .await
}

/// Upsert a count line within a transaction.
///
/// One line per stock row per check; a repeated count for the same
/// row overwrites the previous one and re-derives the difference.
pub async fn tx_upsert_line(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    check_id: Uuid,
    stock_row_id: Uuid,
    expected_quantity: i64,
    actual_quantity: i64,
) -> Result<InventoryCheckLine, sqlx::Error> {
    let difference = actual_quantity - expected_quantity;

    sqlx::query_as::<_, InventoryCheckLine>(
        r#"
        INSERT INTO inventory_check_lines
            (tenant_id, check_id, stock_row_id, expected_quantity, actual_quantity, difference)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (check_id, stock_row_id)
        DO UPDATE SET
            expected_quantity = EXCLUDED.expected_quantity,
            actual_quantity = EXCLUDED.actual_quantity,
            difference = EXCLUDED.difference,
            updated_at = NOW()
        RETURNING id, tenant_id, check_id, stock_row_id,
                  expected_quantity, actual_quantity, difference,
                  created_at, updated_at
        "#,
    )
    .bind(tenant_id)
    .bind(check_id)
    .bind(stock_row_id)
    .bind(expected_quantity)
    .bind(actual_quantity)
    .bind(difference)
    .fetch_one(&mut **tx)
    .await
}

/// Fetch all lines for a check within a transaction.
pub async fn lines_tx(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    check_id: Uuid,
) -> Result<Vec<InventoryCheckLine>, sqlx::Error> {
    sqlx::query_as::<_, InventoryCheckLine>(
        r#"
        SELECT id, tenant_id, check_id, stock_row_id,
               expected_quantity, actual_quantity, difference,
               created_at, updated_at
        FROM inventory_check_lines
        WHERE check_id = $1 AND tenant_id = $2
        ORDER BY created_at, id
        "#,
    )
    .bind(check_id)
    .bind(tenant_id)
    .fetch_all(&mut **tx)
    .await
}

/// Fetch all lines for a check.
pub async fn lines(
    pool: &PgPool,
    tenant_id: &str,
    check_id: Uuid,
) -> Result<Vec<InventoryCheckLine>, sqlx::Error> {
    sqlx::query_as::<_, InventoryCheckLine>(
        r#"
        SELECT id, tenant_id, check_id, stock_row_id,
               expected_quantity, actual_quantity, difference,
               created_at, updated_at
        FROM inventory_check_lines
        WHERE check_id = $1 AND tenant_id = $2
        ORDER BY created_at, id
        "#,
    )
    .bind(check_id)
    .bind(tenant_id)
    .fetch_all(pool)
    .await
}

/// Mark a check completed within a transaction.
pub async fn tx_mark_completed(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    check_id: Uuid,
) -> Result<InventoryCheck, sqlx::Error> {
    sqlx::query_as::<_, InventoryCheck>(
        r#"
        UPDATE inventory_checks
        SET status = 'completed', completed_at = NOW(), updated_at = NOW()
        WHERE id = $1 AND tenant_id = $2
        RETURNING id, tenant_id, warehouse_id, status, completed_at,
                  adjustments_applied_at, created_at, updated_at
        "#,
    )
    .bind(check_id)
    .bind(tenant_id)
    .fetch_one(&mut **tx)
    .await
}

/// Stamp the check as adjusted within a transaction.
pub async fn tx_mark_adjustments_applied(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    check_id: Uuid,
) -> Result<InventoryCheck, sqlx::Error> {
    sqlx::query_as::<_, InventoryCheck>(
        r#"
        UPDATE inventory_checks
        SET adjustments_applied_at = NOW(), updated_at = NOW()
        WHERE id = $1 AND tenant_id = $2
        RETURNING id, tenant_id, warehouse_id, status, completed_at,
                  adjustments_applied_at, created_at, updated_at
        "#,
    )
    .bind(check_id)
    .bind(tenant_id)
    .fetch_one(&mut **tx)
    .await
}
