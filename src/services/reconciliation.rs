//! Inventory reconciliation
//!
//! A check is a counting session against one warehouse. Lines snapshot
//! the expected quantity at count time; applying adjustments snaps each
//! divergent stock row to the counted quantity and records a movement
//! fact (inbound for surplus, loss for shortage) so the correction
//! shows up in movement history. Adjustments are one-shot per check.

use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::repos::audit_repo;
use crate::repos::check_repo::{self, InventoryCheck, InventoryCheckLine};
use crate::repos::movement_repo::{self, MovementType, NewStockMovement};
use crate::repos::stock_repo::{self, ItemRef, StockError};

/// Errors that can occur during reconciliation
#[derive(Debug, Error)]
pub enum ReconciliationError {
    #[error("Inventory check not found: {0}")]
    CheckNotFound(Uuid),

    #[error("Inventory check {0} is already completed")]
    CheckClosed(Uuid),

    #[error("Inventory check {check_id} is not completed (status: {status})")]
    NotCompleted { check_id: Uuid, status: String },

    #[error("Adjustments already applied for check {0}")]
    AlreadyApplied(Uuid),

    #[error("Stock row {stock_row_id} belongs to warehouse {actual}, check covers {expected}")]
    WarehouseMismatch {
        stock_row_id: Uuid,
        expected: Uuid,
        actual: Uuid,
    },

    #[error("Counted quantity must be non-negative, got {0}")]
    NegativeCount(i64),

    #[error(transparent)]
    Stock(#[from] StockError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Open a new counting session for a warehouse.
pub async fn open_check(
    pool: &PgPool,
    tenant_id: &str,
    warehouse_id: Uuid,
) -> Result<InventoryCheck, ReconciliationError> {
    let check = check_repo::create(pool, tenant_id, warehouse_id).await?;

    tracing::info!(
        check_id = %check.id,
        tenant_id = %tenant_id,
        warehouse_id = %warehouse_id,
        "Inventory check opened"
    );

    Ok(check)
}

/// Record (or re-record) a counted quantity for one stock row.
///
/// The expected quantity is snapshotted from the stock row at count
/// time and the difference re-derived; counting the same row twice
/// overwrites the earlier line.
pub async fn record_line(
    pool: &PgPool,
    tenant_id: &str,
    check_id: Uuid,
    stock_row_id: Uuid,
    actual_quantity: i64,
) -> Result<InventoryCheckLine, ReconciliationError> {
    if actual_quantity < 0 {
        return Err(ReconciliationError::NegativeCount(actual_quantity));
    }

    let mut tx = pool.begin().await?;

    let check = check_repo::find_for_update(&mut tx, tenant_id, check_id)
        .await?
        .ok_or(ReconciliationError::CheckNotFound(check_id))?;

    if check.status == "completed" {
        return Err(ReconciliationError::CheckClosed(check_id));
    }

    let stock_row = stock_repo::find_by_id_tx(&mut tx, tenant_id, stock_row_id).await?;
    if stock_row.warehouse_id != check.warehouse_id {
        return Err(ReconciliationError::WarehouseMismatch {
            stock_row_id,
            expected: check.warehouse_id,
            actual: stock_row.warehouse_id,
        });
    }

    let line = check_repo::tx_upsert_line(
        &mut tx,
        tenant_id,
        check_id,
        stock_row_id,
        stock_row.quantity,
        actual_quantity,
    )
    .await?;

    tx.commit().await?;

    tracing::debug!(
        check_id = %check_id,
        stock_row_id = %stock_row_id,
        expected = line.expected_quantity,
        actual = line.actual_quantity,
        difference = line.difference,
        "Inventory check line recorded"
    );

    Ok(line)
}

/// Close the counting session. Idempotent.
pub async fn complete_check(
    pool: &PgPool,
    tenant_id: &str,
    check_id: Uuid,
) -> Result<InventoryCheck, ReconciliationError> {
    let mut tx = pool.begin().await?;

    let check = check_repo::find_for_update(&mut tx, tenant_id, check_id)
        .await?
        .ok_or(ReconciliationError::CheckNotFound(check_id))?;

    if check.status == "completed" {
        return Ok(check);
    }

    let completed = check_repo::tx_mark_completed(&mut tx, tenant_id, check_id).await?;
    tx.commit().await?;

    tracing::info!(check_id = %check_id, tenant_id = %tenant_id, "Inventory check completed");

    Ok(completed)
}

/// Apply stock adjustments for a completed check.
///
/// Each line with a non-zero difference snaps its stock row to the
/// counted quantity and records a movement fact. The movement is a
/// record only; the stock write is the overwrite, so the two cannot
/// double-apply.
pub async fn apply_adjustments(
    pool: &PgPool,
    tenant_id: &str,
    check_id: Uuid,
    actor_id: Option<Uuid>,
) -> Result<InventoryCheck, ReconciliationError> {
    let mut tx = pool.begin().await?;

    let check = check_repo::find_for_update(&mut tx, tenant_id, check_id)
        .await?
        .ok_or(ReconciliationError::CheckNotFound(check_id))?;

    if check.status != "completed" {
        return Err(ReconciliationError::NotCompleted {
            check_id,
            status: check.status,
        });
    }
    if check.adjustments_applied_at.is_some() {
        return Err(ReconciliationError::AlreadyApplied(check_id));
    }

    let lines = check_repo::lines_tx(&mut tx, tenant_id, check_id).await?;

    let mut adjusted = 0usize;
    for line in &lines {
        if line.difference == 0 {
            continue;
        }

        let stock_row =
            stock_repo::tx_overwrite_quantity(&mut tx, tenant_id, line.stock_row_id, line.actual_quantity)
                .await?;

        let item = ItemRef::from_columns(&stock_row.item_kind, stock_row.item_id)?;
        let (movement_type, warehouse_from, warehouse_to) = if line.difference > 0 {
            (MovementType::Inbound, None, Some(check.warehouse_id))
        } else {
            (MovementType::Loss, Some(check.warehouse_id), None)
        };

        movement_repo::tx_insert(
            &mut tx,
            &NewStockMovement {
                tenant_id: tenant_id.to_string(),
                movement_type,
                warehouse_from,
                warehouse_to,
                item,
                quantity: line.difference.abs(),
                note: format!("Inventory check {} adjustment", check_id),
            },
        )
        .await?;

        adjusted += 1;
    }

    let stamped = check_repo::tx_mark_adjustments_applied(&mut tx, tenant_id, check_id).await?;

    audit_repo::tx_record(
        &mut tx,
        tenant_id,
        actor_id,
        "inventory_check_adjusted",
        "inventory_check",
        check_id,
        serde_json::json!({
            "warehouse_id": check.warehouse_id,
            "lines": lines.len(),
            "adjusted": adjusted,
        }),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        check_id = %check_id,
        tenant_id = %tenant_id,
        adjusted = adjusted,
        "Inventory adjustments applied"
    );

    Ok(stamped)
}
