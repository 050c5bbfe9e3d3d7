//! Stock movement applier
//!
//! Turns a movement request into a plan of signed per-warehouse
//! deltas, then persists the movement fact and applies every delta in
//! one transaction. A transfer is two deltas (out of the source, into
//! the destination); the outbound leg runs first so an insufficient
//! source aborts before the destination is touched.

use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

use crate::repos::movement_repo::{self, MovementType, NewStockMovement};
use crate::repos::stock_repo::{self, StockError, StockRow};

/// One signed quantity change against a warehouse stock row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDelta {
    pub warehouse_id: Uuid,
    pub delta: i64,
}

/// Errors that can occur while applying a movement
#[derive(Debug, Error)]
pub enum MovementError {
    #[error("Invalid movement: {0}")]
    Invalid(String),

    #[error(transparent)]
    Stock(#[from] StockError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Plan the stock deltas for a movement without touching the database.
///
/// Validates the warehouse endpoints required by each movement type:
/// inbound needs a destination, outbound and loss need a source, and
/// transfer needs both (and they must differ).
pub fn plan(
    movement_type: MovementType,
    warehouse_from: Option<Uuid>,
    warehouse_to: Option<Uuid>,
    quantity: i64,
) -> Result<Vec<StockDelta>, MovementError> {
    if quantity <= 0 {
        return Err(MovementError::Invalid(format!(
            "quantity must be positive, got {}",
            quantity
        )));
    }

    match movement_type {
        MovementType::Inbound => {
            let to = warehouse_to.ok_or_else(|| {
                MovementError::Invalid("inbound movement requires warehouse_to".to_string())
            })?;
            Ok(vec![StockDelta {
                warehouse_id: to,
                delta: quantity,
            }])
        }
        MovementType::Outbound | MovementType::Loss => {
            let from = warehouse_from.ok_or_else(|| {
                MovementError::Invalid(format!(
                    "{} movement requires warehouse_from",
                    movement_type.as_str()
                ))
            })?;
            Ok(vec![StockDelta {
                warehouse_id: from,
                delta: -quantity,
            }])
        }
        MovementType::Transfer => {
            let from = warehouse_from.ok_or_else(|| {
                MovementError::Invalid("transfer movement requires warehouse_from".to_string())
            })?;
            let to = warehouse_to.ok_or_else(|| {
                MovementError::Invalid("transfer movement requires warehouse_to".to_string())
            })?;
            if from == to {
                return Err(MovementError::Invalid(
                    "transfer source and destination must differ".to_string(),
                ));
            }
            Ok(vec![
                StockDelta {
                    warehouse_id: from,
                    delta: -quantity,
                },
                StockDelta {
                    warehouse_id: to,
                    delta: quantity,
                },
            ])
        }
    }
}

/// Persist and apply a movement within an existing transaction.
///
/// Returns the movement id and the stock rows after adjustment.
pub async fn tx_apply(
    tx: &mut Transaction<'_, Postgres>,
    movement: &NewStockMovement,
) -> Result<(Uuid, Vec<StockRow>), MovementError> {
    let deltas = plan(
        movement.movement_type,
        movement.warehouse_from,
        movement.warehouse_to,
        movement.quantity,
    )?;

    let movement_id = movement_repo::tx_insert(tx, movement).await?;

    let mut rows = Vec::with_capacity(deltas.len());
    for StockDelta { warehouse_id, delta } in deltas {
        let row = stock_repo::tx_adjust(
            tx,
            &movement.tenant_id,
            warehouse_id,
            movement.item,
            delta,
        )
        .await?;
        rows.push(row);
    }

    tracing::debug!(
        movement_id = %movement_id,
        movement_type = movement.movement_type.as_str(),
        quantity = movement.quantity,
        "Stock movement applied"
    );

    Ok((movement_id, rows))
}

/// Persist and apply a movement in its own transaction.
pub async fn apply(
    pool: &PgPool,
    movement: &NewStockMovement,
) -> Result<(Uuid, Vec<StockRow>), MovementError> {
    let mut tx = pool.begin().await?;
    let result = tx_apply(&mut tx, movement).await?;
    tx.commit().await?;

    tracing::info!(
        movement_id = %result.0,
        tenant_id = %movement.tenant_id,
        movement_type = movement.movement_type.as_str(),
        "Stock movement committed"
    );

    Ok(result)
}
