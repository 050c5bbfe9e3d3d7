//! Stock movement and stock query endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;

use crate::contracts::stock_movement_v1::{
    StockMovementRequestV1, StockMovementResponseV1, StockQueryV1,
};
use crate::repos::movement_repo::NewStockMovement;
use crate::repos::stock_repo::{self, StockError, StockRow};
use crate::routes::ApiError;
use crate::services::movement_applier::{self, MovementError};

/// Map movement errors to HTTP status codes
fn map_error(error: MovementError) -> ApiError {
    match error {
        MovementError::Invalid(_) => ApiError::bad_request(error.to_string()),
        MovementError::Stock(StockError::Insufficient { .. }) => {
            ApiError::conflict(error.to_string())
        }
        MovementError::Stock(StockError::UnknownItemKind(_)) => {
            ApiError::bad_request(error.to_string())
        }
        MovementError::Stock(StockError::NotFound(_)) => ApiError::not_found(error.to_string()),
        MovementError::Stock(StockError::Database(_)) | MovementError::Database(_) => {
            ApiError::database()
        }
    }
}

/// Handler for POST /api/stock/movements
///
/// Persists the movement fact and applies its stock deltas atomically.
pub async fn apply_movement(
    State(pool): State<Arc<PgPool>>,
    Json(request): Json<StockMovementRequestV1>,
) -> Result<Json<StockMovementResponseV1>, ApiError> {
    let (movement_id, stock) = movement_applier::apply(
        &pool,
        &NewStockMovement {
            tenant_id: request.tenant_id,
            movement_type: request.movement_type,
            warehouse_from: request.warehouse_from,
            warehouse_to: request.warehouse_to,
            item: request.item,
            quantity: request.quantity,
            note: request.note.unwrap_or_default(),
        },
    )
    .await
    .map_err(map_error)?;

    Ok(Json(StockMovementResponseV1 { movement_id, stock }))
}

/// Handler for GET /api/stock?tenant_id={tenant_id}&warehouse_id={warehouse_id}
pub async fn list_stock(
    State(pool): State<Arc<PgPool>>,
    Query(query): Query<StockQueryV1>,
) -> Result<Json<Vec<StockRow>>, ApiError> {
    let rows = stock_repo::list(&pool, &query.tenant_id, query.warehouse_id)
        .await
        .map_err(|_| ApiError::database())?;

    Ok(Json(rows))
}

/// Handler for GET /api/stock/low?tenant_id={tenant_id}
///
/// Rows at or below their low-stock threshold.
pub async fn list_low_stock(
    State(pool): State<Arc<PgPool>>,
    Query(query): Query<StockQueryV1>,
) -> Result<Json<Vec<StockRow>>, ApiError> {
    let rows = stock_repo::list_low(&pool, &query.tenant_id)
        .await
        .map_err(|_| ApiError::database())?;

    Ok(Json(rows))
}
