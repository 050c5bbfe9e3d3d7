//! Sale return endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::contracts::sale_return_v1::{ReturnActionRequestV1, SaleReturnRequestV1};
use crate::repos::return_repo::SaleReturn;
use crate::repos::stock_repo::StockError;
use crate::routes::ApiError;
use crate::services::movement_applier::MovementError;
use crate::services::return_processor::{self, ReturnError};
use crate::validation;

/// Map return errors to HTTP status codes
fn map_error(error: ReturnError) -> ApiError {
    match error {
        ReturnError::NotFound(_)
        | ReturnError::SaleNotFound(_)
        | ReturnError::SaleItemNotFound(_) => ApiError::not_found(error.to_string()),
        ReturnError::Excessive { .. } => ApiError::bad_request(error.to_string()),
        ReturnError::Movement(MovementError::Invalid(_))
        | ReturnError::Movement(MovementError::Stock(StockError::UnknownItemKind(_))) => {
            ApiError::bad_request(error.to_string())
        }
        ReturnError::Movement(MovementError::Stock(StockError::Insufficient { .. })) => {
            ApiError::conflict(error.to_string())
        }
        ReturnError::Movement(MovementError::Stock(StockError::NotFound(_))) => {
            ApiError::not_found(error.to_string())
        }
        ReturnError::Movement(MovementError::Stock(StockError::Database(_)))
        | ReturnError::Movement(MovementError::Database(_))
        | ReturnError::Database(_) => ApiError::database(),
    }
}

/// Handler for POST /api/returns
///
/// Creates the return with its items and processes it in one
/// transaction.
pub async fn submit_return(
    State(pool): State<Arc<PgPool>>,
    Json(request): Json<SaleReturnRequestV1>,
) -> Result<Json<SaleReturn>, ApiError> {
    validation::validate_sale_return(&request)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let processed = return_processor::create_and_process(&pool, &request)
        .await
        .map_err(map_error)?;

    Ok(Json(processed))
}

/// Handler for POST /api/returns/{return_id}/process
///
/// Idempotent: processing a completed return returns it unchanged.
pub async fn process_return(
    State(pool): State<Arc<PgPool>>,
    Path(return_id): Path<Uuid>,
    Json(request): Json<ReturnActionRequestV1>,
) -> Result<Json<SaleReturn>, ApiError> {
    let processed =
        return_processor::process(&pool, &request.tenant_id, return_id, request.actor_id)
            .await
            .map_err(map_error)?;

    Ok(Json(processed))
}
