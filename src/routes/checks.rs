//! Inventory check endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::contracts::inventory_check_v1::{
    CheckActionRequestV1, CheckDetailV1, CheckLineRequestV1, CheckOpenRequestV1, CheckQueryV1,
};
use crate::repos::check_repo::{self, InventoryCheck, InventoryCheckLine};
use crate::repos::stock_repo::StockError;
use crate::routes::ApiError;
use crate::services::reconciliation::{self, ReconciliationError};

/// Map reconciliation errors to HTTP status codes
fn map_error(error: ReconciliationError) -> ApiError {
    match error {
        ReconciliationError::CheckNotFound(_) => ApiError::not_found(error.to_string()),
        ReconciliationError::CheckClosed(_)
        | ReconciliationError::NotCompleted { .. }
        | ReconciliationError::AlreadyApplied(_) => ApiError::conflict(error.to_string()),
        ReconciliationError::WarehouseMismatch { .. } | ReconciliationError::NegativeCount(_) => {
            ApiError::bad_request(error.to_string())
        }
        ReconciliationError::Stock(StockError::NotFound(_)) => ApiError::not_found(error.to_string()),
        ReconciliationError::Stock(StockError::Insufficient { .. }) => {
            ApiError::conflict(error.to_string())
        }
        ReconciliationError::Stock(StockError::UnknownItemKind(_)) => {
            ApiError::bad_request(error.to_string())
        }
        ReconciliationError::Stock(StockError::Database(_)) | ReconciliationError::Database(_) => {
            ApiError::database()
        }
    }
}

/// Handler for POST /api/checks
pub async fn open_check(
    State(pool): State<Arc<PgPool>>,
    Json(request): Json<CheckOpenRequestV1>,
) -> Result<Json<InventoryCheck>, ApiError> {
    let check = reconciliation::open_check(&pool, &request.tenant_id, request.warehouse_id)
        .await
        .map_err(map_error)?;

    Ok(Json(check))
}

/// Handler for PUT /api/checks/{check_id}/lines
///
/// Records a counted quantity; counting the same stock row twice
/// overwrites the earlier line.
pub async fn record_line(
    State(pool): State<Arc<PgPool>>,
    Path(check_id): Path<Uuid>,
    Json(request): Json<CheckLineRequestV1>,
) -> Result<Json<InventoryCheckLine>, ApiError> {
    let line = reconciliation::record_line(
        &pool,
        &request.tenant_id,
        check_id,
        request.stock_row_id,
        request.actual_quantity,
    )
    .await
    .map_err(map_error)?;

    Ok(Json(line))
}

/// Handler for POST /api/checks/{check_id}/complete
pub async fn complete_check(
    State(pool): State<Arc<PgPool>>,
    Path(check_id): Path<Uuid>,
    Json(request): Json<CheckActionRequestV1>,
) -> Result<Json<InventoryCheck>, ApiError> {
    let check = reconciliation::complete_check(&pool, &request.tenant_id, check_id)
        .await
        .map_err(map_error)?;

    Ok(Json(check))
}

/// Handler for POST /api/checks/{check_id}/apply-adjustments
///
/// One-shot: a second apply is rejected with a conflict.
pub async fn apply_adjustments(
    State(pool): State<Arc<PgPool>>,
    Path(check_id): Path<Uuid>,
    Json(request): Json<CheckActionRequestV1>,
) -> Result<Json<InventoryCheck>, ApiError> {
    let check =
        reconciliation::apply_adjustments(&pool, &request.tenant_id, check_id, request.actor_id)
            .await
            .map_err(map_error)?;

    Ok(Json(check))
}

/// Handler for GET /api/checks/{check_id}?tenant_id={tenant_id}
pub async fn get_check(
    State(pool): State<Arc<PgPool>>,
    Path(check_id): Path<Uuid>,
    Query(query): Query<CheckQueryV1>,
) -> Result<Json<CheckDetailV1>, ApiError> {
    let check = check_repo::find(&pool, &query.tenant_id, check_id)
        .await
        .map_err(|_| ApiError::database())?
        .ok_or_else(|| ApiError::not_found(format!("Inventory check not found: {}", check_id)))?;

    let lines = check_repo::lines(&pool, &query.tenant_id, check_id)
        .await
        .map_err(|_| ApiError::database())?;

    Ok(Json(CheckDetailV1 { check, lines }))
}
