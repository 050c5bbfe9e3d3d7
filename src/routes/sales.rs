//! Sale lifecycle endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::contracts::sale_submit_v1::{
    SaleActionRequestV1, SaleDetailV1, SaleQueryV1, SaleSubmitRequestV1,
};
use crate::repos::sale_repo::{self, Sale};
use crate::repos::stock_repo::StockError;
use crate::routes::ApiError;
use crate::services::movement_applier::MovementError;
use crate::services::sale_finalizer::{self, FinalizeError};
use crate::validation;

/// Map finalizer errors to HTTP status codes
fn map_error(error: FinalizeError) -> ApiError {
    match error {
        FinalizeError::NotFound(_) => ApiError::not_found(error.to_string()),
        FinalizeError::AlreadyFinalized(_) => ApiError::conflict(error.to_string()),
        FinalizeError::Movement(MovementError::Invalid(_)) => {
            ApiError::bad_request(error.to_string())
        }
        FinalizeError::Movement(MovementError::Stock(ref stock)) => match stock {
            StockError::Insufficient { .. } => ApiError::conflict(error.to_string()),
            StockError::UnknownItemKind(_) => ApiError::bad_request(error.to_string()),
            StockError::NotFound(_) => ApiError::not_found(error.to_string()),
            StockError::Database(_) => ApiError::database(),
        },
        FinalizeError::Movement(MovementError::Database(_)) | FinalizeError::Database(_) => {
            ApiError::database()
        }
    }
}

/// Handler for POST /api/sales
///
/// Creates the sale with its items and payments and finalizes it in
/// one transaction.
pub async fn submit_sale(
    State(pool): State<Arc<PgPool>>,
    Json(request): Json<SaleSubmitRequestV1>,
) -> Result<Json<Sale>, ApiError> {
    validation::validate_sale_submit(&request)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let sale = sale_finalizer::submit_sale(&pool, &request)
        .await
        .map_err(map_error)?;

    Ok(Json(sale))
}

/// Handler for POST /api/sales/{sale_id}/finalize
pub async fn finalize_sale(
    State(pool): State<Arc<PgPool>>,
    Path(sale_id): Path<Uuid>,
    Json(request): Json<SaleActionRequestV1>,
) -> Result<Json<Sale>, ApiError> {
    let sale = sale_finalizer::finalize(&pool, &request.tenant_id, sale_id, request.actor_id)
        .await
        .map_err(map_error)?;

    Ok(Json(sale))
}

/// Handler for POST /api/sales/{sale_id}/recompute
///
/// Re-derives totals and status from lines and payments without
/// touching stock.
pub async fn recompute_sale(
    State(pool): State<Arc<PgPool>>,
    Path(sale_id): Path<Uuid>,
    Json(request): Json<SaleActionRequestV1>,
) -> Result<Json<Sale>, ApiError> {
    let sale = sale_finalizer::recompute(&pool, &request.tenant_id, sale_id)
        .await
        .map_err(map_error)?;

    Ok(Json(sale))
}

/// Handler for GET /api/sales/{sale_id}?tenant_id={tenant_id}
pub async fn get_sale(
    State(pool): State<Arc<PgPool>>,
    Path(sale_id): Path<Uuid>,
    Query(query): Query<SaleQueryV1>,
) -> Result<Json<SaleDetailV1>, ApiError> {
    let sale = sale_repo::find(&pool, &query.tenant_id, sale_id)
        .await
        .map_err(|_| ApiError::database())?
        .ok_or_else(|| ApiError::not_found(format!("Sale not found: {}", sale_id)))?;

    let items = sale_repo::items(&pool, &query.tenant_id, sale_id)
        .await
        .map_err(|_| ApiError::database())?;
    let payments = sale_repo::payments(&pool, &query.tenant_id, sale_id)
        .await
        .map_err(|_| ApiError::database())?;

    Ok(Json(SaleDetailV1 {
        sale,
        items,
        payments,
    }))
}
