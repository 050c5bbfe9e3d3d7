//! Credit ledger endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::contracts::credit_entry_v1::{
    CreditAccountCreateRequestV1, CreditAccountDetailV1, CreditEntryActionRequestV1,
    CreditEntryRequestV1, CreditEntryResponseV1, CreditQueryV1,
};
use crate::money::Amounts;
use crate::repos::credit_repo::{self, CreditAccount, CreditEntry, CreditError, NewCreditEntry};
use crate::routes::ApiError;
use crate::services::credit_ledger;

/// Map credit errors to HTTP status codes
fn map_error(error: CreditError) -> ApiError {
    match error {
        CreditError::AccountNotFound(_) | CreditError::EntryNotFound(_) => {
            ApiError::not_found(error.to_string())
        }
        CreditError::Database(_) => ApiError::database(),
    }
}

/// Handler for POST /api/credit/accounts
pub async fn create_account(
    State(pool): State<Arc<PgPool>>,
    Json(request): Json<CreditAccountCreateRequestV1>,
) -> Result<Json<CreditAccount>, ApiError> {
    let credit_limit = match (request.credit_limit_local, request.credit_limit_usd) {
        (None, None) => None,
        (local, usd) => Some(Amounts::new(
            local.unwrap_or_default(),
            usd.unwrap_or_default(),
        )),
    };

    let account = credit_repo::create_account(
        &pool,
        &request.tenant_id,
        &request.account_type,
        &request.name,
        credit_limit,
        request.due_date,
    )
    .await
    .map_err(map_error)?;

    Ok(Json(account))
}

/// Handler for POST /api/credit/entries
///
/// Appends an entry and returns it with the updated balance.
pub async fn append_entry(
    State(pool): State<Arc<PgPool>>,
    Json(request): Json<CreditEntryRequestV1>,
) -> Result<Json<CreditEntryResponseV1>, ApiError> {
    let (entry, account) = credit_ledger::append_entry(
        &pool,
        &request.tenant_id,
        &NewCreditEntry {
            account_id: request.account_id,
            direction: request.direction,
            amount: Amounts::new(request.amount_local, request.amount_usd),
            description: request.description.unwrap_or_default(),
            due_date: request.due_date,
            related_sale_id: request.related_sale_id,
        },
        request.actor_id,
    )
    .await
    .map_err(map_error)?;

    Ok(Json(CreditEntryResponseV1 { entry, account }))
}

/// Handler for POST /api/credit/entries/{entry_id}/settle
pub async fn settle_entry(
    State(pool): State<Arc<PgPool>>,
    Path(entry_id): Path<Uuid>,
    Json(request): Json<CreditEntryActionRequestV1>,
) -> Result<Json<CreditEntry>, ApiError> {
    let entry = credit_ledger::settle_entry(&pool, &request.tenant_id, entry_id, request.actor_id)
        .await
        .map_err(map_error)?;

    Ok(Json(entry))
}

/// Handler for GET /api/credit/accounts/{account_id}?tenant_id={tenant_id}
pub async fn get_account(
    State(pool): State<Arc<PgPool>>,
    Path(account_id): Path<Uuid>,
    Query(query): Query<CreditQueryV1>,
) -> Result<Json<CreditAccountDetailV1>, ApiError> {
    let account = credit_repo::find_account(&pool, &query.tenant_id, account_id)
        .await
        .map_err(map_error)?
        .ok_or_else(|| ApiError::not_found(format!("Credit account not found: {}", account_id)))?;

    let entries = credit_repo::list_entries(&pool, &query.tenant_id, account_id)
        .await
        .map_err(map_error)?;

    Ok(Json(CreditAccountDetailV1 { account, entries }))
}
