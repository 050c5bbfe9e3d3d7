//! Return processor
//!
//! Processing a return restocks the returned quantities into the
//! sale's warehouse via inbound movements, computes the refund per
//! item proportionally to its line total, and forces the sale into
//! refunded status. The whole thing is one transaction keyed on a
//! FOR UPDATE lock of the return header; re-processing a completed
//! return is a no-op that returns the stored result.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

use crate::contracts::sale_return_v1::SaleReturnRequestV1;
use crate::money::{round_half_up, Amounts};
use crate::repos::audit_repo;
use crate::repos::movement_repo::{MovementType, NewStockMovement};
use crate::repos::return_repo::{self, SaleReturn};
use crate::repos::sale_repo::{self, SaleStatus};
use crate::repos::stock_repo::{ItemRef, StockError};
use crate::services::movement_applier::{self, MovementError};

/// Errors that can occur while processing a return
#[derive(Debug, Error)]
pub enum ReturnError {
    #[error("Return not found: {0}")]
    NotFound(Uuid),

    #[error("Sale not found: {0}")]
    SaleNotFound(Uuid),

    #[error("Sale item not found: {0}")]
    SaleItemNotFound(Uuid),

    #[error("Return quantity {requested} exceeds remaining quantity {available} for sale item {sale_item_id}")]
    Excessive {
        sale_item_id: Uuid,
        requested: i64,
        available: i64,
    },

    #[error(transparent)]
    Movement(#[from] MovementError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<StockError> for ReturnError {
    fn from(err: StockError) -> Self {
        ReturnError::Movement(MovementError::Stock(err))
    }
}

/// Refund for a partial return: the line total prorated by quantity,
/// rounded 2dp half-up per currency.
fn prorated_refund(line_total: Amounts, original_quantity: i64, returned: i64) -> Amounts {
    if original_quantity <= 0 {
        return Amounts::ZERO;
    }
    let ratio = Decimal::from(returned) / Decimal::from(original_quantity);
    Amounts {
        local: round_half_up(line_total.local * ratio),
        usd: round_half_up(line_total.usd * ratio),
    }
}

/// Pick the refund for a return item: the caller-supplied amount when
/// one was recorded on the item, otherwise the prorated default.
fn resolve_refund(
    requested: Option<Amounts>,
    line_total: Amounts,
    original_quantity: i64,
    returned: i64,
) -> Amounts {
    match requested {
        Some(amount) => amount.rounded(),
        None => prorated_refund(line_total, original_quantity, returned),
    }
}

/// Process a return within an existing transaction.
pub async fn tx_process(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    return_id: Uuid,
    actor_id: Option<Uuid>,
) -> Result<SaleReturn, ReturnError> {
    let sale_return = return_repo::find_for_update(tx, tenant_id, return_id)
        .await?
        .ok_or(ReturnError::NotFound(return_id))?;

    // Idempotent: a completed return is already settled.
    if sale_return.status == "completed" {
        return Ok(sale_return);
    }

    let sale = sale_repo::find_for_update(tx, tenant_id, sale_return.sale_id)
        .await?
        .ok_or(ReturnError::SaleNotFound(sale_return.sale_id))?;

    let return_items = return_repo::items_tx(tx, tenant_id, return_id).await?;

    let mut total_refunded = Amounts::ZERO;

    for return_item in &return_items {
        let sale_item = sale_repo::find_item_tx(tx, tenant_id, return_item.sale_item_id)
            .await?
            .ok_or(ReturnError::SaleItemNotFound(return_item.sale_item_id))?;

        let already_returned = return_repo::tx_completed_returned_quantity(
            tx,
            tenant_id,
            sale_item.id,
            return_id,
        )
        .await?;

        let available = sale_item.quantity - already_returned;
        if return_item.quantity > available {
            return Err(ReturnError::Excessive {
                sale_item_id: sale_item.id,
                requested: return_item.quantity,
                available,
            });
        }

        let item_ref = ItemRef::from_columns(&sale_item.item_kind, sale_item.item_id)?;
        movement_applier::tx_apply(
            tx,
            &NewStockMovement {
                tenant_id: tenant_id.to_string(),
                movement_type: MovementType::Inbound,
                warehouse_from: None,
                warehouse_to: Some(sale.warehouse_id),
                item: item_ref,
                quantity: return_item.quantity,
                note: format!("Return {}", sale_return.return_number),
            },
        )
        .await?;

        let requested = match (return_item.refund_amount_local, return_item.refund_amount_usd) {
            (None, None) => None,
            (local, usd) => Some(Amounts::new(
                local.unwrap_or_default(),
                usd.unwrap_or_default(),
            )),
        };
        let refund = resolve_refund(
            requested,
            Amounts::new(sale_item.line_total_local, sale_item.line_total_usd),
            sale_item.quantity,
            return_item.quantity,
        );
        return_repo::tx_store_item_refund(tx, tenant_id, return_item.id, refund).await?;
        total_refunded += refund;
    }

    let completed =
        return_repo::tx_mark_completed(tx, tenant_id, return_id, total_refunded.rounded()).await?;

    sale_repo::tx_force_status(tx, tenant_id, sale.id, SaleStatus::Refunded).await?;

    audit_repo::tx_record(
        tx,
        tenant_id,
        actor_id,
        "sale_return_processed",
        "sale_return",
        return_id,
        serde_json::json!({
            "return_number": completed.return_number,
            "sale_id": sale.id,
            "total_refunded_local": completed.total_refunded_local,
            "total_refunded_usd": completed.total_refunded_usd,
        }),
    )
    .await?;

    Ok(completed)
}

/// Process a return in its own transaction.
pub async fn process(
    pool: &PgPool,
    tenant_id: &str,
    return_id: Uuid,
    actor_id: Option<Uuid>,
) -> Result<SaleReturn, ReturnError> {
    let mut tx = pool.begin().await?;
    let result = tx_process(&mut tx, tenant_id, return_id, actor_id).await?;
    tx.commit().await?;

    tracing::info!(
        return_id = %return_id,
        tenant_id = %tenant_id,
        return_number = %result.return_number,
        "Sale return processed"
    );

    Ok(result)
}

/// Generate a return number: date prefix plus a random suffix.
pub fn generate_return_number() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("R-{}-{}", chrono::Utc::now().format("%Y%m%d"), &suffix[..6])
}

/// Create a return with its items and process it, all in one
/// transaction.
///
/// The caller is expected to have validated the request payload.
pub async fn create_and_process(
    pool: &PgPool,
    request: &SaleReturnRequestV1,
) -> Result<SaleReturn, ReturnError> {
    let mut tx = pool.begin().await?;

    let sale = sale_repo::find_for_update(&mut tx, &request.tenant_id, request.sale_id)
        .await?
        .ok_or(ReturnError::SaleNotFound(request.sale_id))?;

    let return_number = request
        .return_number
        .clone()
        .unwrap_or_else(generate_return_number);

    let header = return_repo::tx_insert(
        &mut tx,
        &request.tenant_id,
        sale.id,
        &return_number,
        request.reason.as_deref().unwrap_or(""),
    )
    .await?;

    for item in &request.items {
        let refund = match (item.refund_amount_local, item.refund_amount_usd) {
            (None, None) => None,
            (local, usd) => Some(
                Amounts::new(local.unwrap_or_default(), usd.unwrap_or_default()).rounded(),
            ),
        };
        return_repo::tx_insert_item(
            &mut tx,
            &request.tenant_id,
            header.id,
            item.sale_item_id,
            item.quantity,
            refund,
        )
        .await?;
    }

    let processed = tx_process(&mut tx, &request.tenant_id, header.id, request.actor_id).await?;

    tx.commit().await?;

    tracing::info!(
        return_id = %processed.id,
        tenant_id = %request.tenant_id,
        return_number = %processed.return_number,
        items = request.items.len(),
        "Sale return created and processed"
    );

    Ok(processed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_prorated_refund_full_return() {
        let refund = prorated_refund(Amounts::new(dec!(240000), dec!(20.00)), 2, 2);
        assert_eq!(refund.local, dec!(240000.00));
        assert_eq!(refund.usd, dec!(20.00));
    }

    #[test]
    fn test_prorated_refund_partial_return() {
        let refund = prorated_refund(Amounts::new(dec!(240000), dec!(20.00)), 2, 1);
        assert_eq!(refund.local, dec!(120000.00));
        assert_eq!(refund.usd, dec!(10.00));
    }

    #[test]
    fn test_prorated_refund_rounds_half_up() {
        // 100.00 over 3 units, returning 1: 33.333.. rounds to 33.33.
        let refund = prorated_refund(Amounts::new(dec!(100.00), dec!(0)), 3, 1);
        assert_eq!(refund.local, dec!(33.33));
    }

    #[test]
    fn test_prorated_refund_zero_quantity_guard() {
        let refund = prorated_refund(Amounts::new(dec!(100.00), dec!(0)), 0, 1);
        assert_eq!(refund, Amounts::ZERO);
    }

    #[test]
    fn test_resolve_refund_honors_requested_amount() {
        // Caller asked for 50000 on a line that would prorate to 120000.
        let refund = resolve_refund(
            Some(Amounts::new(dec!(50000), dec!(0))),
            Amounts::new(dec!(240000), dec!(20.00)),
            2,
            1,
        );
        assert_eq!(refund.local, dec!(50000.00));
        assert_eq!(refund.usd, dec!(0.00));
    }

    #[test]
    fn test_resolve_refund_rounds_requested_amount() {
        let refund = resolve_refund(
            Some(Amounts::new(dec!(99.999), dec!(1.005))),
            Amounts::new(dec!(240000), dec!(0)),
            2,
            1,
        );
        assert_eq!(refund.local, dec!(100.00));
        assert_eq!(refund.usd, dec!(1.01));
    }

    #[test]
    fn test_resolve_refund_falls_back_to_prorated() {
        let refund = resolve_refund(None, Amounts::new(dec!(240000), dec!(20.00)), 2, 1);
        assert_eq!(refund.local, dec!(120000.00));
        assert_eq!(refund.usd, dec!(10.00));
    }
}
