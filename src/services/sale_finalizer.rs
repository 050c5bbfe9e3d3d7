//! Sale finalizer
//!
//! Finalization is the point where a sale stops being a draft and
//! becomes a ledger fact: totals are recomputed from lines and
//! payments, one outbound movement per line deducts stock, and the
//! header is stamped with `completed_at`. Everything happens in one
//! transaction, so an insufficient-stock failure on any line leaves
//! the sale untouched.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

use crate::contracts::sale_submit_v1::SaleSubmitRequestV1;
use crate::money::Amounts;
use crate::repos::audit_repo;
use crate::repos::movement_repo::{MovementType, NewStockMovement};
use crate::repos::sale_repo::{
    self, NewSale, NewSaleItem, NewSalePayment, Sale, SaleItem, SalePayment, SaleStatus,
    SaleTotalsUpdate,
};
use crate::repos::stock_repo::{ItemRef, StockError};
use crate::services::movement_applier::{self, MovementError};
use crate::services::sale_totals::{self, DiscountPolicy, LineInput, PaymentInput, SaleTotals};

/// Errors that can occur while finalizing or recomputing a sale
#[derive(Debug, Error)]
pub enum FinalizeError {
    #[error("Sale not found: {0}")]
    NotFound(Uuid),

    #[error("Sale already finalized: {0}")]
    AlreadyFinalized(Uuid),

    #[error(transparent)]
    Movement(#[from] MovementError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<StockError> for FinalizeError {
    fn from(err: StockError) -> Self {
        FinalizeError::Movement(MovementError::Stock(err))
    }
}

/// Resolve the discount policy stored on a sale header.
fn discount_policy(sale: &Sale) -> DiscountPolicy {
    match sale.discount_type.as_str() {
        "percent" => DiscountPolicy::Percent(sale.discount_value),
        "amount" => DiscountPolicy::Amount(sale.discount_value),
        _ => DiscountPolicy::None,
    }
}

fn line_inputs(items: &[SaleItem]) -> Vec<LineInput> {
    items
        .iter()
        .map(|item| LineInput {
            quantity: item.quantity,
            unit_price: Amounts::new(item.unit_price_local, item.unit_price_usd),
            discount: Amounts::new(item.discount_local, item.discount_usd),
        })
        .collect()
}

fn payment_inputs(payments: &[SalePayment]) -> Vec<PaymentInput> {
    payments
        .iter()
        .map(|p| PaymentInput {
            amount: Amounts::new(p.amount_local, p.amount_usd),
            is_change: p.is_change,
        })
        .collect()
}

/// Recompute and persist totals for a sale inside a transaction.
///
/// A refunded sale keeps its forced status; the payment-derived status
/// only applies to sales still in the payment lifecycle.
async fn tx_store_computed_totals(
    tx: &mut Transaction<'_, Postgres>,
    sale: &Sale,
    items: &[SaleItem],
    payments: &[SalePayment],
    completed_at: Option<chrono::DateTime<Utc>>,
) -> Result<(Sale, SaleTotals), FinalizeError> {
    let totals = sale_totals::compute(
        &line_inputs(items),
        &payment_inputs(payments),
        discount_policy(sale),
    );

    for (item, line_total) in items.iter().zip(totals.line_totals.iter()) {
        sale_repo::tx_store_line_total(tx, &sale.tenant_id, item.id, *line_total).await?;
    }

    let status = if sale.status == SaleStatus::Refunded.as_str() {
        SaleStatus::Refunded
    } else {
        totals.status
    };

    let updated = sale_repo::tx_store_totals(
        tx,
        &sale.tenant_id,
        sale.id,
        &SaleTotalsUpdate {
            subtotal: totals.subtotal,
            total: totals.total,
            total_paid: totals.total_paid,
            change_due: totals.change_due,
            status,
            completed_at,
        },
    )
    .await?;

    Ok((updated, totals))
}

/// Finalize a sale within an existing transaction.
///
/// The caller must have begun the transaction; the sale header is
/// locked here so concurrent finalize attempts serialize and the
/// second one fails the `completed_at` guard.
pub async fn tx_finalize(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    sale_id: Uuid,
    actor_id: Option<Uuid>,
) -> Result<Sale, FinalizeError> {
    let sale = sale_repo::find_for_update(tx, tenant_id, sale_id)
        .await?
        .ok_or(FinalizeError::NotFound(sale_id))?;

    if sale.completed_at.is_some() {
        return Err(FinalizeError::AlreadyFinalized(sale_id));
    }

    let items = sale_repo::items_tx(tx, tenant_id, sale_id).await?;
    let payments = sale_repo::payments_tx(tx, tenant_id, sale_id).await?;

    for item in &items {
        let item_ref = ItemRef::from_columns(&item.item_kind, item.item_id)?;
        movement_applier::tx_apply(
            tx,
            &NewStockMovement {
                tenant_id: tenant_id.to_string(),
                movement_type: MovementType::Outbound,
                warehouse_from: Some(sale.warehouse_id),
                warehouse_to: None,
                item: item_ref,
                quantity: item.quantity,
                note: format!("Sale {}", sale.sale_number),
            },
        )
        .await?;
    }

    let (updated, totals) =
        tx_store_computed_totals(tx, &sale, &items, &payments, Some(Utc::now())).await?;

    audit_repo::tx_record(
        tx,
        tenant_id,
        actor_id,
        "sale_finalized",
        "sale",
        sale_id,
        serde_json::json!({
            "sale_number": updated.sale_number,
            "total_local": totals.total.local,
            "total_usd": totals.total.usd,
            "status": totals.status.as_str(),
        }),
    )
    .await?;

    Ok(updated)
}

/// Finalize a sale in its own transaction.
pub async fn finalize(
    pool: &PgPool,
    tenant_id: &str,
    sale_id: Uuid,
    actor_id: Option<Uuid>,
) -> Result<Sale, FinalizeError> {
    let mut tx = pool.begin().await?;
    let sale = tx_finalize(&mut tx, tenant_id, sale_id, actor_id).await?;
    tx.commit().await?;

    tracing::info!(
        sale_id = %sale_id,
        tenant_id = %tenant_id,
        sale_number = %sale.sale_number,
        status = %sale.status,
        "Sale finalized"
    );

    Ok(sale)
}

/// Recompute and persist totals for a sale without moving stock.
///
/// Safe to call at any point in the sale lifecycle; finalized sales
/// keep their `completed_at` and refunded sales keep their status.
pub async fn recompute(
    pool: &PgPool,
    tenant_id: &str,
    sale_id: Uuid,
) -> Result<Sale, FinalizeError> {
    let mut tx = pool.begin().await?;

    let sale = sale_repo::find_for_update(&mut tx, tenant_id, sale_id)
        .await?
        .ok_or(FinalizeError::NotFound(sale_id))?;

    let items = sale_repo::items_tx(&mut tx, tenant_id, sale_id).await?;
    let payments = sale_repo::payments_tx(&mut tx, tenant_id, sale_id).await?;

    let (updated, _totals) =
        tx_store_computed_totals(&mut tx, &sale, &items, &payments, None).await?;

    tx.commit().await?;

    tracing::debug!(sale_id = %sale_id, status = %updated.status, "Sale totals recomputed");

    Ok(updated)
}

/// Generate a sale number: date prefix plus a random suffix.
pub fn generate_sale_number() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("S-{}-{}", Utc::now().format("%Y%m%d"), &suffix[..6])
}

/// Create a sale with its items and payments and finalize it, all in
/// one transaction.
///
/// The caller is expected to have validated the request payload.
pub async fn submit_sale(
    pool: &PgPool,
    request: &SaleSubmitRequestV1,
) -> Result<Sale, FinalizeError> {
    let mut tx = pool.begin().await?;

    let sale_number = request
        .sale_number
        .clone()
        .unwrap_or_else(generate_sale_number);

    let sale = sale_repo::tx_insert_sale(
        &mut tx,
        &NewSale {
            tenant_id: request.tenant_id.clone(),
            sale_number,
            warehouse_id: request.warehouse_id,
            customer_id: request.customer_id,
            vehicle_id: request.vehicle_id,
            discount_type: request.discount_type,
            discount_value: request.discount_value.unwrap_or(Decimal::ZERO),
            is_credit_sale: request.is_credit_sale,
            due_date: request.due_date,
            note: request.note.clone().unwrap_or_default(),
        },
    )
    .await?;

    for item in &request.items {
        sale_repo::tx_insert_item(
            &mut tx,
            &request.tenant_id,
            sale.id,
            &NewSaleItem {
                item: item.item,
                quantity: item.quantity,
                unit_price: Amounts::new(item.unit_price_local, item.unit_price_usd),
                discount: Amounts::new(
                    item.discount_local.unwrap_or(Decimal::ZERO),
                    item.discount_usd.unwrap_or(Decimal::ZERO),
                ),
            },
        )
        .await?;
    }

    for payment in &request.payments {
        sale_repo::tx_insert_payment(
            &mut tx,
            &request.tenant_id,
            sale.id,
            &NewSalePayment {
                method: payment.method.clone(),
                amount: Amounts::new(payment.amount_local, payment.amount_usd),
                currency: payment.currency.clone(),
                reference: payment.reference.clone().unwrap_or_default(),
                is_change: payment.is_change,
            },
        )
        .await?;
    }

    let finalized = tx_finalize(&mut tx, &request.tenant_id, sale.id, request.actor_id).await?;

    tx.commit().await?;

    tracing::info!(
        sale_id = %finalized.id,
        tenant_id = %request.tenant_id,
        sale_number = %finalized.sale_number,
        items = request.items.len(),
        "Sale submitted and finalized"
    );

    Ok(finalized)
}
