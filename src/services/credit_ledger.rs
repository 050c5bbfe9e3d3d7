//! Credit ledger
//!
//! Appends immutable debit/credit entries and keeps the account
//! balance rollup in lockstep within the same transaction. Debit
//! raises the balance (the counterparty owes more), credit lowers it.

use sqlx::PgPool;
use uuid::Uuid;

use crate::money::Amounts;
use crate::repos::audit_repo;
use crate::repos::credit_repo::{
    self, CreditAccount, CreditEntry, CreditError, NewCreditEntry,
};

/// Append an entry and apply its signed delta to the account balance.
pub async fn append_entry(
    pool: &PgPool,
    tenant_id: &str,
    entry: &NewCreditEntry,
    actor_id: Option<Uuid>,
) -> Result<(CreditEntry, CreditAccount), CreditError> {
    let mut tx = pool.begin().await.map_err(CreditError::Database)?;

    let rounded = NewCreditEntry {
        amount: entry.amount.rounded(),
        ..entry.clone()
    };

    let sign = rounded.direction.sign();
    let delta = Amounts {
        local: rounded.amount.local * sign,
        usd: rounded.amount.usd * sign,
    };

    // The additive UPDATE doubles as the existence check; no row means
    // the account id is wrong for this tenant.
    let account = credit_repo::tx_apply_balance_delta(&mut tx, tenant_id, entry.account_id, delta)
        .await
        .map_err(CreditError::Database)?
        .ok_or(CreditError::AccountNotFound(entry.account_id))?;

    let stored = credit_repo::tx_insert_entry(&mut tx, tenant_id, &rounded)
        .await
        .map_err(CreditError::Database)?;

    audit_repo::tx_record(
        &mut tx,
        tenant_id,
        actor_id,
        "credit_entry_appended",
        "credit_account",
        entry.account_id,
        serde_json::json!({
            "entry_id": stored.id,
            "direction": stored.direction,
            "amount_local": stored.amount_local,
            "amount_usd": stored.amount_usd,
            "balance_local": account.balance_local,
            "balance_usd": account.balance_usd,
        }),
    )
    .await
    .map_err(CreditError::Database)?;

    tx.commit().await.map_err(CreditError::Database)?;

    tracing::info!(
        account_id = %entry.account_id,
        tenant_id = %tenant_id,
        direction = %stored.direction,
        "Credit entry appended"
    );

    Ok((stored, account))
}

/// Flag an entry as settled. Idempotent; the balance rollup is
/// untouched because repayment arrives as its own entry.
pub async fn settle_entry(
    pool: &PgPool,
    tenant_id: &str,
    entry_id: Uuid,
    actor_id: Option<Uuid>,
) -> Result<CreditEntry, CreditError> {
    let mut tx = pool.begin().await.map_err(CreditError::Database)?;

    let settled = credit_repo::tx_mark_settled(&mut tx, tenant_id, entry_id)
        .await
        .map_err(CreditError::Database)?
        .ok_or(CreditError::EntryNotFound(entry_id))?;

    audit_repo::tx_record(
        &mut tx,
        tenant_id,
        actor_id,
        "credit_entry_settled",
        "credit_entry",
        entry_id,
        serde_json::json!({
            "account_id": settled.account_id,
            "amount_local": settled.amount_local,
            "amount_usd": settled.amount_usd,
        }),
    )
    .await
    .map_err(CreditError::Database)?;

    tx.commit().await.map_err(CreditError::Database)?;

    tracing::info!(
        entry_id = %entry_id,
        tenant_id = %tenant_id,
        account_id = %settled.account_id,
        "Credit entry settled"
    );

    Ok(settled)
}
