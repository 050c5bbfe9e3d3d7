//! Repository for credit accounts and entries
//!
//! Entries are append-only facts; the account balance is a rollup
//! updated with a single additive UPDATE in the same transaction as
//! the entry insert.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

use crate::money::Amounts;

/// Direction of a credit ledger entry.
///
/// Debit increases what the counterparty owes; credit decreases it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryDirection {
    Debit,
    Credit,
}

impl EntryDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryDirection::Debit => "debit",
            EntryDirection::Credit => "credit",
        }
    }

    /// Signed multiplier applied to the balance rollup.
    pub fn sign(&self) -> Decimal {
        match self {
            EntryDirection::Debit => Decimal::ONE,
            EntryDirection::Credit => Decimal::NEGATIVE_ONE,
        }
    }
}

/// Credit account model
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct CreditAccount {
    pub id: Uuid,
    pub tenant_id: String,
    pub account_type: String,
    pub name: String,
    pub balance_local: Decimal,
    pub balance_usd: Decimal,
    pub credit_limit_local: Option<Decimal>,
    pub credit_limit_usd: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Credit entry model
#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct CreditEntry {
    pub id: Uuid,
    pub tenant_id: String,
    pub account_id: Uuid,
    pub direction: String,
    pub amount_local: Decimal,
    pub amount_usd: Decimal,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub is_settled: bool,
    pub related_sale_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Errors that can occur during credit repository operations
#[derive(Debug, Error)]
pub enum CreditError {
    #[error("Credit account not found: {0}")]
    AccountNotFound(Uuid),

    #[error("Credit entry not found: {0}")]
    EntryNotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Struct for inserting a credit entry
#[derive(Debug, Clone)]
pub struct NewCreditEntry {
    pub account_id: Uuid,
    pub direction: EntryDirection,
    pub amount: Amounts,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub related_sale_id: Option<Uuid>,
}

/// Create a credit account.
pub async fn create_account(
    pool: &PgPool,
    tenant_id: &str,
    account_type: &str,
    name: &str,
    credit_limit: Option<Amounts>,
    due_date: Option<NaiveDate>,
) -> Result<CreditAccount, CreditError> {
    let account = sqlx::query_as::<_, CreditAccount>(
        r#"
        INSERT INTO credit_accounts
            (tenant_id, account_type, name, credit_limit_local, credit_limit_usd, due_date)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, tenant_id, account_type, name, balance_local, balance_usd,
                  credit_limit_local, credit_limit_usd, due_date, created_at, updated_at
        "#,
    )
    .bind(tenant_id)
    .bind(account_type)
    .bind(name)
    .bind(credit_limit.map(|l| l.local))
    .bind(credit_limit.map(|l| l.usd))
    .bind(due_date)
    .fetch_one(pool)
    .await?;

    Ok(account)
}

/// Fetch a credit account by id.
pub async fn find_account(
    pool: &PgPool,
    tenant_id: &str,
    account_id: Uuid,
) -> Result<Option<CreditAccount>, CreditError> {
    let account = sqlx::query_as::<_, CreditAccount>(
        r#"
        SELECT id, tenant_id, account_type, name, balance_local, balance_usd,
               credit_limit_local, credit_limit_usd, due_date, created_at, updated_at
        FROM credit_accounts
        WHERE id = $1 AND tenant_id = $2
        "#,
    )
    .bind(account_id)
    .bind(tenant_id)
    .fetch_optional(pool)
    .await?;

    Ok(account)
}

/// Insert a credit entry within a transaction.
pub async fn tx_insert_entry(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    entry: &NewCreditEntry,
) -> Result<CreditEntry, sqlx::Error> {
    sqlx::query_as::<_, CreditEntry>(
        r#"
        INSERT INTO credit_entries
            (tenant_id, account_id, direction, amount_local, amount_usd,
             description, due_date, related_sale_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, tenant_id, account_id, direction, amount_local, amount_usd,
                  description, due_date, is_settled, related_sale_id, created_at
        "#,
    )
    .bind(tenant_id)
    .bind(entry.account_id)
    .bind(entry.direction.as_str())
    .bind(entry.amount.local)
    .bind(entry.amount.usd)
    .bind(&entry.description)
    .bind(entry.due_date)
    .bind(entry.related_sale_id)
    .fetch_one(&mut **tx)
    .await
}

/// Apply a signed delta to an account balance within a transaction.
///
/// The single additive UPDATE takes the row lock, so concurrent
/// entries against the same account serialize without lost updates.
/// Returns None if the account does not exist for the tenant.
pub async fn tx_apply_balance_delta(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    account_id: Uuid,
    delta: Amounts,
) -> Result<Option<CreditAccount>, sqlx::Error> {
    sqlx::query_as::<_, CreditAccount>(
        r#"
        UPDATE credit_accounts
        SET balance_local = balance_local + $3,
            balance_usd = balance_usd + $4,
            updated_at = NOW()
        WHERE id = $1 AND tenant_id = $2
        RETURNING id, tenant_id, account_type, name, balance_local, balance_usd,
                  credit_limit_local, credit_limit_usd, due_date, created_at, updated_at
        "#,
    )
    .bind(account_id)
    .bind(tenant_id)
    .bind(delta.local)
    .bind(delta.usd)
    .fetch_optional(&mut **tx)
    .await
}

/// Flag an entry as settled within a transaction. Does not touch the
/// balance rollup; settlement is recorded by its own credit entry.
/// Returns None if the entry does not exist for the tenant.
pub async fn tx_mark_settled(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    entry_id: Uuid,
) -> Result<Option<CreditEntry>, sqlx::Error> {
    sqlx::query_as::<_, CreditEntry>(
        r#"
        UPDATE credit_entries
        SET is_settled = TRUE
        WHERE id = $1 AND tenant_id = $2
        RETURNING id, tenant_id, account_id, direction, amount_local, amount_usd,
                  description, due_date, is_settled, related_sale_id, created_at
        "#,
    )
    .bind(entry_id)
    .bind(tenant_id)
    .fetch_optional(&mut **tx)
    .await
}

/// List entries for an account, most recent first.
pub async fn list_entries(
    pool: &PgPool,
    tenant_id: &str,
    account_id: Uuid,
) -> Result<Vec<CreditEntry>, CreditError> {
    let entries = sqlx::query_as::<_, CreditEntry>(
        r#"
        SELECT id, tenant_id, account_id, direction, amount_local, amount_usd,
               description, due_date, is_settled, related_sale_id, created_at
        FROM credit_entries
        WHERE account_id = $1 AND tenant_id = $2
        ORDER BY created_at DESC, id
        "#,
    )
    .bind(account_id)
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}
