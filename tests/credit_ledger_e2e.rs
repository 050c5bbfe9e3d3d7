//! E2E tests for the credit ledger.

mod common;

use common::{get_test_pool, test_tenant};
use rust_decimal_macros::dec;
use serial_test::serial;
use uuid::Uuid;

use stockledger_rs::money::Amounts;
use stockledger_rs::repos::credit_repo::{
    self, CreditError, EntryDirection, NewCreditEntry,
};
use stockledger_rs::services::credit_ledger;

fn entry(account_id: Uuid, direction: EntryDirection, local: rust_decimal::Decimal) -> NewCreditEntry {
    NewCreditEntry {
        account_id,
        direction,
        amount: Amounts::new(local, dec!(0)),
        description: "test entry".to_string(),
        due_date: None,
        related_sale_id: None,
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_debit_then_credit_nets_balance() {
    let pool = get_test_pool().await;
    let tenant = test_tenant();

    let account = credit_repo::create_account(&pool, &tenant, "customer", "Ali", None, None)
        .await
        .unwrap();
    assert_eq!(account.balance_local, dec!(0));

    let (_, after_debit) = credit_ledger::append_entry(
        &pool,
        &tenant,
        &entry(account.id, EntryDirection::Debit, dec!(150000)),
        None,
    )
    .await
    .unwrap();
    assert_eq!(after_debit.balance_local, dec!(150000.00));

    let (_, after_credit) = credit_ledger::append_entry(
        &pool,
        &tenant,
        &entry(account.id, EntryDirection::Credit, dec!(50000)),
        None,
    )
    .await
    .unwrap();
    assert_eq!(after_credit.balance_local, dec!(100000.00));

    // Two immutable entries on file.
    let entries = credit_repo::list_entries(&pool, &tenant, account.id)
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_entry_amounts_rounded_half_up() {
    let pool = get_test_pool().await;
    let tenant = test_tenant();

    let account = credit_repo::create_account(&pool, &tenant, "mechanic", "Vali", None, None)
        .await
        .unwrap();

    let (stored, after) = credit_ledger::append_entry(
        &pool,
        &tenant,
        &entry(account.id, EntryDirection::Debit, dec!(100.005)),
        None,
    )
    .await
    .unwrap();

    assert_eq!(stored.amount_local, dec!(100.01));
    assert_eq!(after.balance_local, dec!(100.01));
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_unknown_account_rejected_without_side_effects() {
    let pool = get_test_pool().await;
    let tenant = test_tenant();
    let bogus = Uuid::new_v4();

    let err = credit_ledger::append_entry(
        &pool,
        &tenant,
        &entry(bogus, EntryDirection::Debit, dec!(1000)),
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CreditError::AccountNotFound(id) if id == bogus));

    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM credit_entries WHERE tenant_id = $1")
            .bind(&tenant)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_settle_entry_flags_without_touching_balance() {
    let pool = get_test_pool().await;
    let tenant = test_tenant();

    let account = credit_repo::create_account(&pool, &tenant, "customer", "Olim", None, None)
        .await
        .unwrap();

    let (stored, _) = credit_ledger::append_entry(
        &pool,
        &tenant,
        &entry(account.id, EntryDirection::Debit, dec!(75000)),
        None,
    )
    .await
    .unwrap();
    assert!(!stored.is_settled);

    let settled = credit_ledger::settle_entry(&pool, &tenant, stored.id, None)
        .await
        .unwrap();
    assert!(settled.is_settled);

    // The flag is bookkeeping only; the balance still shows the debt.
    let after = credit_repo::find_account(&pool, &tenant, account.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.balance_local, dec!(75000.00));

    // Unknown entry ids are rejected.
    let bogus = Uuid::new_v4();
    let err = credit_ledger::settle_entry(&pool, &tenant, bogus, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CreditError::EntryNotFound(id) if id == bogus));
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_tenant_isolation_on_accounts() {
    let pool = get_test_pool().await;
    let tenant_a = test_tenant();
    let tenant_b = test_tenant();

    let account = credit_repo::create_account(&pool, &tenant_a, "supplier", "Depot", None, None)
        .await
        .unwrap();

    // Another tenant cannot post into the account.
    let err = credit_ledger::append_entry(
        &pool,
        &tenant_b,
        &entry(account.id, EntryDirection::Debit, dec!(500)),
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CreditError::AccountNotFound(_)));
}
