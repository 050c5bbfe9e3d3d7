//! E2E tests for the stock ledger and movement applier.

mod common;

use common::{get_test_pool, test_tenant};
use serial_test::serial;
use sqlx::PgPool;
use uuid::Uuid;

use stockledger_rs::repos::movement_repo::{MovementType, NewStockMovement};
use stockledger_rs::repos::stock_repo::{self, ItemRef, StockError};
use stockledger_rs::services::movement_applier::{self, MovementError};

fn movement(
    tenant: &str,
    movement_type: MovementType,
    from: Option<Uuid>,
    to: Option<Uuid>,
    item: ItemRef,
    quantity: i64,
) -> NewStockMovement {
    NewStockMovement {
        tenant_id: tenant.to_string(),
        movement_type,
        warehouse_from: from,
        warehouse_to: to,
        item,
        quantity,
        note: String::new(),
    }
}

async fn quantity(pool: &PgPool, tenant: &str, warehouse: Uuid, item: ItemRef) -> i64 {
    stock_repo::find(pool, tenant, warehouse, item)
        .await
        .unwrap()
        .map(|r| r.quantity)
        .unwrap_or(0)
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_inbound_creates_row_lazily() {
    let pool = get_test_pool().await;
    let tenant = test_tenant();
    let warehouse = Uuid::new_v4();
    let item = ItemRef::Product(Uuid::new_v4());

    assert!(stock_repo::find(&pool, &tenant, warehouse, item)
        .await
        .unwrap()
        .is_none());

    let (_, rows) = movement_applier::apply(
        &pool,
        &movement(&tenant, MovementType::Inbound, None, Some(warehouse), item, 5),
    )
    .await
    .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].quantity, 5);
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_transfer_moves_between_warehouses() {
    let pool = get_test_pool().await;
    let tenant = test_tenant();
    let source = Uuid::new_v4();
    let dest = Uuid::new_v4();
    let item = ItemRef::Part(Uuid::new_v4());

    movement_applier::apply(
        &pool,
        &movement(&tenant, MovementType::Inbound, None, Some(source), item, 10),
    )
    .await
    .unwrap();

    movement_applier::apply(
        &pool,
        &movement(&tenant, MovementType::Transfer, Some(source), Some(dest), item, 4),
    )
    .await
    .unwrap();

    assert_eq!(quantity(&pool, &tenant, source, item).await, 6);
    assert_eq!(quantity(&pool, &tenant, dest, item).await, 4);
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_overdraw_rejected_and_rolled_back() {
    let pool = get_test_pool().await;
    let tenant = test_tenant();
    let warehouse = Uuid::new_v4();
    let item = ItemRef::Product(Uuid::new_v4());

    movement_applier::apply(
        &pool,
        &movement(&tenant, MovementType::Inbound, None, Some(warehouse), item, 3),
    )
    .await
    .unwrap();

    let err = movement_applier::apply(
        &pool,
        &movement(&tenant, MovementType::Outbound, Some(warehouse), None, item, 5),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        MovementError::Stock(StockError::Insufficient {
            on_hand: 3,
            delta: -5,
            ..
        })
    ));

    // The failed movement left no fact behind.
    assert_eq!(quantity(&pool, &tenant, warehouse, item).await, 3);
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM stock_movements WHERE tenant_id = $1")
            .bind(&tenant)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_transfer_with_insufficient_source_touches_nothing() {
    let pool = get_test_pool().await;
    let tenant = test_tenant();
    let source = Uuid::new_v4();
    let dest = Uuid::new_v4();
    let item = ItemRef::Part(Uuid::new_v4());

    movement_applier::apply(
        &pool,
        &movement(&tenant, MovementType::Inbound, None, Some(source), item, 2),
    )
    .await
    .unwrap();

    let err = movement_applier::apply(
        &pool,
        &movement(&tenant, MovementType::Transfer, Some(source), Some(dest), item, 5),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, MovementError::Stock(StockError::Insufficient { .. })));

    assert_eq!(quantity(&pool, &tenant, source, item).await, 2);
    assert_eq!(quantity(&pool, &tenant, dest, item).await, 0);
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_low_stock_listing() {
    let pool = get_test_pool().await;
    let tenant = test_tenant();
    let warehouse = Uuid::new_v4();
    let item = ItemRef::Product(Uuid::new_v4());

    movement_applier::apply(
        &pool,
        &movement(&tenant, MovementType::Inbound, None, Some(warehouse), item, 2),
    )
    .await
    .unwrap();

    sqlx::query(
        "UPDATE stock_rows SET low_stock_threshold = 5 WHERE tenant_id = $1",
    )
    .bind(&tenant)
    .execute(&pool)
    .await
    .unwrap();

    let low = stock_repo::list_low(&pool, &tenant).await.unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].quantity, 2);
}
