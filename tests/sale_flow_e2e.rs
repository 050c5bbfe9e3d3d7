//! E2E tests for the sale lifecycle: submit, finalize, return.
//!
//! These run against a live Postgres; set DATABASE_URL and drop the
//! ignore filter (`cargo test -- --ignored`) to execute them.

mod common;

use common::{get_test_pool, test_tenant};
use rust_decimal_macros::dec;
use serial_test::serial;
use sqlx::PgPool;
use uuid::Uuid;

use stockledger_rs::contracts::sale_return_v1::{SaleReturnItemInputV1, SaleReturnRequestV1};
use stockledger_rs::contracts::sale_submit_v1::{
    SaleItemInputV1, SalePaymentInputV1, SaleSubmitRequestV1,
};
use stockledger_rs::repos::movement_repo::{MovementType, NewStockMovement};
use stockledger_rs::repos::sale_repo::{self, DiscountType};
use stockledger_rs::repos::stock_repo::{self, ItemRef, StockError};
use stockledger_rs::services::movement_applier::{self, MovementError};
use stockledger_rs::services::return_processor::{self, ReturnError};
use stockledger_rs::services::sale_finalizer::{self, FinalizeError};

async fn seed_stock(pool: &PgPool, tenant: &str, warehouse: Uuid, item: ItemRef, quantity: i64) {
    movement_applier::apply(
        pool,
        &NewStockMovement {
            tenant_id: tenant.to_string(),
            movement_type: MovementType::Inbound,
            warehouse_from: None,
            warehouse_to: Some(warehouse),
            item,
            quantity,
            note: "Initial stock".to_string(),
        },
    )
    .await
    .expect("Failed to seed stock");
}

fn submit_request(
    tenant: &str,
    warehouse: Uuid,
    item: ItemRef,
    quantity: i64,
) -> SaleSubmitRequestV1 {
    SaleSubmitRequestV1 {
        tenant_id: tenant.to_string(),
        sale_number: None,
        warehouse_id: warehouse,
        customer_id: None,
        vehicle_id: None,
        discount_type: DiscountType::None,
        discount_value: None,
        is_credit_sale: false,
        due_date: None,
        note: None,
        actor_id: None,
        items: vec![SaleItemInputV1 {
            item,
            quantity,
            unit_price_local: dec!(120000),
            unit_price_usd: dec!(10.00),
            discount_local: None,
            discount_usd: None,
        }],
        payments: vec![SalePaymentInputV1 {
            method: "cash".to_string(),
            amount_local: dec!(240000),
            amount_usd: dec!(0),
            currency: "LOCAL".to_string(),
            reference: None,
            is_change: false,
        }],
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_submit_sale_deducts_stock_and_totals() {
    let pool = get_test_pool().await;
    let tenant = test_tenant();
    let warehouse = Uuid::new_v4();
    let item = ItemRef::Product(Uuid::new_v4());

    seed_stock(&pool, &tenant, warehouse, item, 5).await;

    let sale = sale_finalizer::submit_sale(&pool, &submit_request(&tenant, warehouse, item, 2))
        .await
        .expect("Submit should succeed");

    assert_eq!(sale.total_local, dec!(240000.00));
    assert_eq!(sale.total_usd, dec!(20.00));
    assert_eq!(sale.status, "paid");
    assert!(sale.completed_at.is_some());

    let stock = stock_repo::find(&pool, &tenant, warehouse, item)
        .await
        .unwrap()
        .expect("Stock row should exist");
    assert_eq!(stock.quantity, 3);
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_finalize_is_guarded_against_double_run() {
    let pool = get_test_pool().await;
    let tenant = test_tenant();
    let warehouse = Uuid::new_v4();
    let item = ItemRef::Part(Uuid::new_v4());

    seed_stock(&pool, &tenant, warehouse, item, 5).await;

    let sale = sale_finalizer::submit_sale(&pool, &submit_request(&tenant, warehouse, item, 2))
        .await
        .unwrap();

    let err = sale_finalizer::finalize(&pool, &tenant, sale.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, FinalizeError::AlreadyFinalized(id) if id == sale.id));

    // Stock deducted exactly once.
    let stock = stock_repo::find(&pool, &tenant, warehouse, item)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock.quantity, 3);
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_insufficient_stock_rolls_back_whole_sale() {
    let pool = get_test_pool().await;
    let tenant = test_tenant();
    let warehouse = Uuid::new_v4();
    let item = ItemRef::Product(Uuid::new_v4());

    seed_stock(&pool, &tenant, warehouse, item, 1).await;

    let err = sale_finalizer::submit_sale(&pool, &submit_request(&tenant, warehouse, item, 2))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FinalizeError::Movement(MovementError::Stock(StockError::Insufficient { .. }))
    ));

    // Nothing persisted: stock untouched, no sale rows for the tenant.
    let stock = stock_repo::find(&pool, &tenant, warehouse, item)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock.quantity, 1);

    let sale_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sales WHERE tenant_id = $1")
        .bind(&tenant)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(sale_count, 0);
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_return_restocks_and_marks_sale_refunded() {
    let pool = get_test_pool().await;
    let tenant = test_tenant();
    let warehouse = Uuid::new_v4();
    let item = ItemRef::Product(Uuid::new_v4());

    seed_stock(&pool, &tenant, warehouse, item, 5).await;

    let sale = sale_finalizer::submit_sale(&pool, &submit_request(&tenant, warehouse, item, 2))
        .await
        .unwrap();
    let items = sale_repo::items(&pool, &tenant, sale.id).await.unwrap();

    let processed = return_processor::create_and_process(
        &pool,
        &SaleReturnRequestV1 {
            tenant_id: tenant.clone(),
            sale_id: sale.id,
            return_number: None,
            reason: Some("Customer changed mind".to_string()),
            actor_id: None,
            items: vec![SaleReturnItemInputV1 {
                sale_item_id: items[0].id,
                quantity: 1,
                refund_amount_local: None,
                refund_amount_usd: None,
            }],
        },
    )
    .await
    .expect("Return should process");

    assert_eq!(processed.status, "completed");
    assert!(processed.processed_at.is_some());
    // Half of the 240,000 line.
    assert_eq!(processed.total_refunded_local, dec!(120000.00));

    let stock = stock_repo::find(&pool, &tenant, warehouse, item)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock.quantity, 4);

    let sale = sale_repo::find(&pool, &tenant, sale.id).await.unwrap().unwrap();
    assert_eq!(sale.status, "refunded");

    // Re-processing is a no-op: stock stays at 4.
    let again = return_processor::process(&pool, &tenant, processed.id, None)
        .await
        .unwrap();
    assert_eq!(again.id, processed.id);
    let stock = stock_repo::find(&pool, &tenant, warehouse, item)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock.quantity, 4);
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_return_honors_requested_refund_amount() {
    let pool = get_test_pool().await;
    let tenant = test_tenant();
    let warehouse = Uuid::new_v4();
    let item = ItemRef::Product(Uuid::new_v4());

    seed_stock(&pool, &tenant, warehouse, item, 5).await;

    let sale = sale_finalizer::submit_sale(&pool, &submit_request(&tenant, warehouse, item, 2))
        .await
        .unwrap();
    let items = sale_repo::items(&pool, &tenant, sale.id).await.unwrap();

    // Proration would give 120,000; the request asks for 50,000.
    let processed = return_processor::create_and_process(
        &pool,
        &SaleReturnRequestV1 {
            tenant_id: tenant.clone(),
            sale_id: sale.id,
            return_number: None,
            reason: None,
            actor_id: None,
            items: vec![SaleReturnItemInputV1 {
                sale_item_id: items[0].id,
                quantity: 1,
                refund_amount_local: Some(dec!(50000)),
                refund_amount_usd: Some(dec!(5.00)),
            }],
        },
    )
    .await
    .expect("Return should process");

    assert_eq!(processed.total_refunded_local, dec!(50000.00));
    assert_eq!(processed.total_refunded_usd, dec!(5.00));
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_recompute_keeps_refunded_status() {
    let pool = get_test_pool().await;
    let tenant = test_tenant();
    let warehouse = Uuid::new_v4();
    let item = ItemRef::Part(Uuid::new_v4());

    seed_stock(&pool, &tenant, warehouse, item, 5).await;

    let sale = sale_finalizer::submit_sale(&pool, &submit_request(&tenant, warehouse, item, 2))
        .await
        .unwrap();
    let items = sale_repo::items(&pool, &tenant, sale.id).await.unwrap();

    return_processor::create_and_process(
        &pool,
        &SaleReturnRequestV1 {
            tenant_id: tenant.clone(),
            sale_id: sale.id,
            return_number: None,
            reason: None,
            actor_id: None,
            items: vec![SaleReturnItemInputV1 {
                sale_item_id: items[0].id,
                quantity: 1,
                refund_amount_local: None,
                refund_amount_usd: None,
            }],
        },
    )
    .await
    .unwrap();

    // The payments still cover the total, but the forced status wins.
    let recomputed = sale_finalizer::recompute(&pool, &tenant, sale.id)
        .await
        .unwrap();
    assert_eq!(recomputed.status, "refunded");
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres (DATABASE_URL)"]
async fn test_return_cannot_exceed_sold_quantity() {
    let pool = get_test_pool().await;
    let tenant = test_tenant();
    let warehouse = Uuid::new_v4();
    let item = ItemRef::Part(Uuid::new_v4());

    seed_stock(&pool, &tenant, warehouse, item, 5).await;

    let sale = sale_finalizer::submit_sale(&pool, &submit_request(&tenant, warehouse, item, 2))
        .await
        .unwrap();
    let items = sale_repo::items(&pool, &tenant, sale.id).await.unwrap();

    let err = return_processor::create_and_process(
        &pool,
        &SaleReturnRequestV1 {
            tenant_id: tenant.clone(),
            sale_id: sale.id,
            return_number: None,
            reason: None,
            actor_id: None,
            items: vec![SaleReturnItemInputV1 {
                sale_item_id: items[0].id,
                quantity: 3,
                refund_amount_local: None,
                refund_amount_usd: None,
            }],
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        ReturnError::Excessive {
            requested: 3,
            available: 2,
            ..
        }
    ));

    // Rolled back: stock still reflects only the sale.
    let stock = stock_repo::find(&pool, &tenant, warehouse, item)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock.quantity, 3);
}
