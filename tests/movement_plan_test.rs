use stockledger_rs::repos::movement_repo::MovementType;
use stockledger_rs::services::movement_applier::{plan, MovementError, StockDelta};
use uuid::Uuid;

#[test]
fn test_inbound_adds_to_destination() {
    let to = Uuid::new_v4();
    let deltas = plan(MovementType::Inbound, None, Some(to), 10).unwrap();

    assert_eq!(
        deltas,
        vec![StockDelta {
            warehouse_id: to,
            delta: 10
        }]
    );
}

#[test]
fn test_outbound_subtracts_from_source() {
    let from = Uuid::new_v4();
    let deltas = plan(MovementType::Outbound, Some(from), None, 7).unwrap();

    assert_eq!(
        deltas,
        vec![StockDelta {
            warehouse_id: from,
            delta: -7
        }]
    );
}

#[test]
fn test_loss_subtracts_from_source() {
    let from = Uuid::new_v4();
    let deltas = plan(MovementType::Loss, Some(from), None, 3).unwrap();

    assert_eq!(deltas[0].delta, -3);
}

#[test]
fn test_transfer_is_two_deltas_source_first() {
    let from = Uuid::new_v4();
    let to = Uuid::new_v4();
    let deltas = plan(MovementType::Transfer, Some(from), Some(to), 5).unwrap();

    assert_eq!(deltas.len(), 2);
    assert_eq!(deltas[0], StockDelta { warehouse_id: from, delta: -5 });
    assert_eq!(deltas[1], StockDelta { warehouse_id: to, delta: 5 });
}

#[test]
fn test_transfer_conserves_total_quantity() {
    let deltas = plan(
        MovementType::Transfer,
        Some(Uuid::new_v4()),
        Some(Uuid::new_v4()),
        42,
    )
    .unwrap();

    let net: i64 = deltas.iter().map(|d| d.delta).sum();
    assert_eq!(net, 0);
}

#[test]
fn test_missing_endpoints_rejected() {
    assert!(matches!(
        plan(MovementType::Inbound, None, None, 1),
        Err(MovementError::Invalid(_))
    ));
    assert!(matches!(
        plan(MovementType::Outbound, None, Some(Uuid::new_v4()), 1),
        Err(MovementError::Invalid(_))
    ));
    assert!(matches!(
        plan(MovementType::Transfer, Some(Uuid::new_v4()), None, 1),
        Err(MovementError::Invalid(_))
    ));
}

#[test]
fn test_transfer_to_same_warehouse_rejected() {
    let w = Uuid::new_v4();
    assert!(matches!(
        plan(MovementType::Transfer, Some(w), Some(w), 1),
        Err(MovementError::Invalid(_))
    ));
}

#[test]
fn test_non_positive_quantity_rejected() {
    let w = Uuid::new_v4();
    assert!(matches!(
        plan(MovementType::Inbound, None, Some(w), 0),
        Err(MovementError::Invalid(_))
    ));
    assert!(matches!(
        plan(MovementType::Loss, Some(w), None, -4),
        Err(MovementError::Invalid(_))
    ));
}
