//! Repository for the append-only audit trail

use sqlx::{Postgres, Transaction};
use uuid::Uuid;

/// Record an audit event within a transaction.
///
/// The event commits or rolls back together with the mutation it
/// describes.
pub async fn tx_record(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    actor_id: Option<Uuid>,
    action: &str,
    target_kind: &str,
    target_id: Uuid,
    context: serde_json::Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO audit_log (tenant_id, actor_id, action, target_kind, target_id, context)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(tenant_id)
    .bind(actor_id)
    .bind(action)
    .bind(target_kind)
    .bind(target_id)
    .bind(context)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
