//! Credit ledger contract (v1)

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repos::credit_repo::{CreditAccount, CreditEntry, EntryDirection};

/// Request to append a ledger entry against an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditEntryRequestV1 {
    pub tenant_id: String,
    pub account_id: Uuid,
    pub direction: EntryDirection,
    pub amount_local: Decimal,
    pub amount_usd: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub related_sale_id: Option<Uuid>,
    #[serde(default)]
    pub actor_id: Option<Uuid>,
}

/// Appended entry plus the account balance after the append.
#[derive(Debug, Clone, Serialize)]
pub struct CreditEntryResponseV1 {
    pub entry: CreditEntry,
    pub account: CreditAccount,
}

/// Request to create a credit account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditAccountCreateRequestV1 {
    pub tenant_id: String,
    pub account_type: String,
    pub name: String,
    #[serde(default)]
    pub credit_limit_local: Option<Decimal>,
    #[serde(default)]
    pub credit_limit_usd: Option<Decimal>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

/// Account with its entry history, most recent entries first.
#[derive(Debug, Clone, Serialize)]
pub struct CreditAccountDetailV1 {
    pub account: CreditAccount,
    pub entries: Vec<CreditEntry>,
}

/// Tenant scope for account reads.
#[derive(Debug, Clone, Deserialize)]
pub struct CreditQueryV1 {
    pub tenant_id: String,
}

/// Tenant scope for entry lifecycle actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditEntryActionRequestV1 {
    pub tenant_id: String,
    #[serde(default)]
    pub actor_id: Option<Uuid>,
}
