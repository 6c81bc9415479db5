use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Earning,
    Withdrawal,
}

impl EntryKind {
    pub fn as_db_str(self) -> &'static str {
        match self {
            EntryKind::Earning => "earning",
            EntryKind::Withdrawal => "withdrawal",
        }
    }

    pub fn from_db_str(raw: &str) -> Option<Self> {
        match raw {
            "earning" => Some(EntryKind::Earning),
            "withdrawal" => Some(EntryKind::Withdrawal),
            _ => None,
        }
    }
}

/// A balance-affecting event. Entries are immutable once appended, except for
/// the one-time settlement of a withdrawal.
#[derive(Clone, Debug, PartialEq)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub account_id: AccountId,
    pub kind: EntryKind,
    /// Signed: positive for earnings, negative for withdrawals.
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub note: String,
    pub settled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Insertion order, used to break timestamp ties.
    pub sequence: i64,
}

impl LedgerEntry {
    pub fn earning(
        account_id: AccountId,
        amount: Decimal,
        balance_after: Decimal,
        note: String,
        created_at: DateTime<Utc>,
        sequence: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            kind: EntryKind::Earning,
            amount: amount.abs(),
            balance_after,
            note,
            settled_at: None,
            created_at,
            sequence,
        }
    }

    pub fn withdrawal(
        account_id: AccountId,
        amount: Decimal,
        balance_after: Decimal,
        note: String,
        created_at: DateTime<Utc>,
        sequence: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            kind: EntryKind::Withdrawal,
            amount: -amount.abs(),
            balance_after,
            note,
            settled_at: None,
            created_at,
            sequence,
        }
    }

    pub fn is_withdrawal(&self) -> bool {
        self.kind == EntryKind::Withdrawal
    }

    pub fn is_settled(&self) -> bool {
        self.settled_at.is_some()
    }

    pub fn is_pending_withdrawal(&self) -> bool {
        self.is_withdrawal() && !self.is_settled()
    }
}

pub fn default_withdrawal_note(amount: Decimal) -> String {
    format!("Withdrawal of ${:.2}", amount.abs())
}

pub fn default_earning_note(amount: Decimal) -> String {
    format!("Earning of ${:.2}", amount.abs())
}

#[derive(Debug, Deserialize)]
pub struct CreateWithdrawalRequest {
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct RecordEarningRequest {
    pub account_id: String,
    pub amount: Decimal,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WithdrawalResponse {
    pub id: Uuid,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub note: String,
    pub is_paid: bool,
    pub created_at: i64,
    pub paid_at: Option<i64>,
}

impl WithdrawalResponse {
    pub fn from_entry(entry: &LedgerEntry) -> Self {
        Self {
            id: entry.id,
            amount: entry.amount,
            balance_after: entry.balance_after,
            note: entry.note.clone(),
            is_paid: entry.is_settled(),
            created_at: unix_timestamp(entry.created_at),
            paid_at: entry.settled_at.map(unix_timestamp),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub kind: EntryKind,
    pub amount: Decimal,
    pub balance_after: Decimal,
    pub created_at: i64,
    pub note: String,
}

impl TransactionResponse {
    pub fn from_entry(entry: &LedgerEntry) -> Self {
        Self {
            id: entry.id,
            kind: entry.kind,
            amount: entry.amount,
            balance_after: entry.balance_after,
            created_at: unix_timestamp(entry.created_at),
            note: entry.note.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub account_id: AccountId,
    pub balance: Decimal,
}

pub fn unix_timestamp(time: DateTime<Utc>) -> i64 {
    time.timestamp()
}
