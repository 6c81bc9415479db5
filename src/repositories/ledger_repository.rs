use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::ledger::LedgerError;
use crate::models::{AccountId, LedgerEntry};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("{0}")]
    Decode(String),
}

/// An entry about to be appended. `amount` is the unsigned magnitude; the
/// operation decides the sign.
#[derive(Clone, Debug)]
pub struct NewEntry {
    pub account_id: AccountId,
    pub amount: Decimal,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

/// Storage for balances and ledger entries.
///
/// Every mutating method is one atomic unit serialized per account: either the
/// balance change and the appended entry are both committed, or neither is.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn balance(&self, account_id: &AccountId) -> Result<Decimal, RepositoryError>;

    async fn record_earning(&self, earning: NewEntry) -> Result<LedgerEntry, RepositoryError>;

    async fn record_withdrawal(&self, withdrawal: NewEntry)
    -> Result<LedgerEntry, RepositoryError>;

    async fn settle_withdrawal(
        &self,
        withdrawal_id: Uuid,
        settled_at: DateTime<Utc>,
    ) -> Result<LedgerEntry, RepositoryError>;

    async fn pending_withdrawal(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<LedgerEntry>, RepositoryError>;

    async fn earnings(&self, account_id: &AccountId) -> Result<Vec<LedgerEntry>, RepositoryError>;

    async fn withdrawals(&self, account_id: &AccountId)
    -> Result<Vec<LedgerEntry>, RepositoryError>;
}
