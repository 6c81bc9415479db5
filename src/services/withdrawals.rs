use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::models::{AccountId, LedgerEntry, default_withdrawal_note};
use crate::repositories::{LedgerRepository, NewEntry, RepositoryError};

/// Per-account withdrawal cycle: no pending, pending, settled, and back.
#[derive(Clone)]
pub struct WithdrawalService {
    repository: Arc<dyn LedgerRepository>,
}

impl WithdrawalService {
    pub fn new(repository: Arc<dyn LedgerRepository>) -> Self {
        Self { repository }
    }

    pub async fn request(
        &self,
        account_id: &AccountId,
        amount: Decimal,
    ) -> Result<LedgerEntry, RepositoryError> {
        let withdrawal = self
            .repository
            .record_withdrawal(NewEntry {
                account_id: account_id.clone(),
                amount,
                note: default_withdrawal_note(amount),
                created_at: Utc::now(),
            })
            .await?;

        info!(
            account_id = %account_id,
            withdrawal_id = %withdrawal.id,
            amount = %amount,
            balance_after = %withdrawal.balance_after,
            "withdrawal requested"
        );
        Ok(withdrawal)
    }

    pub async fn settle(&self, withdrawal_id: Uuid) -> Result<LedgerEntry, RepositoryError> {
        let withdrawal = self
            .repository
            .settle_withdrawal(withdrawal_id, Utc::now())
            .await?;

        info!(
            account_id = %withdrawal.account_id,
            withdrawal_id = %withdrawal.id,
            "withdrawal settled"
        );
        Ok(withdrawal)
    }

    pub async fn pending(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<LedgerEntry>, RepositoryError> {
        self.repository.pending_withdrawal(account_id).await
    }
}
