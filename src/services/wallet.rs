use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use crate::models::{AccountId, LedgerEntry, default_earning_note};
use crate::repositories::{LedgerRepository, NewEntry, RepositoryError};

/// Balance reads and earning credits.
#[derive(Clone)]
pub struct WalletService {
    repository: Arc<dyn LedgerRepository>,
}

impl WalletService {
    pub fn new(repository: Arc<dyn LedgerRepository>) -> Self {
        Self { repository }
    }

    pub async fn balance(&self, account_id: &AccountId) -> Result<Decimal, RepositoryError> {
        self.repository.balance(account_id).await
    }

    pub async fn record_earning(
        &self,
        account_id: &AccountId,
        amount: Decimal,
        note: Option<String>,
    ) -> Result<LedgerEntry, RepositoryError> {
        let note = note.unwrap_or_else(|| default_earning_note(amount));
        let earning = self
            .repository
            .record_earning(NewEntry {
                account_id: account_id.clone(),
                amount,
                note,
                created_at: Utc::now(),
            })
            .await?;

        info!(
            account_id = %account_id,
            entry_id = %earning.id,
            amount = %earning.amount,
            balance_after = %earning.balance_after,
            "earning recorded"
        );
        Ok(earning)
    }
}
