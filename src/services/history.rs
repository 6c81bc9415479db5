use std::sync::Arc;

use crate::ledger::merge_history;
use crate::models::{AccountId, LedgerEntry};
use crate::repositories::{LedgerRepository, RepositoryError};

#[derive(Clone)]
pub struct TransactionHistoryService {
    repository: Arc<dyn LedgerRepository>,
}

impl TransactionHistoryService {
    pub fn new(repository: Arc<dyn LedgerRepository>) -> Self {
        Self { repository }
    }

    /// Earnings and withdrawals of one account, newest first.
    pub async fn history(&self, account_id: &AccountId) -> Result<Vec<LedgerEntry>, RepositoryError> {
        let earnings = self.repository.earnings(account_id).await?;
        let withdrawals = self.repository.withdrawals(account_id).await?;
        Ok(merge_history(earnings, withdrawals))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::TransactionHistoryService;
    use crate::models::{AccountId, EntryKind};
    use crate::repositories::InMemoryLedgerRepository;
    use crate::services::wallet::WalletService;
    use crate::services::withdrawals::WithdrawalService;

    #[tokio::test]
    async fn merges_earnings_and_withdrawals_newest_first() {
        let repository = Arc::new(InMemoryLedgerRepository::new());
        let wallet = WalletService::new(repository.clone());
        let withdrawals = WithdrawalService::new(repository.clone());
        let history = TransactionHistoryService::new(repository);
        let account = AccountId::new("tester-3");

        wallet.record_earning(&account, dec!(50), None).await.unwrap();
        withdrawals.request(&account, dec!(30)).await.unwrap();
        wallet
            .record_earning(&account, dec!(20), Some("Bonus".to_owned()))
            .await
            .unwrap();

        let entries = history.history(&account).await.unwrap();
        let view: Vec<(EntryKind, Decimal, Decimal)> = entries
            .iter()
            .map(|entry| (entry.kind, entry.amount, entry.balance_after))
            .collect();

        assert_eq!(
            view,
            vec![
                (EntryKind::Earning, dec!(20), dec!(40)),
                (EntryKind::Withdrawal, dec!(-30), dec!(20)),
                (EntryKind::Earning, dec!(50), dec!(50)),
            ]
        );
        assert_eq!(entries[0].note, "Bonus");
        assert_eq!(entries[2].note, "Earning of $50.00");
    }

    #[tokio::test]
    async fn empty_for_unknown_account() {
        let history = TransactionHistoryService::new(Arc::new(InMemoryLedgerRepository::new()));
        assert!(
            history
                .history(&AccountId::new("ghost"))
                .await
                .unwrap()
                .is_empty()
        );
    }
}
