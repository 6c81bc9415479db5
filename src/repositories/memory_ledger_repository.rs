use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::ledger::{AccountLedger, LedgerError};
use crate::models::{AccountId, LedgerEntry};
use crate::repositories::ledger_repository::{LedgerRepository, NewEntry, RepositoryError};

/// In-process ledger store. Each account sits behind its own lock, so writers
/// on one account never wait on another.
#[derive(Default)]
pub struct InMemoryLedgerRepository {
    accounts: RwLock<HashMap<AccountId, Arc<RwLock<AccountLedger>>>>,
    withdrawal_accounts: RwLock<HashMap<Uuid, AccountId>>,
    sequence: AtomicI64,
}

impl InMemoryLedgerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn account(&self, account_id: &AccountId) -> Option<Arc<RwLock<AccountLedger>>> {
        self.accounts.read().await.get(account_id).cloned()
    }

    async fn account_or_create(&self, account_id: &AccountId) -> Arc<RwLock<AccountLedger>> {
        if let Some(account) = self.account(account_id).await {
            return account;
        }

        let mut accounts = self.accounts.write().await;
        accounts
            .entry(account_id.clone())
            .or_insert_with(|| Arc::new(RwLock::new(AccountLedger::new(account_id.clone()))))
            .clone()
    }

    fn next_sequence(&self) -> i64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl LedgerRepository for InMemoryLedgerRepository {
    async fn balance(&self, account_id: &AccountId) -> Result<Decimal, RepositoryError> {
        match self.account(account_id).await {
            Some(account) => Ok(account.read().await.balance()),
            None => Ok(Decimal::ZERO),
        }
    }

    async fn record_earning(&self, earning: NewEntry) -> Result<LedgerEntry, RepositoryError> {
        let account = self.account_or_create(&earning.account_id).await;
        let mut ledger = account.write().await;
        let entry = ledger.record_earning(
            earning.amount,
            earning.note,
            earning.created_at,
            self.next_sequence(),
        )?;
        Ok(entry)
    }

    async fn record_withdrawal(
        &self,
        withdrawal: NewEntry,
    ) -> Result<LedgerEntry, RepositoryError> {
        let Some(account) = self.account(&withdrawal.account_id).await else {
            return Err(LedgerError::InsufficientFunds {
                balance: Decimal::ZERO,
                requested: withdrawal.amount,
            }
            .into());
        };

        let mut ledger = account.write().await;
        let entry = ledger.request_withdrawal(
            withdrawal.amount,
            withdrawal.note,
            withdrawal.created_at,
            self.next_sequence(),
        )?;

        self.withdrawal_accounts
            .write()
            .await
            .insert(entry.id, entry.account_id.clone());
        Ok(entry)
    }

    async fn settle_withdrawal(
        &self,
        withdrawal_id: Uuid,
        settled_at: DateTime<Utc>,
    ) -> Result<LedgerEntry, RepositoryError> {
        let account_id = self
            .withdrawal_accounts
            .read()
            .await
            .get(&withdrawal_id)
            .cloned()
            .ok_or(LedgerError::WithdrawalNotFound(withdrawal_id))?;

        let account = self
            .account(&account_id)
            .await
            .ok_or(LedgerError::WithdrawalNotFound(withdrawal_id))?;

        let mut ledger = account.write().await;
        Ok(ledger.settle(withdrawal_id, settled_at)?)
    }

    async fn pending_withdrawal(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<LedgerEntry>, RepositoryError> {
        match self.account(account_id).await {
            Some(account) => Ok(account.read().await.pending_withdrawal().cloned()),
            None => Ok(None),
        }
    }

    async fn earnings(&self, account_id: &AccountId) -> Result<Vec<LedgerEntry>, RepositoryError> {
        match self.account(account_id).await {
            Some(account) => Ok(account.read().await.earnings().cloned().collect()),
            None => Ok(Vec::new()),
        }
    }

    async fn withdrawals(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<LedgerEntry>, RepositoryError> {
        match self.account(account_id).await {
            Some(account) => Ok(account.read().await.withdrawals().cloned().collect()),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::InMemoryLedgerRepository;
    use crate::ledger::LedgerError;
    use crate::models::AccountId;
    use crate::repositories::ledger_repository::{LedgerRepository, NewEntry, RepositoryError};

    fn entry(account: &str, amount: Decimal) -> NewEntry {
        NewEntry {
            account_id: AccountId::new(account),
            amount,
            note: "test".to_owned(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn unknown_account_reads_as_empty() {
        let repository = InMemoryLedgerRepository::new();
        let account = AccountId::new("nobody");

        assert_eq!(repository.balance(&account).await.unwrap(), Decimal::ZERO);
        assert!(repository.pending_withdrawal(&account).await.unwrap().is_none());
        assert!(repository.earnings(&account).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn withdrawal_from_unknown_account_is_insufficient() {
        let repository = InMemoryLedgerRepository::new();
        let err = repository
            .record_withdrawal(entry("nobody", dec!(5)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RepositoryError::Ledger(LedgerError::InsufficientFunds { .. })
        ));
        assert_eq!(
            repository.balance(&AccountId::new("nobody")).await.unwrap(),
            Decimal::ZERO
        );
    }

    #[tokio::test]
    async fn settle_resolves_account_from_withdrawal_id() {
        let repository = InMemoryLedgerRepository::new();
        repository.record_earning(entry("a", dec!(40))).await.unwrap();
        let withdrawal = repository
            .record_withdrawal(entry("a", dec!(15)))
            .await
            .unwrap();

        let settled = repository
            .settle_withdrawal(withdrawal.id, Utc::now())
            .await
            .unwrap();
        assert!(settled.is_settled());
        assert!(
            repository
                .pending_withdrawal(&AccountId::new("a"))
                .await
                .unwrap()
                .is_none()
        );

        let missing = Uuid::new_v4();
        let err = repository
            .settle_withdrawal(missing, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::Ledger(LedgerError::WithdrawalNotFound(id)) if id == missing
        ));
    }

    #[tokio::test]
    async fn sequences_increase_across_accounts() {
        let repository = InMemoryLedgerRepository::new();
        let first = repository.record_earning(entry("a", dec!(1))).await.unwrap();
        let second = repository.record_earning(entry("b", dec!(1))).await.unwrap();
        let third = repository.record_earning(entry("a", dec!(1))).await.unwrap();

        assert!(first.sequence < second.sequence);
        assert!(second.sequence < third.sequence);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_withdrawals_leave_exactly_one_pending() {
        let repository = Arc::new(InMemoryLedgerRepository::new());
        repository.record_earning(entry("a", dec!(100))).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let repository = Arc::clone(&repository);
            handles.push(tokio::spawn(async move {
                repository.record_withdrawal(entry("a", dec!(10))).await
            }));
        }

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(RepositoryError::Ledger(LedgerError::WithdrawalAlreadyPending)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        let account = AccountId::new("a");
        assert_eq!(accepted, 1);
        assert_eq!(repository.balance(&account).await.unwrap(), dec!(90));
        assert_eq!(repository.withdrawals(&account).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_earnings_on_separate_accounts_do_not_interfere() {
        let repository = Arc::new(InMemoryLedgerRepository::new());

        let mut handles = Vec::new();
        for index in 0..8 {
            for _ in 0..10 {
                let repository = Arc::clone(&repository);
                let account = format!("tester-{index}");
                handles.push(tokio::spawn(async move {
                    repository.record_earning(entry(&account, dec!(2.5))).await
                }));
            }
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        for index in 0..8 {
            let account = AccountId::new(format!("tester-{index}"));
            assert_eq!(repository.balance(&account).await.unwrap(), dec!(25));
        }
    }
}
