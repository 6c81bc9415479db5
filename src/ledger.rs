use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AccountId, LedgerEntry};

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum LedgerError {
    #[error("Insufficient funds: balance is {balance}, requested {requested}.")]
    InsufficientFunds { balance: Decimal, requested: Decimal },
    #[error("Withdrawal request is already pending.")]
    WithdrawalAlreadyPending,
    #[error("Withdrawal {0} is already settled.")]
    AlreadySettled(Uuid),
    #[error("Withdrawal {0} not found.")]
    WithdrawalNotFound(Uuid),
    #[error("Amount must be positive, got {0}.")]
    NonPositiveAmount(Decimal),
    #[error("Balance would exceed the maximum of {max}.")]
    BalanceLimitExceeded { max: Decimal },
}

/// Largest balance a `NUMERIC(20, 2)` column can hold.
pub const MAX_BALANCE: Decimal = Decimal::from_parts(1_661_992_959, 1_808_227_885, 5, false, 2);

/// Balance after applying `signed_amount`, refusing to go below zero.
pub fn next_balance(current: Decimal, signed_amount: Decimal) -> Result<Decimal, LedgerError> {
    let next = current
        .checked_add(signed_amount)
        .filter(|next| *next <= MAX_BALANCE)
        .ok_or(LedgerError::BalanceLimitExceeded { max: MAX_BALANCE })?;
    if next < Decimal::ZERO {
        return Err(LedgerError::InsufficientFunds {
            balance: current,
            requested: signed_amount.abs(),
        });
    }
    Ok(next)
}

/// Merges the earning and withdrawal streams newest first. Equal timestamps
/// fall back to insertion order, later entries first.
pub fn merge_history(earnings: Vec<LedgerEntry>, withdrawals: Vec<LedgerEntry>) -> Vec<LedgerEntry> {
    let mut merged: Vec<LedgerEntry> = earnings.into_iter().chain(withdrawals).collect();
    merged.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.sequence.cmp(&a.sequence))
    });
    merged
}

fn ensure_positive(amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount(amount));
    }
    Ok(amount)
}

/// Balance and entry log of one account. Callers serialize access per account.
#[derive(Clone, Debug)]
pub struct AccountLedger {
    account_id: AccountId,
    balance: Decimal,
    entries: Vec<LedgerEntry>,
}

impl AccountLedger {
    pub fn new(account_id: AccountId) -> Self {
        Self {
            account_id,
            balance: Decimal::ZERO,
            entries: Vec::new(),
        }
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    fn apply(&mut self, signed_amount: Decimal) -> Result<Decimal, LedgerError> {
        self.balance = next_balance(self.balance, signed_amount)?;
        Ok(self.balance)
    }

    pub fn pending_withdrawal(&self) -> Option<&LedgerEntry> {
        self.entries.iter().find(|entry| entry.is_pending_withdrawal())
    }

    pub fn earnings(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter().filter(|entry| !entry.is_withdrawal())
    }

    pub fn withdrawals(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter().filter(|entry| entry.is_withdrawal())
    }

    pub fn history(&self) -> Vec<LedgerEntry> {
        merge_history(
            self.earnings().cloned().collect(),
            self.withdrawals().cloned().collect(),
        )
    }

    pub fn record_earning(
        &mut self,
        amount: Decimal,
        note: String,
        created_at: DateTime<Utc>,
        sequence: i64,
    ) -> Result<LedgerEntry, LedgerError> {
        let amount = ensure_positive(amount)?;
        let balance_after = self.apply(amount)?;
        let entry = LedgerEntry::earning(
            self.account_id.clone(),
            amount,
            balance_after,
            note,
            created_at,
            sequence,
        );
        self.entries.push(entry.clone());
        Ok(entry)
    }

    /// Deducts `amount` and appends the withdrawal as one step. Nothing is
    /// mutated when the request is refused.
    pub fn request_withdrawal(
        &mut self,
        amount: Decimal,
        note: String,
        created_at: DateTime<Utc>,
        sequence: i64,
    ) -> Result<LedgerEntry, LedgerError> {
        if self.pending_withdrawal().is_some() {
            return Err(LedgerError::WithdrawalAlreadyPending);
        }
        let amount = ensure_positive(amount)?;
        let balance_after = self.apply(-amount)?;
        let entry = LedgerEntry::withdrawal(
            self.account_id.clone(),
            amount,
            balance_after,
            note,
            created_at,
            sequence,
        );
        self.entries.push(entry.clone());
        Ok(entry)
    }

    pub fn settle(
        &mut self,
        withdrawal_id: Uuid,
        settled_at: DateTime<Utc>,
    ) -> Result<LedgerEntry, LedgerError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.id == withdrawal_id && entry.is_withdrawal())
            .ok_or(LedgerError::WithdrawalNotFound(withdrawal_id))?;

        if entry.is_settled() {
            return Err(LedgerError::AlreadySettled(withdrawal_id));
        }
        entry.settled_at = Some(settled_at);
        Ok(entry.clone())
    }
}
