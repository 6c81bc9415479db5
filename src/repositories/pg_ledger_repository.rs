use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::ledger::{LedgerError, next_balance};
use crate::models::{AccountId, EntryKind, LedgerEntry};
use crate::repositories::ledger_repository::{LedgerRepository, NewEntry, RepositoryError};

const ENTRY_COLUMNS: &str = r#"
    id,
    sequence,
    account_id,
    kind,
    amount,
    balance_after,
    note,
    settled_at,
    created_at
"#;

/// PostgreSQL ledger store. Mutations lock the account row with
/// `SELECT ... FOR UPDATE` inside one transaction; an early return drops the
/// transaction and rolls it back.
#[derive(Clone)]
pub struct PgLedgerRepository {
    pool: PgPool,
}

impl PgLedgerRepository {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    async fn append_entry(
        conn: &mut PgConnection,
        entry: NewEntry,
        kind: EntryKind,
        balance_after: Decimal,
    ) -> Result<LedgerEntry, RepositoryError> {
        let signed_amount = match kind {
            EntryKind::Earning => entry.amount,
            EntryKind::Withdrawal => -entry.amount,
        };

        sqlx::query(
            "UPDATE ledger_accounts SET balance = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(entry.account_id.as_str())
        .bind(balance_after)
        .execute(&mut *conn)
        .await?;

        let row = sqlx::query_as::<_, EntryRow>(&format!(
            r#"
            INSERT INTO ledger_entries (
                id,
                account_id,
                kind,
                amount,
                balance_after,
                note,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(entry.account_id.as_str())
        .bind(kind.as_db_str())
        .bind(signed_amount)
        .bind(balance_after)
        .bind(&entry.note)
        .bind(entry.created_at)
        .fetch_one(&mut *conn)
        .await?;

        row.try_into()
    }

    async fn lock_balance(
        conn: &mut PgConnection,
        account_id: &AccountId,
    ) -> Result<Option<Decimal>, RepositoryError> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            "SELECT balance FROM ledger_accounts WHERE id = $1 FOR UPDATE",
        )
        .bind(account_id.as_str())
        .fetch_optional(&mut *conn)
        .await?;
        Ok(balance)
    }

    async fn entries_of_kind(
        &self,
        account_id: &AccountId,
        kind: EntryKind,
    ) -> Result<Vec<LedgerEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, EntryRow>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM ledger_entries
            WHERE account_id = $1 AND kind = $2
            ORDER BY created_at DESC, sequence DESC
            "#
        ))
        .bind(account_id.as_str())
        .bind(kind.as_db_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[async_trait]
impl LedgerRepository for PgLedgerRepository {
    async fn balance(&self, account_id: &AccountId) -> Result<Decimal, RepositoryError> {
        let balance =
            sqlx::query_scalar::<_, Decimal>("SELECT balance FROM ledger_accounts WHERE id = $1")
                .bind(account_id.as_str())
                .fetch_optional(&self.pool)
                .await?;
        Ok(balance.unwrap_or(Decimal::ZERO))
    }

    async fn record_earning(&self, earning: NewEntry) -> Result<LedgerEntry, RepositoryError> {
        if earning.amount <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount(earning.amount).into());
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO ledger_accounts (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(earning.account_id.as_str())
            .execute(&mut *tx)
            .await?;

        let balance = Self::lock_balance(&mut *tx, &earning.account_id)
            .await?
            .unwrap_or(Decimal::ZERO);
        let balance_after = next_balance(balance, earning.amount)?;
        let entry = Self::append_entry(&mut *tx, earning, EntryKind::Earning, balance_after).await?;

        tx.commit().await?;
        Ok(entry)
    }

    async fn record_withdrawal(
        &self,
        withdrawal: NewEntry,
    ) -> Result<LedgerEntry, RepositoryError> {
        if withdrawal.amount <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount(withdrawal.amount).into());
        }

        let mut tx = self.pool.begin().await?;

        let balance = Self::lock_balance(&mut *tx, &withdrawal.account_id).await?;

        let pending = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM ledger_entries
            WHERE account_id = $1 AND kind = 'withdrawal' AND settled_at IS NULL
            LIMIT 1
            "#,
        )
        .bind(withdrawal.account_id.as_str())
        .fetch_optional(&mut *tx)
        .await?;
        if pending.is_some() {
            return Err(LedgerError::WithdrawalAlreadyPending.into());
        }

        let Some(balance) = balance else {
            return Err(LedgerError::InsufficientFunds {
                balance: Decimal::ZERO,
                requested: withdrawal.amount,
            }
            .into());
        };

        let balance_after = next_balance(balance, -withdrawal.amount)?;
        let entry =
            Self::append_entry(&mut *tx, withdrawal, EntryKind::Withdrawal, balance_after).await?;

        tx.commit().await?;
        Ok(entry)
    }

    async fn settle_withdrawal(
        &self,
        withdrawal_id: Uuid,
        settled_at: DateTime<Utc>,
    ) -> Result<LedgerEntry, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let account_id = sqlx::query_scalar::<_, String>(
            "SELECT account_id FROM ledger_entries WHERE id = $1 AND kind = 'withdrawal'",
        )
        .bind(withdrawal_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(LedgerError::WithdrawalNotFound(withdrawal_id))?;

        Self::lock_balance(&mut *tx, &AccountId::new(account_id)).await?;

        let row = sqlx::query_as::<_, EntryRow>(&format!(
            r#"
            UPDATE ledger_entries
            SET settled_at = $2
            WHERE id = $1 AND settled_at IS NULL
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(withdrawal_id)
        .bind(settled_at)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(LedgerError::AlreadySettled(withdrawal_id))?;

        tx.commit().await?;
        row.try_into()
    }

    async fn pending_withdrawal(
        &self,
        account_id: &AccountId,
    ) -> Result<Option<LedgerEntry>, RepositoryError> {
        let row = sqlx::query_as::<_, EntryRow>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM ledger_entries
            WHERE account_id = $1 AND kind = 'withdrawal' AND settled_at IS NULL
            LIMIT 1
            "#
        ))
        .bind(account_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn earnings(&self, account_id: &AccountId) -> Result<Vec<LedgerEntry>, RepositoryError> {
        self.entries_of_kind(account_id, EntryKind::Earning).await
    }

    async fn withdrawals(
        &self,
        account_id: &AccountId,
    ) -> Result<Vec<LedgerEntry>, RepositoryError> {
        self.entries_of_kind(account_id, EntryKind::Withdrawal).await
    }
}

#[derive(Debug, FromRow)]
struct EntryRow {
    id: Uuid,
    sequence: i64,
    account_id: String,
    kind: String,
    amount: Decimal,
    balance_after: Decimal,
    note: String,
    settled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<EntryRow> for LedgerEntry {
    type Error = RepositoryError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        let kind = EntryKind::from_db_str(&row.kind).ok_or_else(|| {
            RepositoryError::Decode(format!("invalid ledger entry kind in database: {}", row.kind))
        })?;

        Ok(LedgerEntry {
            id: row.id,
            account_id: AccountId::new(row.account_id),
            kind,
            amount: row.amount,
            balance_after: row.balance_after,
            note: row.note,
            settled_at: row.settled_at,
            created_at: row.created_at,
            sequence: row.sequence,
        })
    }
}
