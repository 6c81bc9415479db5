pub mod admin;
pub mod guards;
pub mod health;
pub mod transactions;
pub mod withdrawals;

use std::sync::Arc;

use axum::Router;

use crate::error::AppError;
use crate::ledger::LedgerError;
use crate::repositories::RepositoryError;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::router())
        .nest(
            "/api/v1",
            Router::new()
                .merge(withdrawals::router())
                .merge(transactions::router())
                .nest("/admin", admin::router()),
        )
        .with_state(state)
}

pub(crate) fn map_repository_error(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::Ledger(err) => map_ledger_error(err),
        other => AppError::storage(other.to_string()),
    }
}

fn map_ledger_error(err: LedgerError) -> AppError {
    match err {
        LedgerError::InsufficientFunds { .. }
        | LedgerError::WithdrawalAlreadyPending
        | LedgerError::BalanceLimitExceeded { .. } => {
            AppError::unprocessable(err.to_string())
        }
        LedgerError::AlreadySettled(_) => AppError::conflict(err.to_string()),
        LedgerError::WithdrawalNotFound(_) => AppError::not_found(err.to_string()),
        LedgerError::NonPositiveAmount(_) => AppError::validation(err.to_string()),
    }
}
