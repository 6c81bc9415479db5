use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::warn;

use crate::error::AppResult;
use crate::models::{CreateWithdrawalRequest, WithdrawalResponse};
use crate::routes::guards::{ensure_proxy_access, resolve_account};
use crate::routes::map_repository_error;
use crate::state::AppState;
use crate::validation::validate_withdrawal_amount;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/withdrawals", post(create_withdrawal))
        .route("/withdrawals/pending", get(pending_withdrawal))
}

async fn create_withdrawal(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateWithdrawalRequest>,
) -> AppResult<Json<WithdrawalResponse>> {
    ensure_proxy_access(&state, &headers)?;
    let account_id = resolve_account(&headers)?;
    let amount = validate_withdrawal_amount(payload.amount, state.config.withdrawal_min_amount)?;

    let withdrawal = state
        .withdrawal_service
        .request(&account_id, amount)
        .await
        .map_err(|err| {
            warn!(account_id = %account_id, amount = %amount, error = %err, "withdrawal refused");
            map_repository_error(err)
        })?;

    Ok(Json(WithdrawalResponse::from_entry(&withdrawal)))
}

async fn pending_withdrawal(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<Option<WithdrawalResponse>>> {
    ensure_proxy_access(&state, &headers)?;
    let account_id = resolve_account(&headers)?;

    let pending = state
        .withdrawal_service
        .pending(&account_id)
        .await
        .map_err(map_repository_error)?;

    Ok(Json(pending.as_ref().map(WithdrawalResponse::from_entry)))
}
