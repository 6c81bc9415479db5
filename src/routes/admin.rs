use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use tracing::warn;

use crate::error::AppResult;
use crate::models::{RecordEarningRequest, TransactionResponse, WithdrawalResponse};
use crate::routes::guards::ensure_admin_access;
use crate::routes::map_repository_error;
use crate::state::AppState;
use crate::validation::{normalize_note, parse_withdrawal_id, validate_account_id, validate_amount};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/earnings", post(record_earning))
        .route("/withdrawals/{withdrawal_id}/settle", post(settle_withdrawal))
}

async fn record_earning(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<RecordEarningRequest>,
) -> AppResult<Json<TransactionResponse>> {
    ensure_admin_access(&state, &headers)?;
    let account_id = validate_account_id(&payload.account_id)?;
    let amount = validate_amount(payload.amount)?;
    let note = normalize_note(payload.note.as_deref())?;

    let earning = state
        .wallet_service
        .record_earning(&account_id, amount, note)
        .await
        .map_err(map_repository_error)?;

    Ok(Json(TransactionResponse::from_entry(&earning)))
}

async fn settle_withdrawal(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(withdrawal_id): Path<String>,
) -> AppResult<Json<WithdrawalResponse>> {
    ensure_admin_access(&state, &headers)?;
    let withdrawal_id = parse_withdrawal_id(&withdrawal_id)?;

    let withdrawal = state
        .withdrawal_service
        .settle(withdrawal_id)
        .await
        .map_err(|err| {
            warn!(withdrawal_id = %withdrawal_id, error = %err, "settlement refused");
            map_repository_error(err)
        })?;

    Ok(Json(WithdrawalResponse::from_entry(&withdrawal)))
}
