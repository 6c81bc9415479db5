use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};

use crate::error::AppResult;
use crate::models::{BalanceResponse, TransactionResponse};
use crate::routes::guards::{ensure_proxy_access, resolve_account};
use crate::routes::map_repository_error;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/transactions", get(list_transactions))
        .route("/balance", get(get_balance))
}

async fn list_transactions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<Vec<TransactionResponse>>> {
    ensure_proxy_access(&state, &headers)?;
    let account_id = resolve_account(&headers)?;

    let entries = state
        .history_service
        .history(&account_id)
        .await
        .map_err(map_repository_error)?;

    Ok(Json(
        entries.iter().map(TransactionResponse::from_entry).collect(),
    ))
}

async fn get_balance(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<BalanceResponse>> {
    ensure_proxy_access(&state, &headers)?;
    let account_id = resolve_account(&headers)?;

    let balance = state
        .wallet_service
        .balance(&account_id)
        .await
        .map_err(map_repository_error)?;

    Ok(Json(BalanceResponse {
        account_id,
        balance,
    }))
}
