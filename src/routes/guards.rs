use axum::http::HeaderMap;

use crate::error::{AppError, AppResult};
use crate::models::AccountId;
use crate::state::AppState;
use crate::validation::validate_account_id;

pub const ACCOUNT_HEADER: &str = "x-account-id";
pub const PROXY_TOKEN_HEADER: &str = "x-ledger-proxy-token";
pub const ADMIN_TOKEN_HEADER: &str = "x-ledger-admin-token";

pub fn ensure_proxy_access(state: &AppState, headers: &HeaderMap) -> AppResult<()> {
    let Some(expected_token) = state.config.proxy_shared_token.as_ref() else {
        return Ok(());
    };

    if header_str(headers, PROXY_TOKEN_HEADER) == Some(expected_token.as_str()) {
        Ok(())
    } else {
        Err(AppError::unauthorized(
            "Unauthorized. Requests must go through the gateway.",
        ))
    }
}

pub fn ensure_admin_access(state: &AppState, headers: &HeaderMap) -> AppResult<()> {
    ensure_proxy_access(state, headers)?;

    let Some(expected_token) = state.config.admin_token.as_ref() else {
        return Err(AppError::unauthorized("Admin access is disabled."));
    };

    if header_str(headers, ADMIN_TOKEN_HEADER) == Some(expected_token.as_str()) {
        Ok(())
    } else {
        Err(AppError::unauthorized("Invalid admin token."))
    }
}

/// Account resolved by the upstream auth layer.
pub fn resolve_account(headers: &HeaderMap) -> AppResult<AccountId> {
    let raw = header_str(headers, ACCOUNT_HEADER)
        .ok_or_else(|| AppError::unauthorized("Missing account identity."))?;
    validate_account_id(raw)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
