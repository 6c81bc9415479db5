use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::AppError;
use crate::ledger::MAX_BALANCE;
use crate::models::AccountId;

const ACCOUNT_ID_MAX_LEN: usize = 128;
const AMOUNT_MAX_SCALE: u32 = 2;
const NOTE_MAX_LEN: usize = 255;

pub fn validate_account_id(raw: &str) -> Result<AccountId, AppError> {
    let account_id = raw.trim();

    if account_id.is_empty() || account_id.len() > ACCOUNT_ID_MAX_LEN {
        return Err(AppError::validation("Invalid account id."));
    }

    if !account_id
        .bytes()
        .all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.'))
    {
        return Err(AppError::validation("Invalid account id."));
    }

    Ok(AccountId::new(account_id))
}

pub fn validate_amount(amount: Decimal) -> Result<Decimal, AppError> {
    if amount <= Decimal::ZERO {
        return Err(AppError::validation("Amount must be greater than zero."));
    }

    if amount > MAX_BALANCE {
        return Err(AppError::validation(format!(
            "Amount must not exceed {MAX_BALANCE}."
        )));
    }

    let normalized = amount.normalize();
    if normalized.scale() > AMOUNT_MAX_SCALE {
        return Err(AppError::validation(
            "Amount must have at most two decimal places.",
        ));
    }

    Ok(normalized)
}

pub fn validate_withdrawal_amount(amount: Decimal, minimum: Decimal) -> Result<Decimal, AppError> {
    let amount = validate_amount(amount)?;
    if amount < minimum {
        return Err(AppError::validation(format!(
            "Minimum withdrawal amount is {minimum}."
        )));
    }
    Ok(amount)
}

pub fn normalize_note(raw: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(note) = raw.map(str::trim).filter(|note| !note.is_empty()) else {
        return Ok(None);
    };

    if note.chars().count() > NOTE_MAX_LEN {
        return Err(AppError::validation("Note is too long."));
    }

    Ok(Some(note.to_owned()))
}

pub fn parse_withdrawal_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::validation("Invalid withdrawal id."))
}
