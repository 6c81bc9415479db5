use std::env;
use std::str::FromStr;

use rust_decimal::Decimal;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub proxy_shared_token: Option<String>,
    pub admin_token: Option<String>,
    pub withdrawal_min_amount: Decimal,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env::var("LEDGER_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned()),
            database_url: env_string("DATABASE_URL"),
            database_max_connections: env_u32("DATABASE_MAX_CONNECTIONS", 10),
            proxy_shared_token: env_string("PROXY_SHARED_TOKEN"),
            admin_token: env_string("ADMIN_TOKEN"),
            withdrawal_min_amount: env_decimal("WITHDRAWAL_MIN_AMOUNT", Decimal::ONE),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|raw| raw.trim().to_owned())
        .filter(|raw| !raw.is_empty())
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn env_decimal(key: &str, default: Decimal) -> Decimal {
    env::var(key)
        .ok()
        .and_then(|raw| Decimal::from_str(raw.trim()).ok())
        .filter(|value| *value > Decimal::ZERO)
        .unwrap_or(default)
}
