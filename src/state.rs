use std::sync::Arc;

use tracing::warn;

use crate::config::AppConfig;
use crate::repositories::{
    InMemoryLedgerRepository, LedgerRepository, PgLedgerRepository, RepositoryError,
};
use crate::services::history::TransactionHistoryService;
use crate::services::wallet::WalletService;
use crate::services::withdrawals::WithdrawalService;

pub struct AppState {
    pub config: AppConfig,
    pub wallet_service: WalletService,
    pub withdrawal_service: WithdrawalService,
    pub history_service: TransactionHistoryService,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self, RepositoryError> {
        let repository: Arc<dyn LedgerRepository> = match config.database_url.as_deref() {
            Some(database_url) => Arc::new(
                PgLedgerRepository::connect(database_url, config.database_max_connections).await?,
            ),
            None => {
                warn!("DATABASE_URL not set, ledger state is kept in memory only");
                Arc::new(InMemoryLedgerRepository::new())
            }
        };

        Ok(Self::with_repository(config, repository))
    }

    pub fn with_repository(config: AppConfig, repository: Arc<dyn LedgerRepository>) -> Self {
        Self {
            wallet_service: WalletService::new(Arc::clone(&repository)),
            withdrawal_service: WithdrawalService::new(Arc::clone(&repository)),
            history_service: TransactionHistoryService::new(repository),
            config,
        }
    }
}
