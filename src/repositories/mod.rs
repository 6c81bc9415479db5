pub mod ledger_repository;
pub mod memory_ledger_repository;
pub mod pg_ledger_repository;

pub use ledger_repository::{LedgerRepository, NewEntry, RepositoryError};
pub use memory_ledger_repository::InMemoryLedgerRepository;
pub use pg_ledger_repository::PgLedgerRepository;
