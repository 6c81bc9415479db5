pub mod history;
pub mod wallet;
pub mod withdrawals;
