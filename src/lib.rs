pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;
