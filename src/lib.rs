pub mod anonymize;
pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod ledger;
pub mod logger;
pub mod model;
pub mod quote;
pub mod server;
