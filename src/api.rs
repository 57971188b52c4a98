mod client;
mod error;
mod rate_limit;
mod state;
mod stock_prices;

pub use client::ClientAddress;
pub use error::*;
pub use rate_limit::{limit_requests, ClientKey, RateLimit};
pub use state::{create_app, App};
pub use stock_prices::{stock_prices, StockData, StockEntry, StockPrices, StockQuery, MAX_SYMBOLS};

pub type Result<T, E = ApiError> = std::result::Result<T, E>;
