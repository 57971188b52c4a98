use derive_new::new;

use super::RateLimit;
use crate::{database::Database, ledger::LikeLedger, quote::QuoteFetcher};

/// Everything a request handler needs, built once at startup.
#[derive(Debug, Clone, new)]
pub struct App {
    pub ledger: LikeLedger,
    pub quotes: QuoteFetcher,
    pub rate_limit: RateLimit,
    /// Take the client address from `X-Forwarded-For` instead of the socket.
    pub trust_proxy: bool,
}

pub fn create_app(
    database: Database, quotes: QuoteFetcher, rate_limit: RateLimit, trust_proxy: bool,
) -> App {
    App {
        ledger: LikeLedger::new(database),
        quotes,
        rate_limit,
        trust_proxy,
    }
}
