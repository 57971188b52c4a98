use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::Request;
use axum::Router;
use derive_new::new;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::KeyExtractor;
use tower_governor::{GovernorError, GovernorLayer};

use super::{App, ClientAddress};

const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Per-client request budget: `max` requests in a burst, refilled evenly over `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct RateLimit {
    pub max: u32,
    pub window: Duration,
}

impl RateLimit {
    /// Time to earn back one request, `None` when the budget or the window is zero.
    pub fn period(&self) -> Option<Duration> {
        self.window.checked_div(self.max).filter(|period| !period.is_zero())
    }
}

/// Keys the limiter by the same address the handlers see.
///
/// Requests without a resolvable address share a single bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientKey {
    trust_proxy: bool,
}

impl KeyExtractor for ClientKey {
    type Key = Option<IpAddr>;

    fn name(&self) -> &'static str {
        "client address"
    }

    fn extract<T>(&self, request: &Request<T>) -> Result<Self::Key, GovernorError> {
        let ClientAddress(address) =
            ClientAddress::resolve(request.headers(), request.extensions(), self.trust_proxy);
        Ok(address)
    }
}

/// Wrap `router` in a GCRA limiter keyed by client address, or `None` if `limit` is zero.
///
/// Also spawns a task that forgets clients whose budget is full again.
pub fn limit_requests(router: Router<App>, limit: RateLimit, trust_proxy: bool) -> Option<Router<App>> {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientKey { trust_proxy })
        .period(limit.period()?)
        .burst_size(limit.max)
        .finish()?;
    let config = Arc::new(config);

    let limiter = config.limiter().clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            limiter.retain_recent();
            tracing::trace!(clients = limiter.len(), "pruned rate limiter");
        }
    });

    Some(router.layer(GovernorLayer { config }))
}
