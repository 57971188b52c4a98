use std::net::SocketAddr;
use std::path::Path;

use axum::handler::HandlerWithoutStateExt as _;
use axum::http::header::{self, HeaderName};
use axum::http::{HeaderValue, StatusCode};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use snafu::{OptionExt as _, ResultExt as _};
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::api::{self, App};
use crate::config::ServerConfig;
use crate::error::{ApplicationError, BindAddressSnafu, RateLimitSnafu, WebServerSnafu};

/// Headers set on every response unless the handler already chose a value.
const SECURITY_HEADERS: [(HeaderName, &str); 11] = [
    (
        header::CONTENT_SECURITY_POLICY,
        "default-src 'self';base-uri 'self';font-src 'self' https: data:;form-action 'self';frame-ancestors 'self';img-src 'self' data:;object-src 'none';script-src 'self';script-src-attr 'none';style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests",
    ),
    (HeaderName::from_static("cross-origin-opener-policy"), "same-origin"),
    (HeaderName::from_static("cross-origin-resource-policy"), "same-origin"),
    (header::REFERRER_POLICY, "no-referrer"),
    (header::STRICT_TRANSPORT_SECURITY, "max-age=15552000; includeSubDomains"),
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_DNS_PREFETCH_CONTROL, "off"),
    (HeaderName::from_static("x-download-options"), "noopen"),
    (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
    (HeaderName::from_static("x-permitted-cross-domain-policies"), "none"),
    (header::X_XSS_PROTECTION, "0"),
];

/// Where the landing page and public assets live on disk.
#[derive(Debug, Clone)]
pub struct Assets<'a> {
    pub views: &'a Path,
    pub public: &'a Path,
}

impl<'a> From<&'a ServerConfig> for Assets<'a> {
    fn from(config: &'a ServerConfig) -> Self {
        Self {
            views: &config.views_dir,
            public: &config.public_dir,
        }
    }
}

pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

/// Turns a panicking handler into the generic 500 body.
pub fn catch_panic() -> CatchPanicLayer<fn(Box<dyn std::any::Any + Send + 'static>) -> Response> {
    CatchPanicLayer::custom(api::panic_response as fn(_) -> _)
}

pub fn create_router(app: App, assets: Assets<'_>) -> Result<Router, ApplicationError> {
    let public = ServeDir::new(assets.public).not_found_service(not_found.into_service());
    let index = ServeFile::new(assets.views.join("index.html"));

    let router = Router::new()
        .route("/api/stock-prices", get(api::stock_prices))
        .route_service("/", index)
        .nest_service("/public", public)
        .fallback(not_found);

    let limit = app.rate_limit;
    let mut router = api::limit_requests(router, limit, app.trust_proxy).context(RateLimitSnafu {
        max: limit.max,
        window: limit.window,
    })?;

    for (name, value) in SECURITY_HEADERS {
        router = router.layer(SetResponseHeaderLayer::if_not_present(
            name,
            HeaderValue::from_static(value),
        ));
    }

    let router = router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(catch_panic())
                .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any)),
        )
        .with_state(app);

    Ok(router)
}

/// Bind to the configured address and serve until ctrl-c or SIGTERM.
pub async fn serve(router: Router, address: SocketAddr) -> Result<(), ApplicationError> {
    let listener = TcpListener::bind(address)
        .await
        .context(BindAddressSnafu { address })?;

    tracing::info!("listening on {}", address);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context(WebServerSnafu)?;

    tracing::info!("server shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
        _ = terminate => tracing::info!("received terminate signal, shutting down"),
    }
}
