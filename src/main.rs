use dotenvy::dotenv;
use snafu::ResultExt as _;

use stock_checker::api::{create_app, RateLimit};
use stock_checker::config;
use stock_checker::database::Database;
use stock_checker::error::{ApplicationError, ConnectDatabaseSnafu, QuoteClientSnafu};
use stock_checker::logger;
use stock_checker::quote::QuoteFetcher;
use stock_checker::server::{self, Assets};

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    dotenv().ok();

    let config = config::load()?;

    let _guard = logger::init(&config.server)?;

    let database = Database::connect(&config.database)
        .await
        .context(ConnectDatabaseSnafu)?;
    let quotes = QuoteFetcher::new(config.server.quote_api.clone()).context(QuoteClientSnafu)?;
    let rate_limit = RateLimit::new(config.server.rate_limit_max, config.server.rate_limit_window());

    let app = create_app(database, quotes, rate_limit, config.server.trust_proxy);
    let router = server::create_router(app, Assets::from(&config.server))?;

    server::serve(router, config.server.address()).await
}
