use std::net::SocketAddr;
use std::time::Duration;

use snafu::{Location, Snafu};

use crate::database::DatabaseError;
use crate::quote::QuoteError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ApplicationError {
    /// could not read the configuration from the environment
    ConfigLoad {
        source: envy::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not initialize the logger
    InitializeLogger {
        source: tracing::subscriber::SetGlobalDefaultError,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not connect to the like database
    ConnectDatabase {
        source: DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not set up the quote provider client
    QuoteClient {
        source: QuoteError,
        #[snafu(implicit)]
        location: Location,
    },

    /// Rate limit of {max} requests per {window:?} is unusable, both values must be non-zero
    RateLimit {
        max: u32,
        window: Duration,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not bind to the given address, check if it's already in use
    BindAddress {
        address: SocketAddr,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not serve the application
    WebServer {
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },
}
