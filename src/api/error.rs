use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use snafu::{Location, Snafu};

use crate::database::DatabaseError;

const INTERNAL_ERROR: &str = "Internal server error";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApiError {
    #[snafu(display("Stock symbol is required"))]
    MissingSymbol,

    #[snafu(display("Malformed stock symbol"))]
    MalformedSymbol { text: String },

    #[snafu(display("At most two stock symbols can be compared"))]
    TooManySymbols { count: usize },

    #[snafu(display("could not read or update likes at {location}: {source}"))]
    Ledger {
        source: DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("a like was requested but the client address is unknown at {location}"))]
    UnknownClient {
        #[snafu(implicit)]
        location: Location,
    },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingSymbol
            | ApiError::MalformedSymbol { .. }
            | ApiError::TooManySymbols { .. } => StatusCode::BAD_REQUEST,
            ApiError::Ledger { .. } | ApiError::UnknownClient { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Body of every JSON error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn internal() -> Self {
        Self {
            error: INTERNAL_ERROR.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = if status.is_server_error() {
            tracing::error!("request failed: {}", self);
            ErrorBody::internal()
        } else {
            tracing::debug!("rejected request: {:?}", self);
            ErrorBody {
                error: self.to_string(),
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Response for a handler that panicked, the panic payload stays in the logs.
pub fn panic_response(panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    tracing::error!("handler panicked: {}", detail);

    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::internal())).into_response()
}
