use derive_new::new;
use serde::Deserialize;
use snafu::{Location, OptionExt as _, ResultExt as _, Snafu};
use tracing::instrument;
use url::Url;

use crate::model::Symbol;

pub type Result<T, E = QuoteError> = std::result::Result<T, E>;

pub const DEFAULT_QUOTE_API: &str = "https://stock-price-checker-proxy.freecodecamp.rocks/";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum QuoteError {
    #[snafu(display("failed to build the quote http client at {location}: {source}"))]
    Client {
        source: reqwest::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("quote api `{base}` cannot be used as a base url"))]
    Endpoint {
        base: Url,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to request a quote for `{symbol}` at {location}: {source}"))]
    Request {
        symbol: Symbol,
        source: reqwest::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("quote api rejected `{symbol}` at {location}: {source}"))]
    Status {
        symbol: Symbol,
        source: reqwest::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("malformed quote for `{symbol}` at {location}: {source}"))]
    Decode {
        symbol: Symbol,
        source: reqwest::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

/// The part of the provider's quote payload we care about.
#[derive(Debug, Clone, PartialEq, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub latest_price: f64,
}

/// Client for the upstream quote provider.
#[derive(Debug, Clone)]
pub struct QuoteFetcher {
    client: reqwest::Client,
    base: Url,
}

impl QuoteFetcher {
    pub fn new(base: Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context(ClientSnafu)?;

        Ok(Self { client, base })
    }

    fn endpoint(&self, symbol: &Symbol) -> Result<Url> {
        let mut url = self.base.clone();

        url.path_segments_mut()
            .ok()
            .context(EndpointSnafu {
                base: self.base.clone(),
            })?
            .pop_if_empty()
            .extend(["v1", "stock", symbol.as_ref(), "quote"]);

        Ok(url)
    }

    /// Fetch the latest quote for `symbol`. Fires exactly one request, without retries.
    #[instrument(skip(self))]
    pub async fn quote(&self, symbol: &Symbol) -> Result<Quote> {
        let url = self.endpoint(symbol)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context(RequestSnafu { symbol: symbol.clone() })?
            .error_for_status()
            .context(StatusSnafu { symbol: symbol.clone() })?;

        response
            .json::<Quote>()
            .await
            .context(DecodeSnafu { symbol: symbol.clone() })
    }

    /// Like [QuoteFetcher::quote] but every failure is folded into `None`.
    pub async fn lookup(&self, symbol: &Symbol) -> Option<Quote> {
        match self.quote(symbol).await {
            Ok(quote) => Some(quote),
            Err(err) => {
                tracing::warn!(%symbol, "quote unavailable: {}", err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher(base: &str) -> QuoteFetcher {
        QuoteFetcher::new(Url::parse(base).unwrap()).unwrap()
    }

    #[test]
    fn endpoint_appends_quote_path() {
        let fetcher = fetcher(DEFAULT_QUOTE_API);
        let url = fetcher.endpoint(&"goog".parse().unwrap()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://stock-price-checker-proxy.freecodecamp.rocks/v1/stock/GOOG/quote"
        );
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let fetcher = fetcher("http://127.0.0.1:8080/proxy");
        let url = fetcher.endpoint(&"MSFT".parse().unwrap()).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/proxy/v1/stock/MSFT/quote");
    }

    #[test]
    fn throw_error_on_opaque_base() {
        let fetcher = fetcher("mailto:quotes@example.com");
        let result = fetcher.endpoint(&"MSFT".parse().unwrap());
        assert!(matches!(result, Err(QuoteError::Endpoint { .. })));
    }

    #[test]
    fn decode_provider_payload() {
        let payload = r#"{"symbol":"GOOG","latestPrice":135.62,"change":1.2}"#;
        let quote: Quote = serde_json::from_str(payload).unwrap();
        assert_eq!(quote, Quote::new("GOOG".to_string(), 135.62));
    }
}
