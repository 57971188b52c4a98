use axum::extract::State;
use axum::Json;
use axum_extra::extract::Query;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use snafu::{OptionExt as _, ResultExt as _};
use tracing::instrument;

use super::{ApiError, App, ClientAddress, LedgerSnafu, Result, UnknownClientSnafu};
use crate::anonymize::ClientToken;
use crate::model::{ParseSymbolError, Symbol};

/// Symbols a single request may ask for, one to look up or two to compare.
pub const MAX_SYMBOLS: usize = 2;

const INVALID_SYMBOL: &str = "Invalid stock symbol";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StockQuery {
    #[serde(default)]
    pub stock: Vec<String>,
    pub like: Option<String>,
}

impl StockQuery {
    pub fn wants_like(&self) -> bool {
        self.like.as_deref() == Some("true")
    }

    /// Requested symbols in request order, blank values are ignored.
    pub fn symbols(&self) -> Result<Vec<Symbol>> {
        let symbols = self
            .stock
            .iter()
            .filter(|text| !text.trim().is_empty())
            .map(|text| {
                text.parse::<Symbol>().map_err(|err| match err {
                    ParseSymbolError::EmptySymbol => ApiError::MissingSymbol,
                    ParseSymbolError::MalformedSymbol { text } => {
                        ApiError::MalformedSymbol { text }
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;

        match symbols.len() {
            0 => Err(ApiError::MissingSymbol),
            count if count > MAX_SYMBOLS => Err(ApiError::TooManySymbols { count }),
            _ => Ok(symbols),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StockEntry {
    Quoted {
        stock: String,
        price: f64,
        likes: u64,
    },
    Invalid {
        symbol: Symbol,
        error: &'static str,
    },
}

impl StockEntry {
    fn invalid(symbol: &Symbol) -> Self {
        StockEntry::Invalid {
            symbol: symbol.clone(),
            error: INVALID_SYMBOL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StockData {
    Single(StockEntry),
    Pair(Vec<StockEntry>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockPrices {
    pub stock_data: StockData,
}

/// `GET /api/stock-prices?stock=<SYMBOL>[&stock=<SYMBOL>][&like=true]`
#[instrument(skip_all, fields(stock = ?query.stock, like = query.wants_like()))]
pub async fn stock_prices(
    State(app): State<App>, ClientAddress(client): ClientAddress, Query(query): Query<StockQuery>,
) -> Result<Json<StockPrices>> {
    let symbols = query.symbols()?;

    let token = if query.wants_like() {
        let client = client.context(UnknownClientSnafu)?;
        Some(ClientToken::from(client))
    } else {
        None
    };

    let lookups = symbols
        .iter()
        .map(|symbol| lookup(&app, symbol, token.as_ref()));
    let mut entries = try_join_all(lookups).await?;

    let stock_data = if entries.len() == 1 {
        StockData::Single(entries.remove(0))
    } else {
        StockData::Pair(entries)
    };

    Ok(Json(StockPrices { stock_data }))
}

async fn lookup(app: &App, symbol: &Symbol, token: Option<&ClientToken>) -> Result<StockEntry> {
    let Some(quote) = app.quotes.lookup(symbol).await else {
        return Ok(StockEntry::invalid(symbol));
    };

    let likes = match token {
        Some(token) => app.ledger.record_like_if_absent(symbol, token).await,
        None => app.ledger.like_count(symbol).await,
    }
    .context(LedgerSnafu)?;

    Ok(StockEntry::Quoted {
        stock: quote.symbol,
        price: quote.latest_price,
        likes,
    })
}
