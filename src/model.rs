use serde::Serialize;
use snafu::Snafu;

/// Longest ticker we accept, anything above is surely not a symbol.
const MAX_SYMBOL_LEN: usize = 10;

/// A stock ticker, trimmed and normalized to uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Symbol(String);

#[derive(Debug, Snafu, PartialEq)]
pub enum ParseSymbolError {
    /// symbol is empty or only whitespace
    EmptySymbol,

    /// symbol is too long or contains characters a ticker never has
    MalformedSymbol { text: String },
}

impl std::str::FromStr for Symbol {
    type Err = ParseSymbolError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let text = input.trim();

        if text.is_empty() {
            return Err(ParseSymbolError::EmptySymbol);
        }

        let valid = text.len() <= MAX_SYMBOL_LEN
            && text
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');

        if !valid {
            return Err(ParseSymbolError::MalformedSymbol {
                text: text.to_string(),
            });
        }

        Ok(Symbol(text.to_ascii_uppercase()))
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
