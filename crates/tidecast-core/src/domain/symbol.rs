use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Longest ticker the dashboard accepts. US equity tickers run one to
/// five letters; one spare covers share-class suffixes.
const MAX_TICKER_LEN: usize = 6;

/// Canonical equity ticker: ASCII letters only, stored uppercase.
///
/// Parsing trims whitespace and folds case, so user input, provider
/// payloads, and pipeline fingerprints all compare on the same canonical
/// form. Whether a ticker is actually on the dashboard's watch list is a
/// separate concern checked at the selection layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }

        let len = trimmed.chars().count();
        if len > MAX_TICKER_LEN {
            return Err(ValidationError::SymbolTooLong {
                len,
                max: MAX_TICKER_LEN,
            });
        }

        let mut ticker = String::with_capacity(trimmed.len());
        for (index, ch) in trimmed.chars().enumerate() {
            if !ch.is_ascii_alphabetic() {
                return Err(ValidationError::SymbolInvalidChar { ch, index });
            }
            ticker.push(ch.to_ascii_uppercase());
        }

        Ok(Self(ticker))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Symbol {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}
