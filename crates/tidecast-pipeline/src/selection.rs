use serde::{Deserialize, Serialize};

use tidecast_core::{ModelId, PriceField, Symbol, ValidationError};

/// Tickers the dashboard offers. Selections outside this set are rejected
/// at the boundary; the pipeline never sees them.
pub const SUPPORTED_TICKERS: [&str; 5] = ["GLW", "AAPL", "TSLA", "META", "AMZN"];

/// The three user-controlled inputs driving the whole pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub ticker: Symbol,
    pub price_column: PriceField,
    pub model: ModelId,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            ticker: Symbol::parse(SUPPORTED_TICKERS[0]).expect("default ticker is valid"),
            price_column: PriceField::AdjustedClose,
            model: ModelId::ExpSmooth,
        }
    }
}

impl SelectionState {
    /// Validate a raw ticker against the supported set.
    pub fn validate_ticker(raw: &str) -> Result<Symbol, ValidationError> {
        let symbol = Symbol::parse(raw)?;
        if SUPPORTED_TICKERS.contains(&symbol.as_str()) {
            Ok(symbol)
        } else {
            Err(ValidationError::UnsupportedTicker {
                symbol: symbol.as_str().to_owned(),
            })
        }
    }

    /// Apply a partial change, leaving unspecified fields untouched.
    pub fn apply(&self, change: &SelectionChange) -> Result<Self, ValidationError> {
        let ticker = match &change.ticker {
            Some(raw) => Self::validate_ticker(raw)?,
            None => self.ticker.clone(),
        };
        Ok(Self {
            ticker,
            price_column: change.price_column.unwrap_or(self.price_column),
            model: change.model.unwrap_or(self.model),
        })
    }

    /// The selection banner shown above the charts.
    pub fn display_line(&self) -> String {
        format!("Selected Equity: {}", self.ticker)
    }
}

/// Partial selection update from the HTTP surface. Any subset of the three
/// fields may be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SelectionChange {
    pub ticker: Option<String>,
    pub price_column: Option<PriceField>,
    pub model: Option<ModelId>,
}
