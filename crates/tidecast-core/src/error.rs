use thiserror::Error;

/// Validation and contract errors exposed by `tidecast-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("ticker '{symbol}' is not in the supported watch set")]
    UnsupportedTicker { symbol: String },

    #[error("invalid price column '{value}', expected one of open, high, low, close, adj_close, volume")]
    InvalidPriceField { value: String },
    #[error("invalid model id '{value}'")]
    InvalidModelId { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
}
