use serde::{Deserialize, Serialize};
use time::Date;

use crate::{PriceField, Symbol, ValidationError};

/// A single dated observation of the six canonical price columns.
///
/// Individual cells may be absent: providers occasionally emit null cells
/// (halted sessions, missing volume). Consumers that require dense values
/// decide how to handle the gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub date: Date,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub adjusted_close: Option<f64>,
    pub volume: Option<f64>,
}

impl PriceRow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        date: Date,
        open: Option<f64>,
        high: Option<f64>,
        low: Option<f64>,
        close: Option<f64>,
        adjusted_close: Option<f64>,
        volume: Option<f64>,
    ) -> Result<Self, ValidationError> {
        validate_cell("open", open)?;
        validate_cell("high", high)?;
        validate_cell("low", low)?;
        validate_cell("close", close)?;
        validate_cell("adjusted_close", adjusted_close)?;
        validate_cell("volume", volume)?;

        Ok(Self {
            date,
            open,
            high,
            low,
            close,
            adjusted_close,
            volume,
        })
    }

    /// Read the cell for a canonical column.
    pub fn cell(&self, field: PriceField) -> Option<f64> {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
            PriceField::AdjustedClose => self.adjusted_close,
            PriceField::Volume => self.volume,
        }
    }
}

/// Canonical daily price history for one ticker.
///
/// Rows are sorted ascending by date with no duplicates; construction
/// enforces both. Tables are replace-only: a new fetch produces a new
/// table, never an in-place merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    symbol: Symbol,
    rows: Vec<PriceRow>,
}

impl PriceTable {
    /// Build a table from provider rows, sorting ascending by date and
    /// collapsing duplicate dates (the last row wins).
    pub fn from_rows(symbol: Symbol, mut rows: Vec<PriceRow>) -> Self {
        rows.sort_by_key(|row| row.date);
        rows.dedup_by(|next, prev| {
            if next.date == prev.date {
                // Keep the later row for the shared date.
                *prev = next.clone();
                true
            } else {
                false
            }
        });

        Self { symbol, rows }
    }

    pub fn empty(symbol: Symbol) -> Self {
        Self {
            symbol,
            rows: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn rows(&self) -> &[PriceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = Date> + '_ {
        self.rows.iter().map(|row| row.date)
    }

    /// Extract one column, preserving nulls and row order.
    pub fn column(&self, field: PriceField) -> Vec<Option<f64>> {
        self.rows.iter().map(|row| row.cell(field)).collect()
    }

    pub fn last_date(&self) -> Option<Date> {
        self.rows.last().map(|row| row.date)
    }
}

fn validate_cell(field: &'static str, value: Option<f64>) -> Result<(), ValidationError> {
    if let Some(value) = value {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue { field });
        }
        if value < 0.0 {
            return Err(ValidationError::NegativeValue { field });
        }
    }
    Ok(())
}
