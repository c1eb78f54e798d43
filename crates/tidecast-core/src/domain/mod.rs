//! # Domain Models
//!
//! Canonical domain types for tidecast market data and chart output.
//!
//! ## Overview
//!
//! This module provides strongly-typed domain models with built-in
//! validation. All models are designed to be:
//!
//! - **Type-safe**: Invalid states are unrepresentable
//! - **Validated**: Construction validates all invariants
//! - **Serializable**: Full serde support for JSON
//!
//! ## Models
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated equity ticker |
//! | [`PriceField`] | One of the six canonical price columns |
//! | [`ModelId`] | One of the nine supported forecasting models |
//! | [`PriceRow`] | A single dated OHLCV observation |
//! | [`PriceTable`] | Date-sorted, duplicate-free daily history |
//! | [`ChartSpec`] | Declarative line-chart description |
//!
//! ## Validation
//!
//! Price rows enforce invariants at construction time:
//!
//! ```rust
//! use tidecast_core::{PriceRow, ValidationError};
//! use time::macros::date;
//!
//! let row = PriceRow::new(
//!     date!(2024 - 01 - 02),
//!     Some(101.0),
//!     Some(103.0),
//!     Some(100.5),
//!     Some(102.5),
//!     Some(102.5),
//!     Some(1_200_000.0),
//! );
//! assert!(row.is_ok());
//!
//! let bad = PriceRow::new(date!(2024 - 01 - 02), None, None, None, Some(f64::NAN), None, None);
//! assert!(matches!(bad, Err(ValidationError::NonFiniteValue { .. })));
//! ```

mod chart;
mod field;
mod table;
mod symbol;

pub use chart::{Axis, ChartPoint, ChartSpec, LineSeries};
pub use field::{ModelId, PriceField};
pub use table::{PriceRow, PriceTable};
pub use symbol::Symbol;
