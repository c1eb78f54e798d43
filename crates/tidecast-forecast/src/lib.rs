//! Deterministic forecasting engine for daily price series.
//!
//! The crate is organized around one flow: a [`ProjectedSeries`] goes
//! through [`transform::Decomposition`] (log, detrend, conditional
//! deseasonalize), the selected model from [`models`] fits the residual,
//! and an [`Experiment`] wraps the whole run with expanding-window
//! cross-validation and chart assembly.
//!
//! | Module      | Responsibility |
//! |-------------|----------------|
//! | `engine`    | experiment orchestration, validation, chart output |
//! | `models`    | the nine dashboard models |
//! | `transform` | shared series decomposition |
//! | `series`    | validated numeric series with date index |
//! | `error`     | failure taxonomy for callers |
//!
//! Everything here is synchronous and CPU-bound; async callers run
//! experiments on a blocking thread.

pub mod engine;
pub mod error;
pub mod models;
pub mod series;
pub mod transform;

pub use engine::{Experiment, ForecastConfiguration, ForecastReport};
pub use error::ForecastError;
pub use series::ProjectedSeries;
