//! # Tidecast Core
//!
//! Domain types and provider contracts for the tidecast forecast dashboard.
//!
//! ## Overview
//!
//! This crate provides the foundational components for tidecast:
//!
//! - **Canonical domain models** for tickers, price tables, and chart specs
//! - **Provider contract** for historical daily price data
//! - **HTTP transport abstraction** with a deterministic offline client
//! - **Resilience primitives**: retry with backoff, circuit breaker
//! - **Yahoo Finance adapter** for real and mock daily history
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (Yahoo daily history) |
//! | [`circuit_breaker`] | Circuit breaker for resilient upstream calls |
//! | [`domain`] | Domain models (Symbol, PriceTable, ChartSpec) |
//! | [`error`] | Validation error types |
//! | [`http_client`] | HTTP client abstraction |
//! | [`provider`] | Price provider trait and request/error types |
//! | [`retry`] | Retry logic with exponential backoff |
//!
//! ## Error Handling
//!
//! All operations return `Result` types with structured errors. Provider
//! failures carry a [`ProviderErrorKind`] so callers can distinguish
//! missing data from transport trouble:
//!
//! ```rust
//! use tidecast_core::{ProviderError, ProviderErrorKind};
//!
//! fn handle_error(error: ProviderError) {
//!     match error.kind() {
//!         ProviderErrorKind::NotFound => {
//!             // Unknown ticker, nothing to retry
//!         }
//!         ProviderErrorKind::RateLimited | ProviderErrorKind::Unavailable => {
//!             // Wait and retry
//!         }
//!         _ => {}
//!     }
//! }
//! ```

pub mod adapters;
pub mod circuit_breaker;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod provider;
pub mod retry;

// Re-export commonly used types at crate root for convenience

// Adapter implementations
pub use adapters::YahooDailyAdapter;

// Circuit breaker
pub use circuit_breaker::{BreakerConfig, BreakerState, CircuitBreaker};

// Domain models
pub use domain::{
    Axis, ChartPoint, ChartSpec, LineSeries, ModelId, PriceField, PriceRow, PriceTable, Symbol,
};

// Error types
pub use error::ValidationError;

// HTTP client types
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient};

// Provider contract
pub use provider::{
    HealthState, HealthStatus, HistoryRange, HistoryRequest, PriceProvider, ProviderError,
    ProviderErrorKind,
};

// Retry logic
pub use retry::{Backoff, RetryConfig};
