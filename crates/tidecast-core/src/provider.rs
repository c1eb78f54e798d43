//! Price provider trait and request/error types.
//!
//! This module defines the contract every historical-price provider must
//! follow. The dashboard consumes exactly one endpoint: daily OHLCV history
//! for a single ticker over a default range.
//!
//! # Example
//!
//! ```rust,ignore
//! use tidecast_core::{HistoryRequest, PriceProvider, YahooDailyAdapter};
//!
//! async fn fetch(provider: &YahooDailyAdapter) -> Result<(), Box<dyn std::error::Error>> {
//!     let request = HistoryRequest::daily(Symbol::parse("AAPL")?);
//!     let table = provider.history(request).await?;
//!     println!("{} rows", table.len());
//!     Ok(())
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{PriceTable, Symbol};

/// Date span requested from the provider, expressed the way daily-history
/// endpoints take it (a trailing window, not explicit bounds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryRange {
    OneYear,
    TwoYears,
    FiveYears,
    Max,
}

impl HistoryRange {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::FiveYears => "5y",
            Self::Max => "max",
        }
    }

    /// Number of calendar days covered, used by the deterministic mock
    /// transport to size synthetic history.
    pub const fn approx_days(self) -> usize {
        match self {
            Self::OneYear => 365,
            Self::TwoYears => 730,
            Self::FiveYears => 1825,
            Self::Max => 3650,
        }
    }
}

impl Display for HistoryRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload for the daily-history endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub symbol: Symbol,
    pub range: HistoryRange,
}

impl HistoryRequest {
    pub fn new(symbol: Symbol, range: HistoryRange) -> Self {
        Self { symbol, range }
    }

    /// The dashboard's default request: two years of daily bars.
    pub fn daily(symbol: Symbol) -> Self {
        Self::new(symbol, HistoryRange::TwoYears)
    }
}

/// Provider-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// The ticker is unknown to the provider or yielded zero rows.
    NotFound,
    /// Transport or upstream service failure.
    Unavailable,
    /// The provider is throttling us.
    RateLimited,
    /// The request deadline elapsed before a response arrived.
    Timeout,
    /// The request itself was malformed.
    InvalidRequest,
    /// Response arrived but could not be understood.
    Internal,
}

/// Structured provider error consumed by the pipeline's fetch node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    kind: ProviderErrorKind,
    message: String,
    retryable: bool,
}

impl ProviderError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::NotFound,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Timeout,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> ProviderErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            ProviderErrorKind::NotFound => "provider.not_found",
            ProviderErrorKind::Unavailable => "provider.unavailable",
            ProviderErrorKind::RateLimited => "provider.rate_limited",
            ProviderErrorKind::Timeout => "provider.timeout",
            ProviderErrorKind::InvalidRequest => "provider.invalid_request",
            ProviderErrorKind::Internal => "provider.internal",
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for ProviderError {}

/// Coarse provider health derived from the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Runtime provider health snapshot, surfaced on the dashboard snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub state: HealthState,
    pub consecutive_failures: u32,
}

impl HealthStatus {
    pub const fn new(state: HealthState, consecutive_failures: u32) -> Self {
        Self {
            state,
            consecutive_failures,
        }
    }

    pub const fn healthy() -> Self {
        Self::new(HealthState::Healthy, 0)
    }
}

/// Historical-price provider contract.
///
/// Implementations must be `Send + Sync`; the orchestrator shares one
/// provider across concurrent refresh passes. The trait uses boxed futures
/// so providers stay object-safe behind `Arc<dyn PriceProvider>`.
pub trait PriceProvider: Send + Sync {
    /// Stable provider identifier for logs and snapshots.
    fn id(&self) -> &'static str;

    /// Fetch daily history for one ticker.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if:
    /// - The ticker is unknown or yields zero rows (`NotFound`)
    /// - The upstream service or transport fails (`Unavailable`)
    /// - The provider throttles the request (`RateLimited`)
    /// - The response cannot be parsed (`Internal`)
    fn history<'a>(
        &'a self,
        req: HistoryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<PriceTable, ProviderError>> + Send + 'a>>;

    /// Current provider health, derived from recent upstream behavior.
    fn health<'a>(&'a self) -> Pin<Box<dyn Future<Output = HealthStatus> + Send + 'a>>;
}
