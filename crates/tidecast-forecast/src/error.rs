use thiserror::Error;

/// Errors raised while preparing or fitting a forecast experiment.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ForecastError {
    /// The series is too short to run cross-validation at the configured
    /// horizon. No model fit is attempted.
    #[error("insufficient history: need at least {required} observations, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },

    /// The series itself is unusable (length mismatch, non-finite values).
    #[error("invalid series: {0}")]
    InvalidSeries(String),

    /// A model failed to fit or produced a degenerate forecast.
    #[error("model fit failed: {0}")]
    ModelFit(String),
}

impl ForecastError {
    pub fn model_fit(message: impl Into<String>) -> Self {
        Self::ModelFit(message.into())
    }

    pub fn invalid_series(message: impl Into<String>) -> Self {
        Self::InvalidSeries(message.into())
    }
}
