//! Model zoo.
//!
//! | Module       | Models |
//! |--------------|--------|
//! | `exp_smooth` | simple exponential smoothing |
//! | `linear`     | ordinary least squares, ridge, Bayesian ridge, Huber |
//! | `coordinate` | lasso, elastic net (cyclic coordinate descent) |
//! | `lars`       | least-angle regression, lasso-LARS |
//!
//! Every model fits the decomposed residual series. The regression models
//! share one representation: a lag-feature autoregression over the last
//! [`LAG_WINDOW`] observations, forecast recursively.

use ndarray::{Array1, Array2};

use tidecast_core::ModelId;

use crate::error::ForecastError;

mod coordinate;
mod exp_smooth;
mod lars;
mod linear;

pub use coordinate::CoordinateDescent;
pub use exp_smooth::ExpSmoothing;
pub use lars::LeastAngle;
pub use linear::{BayesianRidge, HuberRegression, LeastSquares};

/// Number of lagged observations each regression model conditions on.
pub const LAG_WINDOW: usize = 7;

/// A model that can be fitted to a residual series.
pub trait ResidualModel: Send + Sync {
    fn id(&self) -> ModelId;

    /// Fit the model.
    ///
    /// # Errors
    ///
    /// Returns [`ForecastError::ModelFit`] when the series is too short for
    /// the lag window or a solver cannot produce finite coefficients.
    fn fit(&self, residuals: &[f64]) -> Result<Box<dyn TrainedModel>, ForecastError>;
}

/// A fitted model, ready to extend the residual series.
pub trait TrainedModel: Send {
    fn forecast(&self, horizon: usize) -> Vec<f64>;
}

/// Instantiate the model behind a dashboard model id.
pub fn for_model(id: ModelId) -> Box<dyn ResidualModel> {
    match id {
        ModelId::ExpSmooth => Box::new(ExpSmoothing::default()),
        ModelId::Linear => Box::new(LeastSquares::ordinary()),
        ModelId::Ridge => Box::new(LeastSquares::ridge(1.0)),
        ModelId::Lasso => Box::new(CoordinateDescent::lasso(1.0)),
        ModelId::ElasticNet => Box::new(CoordinateDescent::elastic_net(1.0, 0.5)),
        ModelId::Lar => Box::new(LeastAngle::full_path()),
        ModelId::LassoLar => Box::new(LeastAngle::lasso(1.0)),
        ModelId::BayesianRidge => Box::new(BayesianRidge::default()),
        ModelId::Huber => Box::new(HuberRegression::default()),
    }
}

/// Lag-feature design matrix over a residual series.
///
/// Row `i` predicts `residuals[i + LAG_WINDOW]` from the preceding
/// `LAG_WINDOW` values; column `j` holds lag `j + 1`.
pub(crate) fn lag_matrix(residuals: &[f64]) -> Result<(Array2<f64>, Array1<f64>), ForecastError> {
    let n = residuals.len();
    if n < 2 * LAG_WINDOW + 1 {
        return Err(ForecastError::model_fit(format!(
            "need more than {} observations for a lag window of {}, got {n}",
            2 * LAG_WINDOW,
            LAG_WINDOW
        )));
    }

    let rows = n - LAG_WINDOW;
    let mut x = Array2::zeros((rows, LAG_WINDOW));
    let mut y = Array1::zeros(rows);
    for i in 0..rows {
        for j in 0..LAG_WINDOW {
            x[[i, j]] = residuals[i + LAG_WINDOW - 1 - j];
        }
        y[i] = residuals[i + LAG_WINDOW];
    }
    Ok((x, y))
}

/// Trained linear autoregression shared by every regression model: an
/// intercept, one weight per lag, and the training tail to seed recursion.
#[derive(Debug, Clone)]
pub(crate) struct LinearAutoregressor {
    intercept: f64,
    weights: Vec<f64>,
    tail: Vec<f64>,
}

impl LinearAutoregressor {
    /// Package solved coefficients, rejecting non-finite output.
    pub(crate) fn from_fit(
        intercept: f64,
        weights: Vec<f64>,
        residuals: &[f64],
    ) -> Result<Box<dyn TrainedModel>, ForecastError> {
        if !intercept.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(ForecastError::model_fit(
                "solver produced non-finite coefficients",
            ));
        }
        let tail = residuals[residuals.len() - LAG_WINDOW..].to_vec();
        Ok(Box::new(Self {
            intercept,
            weights,
            tail,
        }))
    }
}

impl TrainedModel for LinearAutoregressor {
    fn forecast(&self, horizon: usize) -> Vec<f64> {
        let mut window = self.tail.clone();
        let mut out = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let mut next = self.intercept;
            for (j, weight) in self.weights.iter().enumerate() {
                next += weight * window[window.len() - 1 - j];
            }
            window.push(next);
            out.push(next);
        }
        out
    }
}
