use tidecast_core::ModelId;

use crate::error::ForecastError;
use crate::models::{ResidualModel, TrainedModel};

/// Simple exponential smoothing over the residual series.
///
/// Trend and seasonality are removed upstream, so a level-only smoother is
/// the right shape here. The smoothing factor is picked from a fixed grid
/// by one-step-ahead mean absolute error, which keeps the fit fully
/// deterministic.
#[derive(Debug, Clone)]
pub struct ExpSmoothing {
    grid: Vec<f64>,
}

impl Default for ExpSmoothing {
    fn default() -> Self {
        Self {
            grid: (1..20).map(|step| step as f64 * 0.05).collect(),
        }
    }
}

impl ExpSmoothing {
    fn one_step_mae(alpha: f64, residuals: &[f64]) -> (f64, f64) {
        let mut level = residuals[0];
        let mut error_sum = 0.0;
        for &value in &residuals[1..] {
            error_sum += (value - level).abs();
            level = alpha * value + (1.0 - alpha) * level;
        }
        (error_sum / (residuals.len() - 1) as f64, level)
    }
}

impl ResidualModel for ExpSmoothing {
    fn id(&self) -> ModelId {
        ModelId::ExpSmooth
    }

    fn fit(&self, residuals: &[f64]) -> Result<Box<dyn TrainedModel>, ForecastError> {
        if residuals.len() < 2 {
            return Err(ForecastError::model_fit(
                "exponential smoothing needs at least two observations",
            ));
        }

        let mut best: Option<(f64, f64)> = None;
        for &alpha in &self.grid {
            let (mae, level) = Self::one_step_mae(alpha, residuals);
            if best.map_or(true, |(best_mae, _)| mae < best_mae) {
                best = Some((mae, level));
            }
        }

        let (_, level) = best.ok_or_else(|| ForecastError::model_fit("empty alpha grid"))?;
        if !level.is_finite() {
            return Err(ForecastError::model_fit("smoothed level is non-finite"));
        }
        Ok(Box::new(FlatLevel { level }))
    }
}

/// Level-only forecast: every horizon step repeats the smoothed level.
#[derive(Debug, Clone, Copy)]
struct FlatLevel {
    level: f64,
}

impl TrainedModel for FlatLevel {
    fn forecast(&self, horizon: usize) -> Vec<f64> {
        vec![self.level; horizon]
    }
}
