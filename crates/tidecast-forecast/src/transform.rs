//! Series decomposition shared by every model.
//!
//! The pipeline is log transform (when the series is strictly positive),
//! linear detrend, then conditional deseasonalization at the daily period.
//! Models fit the remaining residual; [`Decomposition::restore`] reverses
//! the three steps for forecast positions past the training window.

use crate::error::ForecastError;

/// Seasonal period for daily bars (one trading week of calendar days).
pub const SEASONAL_PERIOD: usize = 7;

/// Seasonal variance share below which deseasonalization is skipped.
const SEASONAL_STRENGTH_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
struct TrendLine {
    intercept: f64,
    slope: f64,
}

impl TrendLine {
    fn fit(values: &[f64]) -> Self {
        let n = values.len() as f64;
        let mean_t = (n - 1.0) / 2.0;
        let mean_y = values.iter().sum::<f64>() / n;

        let mut cov = 0.0;
        let mut var = 0.0;
        for (t, &y) in values.iter().enumerate() {
            let dt = t as f64 - mean_t;
            cov += dt * (y - mean_y);
            var += dt * dt;
        }

        let slope = if var > 0.0 { cov / var } else { 0.0 };
        Self {
            intercept: mean_y - slope * mean_t,
            slope,
        }
    }

    fn at(&self, t: usize) -> f64 {
        self.intercept + self.slope * t as f64
    }
}

/// Fitted transform state: what was applied, and how to undo it for
/// positions beyond the training window.
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    log_applied: bool,
    trend: TrendLine,
    seasonal: Option<Vec<f64>>,
    train_len: usize,
    residuals: Vec<f64>,
}

impl Decomposition {
    pub fn fit(values: &[f64]) -> Result<Self, ForecastError> {
        if values.len() < 2 {
            return Err(ForecastError::invalid_series(
                "decomposition needs at least two observations",
            ));
        }

        let log_applied = values.iter().all(|&v| v > 0.0);
        let working: Vec<f64> = if log_applied {
            values.iter().map(|v| v.ln()).collect()
        } else {
            values.to_vec()
        };

        let trend = TrendLine::fit(&working);
        let mut detrended: Vec<f64> = working
            .iter()
            .enumerate()
            .map(|(t, &y)| y - trend.at(t))
            .collect();

        let seasonal = seasonal_indices(&detrended);
        if let Some(indices) = &seasonal {
            for (t, value) in detrended.iter_mut().enumerate() {
                *value -= indices[t % SEASONAL_PERIOD];
            }
        }

        Ok(Self {
            log_applied,
            trend,
            seasonal,
            train_len: values.len(),
            residuals: detrended,
        })
    }

    /// The residual series the model trains on.
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    pub const fn log_applied(&self) -> bool {
        self.log_applied
    }

    pub const fn deseasonalized(&self) -> bool {
        self.seasonal.is_some()
    }

    /// Map residual forecasts at positions `train_len..train_len + h` back
    /// to the original scale.
    pub fn restore(&self, residual_forecast: &[f64]) -> Vec<f64> {
        residual_forecast
            .iter()
            .enumerate()
            .map(|(offset, &residual)| {
                let t = self.train_len + offset;
                let mut value = residual + self.trend.at(t);
                if let Some(indices) = &self.seasonal {
                    value += indices[t % SEASONAL_PERIOD];
                }
                if self.log_applied {
                    value = value.exp();
                }
                value
            })
            .collect()
    }
}

/// Mean-per-phase seasonal indices, or `None` when the seasonal component
/// explains too little of the detrended variance to be worth removing.
fn seasonal_indices(detrended: &[f64]) -> Option<Vec<f64>> {
    if detrended.len() < 2 * SEASONAL_PERIOD {
        return None;
    }

    let mut sums = [0.0; SEASONAL_PERIOD];
    let mut counts = [0usize; SEASONAL_PERIOD];
    for (t, &value) in detrended.iter().enumerate() {
        sums[t % SEASONAL_PERIOD] += value;
        counts[t % SEASONAL_PERIOD] += 1;
    }

    let mut indices: Vec<f64> = sums
        .iter()
        .zip(counts.iter())
        .map(|(&sum, &count)| sum / count as f64)
        .collect();

    // Center the indices so the trend line is left untouched.
    let mean = indices.iter().sum::<f64>() / SEASONAL_PERIOD as f64;
    for index in indices.iter_mut() {
        *index -= mean;
    }

    let total_var = variance(detrended);
    if total_var <= 0.0 {
        return None;
    }
    let seasonal_var = detrended
        .iter()
        .enumerate()
        .map(|(t, _)| indices[t % SEASONAL_PERIOD].powi(2))
        .sum::<f64>()
        / detrended.len() as f64;

    if seasonal_var / total_var > SEASONAL_STRENGTH_THRESHOLD {
        Some(indices)
    } else {
        None
    }
}

fn variance(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weekly_series(n: usize) -> Vec<f64> {
        const PATTERN: [f64; 7] = [1.0, 3.0, 5.0, 4.0, 2.0, -2.0, -4.0];
        (0..n)
            .map(|t| 50.0 + 0.1 * t as f64 + PATTERN[t % 7])
            .collect()
    }

    #[test]
    fn log_applied_only_for_positive_series() {
        let positive = Decomposition::fit(&[1.0, 2.0, 3.0, 4.0]).expect("fit");
        assert!(positive.log_applied());

        let with_zero = Decomposition::fit(&[0.0, 2.0, 3.0, 4.0]).expect("fit");
        assert!(!with_zero.log_applied());
    }

    #[test]
    fn strong_weekly_pattern_is_removed() {
        let series = weekly_series(140);
        let decomposition = Decomposition::fit(&series).expect("fit");
        assert!(decomposition.deseasonalized());

        let residual_var = variance(decomposition.residuals());
        assert!(residual_var < variance(&series));
    }

    #[test]
    fn restore_inverts_fit_on_flat_extension() {
        let series = weekly_series(140);
        let decomposition = Decomposition::fit(&series).expect("fit");

        // A zero residual forecast restores to trend plus seasonality.
        let restored = decomposition.restore(&[0.0; 14]);
        assert_eq!(restored.len(), 14);
        for value in &restored {
            assert!(value.is_finite());
            assert!(*value > 0.0);
        }
        // Points one week apart share a phase and differ only by trend.
        assert!((restored[0].ln() - restored[7].ln()).abs() < 0.1);
    }

    #[test]
    fn trendless_noise_skips_deseasonalization() {
        let series: Vec<f64> = (0..100).map(|t| 10.0 + ((t * 7919) % 13) as f64 * 0.01).collect();
        let decomposition = Decomposition::fit(&series).expect("fit");
        assert!(!decomposition.deseasonalized());
    }
}
