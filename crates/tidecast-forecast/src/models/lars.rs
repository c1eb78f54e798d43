//! Least-angle regression over the lag features.
//!
//! The path starts from the empty model and repeatedly admits the lag most
//! correlated with the current residual, then moves along the equiangular
//! direction until the next lag ties. `full_path` walks the whole path to
//! the least-squares solution; the lasso variant applies the sign-crossing
//! drop rule and stops once the maximum correlation falls below the
//! penalty level.

use ndarray::{Array1, Array2};

use tidecast_core::ModelId;

use crate::error::ForecastError;
use crate::models::linear::{center, solve_symmetric};
use crate::models::{lag_matrix, LinearAutoregressor, ResidualModel, TrainedModel, LAG_WINDOW};

#[derive(Debug, Clone)]
pub struct LeastAngle {
    id: ModelId,
    /// Penalty level for the lasso variant; `None` walks the full path.
    alpha: Option<f64>,
}

impl LeastAngle {
    pub fn full_path() -> Self {
        Self {
            id: ModelId::Lar,
            alpha: None,
        }
    }

    pub fn lasso(alpha: f64) -> Self {
        Self {
            id: ModelId::LassoLar,
            alpha: Some(alpha),
        }
    }
}

impl ResidualModel for LeastAngle {
    fn id(&self) -> ModelId {
        self.id
    }

    fn fit(&self, residuals: &[f64]) -> Result<Box<dyn TrainedModel>, ForecastError> {
        let (x, y) = lag_matrix(residuals)?;
        let centered = center(&x, &y);
        let weights = lars_path(&centered.x, &centered.y, self.alpha)?;
        let intercept = centered.y_mean - centered.x_mean.dot(&weights);
        LinearAutoregressor::from_fit(intercept, weights.to_vec(), residuals)
    }
}

/// One pass of the LARS path. `alpha` switches on the lasso modification
/// and the correlation stopping level (scaled by the sample count, so it
/// matches the coordinate-descent objective).
fn lars_path(
    x: &Array2<f64>,
    y: &Array1<f64>,
    alpha: Option<f64>,
) -> Result<Array1<f64>, ForecastError> {
    let n = x.nrows() as f64;
    let p = LAG_WINDOW;
    let stop_level = alpha.map(|a| a * n);

    let mut beta = Array1::<f64>::zeros(p);
    let mut mu = Array1::<f64>::zeros(x.nrows());
    let mut active: Vec<usize> = Vec::new();
    let mut signs: Vec<f64> = Vec::new();

    // The path has at most p segments; dropped variables can re-enter,
    // so allow some slack before declaring non-convergence.
    for _ in 0..(8 * p) {
        let correlations = x.t().dot(&(y - &mu));
        let max_corr = correlations.iter().fold(0.0f64, |m, c| m.max(c.abs()));

        if let Some(level) = stop_level {
            if max_corr <= level {
                break;
            }
        }
        if max_corr < 1e-12 {
            break;
        }

        // Admit the most correlated inactive lag.
        if active.len() < p {
            let candidate = (0..p)
                .filter(|j| !active.contains(j))
                .max_by(|&a, &b| {
                    correlations[a]
                        .abs()
                        .partial_cmp(&correlations[b].abs())
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            if let Some(j) = candidate {
                if (correlations[j].abs() - max_corr).abs() < 1e-9 || active.is_empty() {
                    active.push(j);
                    signs.push(correlations[j].signum());
                }
            }
        }
        if active.is_empty() {
            break;
        }

        // Equiangular direction over the signed active columns.
        let k = active.len();
        let mut gram = Array2::zeros((k, k));
        for (a, &ja) in active.iter().enumerate() {
            for (b, &jb) in active.iter().enumerate() {
                gram[[a, b]] = signs[a] * signs[b] * x.column(ja).dot(&x.column(jb));
            }
        }
        for d in 0..k {
            // Tiny jitter keeps near-collinear active sets solvable.
            gram[[d, d]] += 1e-10;
        }
        let ones = Array1::ones(k);
        let w = solve_symmetric(gram, ones)?;
        let normalizer = w.sum();
        if normalizer <= 0.0 {
            return Err(ForecastError::model_fit("degenerate equiangular direction"));
        }
        let scale = normalizer.sqrt().recip();
        let w = w.mapv(|v| v * scale);

        let mut direction = Array1::<f64>::zeros(x.nrows());
        for (a, &j) in active.iter().enumerate() {
            direction.scaled_add(signs[a] * w[a], &x.column(j));
        }
        let projections = x.t().dot(&direction);

        // Step length to the next tie, or to the least-squares end.
        let mut gamma = max_corr / scale;
        if active.len() < p {
            for j in 0..p {
                if active.contains(&j) {
                    continue;
                }
                for candidate in [
                    (max_corr - correlations[j]) / (scale - projections[j]),
                    (max_corr + correlations[j]) / (scale + projections[j]),
                ] {
                    if candidate > 1e-12 && candidate < gamma {
                        gamma = candidate;
                    }
                }
            }
        }

        // Lasso rule: a coefficient crossing zero leaves the active set.
        let mut drop_index: Option<usize> = None;
        if alpha.is_some() {
            for (a, &j) in active.iter().enumerate() {
                let step = signs[a] * w[a];
                if step.abs() > 1e-12 {
                    let crossing = -beta[j] / step;
                    if crossing > 1e-12 && crossing < gamma {
                        gamma = crossing;
                        drop_index = Some(a);
                    }
                }
            }
        }

        // Truncate the final step so the path lands exactly on the
        // penalty level.
        let mut done = false;
        if let Some(level) = stop_level {
            let at_step_end = max_corr - gamma * scale;
            if at_step_end < level {
                gamma = (max_corr - level) / scale;
                done = true;
            }
        }

        for (a, &j) in active.iter().enumerate() {
            beta[j] += gamma * signs[a] * w[a];
        }
        mu.scaled_add(gamma, &direction);

        if done {
            break;
        }
        if let Some(a) = drop_index {
            beta[active[a]] = 0.0;
            active.remove(a);
            signs.remove(a);
        } else if active.len() == p {
            // Full path ends at the least-squares solution.
            break;
        }
    }

    Ok(beta)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ar1_series(n: usize, phi: f64) -> Vec<f64> {
        let mut values = vec![1.0];
        for t in 1..n {
            let shock = ((t * 2654435761) % 1000) as f64 / 1000.0 - 0.5;
            values.push(phi * values[t - 1] + 0.01 * shock);
        }
        values
    }

    #[test]
    fn full_path_fits_finite_model() {
        let series = ar1_series(300, 0.7);
        let trained = LeastAngle::full_path().fit(&series).expect("fit");
        assert!(trained.forecast(90).iter().all(|v| v.is_finite()));
    }

    #[test]
    fn heavy_penalty_stops_the_path_immediately() {
        let series = ar1_series(300, 0.7);
        let trained = LeastAngle::lasso(1e6).fit(&series).expect("fit");
        // No lag enters the model, so the forecast is flat.
        let forecast = trained.forecast(5);
        assert!(forecast.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn zero_variance_residual_yields_flat_forecast() {
        let series = vec![0.0; 300];
        let trained = LeastAngle::full_path().fit(&series).expect("fit");
        assert_eq!(trained.forecast(3), vec![0.0; 3]);
    }
}
