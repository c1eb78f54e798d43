//! Lasso and elastic net via cyclic coordinate descent with soft
//! thresholding. Objective matches the usual scaled form,
//! `(1/2n)·RSS + alpha·l1_ratio·|w|_1 + (alpha/2)·(1 - l1_ratio)·|w|_2^2`,
//! so `l1_ratio = 1` is the lasso.

use ndarray::Array1;

use tidecast_core::ModelId;

use crate::error::ForecastError;
use crate::models::linear::center;
use crate::models::{lag_matrix, LinearAutoregressor, ResidualModel, TrainedModel, LAG_WINDOW};

#[derive(Debug, Clone)]
pub struct CoordinateDescent {
    id: ModelId,
    alpha: f64,
    l1_ratio: f64,
    max_iter: usize,
    tolerance: f64,
}

impl CoordinateDescent {
    pub fn lasso(alpha: f64) -> Self {
        Self {
            id: ModelId::Lasso,
            alpha,
            l1_ratio: 1.0,
            max_iter: 1000,
            tolerance: 1e-6,
        }
    }

    pub fn elastic_net(alpha: f64, l1_ratio: f64) -> Self {
        Self {
            id: ModelId::ElasticNet,
            alpha,
            l1_ratio,
            max_iter: 1000,
            tolerance: 1e-6,
        }
    }
}

fn soft_threshold(value: f64, threshold: f64) -> f64 {
    if value > threshold {
        value - threshold
    } else if value < -threshold {
        value + threshold
    } else {
        0.0
    }
}

impl ResidualModel for CoordinateDescent {
    fn id(&self) -> ModelId {
        self.id
    }

    fn fit(&self, residuals: &[f64]) -> Result<Box<dyn TrainedModel>, ForecastError> {
        let (x, y) = lag_matrix(residuals)?;
        let centered = center(&x, &y);
        let n = x.nrows() as f64;

        let l1 = n * self.alpha * self.l1_ratio;
        let l2 = n * self.alpha * (1.0 - self.l1_ratio);
        let column_norms: Vec<f64> = (0..LAG_WINDOW)
            .map(|j| {
                let column = centered.x.column(j);
                column.dot(&column)
            })
            .collect();

        let mut weights = Array1::<f64>::zeros(LAG_WINDOW);
        let mut fit_residual = centered.y.clone();

        for _ in 0..self.max_iter {
            let mut max_shift = 0.0f64;
            for j in 0..LAG_WINDOW {
                if column_norms[j] + l2 <= 0.0 {
                    continue;
                }
                let column = centered.x.column(j);
                let old = weights[j];
                // Partial correlation with this coordinate removed.
                let rho = column.dot(&fit_residual) + old * column_norms[j];
                let new = soft_threshold(rho, l1) / (column_norms[j] + l2);
                if new != old {
                    let delta = new - old;
                    fit_residual.scaled_add(-delta, &column);
                    weights[j] = new;
                    max_shift = max_shift.max(delta.abs());
                }
            }
            if max_shift < self.tolerance {
                break;
            }
        }

        let intercept = centered.y_mean - centered.x_mean.dot(&weights);
        LinearAutoregressor::from_fit(intercept, weights.to_vec(), residuals)
    }
}
