//! Normal-equation regressors: ordinary least squares, ridge, Bayesian
//! ridge, and Huber. All solve small symmetric systems by Gaussian
//! elimination with partial pivoting; the intercept is kept out of every
//! penalty by centering the design.

use ndarray::{Array1, Array2, Axis};

use tidecast_core::ModelId;

use crate::error::ForecastError;
use crate::models::{lag_matrix, LinearAutoregressor, ResidualModel, TrainedModel, LAG_WINDOW};

/// Jitter added to otherwise-unpenalized diagonals so near-collinear lag
/// columns still solve.
const STABILIZER: f64 = 1e-8;

/// Solve `a x = b` for a small symmetric positive system.
pub(crate) fn solve_symmetric(
    mut a: Array2<f64>,
    mut b: Array1<f64>,
) -> Result<Array1<f64>, ForecastError> {
    let n = a.nrows();
    for col in 0..n {
        // Partial pivoting.
        let mut pivot_row = col;
        for row in col + 1..n {
            if a[[row, col]].abs() > a[[pivot_row, col]].abs() {
                pivot_row = row;
            }
        }
        if a[[pivot_row, col]].abs() < 1e-12 {
            return Err(ForecastError::model_fit("singular normal equations"));
        }
        if pivot_row != col {
            for k in 0..n {
                a.swap([col, k], [pivot_row, k]);
            }
            b.swap(col, pivot_row);
        }

        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let mut sum = b[row];
        for k in row + 1..n {
            sum -= a[[row, k]] * x[k];
        }
        x[row] = sum / a[[row, row]];
    }
    Ok(x)
}

/// Design matrix and target with column means removed, so penalties never
/// touch the intercept.
pub(crate) struct Centered {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    pub x_mean: Array1<f64>,
    pub y_mean: f64,
}

pub(crate) fn center(x: &Array2<f64>, y: &Array1<f64>) -> Centered {
    let x_mean = x
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(x.ncols()));
    let y_mean = y.mean().unwrap_or(0.0);

    let mut xc = x.clone();
    for mut row in xc.rows_mut() {
        row -= &x_mean;
    }
    let yc = y - y_mean;

    Centered {
        x: xc,
        y: yc,
        x_mean,
        y_mean,
    }
}

/// Ridge solve on centered data; `l2 = 0` plus the stabilizer is plain OLS.
fn ridge_coefficients(centered: &Centered, l2: f64) -> Result<(f64, Array1<f64>), ForecastError> {
    let mut gram = centered.x.t().dot(&centered.x);
    for d in 0..gram.nrows() {
        gram[[d, d]] += l2 + STABILIZER;
    }
    let rhs = centered.x.t().dot(&centered.y);
    let weights = solve_symmetric(gram, rhs)?;
    let intercept = centered.y_mean - centered.x_mean.dot(&weights);
    Ok((intercept, weights))
}

/// Ordinary least squares and ridge regression over lag features.
#[derive(Debug, Clone)]
pub struct LeastSquares {
    id: ModelId,
    l2: f64,
}

impl LeastSquares {
    pub fn ordinary() -> Self {
        Self {
            id: ModelId::Linear,
            l2: 0.0,
        }
    }

    pub fn ridge(l2: f64) -> Self {
        Self {
            id: ModelId::Ridge,
            l2,
        }
    }
}

impl ResidualModel for LeastSquares {
    fn id(&self) -> ModelId {
        self.id
    }

    fn fit(&self, residuals: &[f64]) -> Result<Box<dyn TrainedModel>, ForecastError> {
        let (x, y) = lag_matrix(residuals)?;
        let centered = center(&x, &y);
        let (intercept, weights) = ridge_coefficients(&centered, self.l2)?;
        LinearAutoregressor::from_fit(intercept, weights.to_vec(), residuals)
    }
}

/// Bayesian ridge: the penalty strength is not fixed but estimated from
/// the data by evidence maximization, iterating ridge solves while
/// re-estimating the noise and weight precisions.
#[derive(Debug, Clone)]
pub struct BayesianRidge {
    max_iter: usize,
    tolerance: f64,
}

impl Default for BayesianRidge {
    fn default() -> Self {
        Self {
            max_iter: 100,
            tolerance: 1e-6,
        }
    }
}

impl BayesianRidge {
    /// Trace of `(gram + ratio I)^-1`, by solving one system per basis
    /// vector. The system is `LAG_WINDOW` wide, so this stays cheap.
    fn trace_inverse(gram: &Array2<f64>, ratio: f64) -> Result<f64, ForecastError> {
        let p = gram.nrows();
        let mut trace = 0.0;
        for d in 0..p {
            let mut a = gram.clone();
            for k in 0..p {
                a[[k, k]] += ratio + STABILIZER;
            }
            let mut e = Array1::zeros(p);
            e[d] = 1.0;
            let column = solve_symmetric(a, e)?;
            trace += column[d];
        }
        Ok(trace)
    }
}

impl ResidualModel for BayesianRidge {
    fn id(&self) -> ModelId {
        ModelId::BayesianRidge
    }

    fn fit(&self, residuals: &[f64]) -> Result<Box<dyn TrainedModel>, ForecastError> {
        let (x, y) = lag_matrix(residuals)?;
        let centered = center(&x, &y);
        let n = x.nrows() as f64;
        let p = LAG_WINDOW as f64;

        let mut ratio = 1.0;
        let mut fit = ridge_coefficients(&centered, ratio)?;
        for _ in 0..self.max_iter {
            let (_, weights) = &fit;
            let predicted = centered.x.dot(weights);
            let rss = (&centered.y - &predicted).mapv(|r| r * r).sum();
            let weight_norm = weights.dot(weights);

            let gram = centered.x.t().dot(&centered.x);
            let gamma = p - ratio * Self::trace_inverse(&gram, ratio)?;
            let lambda = (gamma + 1e-12) / (weight_norm + 1e-12);
            let alpha = (n - gamma + 1e-12) / (rss + 1e-12);

            // Floor keeps the working system well conditioned when the
            // residual is nearly noise-free.
            let next_ratio = (lambda / alpha).max(1e-10);
            if !next_ratio.is_finite() {
                return Err(ForecastError::model_fit(
                    "evidence maximization diverged",
                ));
            }
            let converged = (next_ratio - ratio).abs() <= self.tolerance * ratio.max(1.0);
            ratio = next_ratio;
            fit = ridge_coefficients(&centered, ratio)?;
            if converged {
                break;
            }
        }

        let (intercept, weights) = fit;
        LinearAutoregressor::from_fit(intercept, weights.to_vec(), residuals)
    }
}

/// Huber regression: iteratively reweighted least squares with the Huber
/// influence function, robust to outlier bars.
#[derive(Debug, Clone)]
pub struct HuberRegression {
    epsilon: f64,
    max_iter: usize,
    tolerance: f64,
}

impl Default for HuberRegression {
    fn default() -> Self {
        Self {
            epsilon: 1.35,
            max_iter: 50,
            tolerance: 1e-8,
        }
    }
}

impl HuberRegression {
    fn median(values: &mut [f64]) -> f64 {
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        values[values.len() / 2]
    }
}

impl ResidualModel for HuberRegression {
    fn id(&self) -> ModelId {
        ModelId::Huber
    }

    fn fit(&self, residuals: &[f64]) -> Result<Box<dyn TrainedModel>, ForecastError> {
        let (x, y) = lag_matrix(residuals)?;
        let centered = center(&x, &y);
        let rows = x.nrows();

        let (mut intercept, mut weights) = ridge_coefficients(&centered, 0.0)?;
        for _ in 0..self.max_iter {
            let errors: Vec<f64> = (0..rows)
                .map(|i| y[i] - intercept - x.row(i).dot(&weights))
                .collect();

            let mut absolute: Vec<f64> = errors.iter().map(|e| e.abs()).collect();
            let scale = (Self::median(&mut absolute) / 0.6745).max(1e-8);
            let cutoff = self.epsilon * scale;

            // Weighted solve with an explicit intercept column; rows are
            // scaled by the square root of their Huber weight.
            let mut a = Array2::zeros((rows, LAG_WINDOW + 1));
            let mut b = Array1::zeros(rows);
            for i in 0..rows {
                let error = errors[i].abs();
                let weight = if error <= cutoff { 1.0 } else { cutoff / error };
                let root = weight.sqrt();
                a[[i, 0]] = root;
                for j in 0..LAG_WINDOW {
                    a[[i, j + 1]] = root * x[[i, j]];
                }
                b[i] = root * y[i];
            }

            let mut gram = a.t().dot(&a);
            for d in 0..gram.nrows() {
                gram[[d, d]] += STABILIZER;
            }
            let solution = solve_symmetric(gram, a.t().dot(&b))?;

            let next_intercept = solution[0];
            let next_weights = solution.slice(ndarray::s![1..]).to_owned();
            let shift = (next_intercept - intercept)
                .abs()
                .max(
                    next_weights
                        .iter()
                        .zip(weights.iter())
                        .map(|(a, b)| (a - b).abs())
                        .fold(0.0, f64::max),
                );

            intercept = next_intercept;
            weights = next_weights;
            if shift < self.tolerance {
                break;
            }
        }

        LinearAutoregressor::from_fit(intercept, weights.to_vec(), residuals)
    }
}
