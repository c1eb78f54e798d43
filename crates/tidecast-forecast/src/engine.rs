//! Forecast experiment engine.
//!
//! Every run builds a fresh [`Experiment`]: validate the series length,
//! decompose, cross-validate the selected model over expanding windows,
//! refit on the full series, and emit a forecast chart. Nothing is shared
//! between runs and nothing is seeded, so identical inputs always produce
//! identical output.

use serde_json::json;
use tracing::{debug, info};

use tidecast_core::{Axis, ChartSpec, LineSeries, ModelId, Symbol};

use crate::error::ForecastError;
use crate::models::{for_model, TrainedModel};
use crate::series::ProjectedSeries;
use crate::transform::Decomposition;

/// Fixed experiment constants. Not user-configurable from the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastConfiguration {
    /// Days to forecast past the last observation.
    pub horizon: usize,
    /// Expanding-window validation folds, each one horizon long.
    pub cv_folds: usize,
}

impl Default for ForecastConfiguration {
    fn default() -> Self {
        Self {
            horizon: 90,
            cv_folds: 3,
        }
    }
}

impl ForecastConfiguration {
    /// Minimum observations before any model fit is attempted.
    pub const fn required_history(&self) -> usize {
        self.cv_folds * self.horizon
    }
}

/// Outcome of a completed experiment.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastReport {
    pub model: ModelId,
    pub forecast: Vec<f64>,
    /// Mean absolute error per validation fold, original scale.
    pub cv_mae: Vec<f64>,
    pub chart: ChartSpec,
}

/// One forecasting run for a fixed (series, model) pair.
#[derive(Debug, Clone)]
pub struct Experiment {
    config: ForecastConfiguration,
    model: ModelId,
}

impl Experiment {
    pub fn new(model: ModelId) -> Self {
        Self {
            config: ForecastConfiguration::default(),
            model,
        }
    }

    pub fn with_config(model: ModelId, config: ForecastConfiguration) -> Self {
        Self { config, model }
    }

    /// Decompose, fit, and extend one training window by `horizon` steps,
    /// returning forecasts on the original scale.
    fn fit_window(&self, values: &[f64], horizon: usize) -> Result<Vec<f64>, ForecastError> {
        let decomposition = Decomposition::fit(values)?;
        let trained: Box<dyn TrainedModel> = for_model(self.model).fit(decomposition.residuals())?;
        let restored = decomposition.restore(&trained.forecast(horizon));
        if restored.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::model_fit(
                "forecast left the finite range after inverse transform",
            ));
        }
        Ok(restored)
    }

    /// Expanding-window cross-validation: fold `k` trains on everything
    /// before the `cv_folds - k` trailing horizons and scores the next one.
    /// Folds whose training window is too short for the model are skipped.
    fn cross_validate(&self, series: &ProjectedSeries) -> Vec<f64> {
        let horizon = self.config.horizon;
        let n = series.len();
        let mut scores = Vec::with_capacity(self.config.cv_folds);

        for fold in 0..self.config.cv_folds {
            let train_len = n - (self.config.cv_folds - fold) * horizon;
            let actual = &series.values[train_len..train_len + horizon];

            match self.fit_window(&series.values[..train_len], horizon) {
                Ok(predicted) => {
                    let mae = predicted
                        .iter()
                        .zip(actual)
                        .map(|(p, a)| (p - a).abs())
                        .sum::<f64>()
                        / horizon as f64;
                    scores.push(mae);
                }
                Err(error) => {
                    debug!(fold, %error, "skipping validation fold");
                }
            }
        }
        scores
    }

    /// Run the full experiment.
    ///
    /// # Errors
    ///
    /// - [`ForecastError::InsufficientHistory`] when the series is shorter
    ///   than `cv_folds * horizon`; no fit is attempted.
    /// - [`ForecastError::ModelFit`] when the final fit fails or produces
    ///   non-finite values.
    pub fn run(
        &self,
        symbol: &Symbol,
        series: &ProjectedSeries,
    ) -> Result<ForecastReport, ForecastError> {
        let required = self.config.required_history();
        if series.len() < required {
            return Err(ForecastError::InsufficientHistory {
                required,
                actual: series.len(),
            });
        }

        let cv_mae = self.cross_validate(series);
        let forecast = self.fit_window(&series.values, self.config.horizon)?;

        info!(
            %symbol,
            model = self.model.as_str(),
            observations = series.len(),
            folds_scored = cv_mae.len(),
            "forecast experiment complete"
        );

        let chart = self.chart(symbol, series, &forecast, &cv_mae);
        Ok(ForecastReport {
            model: self.model,
            forecast,
            cv_mae,
            chart,
        })
    }

    fn chart(
        &self,
        symbol: &Symbol,
        series: &ProjectedSeries,
        forecast: &[f64],
        cv_mae: &[f64],
    ) -> ChartSpec {
        let label = series.field.label();
        ChartSpec::new(
            format!("{}-Day Forecast: {symbol} {label}", self.config.horizon),
            Axis::new("date", "Date"),
            Axis::new(series.field.as_str(), label),
        )
        .with_series(LineSeries::from_values(
            "history",
            series.dates.iter().copied(),
            series.values.iter().copied(),
        ))
        .with_series(LineSeries::from_values(
            "forecast",
            series.future_dates(self.config.horizon),
            forecast.iter().copied(),
        ))
        .with_meta(json!({
            "model": self.model.as_str(),
            "cv_mae": cv_mae,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidecast_core::PriceField;
    use time::macros::date;
    use time::Duration;

    fn series(n: usize) -> ProjectedSeries {
        const WEEKLY: [f64; 7] = [1.0, 3.0, 5.0, 4.0, 2.0, -2.0, -4.0];
        let dates = (0..n as i64)
            .map(|i| date!(2023 - 01 - 02) + Duration::days(i))
            .collect();
        let values = (0..n)
            .map(|t| 60.0 + 0.05 * t as f64 + WEEKLY[t % 7])
            .collect();
        ProjectedSeries::new(PriceField::AdjustedClose, dates, values).expect("valid series")
    }

    fn symbol() -> Symbol {
        Symbol::parse("GLW").expect("symbol")
    }

    #[test]
    fn short_history_fails_before_any_fit() {
        let result = Experiment::new(ModelId::ExpSmooth).run(&symbol(), &series(269));
        assert_eq!(
            result,
            Err(ForecastError::InsufficientHistory {
                required: 270,
                actual: 269
            })
        );
    }

    #[test]
    fn boundary_length_is_accepted() {
        // 270 observations leaves the first fold without a training window,
        // so it is skipped, but the experiment itself succeeds.
        let report = Experiment::new(ModelId::ExpSmooth)
            .run(&symbol(), &series(270))
            .expect("report");
        assert_eq!(report.forecast.len(), 90);
        assert!(report.cv_mae.len() < 3);
    }

    #[test]
    fn chart_carries_history_and_forecast_series() {
        let input = series(500);
        let report = Experiment::new(ModelId::Linear)
            .run(&symbol(), &input)
            .expect("report");

        assert_eq!(report.chart.series.len(), 2);
        assert_eq!(report.chart.series[0].name, "history");
        assert_eq!(report.chart.series[0].points.len(), 500);
        assert_eq!(report.chart.series[1].name, "forecast");
        assert_eq!(report.chart.series[1].points.len(), 90);

        // Forecast dates continue daily past the last observation.
        let last = input.last_date().expect("last date");
        assert_eq!(
            report.chart.series[1].points[0].date,
            last + Duration::days(1)
        );

        let meta = report.chart.meta.as_ref().expect("meta");
        assert_eq!(meta["model"], "lr_cds_dt");
        assert_eq!(report.cv_mae.len(), 3);
    }

    #[test]
    fn identical_inputs_give_identical_reports() {
        let input = series(400);
        let run = || {
            Experiment::new(ModelId::Ridge)
                .run(&symbol(), &input)
                .expect("report")
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn every_model_completes_on_a_regular_series() {
        let input = series(450);
        for id in ModelId::ALL {
            let report = Experiment::new(id).run(&symbol(), &input).expect("report");
            assert_eq!(report.forecast.len(), 90, "model {}", id.as_str());
            assert!(report.forecast.iter().all(|v| v.is_finite()));
        }
    }
}
