//! Behavior tests for the forecast engine: the history precondition, the
//! horizon contract, determinism, and the full model list.

use tidecast_core::{ModelId, PriceField, Symbol};
use tidecast_forecast::{Experiment, ForecastConfiguration, ForecastError, ProjectedSeries};
use time::macros::date;
use time::Duration;

fn daily_series(n: usize) -> ProjectedSeries {
    const WEEKLY: [f64; 7] = [1.2, 3.1, 5.4, 4.2, 2.3, -2.2, -4.0];
    let dates = (0..n as i64)
        .map(|i| date!(2023 - 01 - 02) + Duration::days(i))
        .collect();
    let values = (0..n)
        .map(|t| {
            let drift = 0.04 * t as f64;
            let noise = ((t * 2654435761) % 100) as f64 * 0.01;
            55.0 + drift + WEEKLY[t % 7] + noise
        })
        .collect();
    ProjectedSeries::new(PriceField::AdjustedClose, dates, values).expect("valid series")
}

fn glw() -> Symbol {
    Symbol::parse("GLW").expect("valid symbol")
}

// =============================================================================
// History precondition
// =============================================================================

#[tokio::test]
async fn when_history_is_one_short_of_the_bound_no_fit_is_attempted() {
    // Given: 269 observations against a 3-fold, 90-day configuration
    let series = daily_series(269);

    // When: The experiment runs
    let result = Experiment::new(ModelId::ExpSmooth).run(&glw(), &series);

    // Then: It fails with the exact bound, before any model work
    assert_eq!(
        result,
        Err(ForecastError::InsufficientHistory {
            required: 270,
            actual: 269
        })
    );
}

#[tokio::test]
async fn when_history_meets_the_bound_the_experiment_succeeds() {
    // Given: Exactly the minimum history
    let series = daily_series(270);

    // When: The experiment runs
    let report = Experiment::new(ModelId::ExpSmooth)
        .run(&glw(), &series)
        .expect("minimum history must fit");

    // Then: The forecast spans the full horizon
    assert_eq!(report.forecast.len(), 90);
}

#[tokio::test]
async fn when_a_series_carries_non_finite_values_construction_fails() {
    // Given: A series with a NaN hole
    let dates = vec![date!(2024 - 01 - 02), date!(2024 - 01 - 03)];

    // When/Then: The series type itself refuses it
    let result = ProjectedSeries::new(PriceField::Close, dates, vec![10.0, f64::NAN]);
    assert!(matches!(result, Err(ForecastError::InvalidSeries(_))));
}

// =============================================================================
// Forecast contract
// =============================================================================

#[tokio::test]
async fn when_an_experiment_completes_the_chart_has_history_plus_horizon() {
    // Given: Two years of history
    let series = daily_series(500);

    // When: The experiment runs
    let report = Experiment::new(ModelId::Linear)
        .run(&glw(), &series)
        .expect("experiment must complete");

    // Then: One history series, one forecast series, horizon extra dates
    assert_eq!(report.chart.series.len(), 2);
    assert_eq!(report.chart.series[0].points.len(), 500);
    assert_eq!(report.chart.series[1].points.len(), 90);

    let last_observed = series.last_date().expect("last date");
    let first_forecast = report.chart.series[1].points[0].date;
    assert_eq!(first_forecast, last_observed + Duration::days(1));

    // And: Three validation folds were scored
    assert_eq!(report.cv_mae.len(), 3);
    assert!(report.cv_mae.iter().all(|mae| mae.is_finite() && *mae >= 0.0));
}

#[tokio::test]
async fn when_the_same_inputs_run_twice_the_reports_are_identical() {
    // Given: A fixed series and model
    let series = daily_series(420);

    // When: The experiment runs twice
    let first = Experiment::new(ModelId::Huber)
        .run(&glw(), &series)
        .expect("first run");
    let second = Experiment::new(ModelId::Huber)
        .run(&glw(), &series)
        .expect("second run");

    // Then: Forecasts, scores, and charts all match exactly
    assert_eq!(first, second);
}

#[tokio::test]
async fn when_prices_trend_upward_the_forecast_stays_positive_and_finite() {
    // Given: A positive, trending series
    let series = daily_series(500);

    // When: The default model runs
    let report = Experiment::new(ModelId::ExpSmooth)
        .run(&glw(), &series)
        .expect("experiment must complete");

    // Then: The log transform round-trips into positive prices
    assert!(report.forecast.iter().all(|v| v.is_finite() && *v > 0.0));
}

// =============================================================================
// Model list
// =============================================================================

#[tokio::test]
async fn when_each_of_the_nine_models_runs_all_produce_full_forecasts() {
    // Given: A series long enough for every fold
    let series = daily_series(450);

    for model in ModelId::ALL {
        // When: The model runs
        let report = Experiment::new(model)
            .run(&glw(), &series)
            .unwrap_or_else(|e| panic!("{} failed: {e}", model.as_str()));

        // Then: The full horizon comes back finite, tagged with the model
        assert_eq!(report.forecast.len(), 90, "{}", model.as_str());
        assert!(
            report.forecast.iter().all(|v| v.is_finite()),
            "{} produced non-finite values",
            model.as_str()
        );
        let meta = report.chart.meta.expect("chart meta");
        assert_eq!(meta["model"], model.as_str());
    }
}

#[tokio::test]
async fn when_configuration_is_inspected_the_constants_match_the_dashboard() {
    // The dashboard runs 3 folds over a 90-day horizon; the precondition
    // multiplies out to 270 observations.
    let config = ForecastConfiguration::default();
    assert_eq!(config.horizon, 90);
    assert_eq!(config.cv_folds, 3);
    assert_eq!(config.required_history(), 270);
}
