use time::{Date, Duration};

use tidecast_core::PriceField;

use crate::error::ForecastError;

/// A single numeric column lifted out of a price table, aligned to its
/// date index. Values are always finite; null handling happens upstream
/// during projection.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedSeries {
    pub field: PriceField,
    pub dates: Vec<Date>,
    pub values: Vec<f64>,
}

impl ProjectedSeries {
    /// Build a series, rejecting shape mismatches and non-finite values.
    pub fn new(field: PriceField, dates: Vec<Date>, values: Vec<f64>) -> Result<Self, ForecastError> {
        if dates.len() != values.len() {
            return Err(ForecastError::invalid_series(format!(
                "{} dates but {} values",
                dates.len(),
                values.len()
            )));
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::invalid_series(format!(
                "non-finite value at index {index}"
            )));
        }
        Ok(Self {
            field,
            dates,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last_date(&self) -> Option<Date> {
        self.dates.last().copied()
    }

    /// Calendar dates continuing daily past the last observation.
    pub fn future_dates(&self, horizon: usize) -> Vec<Date> {
        match self.last_date() {
            Some(last) => (1..=horizon as i64)
                .map(|offset| last + Duration::days(offset))
                .collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn dates(n: usize) -> Vec<Date> {
        (0..n as i64)
            .map(|i| date!(2024 - 01 - 01) + Duration::days(i))
            .collect()
    }

    #[test]
    fn rejects_shape_mismatch() {
        let err = ProjectedSeries::new(PriceField::Close, dates(3), vec![1.0, 2.0]);
        assert!(matches!(err, Err(ForecastError::InvalidSeries(_))));
    }

    #[test]
    fn rejects_non_finite() {
        let err = ProjectedSeries::new(PriceField::Close, dates(2), vec![1.0, f64::NAN]);
        assert!(matches!(err, Err(ForecastError::InvalidSeries(_))));
    }

    #[test]
    fn future_dates_continue_daily() {
        let series =
            ProjectedSeries::new(PriceField::Close, dates(2), vec![1.0, 2.0]).expect("valid");
        let future = series.future_dates(3);
        assert_eq!(future.len(), 3);
        assert_eq!(future[0], date!(2024 - 01 - 03));
        assert_eq!(future[2], date!(2024 - 01 - 05));
    }
}
