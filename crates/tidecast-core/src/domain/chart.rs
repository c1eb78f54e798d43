use serde::{Deserialize, Serialize};
use time::Date;

/// Axis description for a declarative chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axis {
    pub field: String,
    pub label: String,
}

impl Axis {
    pub fn new(field: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            label: label.into(),
        }
    }
}

/// A single dated point on a line series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub date: Date,
    pub value: f64,
}

/// A named line series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<ChartPoint>,
}

impl LineSeries {
    pub fn new(name: impl Into<String>, points: Vec<ChartPoint>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    pub fn from_values(
        name: impl Into<String>,
        dates: impl IntoIterator<Item = Date>,
        values: impl IntoIterator<Item = f64>,
    ) -> Self {
        let points = dates
            .into_iter()
            .zip(values)
            .map(|(date, value)| ChartPoint { date, value })
            .collect();
        Self::new(name, points)
    }
}

/// Declarative line-chart description handed to the rendering surface.
///
/// Chart specs are value objects: a producing node replaces the whole spec
/// on every recomputation and never mutates one in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub series: Vec<LineSeries>,
    /// Free-form producer metadata (model id, validation scores).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl ChartSpec {
    pub fn new(title: impl Into<String>, x_axis: Axis, y_axis: Axis) -> Self {
        Self {
            title: title.into(),
            x_axis,
            y_axis,
            series: Vec::new(),
            meta: None,
        }
    }

    pub fn with_series(mut self, series: LineSeries) -> Self {
        self.series.push(series);
        self
    }

    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = Some(meta);
        self
    }

    /// An empty chart is a valid, displayable state, not an error.
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|series| series.points.is_empty())
    }

    pub fn point_count(&self) -> usize {
        self.series.iter().map(|series| series.points.len()).sum()
    }
}
