//! History chart rendering: the selected column over the full table.

use tidecast_core::{Axis, ChartSpec, LineSeries, PriceField, PriceTable};

pub struct PriceChartRenderer;

impl PriceChartRenderer {
    /// Render the equity graph for one column. An empty table renders an
    /// empty spec; that is a valid, displayable chart, not an error.
    /// Null cells are simply omitted from the line.
    pub fn render(table: &PriceTable, column: PriceField) -> ChartSpec {
        let label = column.label();
        let mut spec = ChartSpec::new(
            format!("Equity Graph: {label}"),
            Axis::new("date", "Date"),
            Axis::new(column.as_str(), label),
        );

        let points: Vec<_> = table
            .rows()
            .iter()
            .filter_map(|row| {
                row.cell(column).map(|value| tidecast_core::ChartPoint {
                    date: row.date,
                    value,
                })
            })
            .collect();
        spec = spec.with_series(LineSeries::new("history", points));
        spec
    }
}
