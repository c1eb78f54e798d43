//! Column projection: lift one price column out of the table as a dense
//! numeric series for charting and forecasting.

use tidecast_core::{PriceField, PriceTable};
use tidecast_forecast::ProjectedSeries;

use crate::nodes::NodeFailure;

pub struct SeriesProjector;

impl SeriesProjector {
    /// Project a canonical column.
    ///
    /// Sporadic nulls are forward-filled, and leading nulls take the first
    /// observed value, so the result is dense. A column with no
    /// observations at all fails with `ColumnUnavailable`.
    pub fn project(table: &PriceTable, column: PriceField) -> Result<ProjectedSeries, NodeFailure> {
        let cells = table.column(column);
        let first_observed = cells.iter().flatten().next().copied().ok_or_else(|| {
            NodeFailure::column_unavailable(format!(
                "column {column} of {} has no observations",
                table.symbol()
            ))
        })?;

        let mut values = Vec::with_capacity(cells.len());
        let mut last = first_observed;
        for cell in cells {
            if let Some(value) = cell {
                last = value;
            }
            values.push(last);
        }

        ProjectedSeries::new(column, table.dates().collect(), values).map_err(|error| {
            NodeFailure::column_unavailable(format!("column {column} is not projectable: {error}"))
        })
    }
}
