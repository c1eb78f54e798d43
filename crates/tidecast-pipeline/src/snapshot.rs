//! Dashboard snapshot: the serialized view of the whole pipeline at one
//! point in time, consumed by the HTTP surface.

use serde::Serialize;

use tidecast_core::{ChartSpec, HealthStatus};

use crate::nodes::{NodeId, NodeState, PipelineState};
use crate::selection::SelectionState;

#[derive(Debug, Clone, Serialize)]
pub struct NodeReport {
    pub id: NodeId,
    #[serde(flatten)]
    pub state: NodeState,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderReport {
    pub id: String,
    pub health: HealthStatus,
}

/// Point-in-time view of the pipeline. Charts are present only while
/// their producing node is fresh; a failed forecast surfaces through its
/// node report instead, and the price chart is unaffected by it.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub selection: SelectionState,
    pub display: String,
    pub nodes: Vec<NodeReport>,
    pub price_chart: Option<ChartSpec>,
    pub forecast_chart: Option<ChartSpec>,
    pub provider: ProviderReport,
}

impl PipelineState {
    pub fn snapshot(&self, provider_id: &str, health: HealthStatus) -> DashboardSnapshot {
        let inner = self.lock_inner();
        let nodes = vec![
            NodeReport {
                id: NodeId::Fetch,
                state: inner.fetch.clone(),
            },
            NodeReport {
                id: NodeId::Project,
                state: inner.project.clone(),
            },
            NodeReport {
                id: NodeId::PriceChart,
                state: inner.price_chart.clone(),
            },
            NodeReport {
                id: NodeId::Forecast,
                state: inner.forecast.clone(),
            },
        ];

        DashboardSnapshot {
            selection: inner.selection.clone(),
            display: inner.selection.display_line(),
            price_chart: inner
                .price_chart
                .is_fresh()
                .then(|| inner.price_chart_spec.clone())
                .flatten(),
            forecast_chart: inner
                .forecast
                .is_fresh()
                .then(|| inner.forecast_chart_spec.clone())
                .flatten(),
            nodes,
            provider: ProviderReport {
                id: provider_id.to_owned(),
                health,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_snapshot_has_no_charts() {
        let state = PipelineState::default();
        let snapshot = state.snapshot("yahoo", HealthStatus::healthy());

        assert_eq!(snapshot.display, "Selected Equity: GLW");
        assert!(snapshot.price_chart.is_none());
        assert!(snapshot.forecast_chart.is_none());
        assert_eq!(snapshot.nodes.len(), 4);
        assert!(snapshot
            .nodes
            .iter()
            .all(|node| node.state == NodeState::Stale));
    }

    #[test]
    fn snapshot_serializes_failure_details() {
        let state = PipelineState::default();
        let job = state.begin_fetch().expect("fetch job");
        state.complete_fetch(
            job.ticket,
            Err(crate::nodes::NodeFailure::new(
                crate::nodes::FailureKind::DataUnavailable,
                "no rows",
            )),
        );

        let snapshot = state.snapshot("yahoo", HealthStatus::healthy());
        let json = serde_json::to_value(&snapshot).expect("serializes");
        let fetch = &json["nodes"][0];
        assert_eq!(fetch["id"], "fetch");
        assert_eq!(fetch["state"], "failed");
        assert_eq!(fetch["kind"], "data_unavailable");
        assert_eq!(fetch["message"], "no rows");
    }
}
