//! Async driver: runs stale nodes against the provider and the forecast
//! engine, with per-node deadlines. All sequencing decisions live in
//! [`PipelineState`]; this module only performs the work it is handed.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, info_span, warn, Instrument};

use tidecast_core::{HistoryRequest, PriceProvider, ValidationError};
use tidecast_forecast::Experiment;

use crate::nodes::{FailureKind, NodeFailure, PipelineState};
use crate::price_chart::PriceChartRenderer;
use crate::project::SeriesProjector;
use crate::selection::{SelectionChange, SelectionState};
use crate::snapshot::DashboardSnapshot;

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorConfig {
    /// Deadline for one provider fetch, including its internal retries.
    pub fetch_timeout: Duration,
    /// Deadline for one model fit.
    pub forecast_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(15),
            forecast_timeout: Duration::from_secs(60),
        }
    }
}

pub struct Orchestrator {
    state: PipelineState,
    provider: Arc<dyn PriceProvider>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn PriceProvider>) -> Self {
        Self::with_config(provider, OrchestratorConfig::default())
    }

    pub fn with_config(provider: Arc<dyn PriceProvider>, config: OrchestratorConfig) -> Self {
        Self {
            state: PipelineState::default(),
            provider,
            config,
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Apply a selection change and immediately drive a refresh pass.
    pub async fn apply_change(
        &self,
        change: &SelectionChange,
    ) -> Result<SelectionState, ValidationError> {
        let selection = self.state.apply_change(change)?;
        self.refresh().await;
        Ok(selection)
    }

    /// Drive the pipeline until it settles. Each pass runs the nodes in
    /// dependency order: fetch first, then projection, then the two chart
    /// producers concurrently. Nodes that are already fresh for the
    /// current inputs are no-ops.
    ///
    /// A completion discarded because the selection moved on leaves its
    /// node `Stale` again, so a single pass is not enough: the loop keeps
    /// passing until no node hands out work, which is what guarantees the
    /// latest selection always reaches the dashboard.
    pub async fn refresh(&self) {
        loop {
            let fetched = self
                .run_fetch()
                .instrument(info_span!("node", id = "fetch"))
                .await;
            let projected = self.run_project().await;
            let (charted, forecast) = tokio::join!(
                self.run_price_chart(),
                self.run_forecast()
                    .instrument(info_span!("node", id = "forecast")),
            );
            if !(fetched || projected || charted || forecast) {
                break;
            }
        }
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        let health = self.provider.health().await;
        self.state.snapshot(self.provider.id(), health)
    }

    /// Returns whether a job was handed out, so `refresh` knows another
    /// pass may be needed.
    async fn run_fetch(&self) -> bool {
        let Some(job) = self.state.begin_fetch() else {
            return false;
        };

        let request = HistoryRequest::daily(job.symbol.clone());
        let outcome = tokio::time::timeout(self.config.fetch_timeout, self.provider.history(request))
            .await;
        let result = match outcome {
            Ok(Ok(table)) if table.is_empty() => Err(NodeFailure::new(
                FailureKind::DataUnavailable,
                format!("provider returned no rows for {}", job.symbol),
            )),
            Ok(Ok(table)) => {
                info!(symbol = %job.symbol, rows = table.len(), "fetched price history");
                Ok(table)
            }
            Ok(Err(error)) => {
                warn!(symbol = %job.symbol, %error, "fetch failed");
                Err(NodeFailure::from_provider(&error))
            }
            Err(_) => {
                warn!(symbol = %job.symbol, timeout = ?self.config.fetch_timeout, "fetch timed out");
                Err(NodeFailure::timeout(format!(
                    "fetch for {} exceeded {:?}",
                    job.symbol, self.config.fetch_timeout
                )))
            }
        };
        self.state.complete_fetch(job.ticket, result);
        true
    }

    async fn run_project(&self) -> bool {
        let Some(job) = self.state.begin_project() else {
            return false;
        };
        let result = SeriesProjector::project(&job.table, job.column);
        self.state.complete_project(job.ticket, result);
        true
    }

    async fn run_price_chart(&self) -> bool {
        let Some(job) = self.state.begin_price_chart() else {
            return false;
        };
        let spec = PriceChartRenderer::render(&job.table, job.column);
        self.state.complete_price_chart(job.ticket, Ok(spec));
        true
    }

    async fn run_forecast(&self) -> bool {
        let Some(job) = self.state.begin_forecast() else {
            return false;
        };

        // Model fits are CPU-bound; keep them off the async workers.
        let model = job.model;
        let symbol = job.symbol.clone();
        let series = job.series.clone();
        let fit =
            tokio::task::spawn_blocking(move || Experiment::new(model).run(&symbol, &series));

        let result = match tokio::time::timeout(self.config.forecast_timeout, fit).await {
            Ok(Ok(Ok(report))) => Ok(report.chart),
            Ok(Ok(Err(error))) => {
                warn!(model = %model, %error, "forecast failed");
                Err(NodeFailure::from_forecast(&error))
            }
            Ok(Err(join_error)) => Err(NodeFailure::new(
                FailureKind::ModelFitError,
                format!("fit task aborted: {join_error}"),
            )),
            Err(_) => {
                warn!(model = %model, timeout = ?self.config.forecast_timeout, "forecast timed out");
                Err(NodeFailure::timeout(format!(
                    "fit for {model} exceeded {:?}",
                    self.config.forecast_timeout
                )))
            }
        };
        self.state.complete_forecast(job.ticket, result);
        true
    }
}
