//! Synchronous pipeline state core.
//!
//! Four nodes derive from the selection: `Fetch` pulls the price table,
//! `Project` lifts the chosen column, `PriceChart` renders history, and
//! `Forecast` fits the chosen model. [`PipelineState`] tracks one state
//! per node plus the fingerprint of the inputs that produced its current
//! value, which is what gives the three orchestration guarantees:
//!
//! 1. A node recomputes at most once per distinct input combination:
//!    `begin_*` hands out a job only when the node is `Stale`.
//! 2. Dependency order: `begin_*` requires every upstream node `Fresh`.
//! 3. Stale-result suppression: a job carries a ticket with the inputs it
//!    was started for; `complete_*` discards results whose ticket no
//!    longer matches the current inputs.
//!
//! All methods take the internal lock briefly and never block on IO; the
//! async driver lives in [`crate::orchestrator`].

use std::sync::Mutex;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use tidecast_core::{
    ChartSpec, ModelId, PriceField, PriceTable, ProviderError, ProviderErrorKind, Symbol,
    ValidationError,
};
use tidecast_forecast::{ForecastError, ProjectedSeries};

use crate::selection::{SelectionChange, SelectionState};

/// The four pipeline nodes, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeId {
    Fetch,
    Project,
    PriceChart,
    Forecast,
}

impl NodeId {
    pub const ALL: [Self; 4] = [Self::Fetch, Self::Project, Self::PriceChart, Self::Forecast];

    pub const fn dependencies(self) -> &'static [NodeId] {
        match self {
            Self::Fetch => &[],
            Self::Project => &[Self::Fetch],
            Self::PriceChart => &[Self::Fetch],
            Self::Forecast => &[Self::Project],
        }
    }
}

/// Failure classification surfaced on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    DataUnavailable,
    ProviderError,
    ColumnUnavailable,
    InsufficientHistory,
    ModelFitError,
    Timeout,
}

/// A recorded node failure. Failures are local: the failed node reports,
/// dependents simply stay `Stale`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct NodeFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl NodeFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Timeout, message)
    }

    pub fn column_unavailable(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ColumnUnavailable, message)
    }

    pub fn from_provider(error: &ProviderError) -> Self {
        let kind = match error.kind() {
            ProviderErrorKind::NotFound => FailureKind::DataUnavailable,
            ProviderErrorKind::Timeout => FailureKind::Timeout,
            _ => FailureKind::ProviderError,
        };
        Self::new(kind, error.to_string())
    }

    pub fn from_forecast(error: &ForecastError) -> Self {
        let kind = match error {
            ForecastError::InsufficientHistory { .. } => FailureKind::InsufficientHistory,
            ForecastError::InvalidSeries(_) | ForecastError::ModelFit(_) => {
                FailureKind::ModelFitError
            }
        };
        Self::new(kind, error.to_string())
    }
}

/// Per-node lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NodeState {
    Stale,
    Computing,
    Fresh,
    Failed {
        #[serde(flatten)]
        failure: NodeFailure,
    },
}

impl NodeState {
    pub const fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh)
    }

    pub const fn is_computing(&self) -> bool {
        matches!(self, Self::Computing)
    }
}

// Input fingerprints. The table version is a monotonic id bumped on every
// accepted fetch, so downstream fingerprints change with the data.
type ProjectInputs = (u64, PriceField);
type ForecastInputs = (u64, PriceField, ModelId);

/// Ticket for an in-flight fetch. Not cloneable; surrendering it to
/// `complete_fetch` is the only way to finish the computation.
#[derive(Debug)]
pub struct FetchTicket {
    symbol: Symbol,
}

#[derive(Debug)]
pub struct ProjectTicket {
    inputs: ProjectInputs,
}

#[derive(Debug)]
pub struct PriceChartTicket {
    inputs: ProjectInputs,
}

#[derive(Debug)]
pub struct ForecastTicket {
    inputs: ForecastInputs,
}

/// Work handed to the driver by `begin_fetch`.
#[derive(Debug)]
pub struct FetchJob {
    pub ticket: FetchTicket,
    pub symbol: Symbol,
}

#[derive(Debug)]
pub struct ProjectJob {
    pub ticket: ProjectTicket,
    pub table: PriceTable,
    pub column: PriceField,
}

#[derive(Debug)]
pub struct PriceChartJob {
    pub ticket: PriceChartTicket,
    pub table: PriceTable,
    pub column: PriceField,
}

#[derive(Debug)]
pub struct ForecastJob {
    pub ticket: ForecastTicket,
    pub symbol: Symbol,
    pub series: ProjectedSeries,
    pub model: ModelId,
}

pub(crate) struct Inner {
    pub(crate) selection: SelectionState,
    pub(crate) fetch: NodeState,
    pub(crate) project: NodeState,
    pub(crate) price_chart: NodeState,
    pub(crate) forecast: NodeState,
    pub(crate) table: Option<PriceTable>,
    pub(crate) table_version: u64,
    pub(crate) series: Option<ProjectedSeries>,
    pub(crate) price_chart_spec: Option<ChartSpec>,
    pub(crate) forecast_chart_spec: Option<ChartSpec>,
    done_fetch: Option<Symbol>,
    done_project: Option<ProjectInputs>,
    done_price_chart: Option<ProjectInputs>,
    done_forecast: Option<ForecastInputs>,
}

impl Inner {
    fn project_inputs(&self) -> ProjectInputs {
        (self.table_version, self.selection.price_column)
    }

    fn forecast_inputs(&self) -> ForecastInputs {
        (
            self.table_version,
            self.selection.price_column,
            self.selection.model,
        )
    }

    /// Re-derive staleness after an input change: any settled node whose
    /// recorded inputs no longer match the current ones goes back to
    /// `Stale`. Computing nodes are left alone; their completion ticket
    /// will be rejected instead.
    fn mark_stale_on_input_change(&mut self) {
        if !self.fetch.is_computing() && self.done_fetch.as_ref() != Some(&self.selection.ticker) {
            self.fetch = NodeState::Stale;
        }
        let project_inputs = self.project_inputs();
        if !self.project.is_computing() && self.done_project != Some(project_inputs) {
            self.project = NodeState::Stale;
        }
        if !self.price_chart.is_computing() && self.done_price_chart != Some(project_inputs) {
            self.price_chart = NodeState::Stale;
        }
        if !self.forecast.is_computing() && self.done_forecast != Some(self.forecast_inputs()) {
            self.forecast = NodeState::Stale;
        }
    }
}

/// Lock-protected pipeline state shared between the driver and the HTTP
/// surface.
pub struct PipelineState {
    inner: Mutex<Inner>,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new(SelectionState::default())
    }
}

impl PipelineState {
    pub fn new(selection: SelectionState) -> Self {
        Self {
            inner: Mutex::new(Inner {
                selection,
                fetch: NodeState::Stale,
                project: NodeState::Stale,
                price_chart: NodeState::Stale,
                forecast: NodeState::Stale,
                table: None,
                table_version: 0,
                series: None,
                price_chart_spec: None,
                forecast_chart_spec: None,
                done_fetch: None,
                done_project: None,
                done_price_chart: None,
                done_forecast: None,
            }),
        }
    }

    pub(crate) fn lock_inner(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("pipeline state lock is not poisoned")
    }

    pub fn selection(&self) -> SelectionState {
        self.lock_inner().selection.clone()
    }

    /// Apply a partial selection change. Validation failures leave the
    /// pipeline untouched.
    pub fn apply_change(&self, change: &SelectionChange) -> Result<SelectionState, ValidationError> {
        let mut inner = self.lock_inner();
        let next = inner.selection.apply(change)?;
        if next != inner.selection {
            debug!(ticker = %next.ticker, column = %next.price_column, model = %next.model,
                "selection changed");
            inner.selection = next.clone();
            inner.mark_stale_on_input_change();
        }
        Ok(next)
    }

    pub fn node(&self, id: NodeId) -> NodeState {
        let inner = self.lock_inner();
        match id {
            NodeId::Fetch => inner.fetch.clone(),
            NodeId::Project => inner.project.clone(),
            NodeId::PriceChart => inner.price_chart.clone(),
            NodeId::Forecast => inner.forecast.clone(),
        }
    }

    /// Start the fetch node if it is stale. Returns `None` when the node
    /// is already settled for the current ticker or a fetch is in flight.
    pub fn begin_fetch(&self) -> Option<FetchJob> {
        let mut inner = self.lock_inner();
        if inner.fetch != NodeState::Stale {
            return None;
        }
        let symbol = inner.selection.ticker.clone();
        inner.fetch = NodeState::Computing;
        Some(FetchJob {
            ticket: FetchTicket {
                symbol: symbol.clone(),
            },
            symbol,
        })
    }

    /// Finish a fetch. Returns `false` when the result was discarded
    /// because the selection moved on while it was in flight.
    pub fn complete_fetch(
        &self,
        ticket: FetchTicket,
        result: Result<PriceTable, NodeFailure>,
    ) -> bool {
        let mut inner = self.lock_inner();
        if ticket.symbol != inner.selection.ticker {
            debug!(stale = %ticket.symbol, current = %inner.selection.ticker,
                "discarding stale fetch result");
            if inner.fetch.is_computing() {
                inner.fetch = NodeState::Stale;
            }
            return false;
        }
        if !inner.fetch.is_computing() {
            return false;
        }

        inner.done_fetch = Some(ticket.symbol);
        match result {
            Ok(table) => {
                inner.table = Some(table);
                inner.table_version += 1;
                inner.fetch = NodeState::Fresh;
            }
            Err(failure) => {
                inner.fetch = NodeState::Failed { failure };
            }
        }
        inner.mark_stale_on_input_change();
        true
    }

    pub fn begin_project(&self) -> Option<ProjectJob> {
        let mut inner = self.lock_inner();
        if inner.project != NodeState::Stale || !inner.fetch.is_fresh() {
            return None;
        }
        let table = inner.table.clone()?;
        let inputs = inner.project_inputs();
        inner.project = NodeState::Computing;
        Some(ProjectJob {
            ticket: ProjectTicket { inputs },
            table,
            column: inputs.1,
        })
    }

    pub fn complete_project(
        &self,
        ticket: ProjectTicket,
        result: Result<ProjectedSeries, NodeFailure>,
    ) -> bool {
        let mut inner = self.lock_inner();
        if ticket.inputs != inner.project_inputs() {
            if inner.project.is_computing() {
                inner.project = NodeState::Stale;
            }
            return false;
        }
        if !inner.project.is_computing() {
            return false;
        }

        inner.done_project = Some(ticket.inputs);
        match result {
            Ok(series) => {
                inner.series = Some(series);
                inner.project = NodeState::Fresh;
            }
            Err(failure) => {
                inner.project = NodeState::Failed { failure };
            }
        }
        true
    }

    pub fn begin_price_chart(&self) -> Option<PriceChartJob> {
        let mut inner = self.lock_inner();
        if inner.price_chart != NodeState::Stale || !inner.fetch.is_fresh() {
            return None;
        }
        let table = inner.table.clone()?;
        let inputs = inner.project_inputs();
        inner.price_chart = NodeState::Computing;
        Some(PriceChartJob {
            ticket: PriceChartTicket { inputs },
            table,
            column: inputs.1,
        })
    }

    pub fn complete_price_chart(
        &self,
        ticket: PriceChartTicket,
        result: Result<ChartSpec, NodeFailure>,
    ) -> bool {
        let mut inner = self.lock_inner();
        if ticket.inputs != inner.project_inputs() {
            if inner.price_chart.is_computing() {
                inner.price_chart = NodeState::Stale;
            }
            return false;
        }
        if !inner.price_chart.is_computing() {
            return false;
        }

        inner.done_price_chart = Some(ticket.inputs);
        match result {
            Ok(spec) => {
                inner.price_chart_spec = Some(spec);
                inner.price_chart = NodeState::Fresh;
            }
            Err(failure) => {
                inner.price_chart = NodeState::Failed { failure };
            }
        }
        true
    }

    pub fn begin_forecast(&self) -> Option<ForecastJob> {
        let mut inner = self.lock_inner();
        if inner.forecast != NodeState::Stale || !inner.project.is_fresh() {
            return None;
        }
        let series = inner.series.clone()?;
        let inputs = inner.forecast_inputs();
        inner.forecast = NodeState::Computing;
        Some(ForecastJob {
            ticket: ForecastTicket { inputs },
            symbol: inner.selection.ticker.clone(),
            series,
            model: inputs.2,
        })
    }

    pub fn complete_forecast(
        &self,
        ticket: ForecastTicket,
        result: Result<ChartSpec, NodeFailure>,
    ) -> bool {
        let mut inner = self.lock_inner();
        if ticket.inputs != inner.forecast_inputs() {
            debug!("discarding stale forecast result");
            if inner.forecast.is_computing() {
                inner.forecast = NodeState::Stale;
            }
            return false;
        }
        if !inner.forecast.is_computing() {
            return false;
        }

        inner.done_forecast = Some(ticket.inputs);
        match result {
            Ok(spec) => {
                inner.forecast_chart_spec = Some(spec);
                inner.forecast = NodeState::Fresh;
            }
            Err(failure) => {
                inner.forecast = NodeState::Failed { failure };
            }
        }
        true
    }
}
