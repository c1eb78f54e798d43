//! Reactive selection-to-chart pipeline.
//!
//! The dashboard is one dataflow: a [`SelectionState`] drives a fetch of
//! daily history, a column projection, and two chart producers. This crate
//! holds the synchronous state machine that sequences those nodes
//! ([`PipelineState`]) and the async driver that executes them
//! ([`Orchestrator`]).
//!
//! | Module         | Responsibility |
//! |----------------|----------------|
//! | `selection`    | validated user inputs and partial updates |
//! | `nodes`        | node states, fingerprints, begin/complete tickets |
//! | `project`      | column projection with null filling |
//! | `price_chart`  | history chart rendering |
//! | `orchestrator` | async execution with deadlines |
//! | `snapshot`     | serialized dashboard view |

pub mod nodes;
pub mod orchestrator;
pub mod price_chart;
pub mod project;
pub mod selection;
pub mod snapshot;

pub use nodes::{FailureKind, NodeFailure, NodeId, NodeState, PipelineState};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use price_chart::PriceChartRenderer;
pub use project::SeriesProjector;
pub use selection::{SelectionChange, SelectionState, SUPPORTED_TICKERS};
pub use snapshot::{DashboardSnapshot, NodeReport, ProviderReport};
