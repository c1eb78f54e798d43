//! Behavior tests for the selection-to-chart pipeline.
//!
//! These verify the three orchestration guarantees end to end: dependency
//! order, at-most-once recomputation per input combination, and discard of
//! results that arrive after the selection has moved on.

use std::sync::Arc;
use std::time::Duration;

use tidecast_core::{ModelId, PriceField, ProviderError, YahooDailyAdapter};
use tidecast_pipeline::{
    FailureKind, NodeId, NodeState, Orchestrator, OrchestratorConfig, PipelineState,
    SelectionChange,
};
use tidecast_tests::{table_without_volume, FailingProvider, PendingProvider, SlowProvider};

fn mock_orchestrator() -> Orchestrator {
    Orchestrator::new(Arc::new(YahooDailyAdapter::default()))
}

// =============================================================================
// Dependency order and settlement
// =============================================================================

#[tokio::test]
async fn when_refresh_runs_every_node_settles_fresh() {
    // Given: A pipeline over the deterministic provider
    let orchestrator = mock_orchestrator();

    // When: One refresh pass runs
    orchestrator.refresh().await;

    // Then: All four nodes are fresh and both charts exist
    for id in NodeId::ALL {
        assert!(
            orchestrator.state().node(id).is_fresh(),
            "{id:?} should be fresh after refresh"
        );
    }
    let snapshot = orchestrator.snapshot().await;
    assert!(snapshot.price_chart.is_some());
    assert!(snapshot.forecast_chart.is_some());
    assert_eq!(snapshot.display, "Selected Equity: GLW");
}

#[tokio::test]
async fn when_dependencies_are_stale_downstream_nodes_do_not_start() {
    // Given: A pipeline that has never fetched
    let state = PipelineState::default();

    // When/Then: No downstream node hands out work
    assert!(state.begin_project().is_none());
    assert!(state.begin_price_chart().is_none());
    assert!(state.begin_forecast().is_none());
}

// =============================================================================
// At-most-once recomputation
// =============================================================================

#[tokio::test]
async fn when_inputs_are_unchanged_refresh_recomputes_nothing() {
    // Given: A fully settled pipeline
    let orchestrator = mock_orchestrator();
    orchestrator.refresh().await;
    let first = orchestrator.snapshot().await;

    // When: Refresh runs again without any selection change
    orchestrator.refresh().await;
    let second = orchestrator.snapshot().await;

    // Then: The charts are byte-for-byte the same values
    assert_eq!(first.price_chart, second.price_chart);
    assert_eq!(first.forecast_chart, second.forecast_chart);
}

#[tokio::test]
async fn when_only_the_model_changes_the_fetch_and_price_chart_survive() {
    // Given: A settled pipeline on the default selection
    let orchestrator = mock_orchestrator();
    orchestrator.refresh().await;
    let before = orchestrator.snapshot().await;

    // When: The user picks a different model
    orchestrator
        .apply_change(&SelectionChange {
            model: Some(ModelId::Ridge),
            ..SelectionChange::default()
        })
        .await
        .expect("valid change");
    let after = orchestrator.snapshot().await;

    // Then: Only the forecast was recomputed
    assert_eq!(before.price_chart, after.price_chart);
    let meta = after.forecast_chart.expect("forecast chart").meta;
    assert_eq!(meta.expect("meta")["model"], "ridge_cds_dt");
}

#[tokio::test]
async fn when_a_node_fails_it_is_not_retried_for_the_same_inputs() {
    // Given: A provider that always reports the ticker missing
    let orchestrator = Orchestrator::new(Arc::new(FailingProvider {
        error: ProviderError::not_found("no such ticker"),
    }));
    orchestrator.refresh().await;

    // When: Another refresh runs with the same selection
    orchestrator.refresh().await;

    // Then: The fetch stays failed rather than hammering the provider
    match orchestrator.state().node(NodeId::Fetch) {
        NodeState::Failed { failure } => {
            assert_eq!(failure.kind, FailureKind::DataUnavailable);
        }
        other => panic!("expected failed fetch, got {other:?}"),
    }
    assert!(orchestrator.state().begin_fetch().is_none());
}

// =============================================================================
// Failure isolation
// =============================================================================

#[tokio::test]
async fn when_the_fetch_fails_dependents_stay_stale_and_serving_continues() {
    // Given: An unreachable provider
    let orchestrator = Orchestrator::new(Arc::new(FailingProvider {
        error: ProviderError::unavailable("upstream down"),
    }));

    // When: A refresh pass runs
    orchestrator.refresh().await;

    // Then: Only the fetch failed; dependents never started
    match orchestrator.state().node(NodeId::Fetch) {
        NodeState::Failed { failure } => {
            assert_eq!(failure.kind, FailureKind::ProviderError);
        }
        other => panic!("expected failed fetch, got {other:?}"),
    }
    assert_eq!(orchestrator.state().node(NodeId::Project), NodeState::Stale);
    assert_eq!(orchestrator.state().node(NodeId::Forecast), NodeState::Stale);

    // And: Snapshots still serve, with the failure spelled out
    let snapshot = orchestrator.snapshot().await;
    assert!(snapshot.price_chart.is_none());
    let json = serde_json::to_value(&snapshot).expect("serializes");
    assert_eq!(json["nodes"][0]["state"], "failed");
    assert_eq!(json["nodes"][0]["kind"], "provider_error");
}

#[tokio::test]
async fn when_the_fetch_exceeds_its_deadline_the_node_fails_with_timeout() {
    // Given: A provider that never answers and a short deadline
    let orchestrator = Orchestrator::with_config(
        Arc::new(PendingProvider),
        OrchestratorConfig {
            fetch_timeout: Duration::from_millis(20),
            forecast_timeout: Duration::from_secs(5),
        },
    );

    // When: A refresh pass runs
    orchestrator.refresh().await;

    // Then: The fetch failed with a timeout and dependents stayed stale
    match orchestrator.state().node(NodeId::Fetch) {
        NodeState::Failed { failure } => assert_eq!(failure.kind, FailureKind::Timeout),
        other => panic!("expected timed-out fetch, got {other:?}"),
    }
    assert_eq!(orchestrator.state().node(NodeId::Project), NodeState::Stale);
}

#[tokio::test]
async fn when_the_selected_column_is_all_null_only_projection_fails() {
    // Given: A fetched table whose volume column is entirely null, with
    // volume selected
    let state = PipelineState::default();
    state
        .apply_change(&SelectionChange {
            price_column: Some(PriceField::Volume),
            ..SelectionChange::default()
        })
        .expect("valid change");

    let fetch = state.begin_fetch().expect("fetch job");
    assert!(state.complete_fetch(fetch.ticket, Ok(table_without_volume("GLW", 400))));

    // When: The projection runs
    let job = state.begin_project().expect("project job");
    let result = tidecast_pipeline::SeriesProjector::project(&job.table, job.column);
    let failure = result.expect_err("all-null column must fail");
    state.complete_project(job.ticket, Err(failure));

    // Then: Project failed with ColumnUnavailable, fetch stays fresh, and
    // the forecast never starts
    match state.node(NodeId::Project) {
        NodeState::Failed { failure } => {
            assert_eq!(failure.kind, FailureKind::ColumnUnavailable);
        }
        other => panic!("expected failed projection, got {other:?}"),
    }
    assert!(state.node(NodeId::Fetch).is_fresh());
    assert!(state.begin_forecast().is_none());
}

// =============================================================================
// Stale-result suppression
// =============================================================================

#[tokio::test]
async fn when_the_ticker_changes_mid_fetch_the_late_result_is_discarded() {
    // Given: A fetch in flight for the default ticker
    let state = PipelineState::default();
    let job = state.begin_fetch().expect("fetch job");

    // When: The user switches tickers before the fetch lands
    state
        .apply_change(&SelectionChange {
            ticker: Some("TSLA".into()),
            ..SelectionChange::default()
        })
        .expect("valid change");
    let accepted = state.complete_fetch(job.ticket, Ok(table_without_volume("GLW", 400)));

    // Then: The stale table is dropped and the node is ready to refetch
    assert!(!accepted);
    assert_eq!(state.node(NodeId::Fetch), NodeState::Stale);
    let refetch = state.begin_fetch().expect("fresh fetch job");
    assert_eq!(refetch.symbol.as_str(), "TSLA");
}

#[tokio::test]
async fn when_the_ticker_changes_during_a_refresh_the_new_ticker_still_lands() {
    // Given: A refresh in flight against a slow provider
    let orchestrator = Arc::new(Orchestrator::new(Arc::new(SlowProvider::new(
        Duration::from_millis(50),
    ))));
    let driver = Arc::clone(&orchestrator);
    let inflight = tokio::spawn(async move { driver.refresh().await });

    // When: The ticker switches while the first fetch is still out
    tokio::time::sleep(Duration::from_millis(10)).await;
    orchestrator
        .apply_change(&SelectionChange {
            ticker: Some("TSLA".into()),
            ..SelectionChange::default()
        })
        .await
        .expect("valid change");
    inflight.await.expect("refresh task");

    // Then: The superseded result was discarded and the driver re-ran the
    // fetch, so the settled dashboard shows the new ticker
    assert!(
        orchestrator.state().node(NodeId::Fetch).is_fresh(),
        "fetch must settle for the new ticker, got {:?}",
        orchestrator.state().node(NodeId::Fetch)
    );
    let snapshot = orchestrator.snapshot().await;
    assert_eq!(snapshot.selection.ticker.as_str(), "TSLA");
    assert_eq!(snapshot.display, "Selected Equity: TSLA");
    assert!(snapshot.price_chart.is_some());
    assert!(snapshot.forecast_chart.is_some());
}

#[tokio::test]
async fn when_the_model_changes_mid_fetch_the_result_still_applies() {
    // Given: A fetch in flight
    let state = PipelineState::default();
    let job = state.begin_fetch().expect("fetch job");

    // When: Only the model changes while the fetch is out
    state
        .apply_change(&SelectionChange {
            model: Some(ModelId::Lasso),
            ..SelectionChange::default()
        })
        .expect("valid change");

    // Then: The fetch inputs were untouched, so the table is kept
    assert!(state.complete_fetch(job.ticket, Ok(table_without_volume("GLW", 400))));
    assert!(state.node(NodeId::Fetch).is_fresh());
}

// =============================================================================
// Selection validation
// =============================================================================

#[tokio::test]
async fn when_an_unsupported_ticker_is_submitted_the_pipeline_is_untouched() {
    // Given: A settled pipeline
    let orchestrator = mock_orchestrator();
    orchestrator.refresh().await;

    // When: A ticker outside the supported set arrives
    let result = orchestrator
        .apply_change(&SelectionChange {
            ticker: Some("MSFT".into()),
            ..SelectionChange::default()
        })
        .await;

    // Then: The change is rejected and the current selection survives
    assert!(result.is_err());
    let snapshot = orchestrator.snapshot().await;
    assert_eq!(snapshot.selection.ticker.as_str(), "GLW");
    assert!(snapshot.forecast_chart.is_some());
}
