//! HTTP surface: options, selection updates, dashboard snapshots.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use tidecast_core::{ModelId, PriceField, ValidationError};
use tidecast_pipeline::{
    DashboardSnapshot, Orchestrator, SelectionChange, SelectionState, SUPPORTED_TICKERS,
};

pub type AppState = Arc<Orchestrator>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/options", get(options))
        .route("/api/selection", put(update_selection))
        .route("/api/dashboard", get(dashboard))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Client-side validation errors rendered as JSON.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// The three selection enumerations plus the defaults a fresh client
/// should render.
async fn options() -> Json<serde_json::Value> {
    let columns: Vec<_> = PriceField::ALL
        .into_iter()
        .map(|field| json!({ "id": field.as_str(), "label": field.label() }))
        .collect();
    let models: Vec<_> = ModelId::ALL.into_iter().map(ModelId::as_str).collect();

    Json(json!({
        "tickers": SUPPORTED_TICKERS,
        "columns": columns,
        "models": models,
        "defaults": SelectionState::default(),
    }))
}

async fn update_selection(
    State(orchestrator): State<AppState>,
    Json(change): Json<SelectionChange>,
) -> Result<Json<DashboardSnapshot>, ApiError> {
    orchestrator.apply_change(&change).await?;
    Ok(Json(orchestrator.snapshot().await))
}

async fn dashboard(State(orchestrator): State<AppState>) -> Json<DashboardSnapshot> {
    Json(orchestrator.snapshot().await)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
