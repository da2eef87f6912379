//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// "ok", or "degraded" when the completion service has no credential
    pub status: String,
    /// Module name ("bpa-ai")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    pub completion_configured: bool,
    pub search_configured: bool,
    /// Last error message if any (for diagnostics)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let last_error = state.last_error.read().await.clone();

    Json(HealthResponse {
        status: if state.completion_configured { "ok" } else { "degraded" }.to_string(),
        module: "bpa-ai".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        completion_configured: state.completion_configured,
        search_configured: state.search_configured,
        last_error,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
