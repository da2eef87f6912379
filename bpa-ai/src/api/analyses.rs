//! Stored analysis endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bpa_common::Analysis;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SaveAnalysisResponse {
    pub id: Uuid,
}

/// POST /api/analyses
pub async fn save_analysis(
    State(state): State<AppState>,
    payload: Result<Json<Analysis>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SaveAnalysisResponse>)> {
    let Json(analysis) = payload?;
    let analysis = analysis.normalized();
    state.store.save(&analysis).await?;
    Ok((StatusCode::CREATED, Json(SaveAnalysisResponse { id: analysis.id })))
}

/// GET /api/analyses/:id
pub async fn get_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Analysis>> {
    state
        .store
        .load(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Analysis {}", id)))
}

/// Build stored analysis routes
pub fn analyses_routes() -> Router<AppState> {
    Router::new()
        .route("/api/analyses", post(save_analysis))
        .route("/api/analyses/:id", get(get_analysis))
}
