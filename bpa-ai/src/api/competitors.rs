//! Competitor endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use bpa_common::{AnswerSet, Competitor};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AnswersBody {
    #[serde(default)]
    pub answers: AnswerSet,
}

#[derive(Debug, Serialize)]
pub struct CompetitorsResponse {
    pub competitors: Vec<Competitor>,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
}

/// POST /api/analyze-competitors
pub async fn analyze_competitors(
    State(state): State<AppState>,
    payload: Result<Json<AnswersBody>, JsonRejection>,
) -> ApiResult<Json<CompetitorsResponse>> {
    let Json(body) = payload?;
    match state.discovery.discover(&body.answers).await {
        Ok(competitors) => Ok(Json(CompetitorsResponse { competitors })),
        Err(e) => {
            state.record_error(e.to_string()).await;
            Err(e.into())
        }
    }
}

/// POST /api/competitor-suggest
pub async fn competitor_suggest(
    State(state): State<AppState>,
    payload: Result<Json<AnswersBody>, JsonRejection>,
) -> ApiResult<Json<SuggestionsResponse>> {
    let Json(body) = payload?;
    match state.discovery.suggest(&body.answers).await {
        Ok(suggestions) => Ok(Json(SuggestionsResponse { suggestions })),
        Err(e) => {
            state.record_error(e.to_string()).await;
            Err(e.into())
        }
    }
}

/// Build competitor routes
pub fn competitor_routes() -> Router<AppState> {
    Router::new()
        .route("/api/analyze-competitors", post(analyze_competitors))
        .route("/api/competitor-suggest", post(competitor_suggest))
}
