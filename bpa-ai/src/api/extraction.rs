//! Website extraction endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::types::PageSignals;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ScrapeBody {
    pub url: String,
}

/// POST /api/scrape-website
///
/// Unlike competitor enrichment, a failure here is the whole answer: invalid
/// URLs map to 400 and unreachable sites to 502.
pub async fn scrape_website(
    State(state): State<AppState>,
    payload: Result<Json<ScrapeBody>, JsonRejection>,
) -> ApiResult<Json<PageSignals>> {
    let Json(body) = payload?;
    let signals = state.extractor.extract(&body.url).await?;
    Ok(Json(signals))
}

/// Build extraction routes
pub fn extraction_routes() -> Router<AppState> {
    Router::new().route("/api/scrape-website", post(scrape_website))
}
