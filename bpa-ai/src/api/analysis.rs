//! Analysis endpoints
//!
//! POST /api/analyze-businessplan runs the assembler (and, on request,
//! competitor discovery alongside it). POST /api/generate-premium-analysis
//! upgrades an existing analysis without regenerating its standard fields.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use bpa_common::Analysis;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AnalysisError, ApiError, ApiResult};
use crate::types::AnalysisRequest;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeBody {
    #[serde(flatten)]
    pub request: AnalysisRequest,
    /// Standard analysis to upgrade when `isPremium` is set
    #[serde(default)]
    pub existing_analysis: Option<Analysis>,
    #[serde(default)]
    pub include_competitors: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumBody {
    #[serde(default)]
    pub existing_analysis: Option<Analysis>,
    #[serde(default)]
    pub analysis_id: Option<Uuid>,
}

/// POST /api/analyze-businessplan
pub async fn analyze_businessplan(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeBody>, JsonRejection>,
) -> ApiResult<Json<Analysis>> {
    let Json(body) = payload?;

    if body.request.is_premium {
        if let Some(existing) = body.existing_analysis {
            info!(analysis_id = %existing.id, "Premium requested for existing analysis");
            let analysis = upgrade(&state, existing).await?;
            return Ok(Json(analysis));
        }
    }

    let result = if body.include_competitors {
        let answers = body.request.answers.clone();
        let (analysis, competitors) = tokio::join!(
            state.assembler.assemble(body.request),
            state.discovery.discover(&answers)
        );
        analysis.map(|mut analysis| {
            match competitors {
                Ok(competitors) => analysis.competitors = Some(competitors),
                Err(e) => warn!(
                    error = %e,
                    "Competitor discovery failed, analysis returned without competitors"
                ),
            }
            analysis
        })
    } else {
        state.assembler.assemble(body.request).await
    };

    match result {
        Ok(analysis) => Ok(Json(analysis)),
        Err(e) => Err(report(&state, e).await),
    }
}

/// POST /api/generate-premium-analysis
pub async fn generate_premium_analysis(
    State(state): State<AppState>,
    payload: Result<Json<PremiumBody>, JsonRejection>,
) -> ApiResult<Json<Analysis>> {
    let Json(body) = payload?;

    let (existing, stored) = match (body.existing_analysis, body.analysis_id) {
        (Some(existing), _) => (existing, false),
        (None, Some(id)) => {
            let existing = state
                .store
                .load(id)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("Analysis {}", id)))?;
            (existing, true)
        }
        (None, None) => {
            return Err(ApiError::BadRequest(
                "Either existingAnalysis or analysisId is required".to_string(),
            ));
        }
    };

    let analysis = upgrade(&state, existing).await?;

    // Keep the stored copy in step with what the caller received
    if stored {
        if let Err(e) = state.store.save(&analysis).await {
            warn!(analysis_id = %analysis.id, error = %e, "Failed to store premium analysis");
        }
    }

    Ok(Json(analysis))
}

async fn upgrade(state: &AppState, existing: Analysis) -> ApiResult<Analysis> {
    match state.assembler.upgrade(existing.normalized()).await {
        Ok(analysis) => Ok(analysis),
        Err(e) => Err(report(state, e).await),
    }
}

async fn report(state: &AppState, err: AnalysisError) -> ApiError {
    state.record_error(err.to_string()).await;
    err.into()
}

/// Build analysis routes
pub fn analysis_routes() -> Router<AppState> {
    Router::new()
        .route("/api/analyze-businessplan", post(analyze_businessplan))
        .route("/api/generate-premium-analysis", post(generate_premium_analysis))
}
