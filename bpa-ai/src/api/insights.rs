//! Coaching, answer help, plan summary and market estimate endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use bpa_common::AnswerSet;

use crate::error::{ApiError, ApiResult};
use crate::types::{AnswerHelp, AnswerHelpRequest, IndustryBenchmarks, MarketData};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SectionFeedbackBody {
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SectionFeedbackResponse {
    pub feedback: String,
}

#[derive(Debug, Deserialize)]
pub struct PlanSummaryBody {
    #[serde(default)]
    pub answers: AnswerSet,
}

#[derive(Debug, Serialize)]
pub struct PlanSummaryResponse {
    pub summary: String,
}

#[derive(Debug, Deserialize)]
pub struct MarketEstimateBody {
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub region: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketEstimateResponse {
    pub estimate: String,
    pub source: String,
    /// True when the figure came from static tables
    pub fallback: bool,
    pub market_data: MarketData,
    pub benchmarks: IndustryBenchmarks,
}

/// POST /api/section-feedback
pub async fn section_feedback(
    State(state): State<AppState>,
    payload: Result<Json<SectionFeedbackBody>, JsonRejection>,
) -> ApiResult<Json<SectionFeedbackResponse>> {
    let Json(body) = payload?;
    match state.advisor.section_feedback(&body.section, &body.text).await {
        Ok(feedback) => Ok(Json(SectionFeedbackResponse { feedback })),
        Err(e) => {
            state.record_error(e.to_string()).await;
            Err(e.into())
        }
    }
}

/// POST /api/ai-suggest
///
/// `{suggestion}` when an answer could be drafted from the website,
/// otherwise `{suggestions}` with two follow-up questions.
pub async fn answer_help(
    State(state): State<AppState>,
    payload: Result<Json<AnswerHelpRequest>, JsonRejection>,
) -> ApiResult<Json<AnswerHelp>> {
    let Json(request) = payload?;
    match state.advisor.answer_help(&request).await {
        Ok(help) => Ok(Json(help)),
        Err(e) => {
            state.record_error(e.to_string()).await;
            Err(e.into())
        }
    }
}

/// POST /api/overall-summary
pub async fn plan_summary(
    State(state): State<AppState>,
    payload: Result<Json<PlanSummaryBody>, JsonRejection>,
) -> ApiResult<Json<PlanSummaryResponse>> {
    let Json(body) = payload?;
    match state.advisor.plan_summary(&body.answers).await {
        Ok(summary) => Ok(Json(PlanSummaryResponse { summary })),
        Err(e) => {
            state.record_error(e.to_string()).await;
            Err(e.into())
        }
    }
}

/// POST /api/market-estimate
pub async fn market_estimate(
    State(state): State<AppState>,
    payload: Result<Json<MarketEstimateBody>, JsonRejection>,
) -> ApiResult<Json<MarketEstimateResponse>> {
    let Json(body) = payload?;
    let industry = body.industry.trim();
    let region = body.region.trim();
    if industry.is_empty() || region.is_empty() {
        return Err(ApiError::BadRequest(
            "Both industry and region are required".to_string(),
        ));
    }

    let (estimate, market_data, benchmarks) = tokio::join!(
        state.estimator.market_estimate(industry, region),
        state.estimator.market_data(industry, region),
        state.estimator.benchmarks(industry)
    );

    Ok(Json(MarketEstimateResponse {
        estimate: estimate.estimate,
        source: estimate.source,
        fallback: estimate.fallback,
        market_data,
        benchmarks,
    }))
}

/// Build insight routes
pub fn insight_routes() -> Router<AppState> {
    Router::new()
        .route("/api/section-feedback", post(section_feedback))
        .route("/api/ai-suggest", post(answer_help))
        .route("/api/overall-summary", post(plan_summary))
        .route("/api/market-estimate", post(market_estimate))
}
