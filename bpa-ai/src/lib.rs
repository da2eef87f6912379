//! bpa-ai library interface
//!
//! Exposes the pipeline components and the HTTP router for the binary and
//! for integration tests.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod prompts;
pub mod services;
pub mod types;
pub mod utils;

pub use crate::error::{AnalysisError, ApiError, ApiResult};

use axum::Router;
use bpa_common::config::TomlConfig;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::services::{
    Advisor, AnalysisAssembler, AssemblerSettings, CompetitorDiscovery, DiscoverySettings,
    ModelEstimator, PageExtractor, StaticEstimator,
};
use crate::types::{AnalysisStore, Browser, CompletionService, Estimator, WebSearch};
use crate::utils::RetryPolicy;

/// External collaborators the service is wired to
pub struct Dependencies {
    pub completion: Arc<dyn CompletionService>,
    pub browser: Arc<dyn Browser>,
    /// Absent when no search credential is configured
    pub search: Option<Arc<dyn WebSearch>>,
    pub store: Arc<dyn AnalysisStore>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub assembler: Arc<AnalysisAssembler>,
    pub discovery: Arc<CompetitorDiscovery>,
    pub extractor: Arc<PageExtractor>,
    pub advisor: Arc<Advisor>,
    pub estimator: Arc<dyn Estimator>,
    pub store: Arc<dyn AnalysisStore>,
    pub completion_configured: bool,
    pub search_configured: bool,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(config: &TomlConfig, deps: Dependencies) -> Self {
        let completion_config = &config.completion;
        let language = completion_config.response_language.clone();

        let estimator = select_estimator(
            &config.estimator,
            deps.completion.clone(),
            &completion_config.model,
        );
        let extractor = Arc::new(PageExtractor::new(deps.browser, &config.extraction));

        let assembler = AnalysisAssembler::new(
            deps.completion.clone(),
            estimator.clone(),
            RetryPolicy::from_config(&config.retry),
            AssemblerSettings {
                model: completion_config.model.clone(),
                premium_model: completion_config.premium_model.clone(),
                max_tokens: completion_config.max_tokens,
                premium_max_tokens: completion_config.premium_max_tokens,
                temperature: completion_config.temperature,
                language: language.clone(),
            },
        );

        let search_configured = deps
            .search
            .as_ref()
            .map(|s| s.is_configured())
            .unwrap_or(false);
        let discovery = CompetitorDiscovery::new(
            deps.completion.clone(),
            extractor.clone(),
            deps.search,
            DiscoverySettings {
                model: completion_config.model.clone(),
                max_competitors: config.competitors.max_competitors,
                language: language.clone(),
            },
        );

        let advisor = Advisor::new(
            deps.completion.clone(),
            extractor.clone(),
            completion_config.model.clone(),
            language,
        );

        Self {
            assembler: Arc::new(assembler),
            discovery: Arc::new(discovery),
            extractor,
            advisor: Arc::new(advisor),
            estimator,
            store: deps.store,
            completion_configured: deps.completion.is_configured(),
            search_configured,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Remember a failure for /health diagnostics
    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }
}

/// Estimator selected by the `estimator` configuration key
fn select_estimator(
    kind: &str,
    completion: Arc<dyn CompletionService>,
    model: &str,
) -> Arc<dyn Estimator> {
    match kind.trim().to_lowercase().as_str() {
        "model" => {
            tracing::info!("Using model-backed market estimator");
            Arc::new(ModelEstimator::new(completion, model))
        }
        "static" => Arc::new(StaticEstimator),
        other => {
            tracing::warn!("Unknown estimator '{}', using static tables", other);
            Arc::new(StaticEstimator)
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::analysis_routes())
        .merge(api::competitor_routes())
        .merge(api::extraction_routes())
        .merge(api::insight_routes())
        .merge(api::analyses_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
