//! Core types and trait seams for bpa-ai
//!
//! Every external collaborator (completion service, headless browser, web
//! search, estimator, analysis storage) sits behind a trait defined here so
//! the pipeline can be driven by scripted fakes in tests.

use async_trait::async_trait;
use bpa_common::{Analysis, AnswerSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

// ============================================================================
// Completion service
// ============================================================================

/// A fully built completion request, independent of any provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSpec {
    pub system_message: String,
    pub user_message: String,
    /// JSON skeleton the model is asked to follow (empty for free-text prompts)
    pub expected_schema_hint: String,
}

/// Per-call sampling options
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Ask the provider for a JSON-object-only response
    pub force_json_mode: bool,
}

/// Raw model output
#[derive(Debug, Clone, Default)]
pub struct RawCompletion {
    /// Choice text, untrusted
    pub text: String,
    /// Full provider response body
    pub raw: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum CompletionError {
    /// Transport failure, timeout, or non-success status. Plausibly transient.
    #[error("Completion service unavailable: {0}")]
    Unavailable(String),

    /// Success status with an error payload (quota, invalid request). Not transient.
    #[error("Completion service rejected the request: {0}")]
    Rejected(String),

    /// No credential configured
    #[error("Completion service credential is not configured")]
    MissingCredential,
}

impl CompletionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CompletionError::Unavailable(_))
    }
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Perform exactly one completion call
    async fn complete(
        &self,
        prompt: &PromptSpec,
        options: &CompletionOptions,
    ) -> Result<RawCompletion, CompletionError>;

    /// Whether a credential is available
    fn is_configured(&self) -> bool;
}

// ============================================================================
// Content extraction
// ============================================================================

/// Structured signals extracted from a rendered page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSignals {
    /// URL after normalization (and redirects, when the browser reports them)
    pub url: String,
    pub title: String,
    pub description: String,
    /// `og:*` property → content
    pub og_tags: BTreeMap<String, String>,
    /// Parsed `application/ld+json` blocks
    pub structured_data: Vec<serde_json::Value>,
    /// h1/h2 headings in document order
    pub headings: Vec<String>,
    /// Bounded prefix of the visible text
    pub visible_text: String,
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Browser error: {0}")]
    Browser(String),
}

/// Outcome of a navigation
#[derive(Debug, Clone)]
pub struct NavigationResponse {
    pub status: u16,
    pub final_url: Url,
}

/// Headless browser capable of opening sessions
#[async_trait]
pub trait Browser: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn BrowserSession>, ExtractionError>;
}

/// One browser session (page). Must be closed when no longer needed.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate to `url`. Err only when no response arrived within `timeout`.
    async fn navigate(
        &mut self,
        url: &Url,
        timeout: Duration,
    ) -> Result<NavigationResponse, ExtractionError>;

    /// Serialized DOM of the current page
    async fn content(&mut self) -> Result<String, ExtractionError>;

    async fn close(&mut self);
}

// ============================================================================
// Web search
// ============================================================================

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Web search is not configured")]
    NotConfigured,

    #[error("Web search unavailable: {0}")]
    Unavailable(String),
}

impl SearchError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SearchError::Unavailable(_))
    }
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Ordered candidate names for a free-text query
    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError>;

    fn is_configured(&self) -> bool;
}

// ============================================================================
// Estimator
// ============================================================================

/// Market overview for an industry and region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    pub industry: String,
    pub region: String,
    /// Total addressable market, USD
    pub total_market_size: f64,
    /// Annual growth, percent
    pub growth_rate: f64,
    pub top_players: Vec<String>,
    pub market_trends: Vec<String>,
    pub source: String,
}

/// Unit-economics benchmarks for an industry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustryBenchmarks {
    pub industry: String,
    pub average_cac: f64,
    pub average_ltv: f64,
    /// Percent per year
    pub average_churn_rate: f64,
    /// Percent
    pub average_gross_margin: f64,
    pub source: String,
}

/// Headline market-size estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketEstimate {
    pub estimate: String,
    pub source: String,
    /// True when the figure came from static tables rather than the model
    pub fallback: bool,
}

/// Market-size and benchmark lookups used as premium context
#[async_trait]
pub trait Estimator: Send + Sync {
    async fn market_data(&self, industry: &str, region: &str) -> MarketData;

    async fn benchmarks(&self, industry: &str) -> IndustryBenchmarks;

    async fn market_estimate(&self, industry: &str, region: &str) -> MarketEstimate;
}

// ============================================================================
// Analysis storage
// ============================================================================

/// Read/write contract for persisted analyses
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn save(&self, analysis: &Analysis) -> bpa_common::Result<()>;

    async fn load(&self, id: Uuid) -> bpa_common::Result<Option<Analysis>>;
}

// ============================================================================
// Requests
// ============================================================================

/// One analysis invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    #[serde(default)]
    pub answers: AnswerSet,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub has_website: bool,
    #[serde(default)]
    pub is_premium: bool,
}

/// Help with answering one form question
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerHelpRequest {
    #[serde(default)]
    pub question_id: String,
    #[serde(default)]
    pub question_text: String,
    /// Whatever the form currently holds for the question
    #[serde(default)]
    pub current_answer: serde_json::Value,
    #[serde(default)]
    pub business_domain: Option<String>,
    /// Company site to draft the answer from
    #[serde(default)]
    pub website_url: Option<String>,
}

/// Drafted answer, or follow-up questions when no draft could be made
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnswerHelp {
    Draft { suggestion: String },
    FollowUps { suggestions: Vec<String> },
}
