//! Scripted collaborators shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bpa_ai::types::{
    AnalysisStore, Browser, BrowserSession, CompletionError, CompletionOptions, CompletionService,
    ExtractionError, NavigationResponse, PromptSpec, RawCompletion, SearchError, WebSearch,
};
use bpa_ai::{AppState, Dependencies};
use bpa_common::config::TomlConfig;
use bpa_common::{Analysis, AnswerSet};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

// ============================================================================
// Completion service
// ============================================================================

type Responder = dyn Fn(&PromptSpec) -> Result<String, CompletionError> + Send + Sync;

/// Completion service answering through a closure, recording every prompt
pub struct ScriptedCompletion {
    responder: Box<Responder>,
    configured: bool,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<PromptSpec>>,
}

impl ScriptedCompletion {
    pub fn new(
        responder: impl Fn(&PromptSpec) -> Result<String, CompletionError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            configured: true,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Same reply to every call
    pub fn always(text: &str) -> Arc<Self> {
        let text = text.to_string();
        Self::new(move |_| Ok(text.clone()))
    }

    /// Every call fails as a transport error
    pub fn unavailable() -> Arc<Self> {
        Self::new(|_| Err(CompletionError::Unavailable("connection refused".to_string())))
    }

    /// No credential configured
    pub fn unconfigured() -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(|_| Err(CompletionError::MissingCredential)),
            configured: false,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn recorded_prompts(&self) -> Vec<PromptSpec> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(
        &self,
        prompt: &PromptSpec,
        _options: &CompletionOptions,
    ) -> Result<RawCompletion, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.clone());
        if !self.configured {
            return Err(CompletionError::MissingCredential);
        }
        (self.responder)(prompt).map(|text| RawCompletion {
            text,
            raw: json!(null),
        })
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}

// ============================================================================
// Browser
// ============================================================================

/// Browser serving canned HTML per host; unknown hosts fail navigation
#[derive(Default)]
pub struct FakeBrowser {
    pages: HashMap<String, String>,
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, host: &str, html: &str) -> Self {
        self.pages.insert(host.to_string(), html.to_string());
        self
    }

    pub fn sessions_balanced(&self) -> bool {
        self.opened.load(Ordering::SeqCst) == self.closed.load(Ordering::SeqCst)
    }
}

struct FakeSession {
    pages: HashMap<String, String>,
    current: Option<String>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn open_session(&self) -> Result<Box<dyn BrowserSession>, ExtractionError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            pages: self.pages.clone(),
            current: None,
            closed: self.closed.clone(),
        }))
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(
        &mut self,
        url: &Url,
        _timeout: Duration,
    ) -> Result<NavigationResponse, ExtractionError> {
        let host = url.host_str().unwrap_or_default();
        match self.pages.get(host) {
            Some(html) => {
                self.current = Some(html.clone());
                Ok(NavigationResponse {
                    status: 200,
                    final_url: url.clone(),
                })
            }
            None => Err(ExtractionError::NavigationFailed(format!("could not resolve {}", host))),
        }
    }

    async fn content(&mut self) -> Result<String, ExtractionError> {
        self.current
            .clone()
            .ok_or_else(|| ExtractionError::Browser("no page".to_string()))
    }

    async fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn page(title: &str, text: &str) -> String {
    format!(
        "<html><head><title>{}</title><meta name=\"description\" content=\"{}\"></head>\
         <body><h1>{}</h1><p>{}</p></body></html>",
        title, text, title, text
    )
}

// ============================================================================
// Web search
// ============================================================================

pub struct FakeSearch {
    pub names: Vec<String>,
}

#[async_trait]
impl WebSearch for FakeSearch {
    async fn search(&self, _query: &str) -> Result<Vec<String>, SearchError> {
        Ok(self.names.clone())
    }

    fn is_configured(&self) -> bool {
        true
    }
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Default)]
pub struct InMemoryStore {
    analyses: Mutex<HashMap<Uuid, Analysis>>,
}

#[async_trait]
impl AnalysisStore for InMemoryStore {
    async fn save(&self, analysis: &Analysis) -> bpa_common::Result<()> {
        self.analyses.lock().unwrap().insert(analysis.id, analysis.clone());
        Ok(())
    }

    async fn load(&self, id: Uuid) -> bpa_common::Result<Option<Analysis>> {
        Ok(self.analyses.lock().unwrap().get(&id).cloned())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Defaults with millisecond backoff so retry tests stay fast
pub fn test_config() -> TomlConfig {
    let mut config = TomlConfig::default();
    config.retry.initial_backoff_ms = 1;
    config.retry.max_backoff_ms = 2;
    config
}

pub fn app_state(
    completion: Arc<ScriptedCompletion>,
    browser: FakeBrowser,
    search: Option<FakeSearch>,
) -> AppState {
    AppState::new(
        &test_config(),
        Dependencies {
            completion,
            browser: Arc::new(browser),
            search: search.map(|s| Arc::new(s) as Arc<dyn WebSearch>),
            store: Arc::new(InMemoryStore::default()),
        },
    )
}

/// The two-answer scenario used throughout the tests
pub fn clinic_answers() -> AnswerSet {
    let mut answers = AnswerSet::new();
    answers.insert("company_value".into(), json!("AI scheduling tool for clinics"));
    answers.insert("customer_problem".into(), json!("manual booking"));
    answers
}

pub const STANDARD_REPLY: &str = r#"{
  "score": 68,
  "scoreBreakdown": {"problemSolution": 12, "market": 10, "businessModel": 9, "team": 8,
                     "traction": 6, "financialPlan": 9, "risk": 6},
  "insights": [{"category": "market", "strength": "high", "summary": "Underserved niche",
                "details": "Clinics still book by phone"}],
  "feedback": {"company_value": "Quantify the hours saved per clinic.",
               "customer_problem": "Back the problem with interview data."},
  "actionItems": [{"priority": "high", "title": "Run a pilot", "description": "Three clinics",
                   "timeframe": "3 months", "impact": "First traction"}]
}"#;

pub const PREMIUM_REPLY: &str = r#"{
  "premiumAnalysis": {
    "swot": {"strengths": ["Focused niche"], "weaknesses": ["Small team"],
             "opportunities": ["EU expansion"], "threats": ["Incumbents"]},
    "financialProjections": {
      "year1": {"revenue": 500000, "costs": 800000, "ebitda": -300000, "customers": 40},
      "year2": {"revenue": 2000000, "costs": 1600000, "ebitda": 400000, "customers": 150},
      "year3": {"revenue": 5000000, "costs": 3000000, "ebitda": 2000000, "customers": 400}
    },
    "detailedRecommendations": {"immediate": [], "shortTerm": [], "longTerm": []},
    "benchmarkAnalysis": {"industryComparison": {}, "peerComparison": []},
    "investmentProposal": {"askAmount": "5 MSEK", "valuation": "25 MSEK", "useOfFunds": {},
                           "keyMetrics": [], "investorBenefits": []},
    "pitchVideo": {"script": "Clinics lose hours.", "durationSeconds": 60, "scenes": [],
                   "videoPrompt": "A clinic reception"},
    "marketTrends": ["Digital health"],
    "competitiveLandscape": "Fragmented",
    "riskMitigation": {"identifiedRisks": []},
    "imagePrompts": [{"purpose": "cover", "prompt": "Calm clinic"}],
    "dealReadyScore": 71
  }
}"#;

/// Routes assessment prompts to the standard or premium reply
pub fn assessment_responder(prompt: &PromptSpec) -> Result<String, CompletionError> {
    if prompt.user_message.contains("premiumAnalysis") {
        Ok(PREMIUM_REPLY.to_string())
    } else {
        Ok(STANDARD_REPLY.to_string())
    }
}
