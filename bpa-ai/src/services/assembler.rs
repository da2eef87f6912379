//! Analysis Assembler
//!
//! Drives one analysis run through its states:
//!
//! ```text
//! Idle → BuildingPrompt → AwaitingCompletion → Normalizing
//!      → [AwaitingPremiumCompletion → NormalizingPremium] → Done
//! ```
//!
//! `Failed` is reachable only for non-recoverable conditions (no answers,
//! missing credential, upstream rejection). An unavailable completion service
//! is recovered by normalizing an empty response, which yields a provisional
//! analysis. A premium upgrade of an existing analysis enters directly at
//! `AwaitingPremiumCompletion` and never regenerates the standard fields.

use bpa_common::analysis::{
    answer_flag, answer_text, INDUSTRY_ANSWER_KEYS, REGION_ANSWER_KEYS, WEBSITE_ANSWER_KEYS,
};
use bpa_common::{Analysis, AnswerSet, PremiumAnalysis, SubscriptionLevel};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::schema_guard::{self, Guarded, StandardAssessment};
use crate::error::AnalysisError;
use crate::prompts::{self, PromptMode, PromptOptions};
use crate::types::{
    AnalysisRequest, CompletionError, CompletionOptions, CompletionService, Estimator, PromptSpec,
};
use crate::utils::{retry, RetryPolicy};

/// Assembler states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    Idle,
    BuildingPrompt,
    AwaitingCompletion,
    Normalizing,
    AwaitingPremiumCompletion,
    NormalizingPremium,
    Done,
    Failed,
}

/// State transition record
#[derive(Debug, Clone)]
pub struct StateTransition {
    pub correlation_id: Uuid,
    pub old_state: AssemblerState,
    pub new_state: AssemblerState,
    pub transitioned_at: DateTime<Utc>,
}

/// Transitions taken by one run, in order
#[derive(Debug, Clone)]
pub struct AssemblyTrace {
    pub correlation_id: Uuid,
    pub transitions: Vec<StateTransition>,
}

impl AssemblyTrace {
    /// Every state visited, starting with `Idle`
    pub fn states(&self) -> Vec<AssemblerState> {
        let mut states = vec![AssemblerState::Idle];
        states.extend(self.transitions.iter().map(|t| t.new_state));
        states
    }

    pub fn final_state(&self) -> AssemblerState {
        self.transitions
            .last()
            .map(|t| t.new_state)
            .unwrap_or(AssemblerState::Idle)
    }
}

/// Model and sampling settings for assessment calls
#[derive(Debug, Clone)]
pub struct AssemblerSettings {
    pub model: String,
    pub premium_model: String,
    pub max_tokens: u32,
    pub premium_max_tokens: u32,
    pub temperature: f32,
    pub language: String,
}

impl Default for AssemblerSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            premium_model: "gpt-4o".to_string(),
            max_tokens: 2000,
            premium_max_tokens: 4000,
            temperature: 0.7,
            language: "English".to_string(),
        }
    }
}

struct Run {
    correlation_id: Uuid,
    state: AssemblerState,
    transitions: Vec<StateTransition>,
}

impl Run {
    fn new() -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            state: AssemblerState::Idle,
            transitions: Vec::new(),
        }
    }

    fn transition_to(&mut self, new_state: AssemblerState) {
        debug!(
            correlation_id = %self.correlation_id,
            from = ?self.state,
            to = ?new_state,
            "Assembler state transition"
        );
        self.transitions.push(StateTransition {
            correlation_id: self.correlation_id,
            old_state: self.state,
            new_state,
            transitioned_at: Utc::now(),
        });
        self.state = new_state;
    }

    fn fail(&mut self, err: AnalysisError) -> AnalysisError {
        warn!(
            correlation_id = %self.correlation_id,
            state = ?self.state,
            error = %err,
            "Analysis failed"
        );
        self.transition_to(AssemblerState::Failed);
        err
    }

    fn into_trace(self) -> AssemblyTrace {
        AssemblyTrace {
            correlation_id: self.correlation_id,
            transitions: self.transitions,
        }
    }
}

pub struct AnalysisAssembler {
    completion: Arc<dyn CompletionService>,
    estimator: Arc<dyn Estimator>,
    retry_policy: RetryPolicy,
    settings: AssemblerSettings,
}

impl AnalysisAssembler {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        estimator: Arc<dyn Estimator>,
        retry_policy: RetryPolicy,
        settings: AssemblerSettings,
    ) -> Self {
        Self {
            completion,
            estimator,
            retry_policy,
            settings,
        }
    }

    /// Assemble a fresh analysis (standard, plus premium when requested)
    pub async fn assemble(&self, request: AnalysisRequest) -> Result<Analysis, AnalysisError> {
        self.assemble_traced(request).await.0
    }

    /// Add a premium section to an existing analysis
    pub async fn upgrade(&self, existing: Analysis) -> Result<Analysis, AnalysisError> {
        self.upgrade_traced(existing).await.0
    }

    pub async fn assemble_traced(
        &self,
        request: AnalysisRequest,
    ) -> (Result<Analysis, AnalysisError>, AssemblyTrace) {
        let mut run = Run::new();
        let result = self.run_fresh(&mut run, request).await;
        (result, run.into_trace())
    }

    pub async fn upgrade_traced(
        &self,
        existing: Analysis,
    ) -> (Result<Analysis, AnalysisError>, AssemblyTrace) {
        let mut run = Run::new();
        let result = self.run_upgrade(&mut run, existing).await;
        (result, run.into_trace())
    }

    async fn run_fresh(
        &self,
        run: &mut Run,
        request: AnalysisRequest,
    ) -> Result<Analysis, AnalysisError> {
        info!(
            correlation_id = %run.correlation_id,
            answers = request.answers.len(),
            premium = request.is_premium,
            "Starting analysis"
        );

        run.transition_to(AssemblerState::BuildingPrompt);
        self.check_preconditions(run, &request.answers)?;
        let industry = context_value(&request.industry, &request.answers, &INDUSTRY_ANSWER_KEYS);
        let region = context_value(&request.region, &request.answers, &REGION_ANSWER_KEYS);
        let has_website = request.has_website
            || answer_flag(&request.answers, &WEBSITE_ANSWER_KEYS).unwrap_or(false);
        let options = self.prompt_options(&industry, &region, &request.company);
        let prompt = prompts::build_with(&request.answers, PromptMode::Standard, &options);

        run.transition_to(AssemblerState::AwaitingCompletion);
        let completion_options = CompletionOptions {
            model: self.settings.model.clone(),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            force_json_mode: true,
        };
        let raw = self.complete(run, "standard_analysis", &prompt, &completion_options).await?;

        run.transition_to(AssemblerState::Normalizing);
        let guarded = schema_guard::parse::<StandardAssessment>(&raw, &request.answers);
        let provisional = guarded.is_defaulted();
        if provisional {
            warn!(
                correlation_id = %run.correlation_id,
                "Standard assessment defaulted, result is provisional"
            );
        }
        let assessment = guarded.into_inner();

        let analysis = Analysis {
            id: Uuid::new_v4(),
            score: assessment.score,
            score_breakdown: assessment.score_breakdown,
            insights: assessment.insights,
            feedback: assessment.feedback,
            action_items: assessment.action_items,
            premium_analysis: None,
            subscription_level: SubscriptionLevel::Standard,
            provisional,
            answers: request.answers,
            company: request.company,
            email: request.email,
            has_website,
            industry,
            region,
            competitors: None,
            generated_at: Utc::now(),
        };

        let analysis = if request.is_premium {
            self.premium_stage(run, analysis).await?
        } else {
            analysis
        };

        run.transition_to(AssemblerState::Done);
        info!(
            correlation_id = %run.correlation_id,
            analysis_id = %analysis.id,
            score = analysis.score,
            provisional = analysis.provisional,
            "Analysis assembled"
        );
        Ok(analysis)
    }

    async fn run_upgrade(
        &self,
        run: &mut Run,
        existing: Analysis,
    ) -> Result<Analysis, AnalysisError> {
        info!(
            correlation_id = %run.correlation_id,
            analysis_id = %existing.id,
            "Upgrading analysis to premium"
        );
        if existing.answers.is_empty() {
            return Err(run.fail(AnalysisError::NoAnswers));
        }
        if !self.completion.is_configured() {
            return Err(run.fail(missing_credential()));
        }

        let analysis = self.premium_stage(run, existing).await?;
        run.transition_to(AssemblerState::Done);
        Ok(analysis)
    }

    fn check_preconditions(&self, run: &mut Run, answers: &AnswerSet) -> Result<(), AnalysisError> {
        if answers.is_empty() {
            return Err(run.fail(AnalysisError::NoAnswers));
        }
        if !self.completion.is_configured() {
            return Err(run.fail(missing_credential()));
        }
        Ok(())
    }

    async fn premium_stage(
        &self,
        run: &mut Run,
        analysis: Analysis,
    ) -> Result<Analysis, AnalysisError> {
        // Analyses stored before the top-level fields existed carry them only as answers
        let industry = context_value(&analysis.industry, &analysis.answers, &INDUSTRY_ANSWER_KEYS);
        let region = context_value(&analysis.region, &analysis.answers, &REGION_ANSWER_KEYS);
        let mut options = self.prompt_options(&industry, &region, &analysis.company);
        options.context = self.market_context(industry.as_deref(), region.as_deref()).await;
        let prompt = prompts::build_with(&analysis.answers, PromptMode::Premium, &options);

        run.transition_to(AssemblerState::AwaitingPremiumCompletion);
        let completion_options = CompletionOptions {
            model: self.settings.premium_model.clone(),
            max_tokens: self.settings.premium_max_tokens,
            temperature: self.settings.temperature,
            force_json_mode: true,
        };
        let raw = self.complete(run, "premium_analysis", &prompt, &completion_options).await?;

        run.transition_to(AssemblerState::NormalizingPremium);
        let premium = match schema_guard::parse::<PremiumAnalysis>(&raw, &()) {
            Guarded::Parsed(premium) => premium,
            Guarded::Defaulted(premium) => {
                warn!(
                    correlation_id = %run.correlation_id,
                    "Premium section defaulted, marked provisional"
                );
                premium
            }
        };
        Ok(analysis.with_premium(premium))
    }

    /// One completion with the shared retry policy. Unavailable after the last
    /// attempt becomes empty text for the guard to default.
    async fn complete(
        &self,
        run: &mut Run,
        operation: &str,
        prompt: &PromptSpec,
        options: &CompletionOptions,
    ) -> Result<String, AnalysisError> {
        let outcome = retry(operation, &self.retry_policy, CompletionError::is_retryable, || {
            self.completion.complete(prompt, options)
        })
        .await;

        match outcome {
            Ok(completion) => Ok(completion.text),
            Err(e) => match AnalysisError::from_completion(&e, operation) {
                Some(fatal) => Err(run.fail(fatal)),
                None => {
                    warn!(
                        correlation_id = %run.correlation_id,
                        operation,
                        error = %e,
                        "Completion service unavailable, continuing with defaults"
                    );
                    Ok(String::new())
                }
            },
        }
    }

    fn prompt_options(
        &self,
        industry: &Option<String>,
        region: &Option<String>,
        company: &Option<String>,
    ) -> PromptOptions {
        PromptOptions {
            language: self.settings.language.clone(),
            company: company.clone(),
            industry: industry.clone(),
            region: region.clone(),
            context: None,
        }
    }

    /// Market data and benchmarks for the premium prompt; needs an industry
    async fn market_context(&self, industry: Option<&str>, region: Option<&str>) -> Option<String> {
        let industry = industry?;
        let region = region.unwrap_or("Global");

        let market = self.estimator.market_data(industry, region).await;
        let benchmarks = self.estimator.benchmarks(industry).await;

        Some(format!(
            "Market size ({region}): {size:.0} USD, annual growth {growth}% ({market_source})\n\
             Top players: {players}\n\
             Trends: {trends}\n\
             Benchmarks: CAC {cac} USD, LTV {ltv} USD, churn {churn}%, \
             gross margin {margin}% ({bench_source})",
            region = market.region,
            size = market.total_market_size,
            growth = market.growth_rate,
            market_source = market.source,
            players = market.top_players.join(", "),
            trends = market.market_trends.join(", "),
            cac = benchmarks.average_cac,
            ltv = benchmarks.average_ltv,
            churn = benchmarks.average_churn_rate,
            margin = benchmarks.average_gross_margin,
            bench_source = benchmarks.source,
        ))
    }
}

/// Explicit non-blank value, else the questionnaire's own answer
fn context_value(explicit: &Option<String>, answers: &AnswerSet, keys: &[&str]) -> Option<String> {
    explicit
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| answer_text(answers, keys))
}

fn missing_credential() -> AnalysisError {
    AnalysisError::Configuration("Completion service credential is not configured".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::estimator::StaticEstimator;
    use crate::types::RawCompletion;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Replies in order; `None` simulates an unavailable service
    struct Scripted {
        replies: Mutex<Vec<Option<String>>>,
        prompts: Mutex<Vec<PromptSpec>>,
        configured: bool,
    }

    impl Scripted {
        fn new(replies: Vec<Option<&str>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .rev()
                        .map(|r| r.map(String::from))
                        .collect(),
                ),
                prompts: Mutex::new(Vec::new()),
                configured: true,
            })
        }
    }

    #[async_trait]
    impl CompletionService for Scripted {
        async fn complete(
            &self,
            prompt: &PromptSpec,
            _: &CompletionOptions,
        ) -> Result<RawCompletion, CompletionError> {
            self.prompts.lock().unwrap().push(prompt.clone());
            match self.replies.lock().unwrap().pop().flatten() {
                Some(text) => Ok(RawCompletion { text, raw: json!(null) }),
                None => Err(CompletionError::Unavailable("connection refused".into())),
            }
        }

        fn is_configured(&self) -> bool {
            self.configured
        }
    }

    fn assembler(completion: Arc<Scripted>) -> AnalysisAssembler {
        AnalysisAssembler::new(
            completion,
            Arc::new(StaticEstimator),
            RetryPolicy::none(),
            AssemblerSettings::default(),
        )
    }

    fn request(premium: bool) -> AnalysisRequest {
        let mut answers = AnswerSet::new();
        answers.insert("company_value".into(), json!("AI scheduling tool for clinics"));
        answers.insert("customer_problem".into(), json!("manual booking"));
        AnalysisRequest {
            answers,
            industry: Some("SaaS".into()),
            is_premium: premium,
            ..AnalysisRequest::default()
        }
    }

    const STANDARD: &str = r#"{"score": 64, "feedback": {"company_value": "Sharpen it."}}"#;

    #[tokio::test]
    async fn test_standard_run_visits_expected_states() {
        let (result, trace) = assembler(Scripted::new(vec![Some(STANDARD)]))
            .assemble_traced(request(false))
            .await;
        let analysis = result.unwrap();
        assert_eq!(analysis.score, 64);
        assert!(analysis.premium_analysis.is_none());
        assert_eq!(
            trace.states(),
            vec![
                AssemblerState::Idle,
                AssemblerState::BuildingPrompt,
                AssemblerState::AwaitingCompletion,
                AssemblerState::Normalizing,
                AssemblerState::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_upgrade_enters_at_premium_completion() {
        let completion = Scripted::new(vec![Some(STANDARD), Some(r#"{"dealReadyScore": 80}"#)]);
        let assembler = assembler(completion.clone());
        let standard = assembler.assemble(request(false)).await.unwrap();

        let (result, trace) = assembler.upgrade_traced(standard.clone()).await;
        let premium = result.unwrap();
        assert_eq!(
            trace.states(),
            vec![
                AssemblerState::Idle,
                AssemblerState::AwaitingPremiumCompletion,
                AssemblerState::NormalizingPremium,
                AssemblerState::Done,
            ]
        );
        assert_eq!(premium.score, standard.score);
        assert_eq!(premium.subscription_level, SubscriptionLevel::Premium);
        assert_eq!(completion.prompts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_premium_prompt_carries_market_context() {
        let completion = Scripted::new(vec![Some(STANDARD), Some("{}")]);
        assembler(completion.clone()).assemble(request(true)).await.unwrap();
        let prompts = completion.prompts.lock().unwrap();
        assert!(prompts[1].user_message.contains("Gartner Market Analysis 2024"));
        assert!(!prompts[0].user_message.contains("Gartner"));
    }

    #[tokio::test]
    async fn test_upgrade_reads_industry_and_region_from_answers() {
        let completion = Scripted::new(vec![Some(STANDARD), Some("{}")]);
        let assembler = assembler(completion.clone());
        let mut standard = assembler.assemble(request(false)).await.unwrap();
        standard.industry = None;
        standard.answers.insert("bransch".into(), json!("SaaS"));
        standard.answers.insert("omrade".into(), json!("Sverige"));

        let upgraded = assembler.upgrade(standard).await.unwrap();
        let prompts = completion.prompts.lock().unwrap();
        assert!(prompts[1].user_message.contains("Gartner Market Analysis 2024"));
        assert!(prompts[1].user_message.contains("Sverige"));
        assert_eq!(upgraded.industry, None);
    }

    #[tokio::test]
    async fn test_request_context_falls_back_to_answers() {
        let mut request = request(false);
        request.industry = Some("  ".into());
        request.email = Some("founder@clinicly.example".into());
        request.answers.insert("bransch".into(), json!("Fintech"));
        request.answers.insert("hasWebsite".into(), json!(true));

        let analysis = assembler(Scripted::new(vec![Some(STANDARD)]))
            .assemble(request)
            .await
            .unwrap();
        assert_eq!(analysis.industry.as_deref(), Some("Fintech"));
        assert!(analysis.has_website);
        assert_eq!(analysis.email.as_deref(), Some("founder@clinicly.example"));
    }

    #[tokio::test]
    async fn test_empty_answers_fail() {
        let (result, trace) = assembler(Scripted::new(vec![]))
            .assemble_traced(AnalysisRequest::default())
            .await;
        assert!(matches!(result, Err(AnalysisError::NoAnswers)));
        assert_eq!(trace.final_state(), AssemblerState::Failed);
    }

    #[tokio::test]
    async fn test_unavailable_recovers_through_normalizing() {
        let (result, trace) = assembler(Scripted::new(vec![None]))
            .assemble_traced(request(false))
            .await;
        let analysis = result.unwrap();
        assert!(analysis.provisional);
        assert_eq!(analysis.score, bpa_common::analysis::FALLBACK_SCORE);
        assert!(trace.states().contains(&AssemblerState::Normalizing));
        assert_eq!(trace.final_state(), AssemblerState::Done);
    }
}
