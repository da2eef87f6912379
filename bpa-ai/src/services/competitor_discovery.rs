//! Competitor discovery
//!
//! One completion call names the competitors; each named competitor is then
//! enriched concurrently (page extraction plus a summarizing completion).
//! Enrichment is best-effort: a failure degrades that one entry to name-only
//! and never removes it from the result.

use bpa_common::{AnswerSet, Competitor};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::page_extractor::PageExtractor;
use super::schema_guard::{self, Candidate, CandidateList, CompetitorSummary, Guarded};
use crate::error::AnalysisError;
use crate::prompts::{competitors as prompts, PromptOptions};
use crate::types::{
    CompletionError, CompletionOptions, CompletionService, PromptSpec, RawCompletion,
    WebSearch,
};
use crate::utils::{retry, RetryPolicy};

/// Jaro-Winkler similarity at which two names count as the same company
const DUPLICATE_SIMILARITY: f64 = 0.95;

#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    pub model: String,
    pub max_competitors: usize,
    pub language: String,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            max_competitors: 3,
            language: "English".to_string(),
        }
    }
}

pub struct CompetitorDiscovery {
    completion: Arc<dyn CompletionService>,
    extractor: Arc<PageExtractor>,
    search: Option<Arc<dyn WebSearch>>,
    settings: DiscoverySettings,
}

impl CompetitorDiscovery {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        extractor: Arc<PageExtractor>,
        search: Option<Arc<dyn WebSearch>>,
        settings: DiscoverySettings,
    ) -> Self {
        Self {
            completion,
            extractor,
            search,
            settings,
        }
    }

    fn prompt_options(&self) -> PromptOptions {
        PromptOptions {
            language: self.settings.language.clone(),
            ..PromptOptions::default()
        }
    }

    fn options(&self, max_tokens: u32, force_json_mode: bool) -> CompletionOptions {
        CompletionOptions {
            model: self.settings.model.clone(),
            max_tokens,
            temperature: 0.4,
            force_json_mode,
        }
    }

    /// Discovery is best-effort, so every call gets a single attempt
    async fn complete(
        &self,
        operation: &str,
        prompt: &PromptSpec,
        options: &CompletionOptions,
    ) -> Result<RawCompletion, CompletionError> {
        retry(operation, &RetryPolicy::none(), CompletionError::is_retryable, || {
            self.completion.complete(prompt, options)
        })
        .await
    }

    /// Named competitors, enriched where possible
    pub async fn discover(&self, answers: &AnswerSet) -> Result<Vec<Competitor>, AnalysisError> {
        if answers.is_empty() {
            return Err(AnalysisError::NoAnswers);
        }

        let max = self.settings.max_competitors;
        let prompt = prompts::competitor_list(answers, max, &self.prompt_options());
        // The list is a JSON array, which json_object mode would refuse
        let raw = match self.complete("competitor_list", &prompt, &self.options(600, false)).await {
            Ok(completion) => completion.text,
            Err(e) => match AnalysisError::from_completion(&e, "competitor_list") {
                Some(fatal) => return Err(fatal),
                None => {
                    warn!(error = %e, "Competitor list unavailable, returning no competitors");
                    return Ok(Vec::new());
                }
            },
        };

        let candidates = dedupe_candidates(
            schema_guard::parse::<CandidateList>(&raw, &()).into_inner().0,
            self.settings.max_competitors,
        );
        info!(candidates = candidates.len(), "Competitor candidates named");

        let business = prompts::describe_business(answers);
        let competitors =
            join_all(candidates.into_iter().map(|candidate| self.enrich(candidate, &business)))
                .await;

        let enriched = competitors.iter().filter(|c| !c.is_name_only()).count();
        info!(total = competitors.len(), enriched, "Competitor discovery complete");
        Ok(competitors)
    }

    /// Enrich one candidate; any failure yields a name-only entry
    async fn enrich(&self, candidate: Candidate, business: &str) -> Competitor {
        let Some(url) = candidate.url.as_deref() else {
            debug!(competitor = %candidate.name, "No website named, keeping name only");
            return Competitor::name_only(candidate.name);
        };

        let signals = match self.extractor.extract(url).await {
            Ok(signals) => signals,
            Err(e) => {
                warn!(
                    competitor = %candidate.name,
                    error = %e,
                    "Competitor site unreachable, keeping name only"
                );
                return Competitor::name_only(candidate.name);
            }
        };

        let prompt = prompts::competitor_summary(
            &candidate.name,
            &signals,
            business,
            &self.prompt_options(),
        );
        let options = self.options(500, true);
        let raw = match self.complete("competitor_summary", &prompt, &options).await {
            Ok(completion) => completion.text,
            Err(e) => {
                warn!(
                    competitor = %candidate.name,
                    error = %e,
                    "Competitor summary failed, keeping name only"
                );
                return Competitor::name_only(candidate.name);
            }
        };

        match schema_guard::parse::<CompetitorSummary>(&raw, &()) {
            Guarded::Parsed(summary) => Competitor {
                name: candidate.name,
                url: Some(signals.url),
                offering_summary: summary.offering_summary,
                strengths: summary.strengths,
                weaknesses: summary.weaknesses,
                opportunities: summary.opportunities,
            },
            Guarded::Defaulted(_) => {
                warn!(
                    competitor = %candidate.name,
                    "Competitor summary malformed, keeping name only"
                );
                Competitor::name_only(candidate.name)
            }
        }
    }

    /// Competitor names for the form: model suggestions merged with web search
    pub async fn suggest(&self, answers: &AnswerSet) -> Result<Vec<String>, AnalysisError> {
        if answers.is_empty() {
            return Err(AnalysisError::NoAnswers);
        }

        let prompt = prompts::competitor_suggestions(answers, &self.prompt_options());
        let options = self.options(300, false);
        let model_names = match self.complete("competitor_suggest", &prompt, &options).await {
            Ok(completion) => suggestion_names(&completion.text),
            Err(e) => match AnalysisError::from_completion(&e, "competitor_suggest") {
                Some(fatal) => return Err(fatal),
                None => {
                    warn!(error = %e, "Model suggestions unavailable");
                    Vec::new()
                }
            },
        };

        let search_names = match self.search.as_ref().filter(|s| s.is_configured()) {
            Some(search) => {
                let query = search_query(answers);
                match search.search(&query).await {
                    Ok(names) => names,
                    Err(e) => {
                        warn!(error = %e, "Web search failed, using model suggestions only");
                        Vec::new()
                    }
                }
            }
            None => Vec::new(),
        };

        let merged = merge_names(model_names.into_iter().chain(search_names));
        debug!(suggestions = merged.len(), "Competitor suggestions merged");
        Ok(merged)
    }
}

/// Parse the model's suggestion reply; non-JSON replies are read line by line
pub fn suggestion_names(text: &str) -> Vec<String> {
    match schema_guard::parse::<CandidateList>(text, &()) {
        Guarded::Parsed(CandidateList(list)) if !list.is_empty() => {
            list.into_iter().map(|c| c.name).collect()
        }
        _ => salvage_names(text),
    }
}

/// Names from free text: one per line, bullets and numbering removed
pub fn salvage_names(text: &str) -> Vec<String> {
    schema_guard::strip_fences(text)
        .lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| {
                    c.is_ascii_digit() || matches!(c, '-' | '*' | '•' | '.' | ')')
                })
                .trim()
                .trim_matches(|c: char| matches!(c, '"' | '\'' | ',' | '[' | ']'))
                .trim()
                .to_string()
        })
        .filter(|name| !name.is_empty() && name.chars().count() <= 80)
        .collect()
}

fn is_duplicate(seen: &[String], name: &str) -> bool {
    let lower = name.to_lowercase();
    seen.iter().any(|existing| {
        existing == &lower || strsim::jaro_winkler(existing, &lower) >= DUPLICATE_SIMILARITY
    })
}

/// Order-preserving, case-insensitive fuzzy dedupe
pub fn merge_names(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut merged = Vec::new();
    for name in names {
        let name = name.trim().to_string();
        if name.is_empty() || is_duplicate(&seen, &name) {
            continue;
        }
        seen.push(name.to_lowercase());
        merged.push(name);
    }
    merged
}

fn dedupe_candidates(candidates: Vec<Candidate>, max: usize) -> Vec<Candidate> {
    let mut seen: Vec<String> = Vec::new();
    let mut urls = HashSet::new();
    let mut kept = Vec::new();
    for candidate in candidates {
        if kept.len() >= max {
            break;
        }
        if is_duplicate(&seen, &candidate.name) {
            continue;
        }
        if let Some(url) = candidate.url.as_deref() {
            if !urls.insert(url.trim_end_matches('/').to_lowercase()) {
                continue;
            }
        }
        seen.push(candidate.name.to_lowercase());
        kept.push(candidate);
    }
    kept
}

fn search_query(answers: &AnswerSet) -> String {
    let description = ["company_value", "solution", "business_idea"]
        .iter()
        .find_map(|key| answers.get(*key).and_then(|v| v.as_str()))
        .unwrap_or_default();
    let short: String = description.chars().take(120).collect();
    format!("{} competitors", short.trim())
}
