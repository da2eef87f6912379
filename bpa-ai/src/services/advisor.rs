//! Free-text coaching: section feedback, answer help and plan summary
//!
//! Every call is a single attempt. A transport failure degrades to a fixed
//! fallback text; a rejection or missing credential reaches the caller.

use std::sync::Arc;

use bpa_common::analysis::lenient;
use bpa_common::AnswerSet;
use serde_json::Value;
use tracing::{debug, warn};

use super::page_extractor::PageExtractor;
use super::schema_guard;
use crate::error::AnalysisError;
use crate::prompts::{advisory, PromptOptions};
use crate::types::{
    AnswerHelp, AnswerHelpRequest, CompletionError, CompletionOptions, CompletionService,
    PageSignals, PromptSpec,
};
use crate::utils::{retry, RetryPolicy};

/// Returned when the completion service cannot be reached
pub const FALLBACK_SECTION_FEEDBACK: &str =
    "Feedback is not available right now. Please try again in a moment.";

pub const FALLBACK_PLAN_SUMMARY: &str =
    "A summary is not available right now. Please try again in a moment.";

/// Pads the follow-up list when the model returns fewer than two
pub const FALLBACK_FOLLOW_UP: &str = "Can you give a concrete example from your own business?";

const FOLLOW_UP_COUNT: usize = 2;

pub struct Advisor {
    completion: Arc<dyn CompletionService>,
    extractor: Arc<PageExtractor>,
    model: String,
    language: String,
}

impl Advisor {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        extractor: Arc<PageExtractor>,
        model: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            completion,
            extractor,
            model: model.into(),
            language: language.into(),
        }
    }

    /// Short critique of one section's text
    pub async fn section_feedback(
        &self,
        section: &str,
        text: &str,
    ) -> Result<String, AnalysisError> {
        if section.trim().is_empty() || text.trim().is_empty() {
            return Err(AnalysisError::InvalidRequest(
                "Both section and text are required".to_string(),
            ));
        }

        let prompt = advisory::section_feedback(section, text, &self.prompt_options());
        let feedback = self.complete_text("section_feedback", &prompt, 200, 0.7).await?;
        Ok(feedback.unwrap_or_else(|| FALLBACK_SECTION_FEEDBACK.to_string()))
    }

    /// A few sentences on the whole plan
    pub async fn plan_summary(&self, answers: &AnswerSet) -> Result<String, AnalysisError> {
        if answers.is_empty() {
            return Err(AnalysisError::NoAnswers);
        }

        let prompt = advisory::plan_summary(answers, &self.prompt_options());
        let summary = self.complete_text("plan_summary", &prompt, 300, 0.7).await?;
        Ok(summary.unwrap_or_else(|| FALLBACK_PLAN_SUMMARY.to_string()))
    }

    /// Draft an answer from the company website, or ask two follow-up questions
    ///
    /// A draft is attempted only when a website was given, could be read, and
    /// the question is identified. Otherwise, or when the draft comes back
    /// empty, the follow-up questions are returned.
    pub async fn answer_help(
        &self,
        request: &AnswerHelpRequest,
    ) -> Result<AnswerHelp, AnalysisError> {
        if request.question_text.trim().is_empty() {
            return Err(AnalysisError::InvalidRequest(
                "questionText is required".to_string(),
            ));
        }
        let business = request.business_domain.as_deref().unwrap_or_default().trim();

        if !request.question_id.trim().is_empty() {
            if let Some(page) = self.website(request.website_url.as_deref()).await {
                let prompt = advisory::answer_draft(
                    request.question_id.trim(),
                    &request.question_text,
                    business,
                    &page,
                    &self.prompt_options(),
                );
                if let Some(draft) = self.complete_text("answer_draft", &prompt, 300, 0.3).await? {
                    return Ok(AnswerHelp::Draft { suggestion: draft });
                }
                debug!(question = %request.question_id, "No answer draft, asking follow-ups");
            }
        }

        let current = lenient::text_of(&request.current_answer);
        let prompt = advisory::follow_up_questions(
            &request.question_text,
            &current,
            business,
            &self.prompt_options(),
        );
        let reply = self.complete_text("follow_up_questions", &prompt, 200, 0.3).await?;
        Ok(AnswerHelp::FollowUps {
            suggestions: follow_ups(reply.as_deref()),
        })
    }

    async fn website(&self, url: Option<&str>) -> Option<PageSignals> {
        let url = url.map(str::trim).filter(|u| !u.is_empty())?;
        match self.extractor.extract(url).await {
            Ok(signals) => Some(signals),
            Err(e) => {
                warn!(url, error = %e, "Could not read company website for answer draft");
                None
            }
        }
    }

    /// Trimmed reply text; `None` when empty or the service is unavailable
    async fn complete_text(
        &self,
        operation: &str,
        prompt: &PromptSpec,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<Option<String>, AnalysisError> {
        let options = CompletionOptions {
            model: self.model.clone(),
            max_tokens,
            temperature,
            force_json_mode: false,
        };
        let result = retry(operation, &RetryPolicy::none(), CompletionError::is_retryable, || {
            self.completion.complete(prompt, &options)
        })
        .await;

        match result {
            Ok(completion) => {
                let text = completion.text.trim();
                Ok((!text.is_empty()).then(|| text.to_string()))
            }
            Err(e) => match AnalysisError::from_completion(&e, operation) {
                Some(fatal) => Err(fatal),
                None => {
                    warn!(operation, error = %e, "Completion unavailable, using fallback");
                    Ok(None)
                }
            },
        }
    }

    fn prompt_options(&self) -> PromptOptions {
        PromptOptions {
            language: self.language.clone(),
            ..PromptOptions::default()
        }
    }
}

/// Exactly two follow-up questions from the model reply
///
/// A JSON array is read element by element; any other non-empty reply counts
/// as a single question. Missing entries are padded with a generic question.
pub fn follow_ups(reply: Option<&str>) -> Vec<String> {
    let mut questions: Vec<String> = match reply {
        Some(text) => match schema_guard::parse_value(text) {
            Some(Value::Array(items)) => items
                .iter()
                .map(lenient::text_of)
                .filter(|q| !q.is_empty())
                .collect(),
            _ => vec![text.trim().to_string()],
        },
        None => Vec::new(),
    };
    questions.retain(|q| !q.is_empty());
    questions.truncate(FOLLOW_UP_COUNT);
    while questions.len() < FOLLOW_UP_COUNT {
        questions.push(FALLBACK_FOLLOW_UP.to_string());
    }
    questions
}
