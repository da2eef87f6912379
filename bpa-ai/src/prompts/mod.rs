//! Prompt Builder
//!
//! Pure functions turning an answer set into a `PromptSpec`. No I/O and no
//! validation of business semantics: whatever the caller supplies is sent.

pub mod advisory;
pub mod analysis;
pub mod competitors;
pub mod schema;

use bpa_common::AnswerSet;

use crate::types::PromptSpec;

pub use analysis::{fields_for, is_answered, CATEGORY_FIELDS};

/// Assessment tier requested from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    Standard,
    Premium,
}

/// Context shared by every prompt
#[derive(Debug, Clone)]
pub struct PromptOptions {
    /// Language for text values in the answer
    pub language: String,
    pub company: Option<String>,
    pub industry: Option<String>,
    pub region: Option<String>,
    /// Reference material appended to the prompt (premium market data)
    pub context: Option<String>,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            language: "English".to_string(),
            company: None,
            industry: None,
            region: None,
            context: None,
        }
    }
}

/// Build an assessment prompt with default options
pub fn build(answers: &AnswerSet, mode: PromptMode) -> PromptSpec {
    build_with(answers, mode, &PromptOptions::default())
}

pub fn build_with(answers: &AnswerSet, mode: PromptMode, options: &PromptOptions) -> PromptSpec {
    analysis::build_assessment(answers, mode, options)
}
