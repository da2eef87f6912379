//! Competitor discovery prompts

use bpa_common::AnswerSet;

use super::{schema, PromptOptions};
use crate::types::{PageSignals, PromptSpec};

/// Answer keys that describe what the company does, most specific first
const DESCRIPTION_FIELDS: &[&str] = &[
    "company_value",
    "business_idea",
    "solution",
    "customer_problem",
    "target_customer",
    "unique_solution",
    "competitors",
    "competition",
];

/// Short description of the business built from the answers
pub fn describe_business(answers: &AnswerSet) -> String {
    DESCRIPTION_FIELDS
        .iter()
        .filter_map(|key| answers.get(*key).map(|v| (*key, v)))
        .filter_map(|(key, value)| match value {
            serde_json::Value::String(s) if !s.trim().is_empty() => {
                Some(format!("{}: {}", key, s.trim()))
            }
            serde_json::Value::Null | serde_json::Value::String(_) => None,
            other => Some(format!("{}: {}", key, other)),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Website, title, description, headings and page text, one per line
pub fn describe_page(signals: &PageSignals) -> String {
    let mut text = format!("Website: {}\n", signals.url);
    if !signals.title.is_empty() {
        text.push_str(&format!("Page title: {}\n", signals.title));
    }
    if !signals.description.is_empty() {
        text.push_str(&format!("Description: {}\n", signals.description));
    }
    if !signals.headings.is_empty() {
        text.push_str(&format!("Headings: {}\n", signals.headings.join(" | ")));
    }
    text.push_str(&format!("Page text:\n{}\n", signals.visible_text));
    text
}

/// Ask for a short list of named competitors with their sites
pub fn competitor_list(answers: &AnswerSet, max: usize, options: &PromptOptions) -> PromptSpec {
    let schema_hint = schema::competitor_list_schema().to_string();
    let mut user = format!(
        "Name up to {} real companies that compete most directly with this business.\n\n{}\n",
        max,
        describe_business(answers)
    );
    if let Some(region) = options.region.as_deref() {
        user.push_str(&format!("Prefer companies active in: {}\n", region));
    }
    user.push_str(&format!(
        "\nRespond with a JSON array only, no prose and no markdown:\n{}",
        schema_hint
    ));

    PromptSpec {
        system_message: "You are a market analyst who maps competitive landscapes for startups. \
                         Respond with JSON only."
            .to_string(),
        user_message: user,
        expected_schema_hint: schema_hint,
    }
}

/// Summarize one competitor from its extracted page signals
pub fn competitor_summary(
    name: &str,
    signals: &PageSignals,
    business: &str,
    options: &PromptOptions,
) -> PromptSpec {
    let schema_hint = schema::competitor_summary_schema().to_string();
    let mut user = format!("Competitor: {}\n{}\n", name, describe_page(signals));
    user.push_str(&format!(
        "Our business:\n{}\n\nSummarize this competitor's offering, strengths and weaknesses, \
         and the opportunities it leaves open for our business. Write in {}. Respond with \
         exactly one JSON object:\n{}",
        business, options.language, schema_hint
    ));

    PromptSpec {
        system_message: "You are a competitive-intelligence analyst. Respond with JSON only."
            .to_string(),
        user_message: user,
        expected_schema_hint: schema_hint,
    }
}

/// Names-only suggestions for the competitor field of the form
pub fn competitor_suggestions(answers: &AnswerSet, options: &PromptOptions) -> PromptSpec {
    let schema_hint = r#"["Company A", "Company B"]"#.to_string();
    let mut user = format!(
        "Suggest well-known competitors or alternatives to this business.\n\n{}\n",
        describe_business(answers)
    );
    if let Some(industry) = options.industry.as_deref() {
        user.push_str(&format!("Industry: {}\n", industry));
    }
    user.push_str(&format!(
        "\nRespond with a JSON array of company names only:\n{}",
        schema_hint
    ));

    PromptSpec {
        system_message: "You are a market analyst. Respond with JSON only.".to_string(),
        user_message: user,
        expected_schema_hint: schema_hint,
    }
}
