//! Free-text advisory prompts: coaching, answer drafts, plan summary and
//! market sizing

use bpa_common::AnswerSet;

use super::{competitors::describe_page, PromptOptions};
use crate::types::{PageSignals, PromptSpec};

const ADVISOR_SYSTEM: &str = "You are an expert in business plans and company analysis. \
                              Give concrete, specific answers without explaining how you \
                              arrived at them.";

pub fn section_feedback(section: &str, text: &str, options: &PromptOptions) -> PromptSpec {
    PromptSpec {
        system_message: "You are a constructive, pedagogical startup coach.".to_string(),
        user_message: format!(
            "Here is the \"{}\" section of a startup's business plan:\n\"{}\"\n\n\
             Give a short comment in {}: what is good, what can be improved, and one tip \
             for the founder. Answer in three sentences.",
            section, text, options.language
        ),
        expected_schema_hint: String::new(),
    }
}

/// Extra instruction for questions with a known focus
fn draft_focus(question_id: &str) -> Option<&'static str> {
    match question_id {
        "customer_problem" => Some(
            "Describe the exact problem the target customers have and how it shows up \
             in their daily work.",
        ),
        "problem_evidence" => Some(
            "Give concrete evidence that the problem exists: statistics, studies or trends \
             that concern the target customers.",
        ),
        "market_gap" => Some(
            "Name the specific gap in the market this company fills and why existing \
             alternatives leave it open.",
        ),
        "why_now" => Some(
            "Explain which technical, market or regulatory changes make this the right \
             time for the company.",
        ),
        "unique_solution" => Some(
            "Explain what makes the solution unique and hard to copy compared with \
             competitors.",
        ),
        "main_risks" => Some(
            "Identify the largest risks for the company and how each can be handled.",
        ),
        _ => None,
    }
}

/// Draft an answer to one form question from the company's website
pub fn answer_draft(
    question_id: &str,
    question_text: &str,
    business: &str,
    page: &PageSignals,
    options: &PromptOptions,
) -> PromptSpec {
    let mut user = format!("Question: {}\n\n", question_text);
    if !business.trim().is_empty() {
        user.push_str(&format!("About the company:\n{}\n\n", business.trim()));
    }
    user.push_str(&format!("From the company's website:\n{}\n", describe_page(page)));
    if let Some(focus) = draft_focus(question_id) {
        user.push_str(focus);
        user.push('\n');
    }
    user.push_str(&format!(
        "Answer the question for this company in {}. Give a concrete, specific answer \
         of at least 100 words.",
        options.language
    ));

    PromptSpec {
        system_message: ADVISOR_SYSTEM.to_string(),
        user_message: user,
        expected_schema_hint: String::new(),
    }
}

/// Ask for exactly two follow-up questions on a draft answer
pub fn follow_up_questions(
    question_text: &str,
    current_answer: &str,
    business: &str,
    options: &PromptOptions,
) -> PromptSpec {
    let schema_hint = r#"["First follow-up question", "Second follow-up question"]"#.to_string();
    let user = format!(
        "Question: \"{}\"\nAnswer so far: \"{}\"\nAbout the company: \"{}\"\n\n\
         Give EXACTLY 2 sharp follow-up questions or clarifications that would make this \
         answer stronger for this specific company. Write them in {}. Respond with a JSON \
         array of exactly two strings:\n{}",
        question_text, current_answer, business, options.language, schema_hint
    );

    PromptSpec {
        system_message: ADVISOR_SYSTEM.to_string(),
        user_message: user,
        expected_schema_hint: schema_hint,
    }
}

/// Short summary of the whole plan: strengths, weaknesses, next steps
pub fn plan_summary(answers: &AnswerSet, options: &PromptOptions) -> PromptSpec {
    let plan = serde_json::to_string_pretty(answers).unwrap_or_default();
    PromptSpec {
        system_message: "You are a constructive, pedagogical startup coach.".to_string(),
        user_message: format!(
            "Here is a startup's complete business plan as JSON:\n{}\n\n\
             Summarize it in {}. Point out its strengths and weaknesses and recommend \
             concrete next steps. Use at most five sentences.",
            plan, options.language
        ),
        expected_schema_hint: String::new(),
    }
}

/// Reply format parsed by `ModelEstimator`
pub const MARKET_ESTIMATE_FORMAT: &str = "Market size: <number> <currency>\nSource: <short source>";

pub fn market_estimate(industry: &str, region: &str) -> PromptSpec {
    PromptSpec {
        system_message: "You are a market analysis expert.".to_string(),
        user_message: format!(
            "Estimate the total addressable market for the industry \"{}\" in the region \
             \"{}\". Reply with exactly two lines and nothing else:\n{}",
            industry, region, MARKET_ESTIMATE_FORMAT
        ),
        expected_schema_hint: String::new(),
    }
}
