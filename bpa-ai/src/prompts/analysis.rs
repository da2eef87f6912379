//! Business-plan assessment prompts

use bpa_common::analysis::ScoreCategory;
use bpa_common::AnswerSet;
use serde_json::Value;
use std::collections::BTreeSet;

use super::{schema, PromptMode, PromptOptions};
use crate::types::PromptSpec;

/// Which answer keys inform each score category
///
/// Used to group answers in the prompt and to grade categories on the
/// fallback path. Keys not listed here are still sent, under "Other answers".
pub const CATEGORY_FIELDS: &[(ScoreCategory, &[&str])] = &[
    (
        ScoreCategory::ProblemSolution,
        &[
            "company_value",
            "business_idea",
            "customer_problem",
            "problem_evidence",
            "market_gap",
            "solution",
            "why_now",
        ],
    ),
    (
        ScoreCategory::Market,
        &[
            "target_customer",
            "market_size",
            "market_potential",
            "market_trends",
            "competitors",
            "competition",
            "unique_solution",
        ],
    ),
    (
        ScoreCategory::BusinessModel,
        &["revenue_block", "revenue_model", "growth_plan", "ip_rights"],
    ),
    (
        ScoreCategory::Team,
        &[
            "team",
            "founder_market_fit",
            "team_skills",
            "hiring_plan",
            "board_advisors",
        ],
    ),
    (ScoreCategory::Traction, &["traction", "milestones"]),
    (
        ScoreCategory::FinancialPlan,
        &["capital_block", "runway", "exit_strategy"],
    ),
    (ScoreCategory::Risk, &["main_risks", "esg"]),
];

/// Answer keys that belong to `category`
pub fn fields_for(category: ScoreCategory) -> &'static [&'static str] {
    CATEGORY_FIELDS
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, fields)| *fields)
        .unwrap_or(&[])
}

/// True when the answer carries content (non-blank string, number, bool,
/// non-empty array or object)
pub fn is_answered(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// Render one answer value without loss
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_answers(answers: &AnswerSet) -> String {
    let mut out = String::new();
    let mut placed = BTreeSet::new();

    for (category, fields) in CATEGORY_FIELDS {
        let present: Vec<&str> = fields
            .iter()
            .copied()
            .filter(|key| answers.contains_key(*key))
            .collect();
        if present.is_empty() {
            continue;
        }
        out.push_str(&format!("## {}\n", category.label()));
        for key in present {
            if let Some(value) = answers.get(key) {
                out.push_str(&format!("[{}]: {}\n", key, render_value(value)));
                placed.insert(key);
            }
        }
        out.push('\n');
    }

    let others: Vec<(&String, &Value)> = answers
        .iter()
        .filter(|(key, _)| !placed.contains(key.as_str()))
        .collect();
    if !others.is_empty() {
        out.push_str("## Other answers\n");
        for (key, value) in others {
            out.push_str(&format!("[{}]: {}\n", key, render_value(value)));
        }
    }

    out
}

pub(super) fn build_assessment(
    answers: &AnswerSet,
    mode: PromptMode,
    options: &PromptOptions,
) -> PromptSpec {
    let schema = match mode {
        PromptMode::Standard => schema::standard_schema(),
        PromptMode::Premium => schema::premium_schema(),
    };
    let schema_hint = serde_json::to_string_pretty(&schema).unwrap_or_else(|_| schema.to_string());

    let system_message = format!(
        "You are an experienced startup investment analyst. Assess business plans the way a \
         seed or Series A investor would. Respond with JSON only, no prose, no markdown. \
         Write all text values in {}.",
        options.language
    );

    let mut user = String::new();
    user.push_str("Assess the following business plan.\n\n");
    if let Some(company) = options.company.as_deref() {
        user.push_str(&format!("Company: {}\n", company));
    }
    if let Some(industry) = options.industry.as_deref() {
        user.push_str(&format!("Industry: {}\n", industry));
    }
    if let Some(region) = options.region.as_deref() {
        user.push_str(&format!("Region: {}\n", region));
    }
    user.push('\n');
    user.push_str(&render_answers(answers));
    user.push('\n');

    if let Some(context) = options.context.as_deref() {
        user.push_str("Reference market data:\n");
        user.push_str(context);
        user.push_str("\n\n");
    }

    user.push_str(
        "Scoring rules: each scoreBreakdown value must not exceed its stated maximum and \
         `score` is the overall readiness from 0 to 100. `feedback` keys must be answer keys \
         shown in brackets above; give feedback for every answer that matters to an investor.\n",
    );
    if mode == PromptMode::Premium {
        user.push_str(
            "Also produce the full `premiumAnalysis` section: a SWOT, three-year financial \
             projections, phased recommendations, benchmark comparison, investment proposal, \
             a 60-second pitch video package, market trends, competitive landscape, risk \
             mitigation plan and image-generation prompts.\n",
        );
    }
    user.push_str("\nReturn exactly one JSON object with this shape:\n");
    user.push_str(&schema_hint);

    PromptSpec {
        system_message,
        user_message: user,
        expected_schema_hint: schema_hint,
    }
}
