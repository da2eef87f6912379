//! Response Normalizer / Schema Guard
//!
//! Model output is an untrusted string. It may be wrapped in markdown code
//! fences, cut off mid-object, or not JSON at all. `parse` never fails: it
//! returns `Guarded::Parsed` when the text yielded a genuine value and
//! `Guarded::Defaulted` when any required part had to come from fallback
//! defaults. Every field of the returned value is populated either way.

use bpa_common::analysis::{
    ActionItem, Insight, Priority, ScoreBreakdown, ScoreCategory, Strength,
    FALLBACK_DEAL_READY_SCORE, FALLBACK_SCORE,
};
use bpa_common::analysis::lenient;
use bpa_common::{AnswerSet, PremiumAnalysis};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::prompts::{fields_for, is_answered};

/// Parse outcome: the value is always usable
#[derive(Debug, Clone, PartialEq)]
pub enum Guarded<T> {
    Parsed(T),
    Defaulted(T),
}

impl<T> Guarded<T> {
    pub fn is_defaulted(&self) -> bool {
        matches!(self, Guarded::Defaulted(_))
    }

    pub fn value(&self) -> &T {
        match self {
            Guarded::Parsed(v) | Guarded::Defaulted(v) => v,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Guarded::Parsed(v) | Guarded::Defaulted(v) => v,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Guarded<U> {
        match self {
            Guarded::Parsed(v) => Guarded::Parsed(f(v)),
            Guarded::Defaulted(v) => Guarded::Defaulted(f(v)),
        }
    }
}

/// A target shape the guard can produce
pub trait Schema: Sized {
    type Context: ?Sized;

    /// Every required field present with a neutral value
    fn fallback(ctx: &Self::Context) -> Self;

    /// Build from structurally valid JSON, defaulting what is missing
    fn from_json(value: Value, ctx: &Self::Context) -> Guarded<Self>;
}

/// Parse untrusted model text into `S`
pub fn parse<S: Schema>(raw: &str, ctx: &S::Context) -> Guarded<S> {
    match parse_value(raw) {
        Some(value) => S::from_json(value, ctx),
        None => Guarded::Defaulted(S::fallback(ctx)),
    }
}

/// Remove leading/trailing markdown code-fence markers
pub fn strip_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Strip fences and parse; falls back to the outermost `{...}` or `[...]`
/// span when prose surrounds the JSON
pub fn parse_value(raw: &str) -> Option<Value> {
    let text = strip_fences(raw);
    if text.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str(text) {
        return Some(value);
    }

    let start = text.find(|c: char| c == '{' || c == '[')?;
    let close = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(close)?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

// ============================================================================
// Field coercion helpers
// ============================================================================

/// Integer points in `0..=max` from a number or numeric string
fn as_points(value: &Value, max: u8) -> Option<u8> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !raw.is_finite() {
        return None;
    }
    Some(raw.round().clamp(0.0, f64::from(max)) as u8)
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(as_text).collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(items.iter().filter_map(as_text).collect()),
        Value::String(s) if !s.trim().is_empty() => Some(vec![s.trim().to_string()]),
        _ => None,
    }
}

/// First present key among aliases
fn pick<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k).filter(|v| !v.is_null()))
}

fn parse_level(value: Option<&Value>) -> Option<&'static str> {
    let text = value?.as_str()?.trim().to_ascii_lowercase();
    match text.as_str() {
        "high" | "hög" | "strong" => Some("high"),
        "medium" | "medel" | "moderate" => Some("medium"),
        "low" | "låg" | "weak" => Some("low"),
        _ => None,
    }
}

fn to_strength(level: Option<&str>) -> Strength {
    match level {
        Some("high") => Strength::High,
        Some("low") => Strength::Low,
        _ => Strength::Medium,
    }
}

fn to_priority(level: Option<&str>) -> Priority {
    match level {
        Some("high") => Priority::High,
        Some("low") => Priority::Low,
        _ => Priority::Medium,
    }
}

// ============================================================================
// Standard assessment
// ============================================================================

/// Standard-tier fields produced by one completion
#[derive(Debug, Clone, PartialEq)]
pub struct StandardAssessment {
    pub score: u8,
    pub score_breakdown: ScoreBreakdown,
    pub insights: Vec<Insight>,
    pub feedback: BTreeMap<String, String>,
    pub action_items: Vec<ActionItem>,
}

const FALLBACK_FEEDBACK: &str = "Automated feedback is not available for this answer right now. \
                                 Re-run the analysis to get a detailed critique.";

/// Neutral note for every answered key
pub fn fallback_feedback(answers: &AnswerSet) -> BTreeMap<String, String> {
    answers
        .iter()
        .filter(|(_, value)| is_answered(value))
        .map(|(key, _)| (key.clone(), FALLBACK_FEEDBACK.to_string()))
        .collect()
}

/// One pending insight per category; strength reflects answer coverage
pub fn fallback_insights(answers: &AnswerSet) -> Vec<Insight> {
    ScoreCategory::ALL
        .iter()
        .map(|category| {
            let answered = fields_for(*category)
                .iter()
                .filter(|key| answers.get(**key).map(is_answered).unwrap_or(false))
                .count();
            Insight {
                category: category.key().to_string(),
                strength: if answered > 0 { Strength::Medium } else { Strength::Low },
                summary: format!("{}: assessment pending", category.label()),
                details: format!(
                    "This category could not be assessed automatically. \
                     {} related answer(s) were provided.",
                    answered
                ),
            }
        })
        .collect()
}

pub fn fallback_action_items() -> Vec<ActionItem> {
    vec![ActionItem {
        priority: Priority::High,
        title: "Re-run the assessment".to_string(),
        description: "The automated assessment was incomplete, so the scores shown are provisional."
            .to_string(),
        timeframe: "Now".to_string(),
        impact: "Replaces provisional values with a genuine assessment".to_string(),
    }]
}

fn parse_breakdown(value: &Value) -> Option<ScoreBreakdown> {
    let obj = value.as_object()?;
    let mut raw = Vec::new();
    for category in ScoreCategory::ALL {
        let snake = snake_case(category.key());
        let points = pick(obj, &[category.key(), snake.as_str()]).and_then(|v| as_points(v, 100))?;
        raw.push((category, points));
    }

    // Models sometimes grade every category out of 100; rescale onto the maxima
    let percent_scale = raw.iter().any(|(c, p)| *p > c.max_points());
    let mut breakdown = ScoreBreakdown::default();
    for (category, points) in raw {
        let points = if percent_scale {
            (u32::from(points) * u32::from(category.max_points()) / 100) as u8
        } else {
            points
        };
        breakdown.set(category, points);
    }
    Some(breakdown)
}

fn snake_case(camel: &str) -> String {
    let mut out = String::with_capacity(camel.len() + 4);
    for c in camel.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn parse_insight(value: &Value) -> Option<Insight> {
    let obj = value.as_object()?;
    let summary = pick(obj, &["summary", "title"]).and_then(as_text)?;
    Some(Insight {
        category: pick(obj, &["category", "area"]).and_then(as_text).unwrap_or_default(),
        strength: to_strength(parse_level(pick(obj, &["strength", "level"]))),
        summary,
        details: pick(obj, &["details", "description"]).and_then(as_text).unwrap_or_default(),
    })
}

fn parse_action_item(value: &Value) -> Option<ActionItem> {
    let obj = value.as_object()?;
    let title = pick(obj, &["title", "action"]).and_then(as_text)?;
    Some(ActionItem {
        priority: to_priority(parse_level(obj.get("priority"))),
        title,
        description: pick(obj, &["description", "details"]).and_then(as_text).unwrap_or_default(),
        timeframe: pick(obj, &["timeframe", "timeline"]).and_then(as_text).unwrap_or_default(),
        impact: obj.get("impact").and_then(as_text).unwrap_or_default(),
    })
}

impl Schema for StandardAssessment {
    type Context = AnswerSet;

    fn fallback(answers: &AnswerSet) -> Self {
        Self {
            score: FALLBACK_SCORE,
            score_breakdown: ScoreBreakdown::proportional(FALLBACK_SCORE),
            insights: fallback_insights(answers),
            feedback: fallback_feedback(answers),
            action_items: fallback_action_items(),
        }
    }

    fn from_json(value: Value, answers: &AnswerSet) -> Guarded<Self> {
        let Value::Object(obj) = value else {
            return Guarded::Defaulted(Self::fallback(answers));
        };
        let mut defaulted = false;

        let score = pick(&obj, &["score", "total_score", "totalScore"])
            .and_then(|v| as_points(v, 100));
        let score = match score {
            Some(score) => score,
            None => {
                defaulted = true;
                FALLBACK_SCORE
            }
        };

        let breakdown =
            pick(&obj, &["scoreBreakdown", "score_breakdown"]).and_then(parse_breakdown);
        let score_breakdown = match breakdown {
            Some(breakdown) => breakdown,
            None => {
                defaulted = true;
                ScoreBreakdown::proportional(score)
            }
        };

        let insights = match pick(&obj, &["insights"]).and_then(Value::as_array) {
            Some(items) => items.iter().filter_map(parse_insight).collect(),
            None => {
                defaulted = true;
                fallback_insights(answers)
            }
        };

        let mut feedback: BTreeMap<String, String> = pick(&obj, &["feedback"])
            .and_then(Value::as_object)
            .map(|fields| {
                fields
                    .iter()
                    .filter(|(key, _)| answers.contains_key(key.as_str()))
                    .filter_map(|(key, v)| as_text(v).map(|text| (key.clone(), text)))
                    .collect()
            })
            .unwrap_or_default();
        if feedback.is_empty() && answers.values().any(is_answered) {
            defaulted = true;
            feedback = fallback_feedback(answers);
        }

        let action_items = match pick(&obj, &["actionItems", "action_items"])
            .and_then(Value::as_array)
        {
            Some(items) => items.iter().filter_map(parse_action_item).collect(),
            None => {
                defaulted = true;
                fallback_action_items()
            }
        };

        let assessment = Self {
            score,
            score_breakdown,
            insights,
            feedback,
            action_items,
        };
        if defaulted {
            Guarded::Defaulted(assessment)
        } else {
            Guarded::Parsed(assessment)
        }
    }
}

// ============================================================================
// Premium payload
// ============================================================================

/// Read one section with `read`; a missing section or one of the wrong shape
/// defaults and marks the payload provisional
fn section<T: Default>(
    obj: &Map<String, Value>,
    key: &str,
    defaulted: &mut bool,
    read: impl FnOnce(&Value) -> Option<T>,
) -> T {
    match obj.get(key).filter(|v| !v.is_null()).map(|v| (v, read(v))) {
        Some((_, Some(value))) => value,
        Some((raw, None)) => {
            tracing::debug!(
                section = key,
                kind = json_kind(raw),
                "Premium section malformed, using default"
            );
            *defaulted = true;
            T::default()
        }
        None => {
            *defaulted = true;
            T::default()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Object sections; leaves inside coerce field by field
fn object<T: DeserializeOwned>(value: &Value) -> Option<T> {
    value.is_object().then(|| serde_json::from_value(value.clone()).ok()).flatten()
}

fn list_of_text(value: &Value) -> Option<Vec<String>> {
    (value.is_array() || value.is_string()).then(|| lenient::string_list_of(value))
}

fn non_empty_text(value: &Value) -> Option<String> {
    Some(lenient::text_of(value)).filter(|text| !text.is_empty())
}

fn list_of<T: DeserializeOwned>(value: &Value) -> Option<Vec<T>> {
    value.is_array().then(|| lenient::items_of(value))
}

impl Schema for PremiumAnalysis {
    type Context = ();

    fn fallback(_: &()) -> Self {
        PremiumAnalysis::provisional()
    }

    fn from_json(value: Value, _: &()) -> Guarded<Self> {
        let Value::Object(mut obj) = value else {
            return Guarded::Defaulted(Self::fallback(&()));
        };
        // Accept both the full premium shape and a bare premium section
        if let Some(Value::Object(inner)) = obj.remove("premiumAnalysis") {
            obj = inner;
        }

        let mut defaulted = false;
        let deal_ready_score = match obj.get("dealReadyScore").and_then(|v| as_points(v, 100)) {
            Some(score) => score,
            None => {
                defaulted = true;
                FALLBACK_DEAL_READY_SCORE
            }
        };

        let d = &mut defaulted;
        let mut premium = PremiumAnalysis {
            swot: section(&obj, "swot", d, object),
            financial_projections: section(&obj, "financialProjections", d, object),
            detailed_recommendations: section(&obj, "detailedRecommendations", d, object),
            benchmark_analysis: section(&obj, "benchmarkAnalysis", d, object),
            investment_proposal: section(&obj, "investmentProposal", d, object),
            pitch_video: section(&obj, "pitchVideo", d, object),
            market_trends: section(&obj, "marketTrends", d, list_of_text),
            competitive_landscape: section(&obj, "competitiveLandscape", d, non_empty_text),
            risk_mitigation: section(&obj, "riskMitigation", d, object),
            image_prompts: section(&obj, "imagePrompts", d, list_of),
            deal_ready_score,
            provisional: false,
        };

        if defaulted {
            premium.provisional = true;
            Guarded::Defaulted(premium)
        } else {
            Guarded::Parsed(premium)
        }
    }
}

// ============================================================================
// Competitor discovery shapes
// ============================================================================

/// A competitor named by the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateList(pub Vec<Candidate>);

fn parse_candidate(value: &Value) -> Option<Candidate> {
    match value {
        Value::String(name) if !name.trim().is_empty() => Some(Candidate {
            name: name.trim().to_string(),
            url: None,
        }),
        Value::Object(obj) => {
            let name = pick(obj, &["name", "company"]).and_then(as_text)?;
            let url = pick(obj, &["url", "website", "site"])
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|u| {
                    !u.is_empty()
                        && !u.eq_ignore_ascii_case("null")
                        && !u.eq_ignore_ascii_case("n/a")
                })
                .map(str::to_string);
            Some(Candidate { name, url })
        }
        _ => None,
    }
}

/// Locate the list inside an array or a wrapper object
fn list_items(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(obj) => ["competitors", "suggestions", "items", "names"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_array)),
        _ => None,
    }
}

impl Schema for CandidateList {
    type Context = ();

    fn fallback(_: &()) -> Self {
        CandidateList::default()
    }

    fn from_json(value: Value, _: &()) -> Guarded<Self> {
        match list_items(&value) {
            Some(items) => {
                Guarded::Parsed(CandidateList(items.iter().filter_map(parse_candidate).collect()))
            }
            None => Guarded::Defaulted(CandidateList::default()),
        }
    }
}

/// Enrichment for one competitor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompetitorSummary {
    pub offering_summary: Option<String>,
    pub strengths: Option<Vec<String>>,
    pub weaknesses: Option<Vec<String>>,
    pub opportunities: Option<Vec<String>>,
}

impl Schema for CompetitorSummary {
    type Context = ();

    fn fallback(_: &()) -> Self {
        CompetitorSummary::default()
    }

    fn from_json(value: Value, _: &()) -> Guarded<Self> {
        let Value::Object(obj) = value else {
            return Guarded::Defaulted(CompetitorSummary::default());
        };
        let summary = CompetitorSummary {
            offering_summary: pick(
                &obj,
                &["offeringSummary", "offering_summary", "summary", "offering"],
            )
            .and_then(as_text),
            strengths: obj.get("strengths").and_then(as_string_list),
            weaknesses: obj.get("weaknesses").and_then(as_string_list),
            opportunities: obj.get("opportunities").and_then(as_string_list),
        };
        if summary.offering_summary.is_none() {
            Guarded::Defaulted(CompetitorSummary::default())
        } else {
            Guarded::Parsed(summary)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn answers() -> AnswerSet {
        let mut answers = AnswerSet::new();
        answers.insert("company_value".into(), json!("AI scheduling tool for clinics"));
        answers.insert("customer_problem".into(), json!("manual booking"));
        answers
    }

    const GOOD: &str = r#"{
        "score": 68,
        "scoreBreakdown": {"problemSolution": 12, "market": 10, "businessModel": 9,
                           "team": 8, "traction": 6, "financialPlan": 9, "risk": 6},
        "insights": [{"category": "market", "strength": "High", "summary": "Large niche",
                      "details": "Clinics are underserved"}],
        "feedback": {"company_value": "Quantify time saved.", "unknown_key": "dropped"},
        "actionItems": [{"priority": "high", "title": "Run a pilot",
                         "description": "Three clinics", "timeframe": "3 months",
                         "impact": "Traction"}]
    }"#;

    #[test]
    fn test_fenced_equals_unfenced() {
        let fenced = format!("```json\n{}\n```", GOOD);
        let plain = parse::<StandardAssessment>(GOOD, &answers());
        let wrapped = parse::<StandardAssessment>(&fenced, &answers());
        assert_eq!(plain, wrapped);
        assert!(!plain.is_defaulted());

        let bare_fence = format!("```\n{}\n```", GOOD);
        assert_eq!(parse::<StandardAssessment>(&bare_fence, &answers()), plain);
    }

    #[test]
    fn test_non_json_yields_conformant_default() {
        for raw in ["", "   ", "I'm sorry, I can't help with that.", "{\"score\": 7"] {
            let guarded = parse::<StandardAssessment>(raw, &answers());
            assert!(guarded.is_defaulted(), "input {:?}", raw);
            let value = guarded.value();
            assert_eq!(value.score, FALLBACK_SCORE);
            assert_eq!(value.insights.len(), ScoreCategory::ALL.len());
            assert!(value.feedback.contains_key("company_value"));
            assert!(value.feedback.contains_key("customer_problem"));
            assert!(!value.action_items.is_empty());
            assert!(value.score_breakdown.total() <= 100);
        }
    }

    #[test]
    fn test_feedback_keys_are_subset_of_answers() {
        let parsed = parse::<StandardAssessment>(GOOD, &answers()).into_inner();
        assert_eq!(parsed.feedback.len(), 1);
        assert!(parsed.feedback.contains_key("company_value"));
    }

    #[test]
    fn test_parsed_fields_are_normalized() {
        let parsed = parse::<StandardAssessment>(GOOD, &answers()).into_inner();
        assert_eq!(parsed.score, 68);
        assert_eq!(parsed.score_breakdown.problem_solution, 12);
        assert_eq!(parsed.insights[0].strength, Strength::High);
        assert_eq!(parsed.action_items[0].priority, Priority::High);
    }

    #[test]
    fn test_partial_object_defaults_missing_fields() {
        let guarded = parse::<StandardAssessment>(r#"{"score": "82"}"#, &answers());
        assert!(guarded.is_defaulted());
        let value = guarded.into_inner();
        assert_eq!(value.score, 82);
        assert_eq!(value.score_breakdown, ScoreBreakdown::proportional(82));
        assert!(!value.feedback.is_empty());
    }

    #[test]
    fn test_out_of_range_score_clamped() {
        let value = parse::<StandardAssessment>(r#"{"score": 250}"#, &answers()).into_inner();
        assert_eq!(value.score, 100);
        let value = parse::<StandardAssessment>(r#"{"score": -4}"#, &answers()).into_inner();
        assert_eq!(value.score, 0);
    }

    #[test]
    fn test_percent_breakdown_rescaled() {
        let raw = r#"{"score": 70, "score_breakdown": {"problem_solution": 80, "market": 60,
            "business_model": 70, "team": 90, "traction": 40, "financial_plan": 50, "risk": 100}}"#;
        let breakdown = parse::<StandardAssessment>(raw, &answers()).into_inner().score_breakdown;
        assert_eq!(breakdown.problem_solution, 12);
        assert_eq!(breakdown.risk, 10);
        assert!(breakdown.total() <= 100);
    }

    #[test]
    fn test_prose_around_json_is_tolerated() {
        let raw = format!("Here is the analysis:\n{}\nHope this helps!", GOOD);
        assert!(!parse::<StandardAssessment>(&raw, &answers()).is_defaulted());
    }

    #[test]
    fn test_premium_nested_and_flat_shapes_agree() {
        let section = json!({
            "swot": {"strengths": ["Team"]},
            "financialProjections": {"year1": {"revenue": 1000000}},
            "detailedRecommendations": {"immediate": [{"action": "Hire CTO"}]},
            "benchmarkAnalysis": {},
            "investmentProposal": {"askAmount": "4 MSEK"},
            "pitchVideo": {"script": "Meet ClinicBook"},
            "marketTrends": ["Digital health"],
            "competitiveLandscape": "Fragmented",
            "riskMitigation": {"identifiedRisks": []},
            "imagePrompts": [{"purpose": "cover", "prompt": "clinic"}],
            "dealReadyScore": 71
        });
        let flat = parse::<PremiumAnalysis>(&section.to_string(), &());
        let wrapper = json!({"score": 60, "premiumAnalysis": section});
        let nested = parse::<PremiumAnalysis>(&wrapper.to_string(), &());

        assert_eq!(flat, nested);
        assert!(!flat.is_defaulted());
        assert_eq!(flat.value().deal_ready_score, 71);
        assert_eq!(flat.value().investment_proposal.ask_amount, "4 MSEK");
    }

    #[test]
    fn test_premium_malformed_section_defaults_only_that_section() {
        let raw = r#"{"swot": "not an object", "marketTrends": ["AI"], "dealReadyScore": 64}"#;
        let guarded = parse::<PremiumAnalysis>(raw, &());
        assert!(guarded.is_defaulted());
        let premium = guarded.into_inner();
        assert!(premium.provisional);
        assert!(premium.swot.strengths.is_empty());
        assert_eq!(premium.market_trends, vec!["AI"]);
        assert_eq!(premium.deal_ready_score, 64);
    }

    #[test]
    fn test_premium_mistyped_leaves_are_coerced_not_discarded() {
        let raw = json!({
            "investmentProposal": {
                "askAmount": "4 MSEK",
                "valuation": "20 MSEK",
                "useOfFunds": {"product": 40, "sales": 35, "operations": 25},
                "keyMetrics": {"mrr": "500k"},
                "investorBenefits": ["Recurring revenue"]
            },
            "financialProjections": {
                "year1": {"revenue": "2 MSEK", "costs": 3000000},
                "year2": {"revenue": 5000000, "customers": "150"},
                "year3": {"revenue": 9000000}
            },
            "benchmarkAnalysis": {
                "peerComparison": [
                    {"company": "Doctolib", "funding": "500 MEUR", "valuation": "5 BEUR"}
                ]
            },
            "marketTrends": ["Digital health", 2025],
            "dealReadyScore": "70"
        });
        let premium = parse::<PremiumAnalysis>(&raw.to_string(), &()).into_inner();

        let proposal = &premium.investment_proposal;
        assert_eq!(proposal.ask_amount, "4 MSEK");
        assert_eq!(proposal.valuation, "20 MSEK");
        assert_eq!(proposal.use_of_funds.len(), 3);
        assert_eq!(proposal.key_metrics, vec!["mrr: 500k"]);
        assert_eq!(proposal.investor_benefits, vec!["Recurring revenue"]);

        let years = &premium.financial_projections;
        assert_eq!(years.year1.revenue, 2_000_000.0);
        assert_eq!(years.year2.revenue, 5_000_000.0);
        assert_eq!(years.year2.customers, 150);
        assert_eq!(years.year3.revenue, 9_000_000.0);

        assert_eq!(premium.benchmark_analysis.peer_comparison[0].name, "Doctolib");
        assert_eq!(premium.market_trends, vec!["Digital health", "2025"]);
        assert_eq!(premium.deal_ready_score, 70);
    }

    #[test]
    fn test_premium_garbage_is_provisional_default() {
        let premium = parse::<PremiumAnalysis>("no json here", &()).into_inner();
        assert!(premium.provisional);
        assert_eq!(premium.deal_ready_score, 75);
    }

    #[test]
    fn test_candidate_list_shapes() {
        let fenced = "```json\n[{\"name\": \"Doctolib\", \"url\": \"https://doctolib.fr\"}, \
                      {\"name\": \"Muntra\", \"url\": null}, \"Bokadirekt\"]\n```";
        let list = parse::<CandidateList>(fenced, &()).into_inner().0;
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].url.as_deref(), Some("https://doctolib.fr"));
        assert_eq!(list[1].url, None);
        assert_eq!(list[2].name, "Bokadirekt");

        let wrapped = parse::<CandidateList>(r#"{"competitors": [{"name": "A"}]}"#, &())
            .into_inner()
            .0;
        assert_eq!(wrapped.len(), 1);

        assert!(parse::<CandidateList>("1. Doctolib\n2. Muntra", &()).is_defaulted());
    }

    #[test]
    fn test_summary_without_offering_is_defaulted() {
        let guarded = parse::<CompetitorSummary>(r#"{"strengths": ["Brand"]}"#, &());
        assert!(guarded.is_defaulted());
        assert_eq!(guarded.into_inner(), CompetitorSummary::default());

        let ok = parse::<CompetitorSummary>(
            r#"{"offeringSummary": "Booking SaaS", "strengths": "Brand", "weaknesses": []}"#,
            &(),
        );
        assert!(!ok.is_defaulted());
        let ok = ok.into_inner();
        assert_eq!(ok.strengths, Some(vec!["Brand".to_string()]));
        assert_eq!(ok.weaknesses, Some(vec![]));
        assert_eq!(ok.opportunities, None);
    }
}
