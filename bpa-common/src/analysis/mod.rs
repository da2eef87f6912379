//! Analysis data model
//!
//! The Analysis artifact is the contract between the analysis pipeline and the
//! rendering/storage layers. Every non-optional field is always present on the
//! wire, even when the pipeline had to fall back to defaults (`provisional`).

mod competitor;
pub mod lenient;
mod premium;

pub use competitor::Competitor;
pub use premium::{
    BenchmarkAnalysis, BenchmarkRow, DetailedRecommendations, FinancialProjections, ImagePrompt,
    InvestmentProposal, PeerComparison, PitchVideo, PitchVideoScene, PremiumAnalysis,
    Recommendation, RiskItem, RiskMitigation, Swot, YearProjection, FALLBACK_DEAL_READY_SCORE,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Question identifier → answer value
///
/// Values are strings, numbers, or nested structures for grouped fields
/// (e.g. capital allocation). Ordered so prompts serialize deterministically.
pub type AnswerSet = BTreeMap<String, serde_json::Value>;

/// Answer keys the questionnaire uses for the company's industry
pub const INDUSTRY_ANSWER_KEYS: [&str; 2] = ["industry", "bransch"];

/// Answer keys the questionnaire uses for the operating region
pub const REGION_ANSWER_KEYS: [&str; 3] = ["region", "omrade", "område"];

/// Answer keys recording whether the company has a website
pub const WEBSITE_ANSWER_KEYS: [&str; 2] = ["hasWebsite", "has_website"];

/// First non-blank text answer among `keys`
pub fn answer_text(answers: &AnswerSet, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        let text = lenient::text_of(answers.get(*key)?);
        (!text.is_empty()).then_some(text)
    })
}

/// First yes/no answer among `keys`; accepts booleans and yes/ja/true text
pub fn answer_flag(answers: &AnswerSet, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|key| match answers.get(*key)? {
        serde_json::Value::Bool(flag) => Some(*flag),
        serde_json::Value::String(text) => match text.trim().to_lowercase().as_str() {
            "yes" | "ja" | "true" => Some(true),
            "no" | "nej" | "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// Score reported when the completion service could not produce one
///
/// Always paired with `provisional = true`.
pub const FALLBACK_SCORE: u8 = 75;

/// Fixed scoring categories with their maximum points (sum = 100)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreCategory {
    ProblemSolution,
    Market,
    BusinessModel,
    Team,
    Traction,
    FinancialPlan,
    Risk,
}

impl ScoreCategory {
    pub const ALL: [ScoreCategory; 7] = [
        ScoreCategory::ProblemSolution,
        ScoreCategory::Market,
        ScoreCategory::BusinessModel,
        ScoreCategory::Team,
        ScoreCategory::Traction,
        ScoreCategory::FinancialPlan,
        ScoreCategory::Risk,
    ];

    /// Wire name, also used as the key in model output
    pub fn key(self) -> &'static str {
        match self {
            ScoreCategory::ProblemSolution => "problemSolution",
            ScoreCategory::Market => "market",
            ScoreCategory::BusinessModel => "businessModel",
            ScoreCategory::Team => "team",
            ScoreCategory::Traction => "traction",
            ScoreCategory::FinancialPlan => "financialPlan",
            ScoreCategory::Risk => "risk",
        }
    }

    /// Human-readable label used in prompts and fallback insights
    pub fn label(self) -> &'static str {
        match self {
            ScoreCategory::ProblemSolution => "Problem & solution",
            ScoreCategory::Market => "Market",
            ScoreCategory::BusinessModel => "Business model",
            ScoreCategory::Team => "Team",
            ScoreCategory::Traction => "Traction",
            ScoreCategory::FinancialPlan => "Financial plan",
            ScoreCategory::Risk => "Risk",
        }
    }

    pub fn max_points(self) -> u8 {
        match self {
            ScoreCategory::Risk => 10,
            _ => 15,
        }
    }
}

/// Per-category sub-scores; each is clamped to its category maximum
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoreBreakdown {
    pub problem_solution: u8,
    pub market: u8,
    pub business_model: u8,
    pub team: u8,
    pub traction: u8,
    pub financial_plan: u8,
    pub risk: u8,
}

impl ScoreBreakdown {
    pub fn get(&self, category: ScoreCategory) -> u8 {
        match category {
            ScoreCategory::ProblemSolution => self.problem_solution,
            ScoreCategory::Market => self.market,
            ScoreCategory::BusinessModel => self.business_model,
            ScoreCategory::Team => self.team,
            ScoreCategory::Traction => self.traction,
            ScoreCategory::FinancialPlan => self.financial_plan,
            ScoreCategory::Risk => self.risk,
        }
    }

    /// Set a sub-score, clamping it to the category maximum
    pub fn set(&mut self, category: ScoreCategory, points: u8) {
        let points = points.min(category.max_points());
        match category {
            ScoreCategory::ProblemSolution => self.problem_solution = points,
            ScoreCategory::Market => self.market = points,
            ScoreCategory::BusinessModel => self.business_model = points,
            ScoreCategory::Team => self.team = points,
            ScoreCategory::Traction => self.traction = points,
            ScoreCategory::FinancialPlan => self.financial_plan = points,
            ScoreCategory::Risk => self.risk = points,
        }
    }

    pub fn total(&self) -> u32 {
        ScoreCategory::ALL.iter().map(|c| u32::from(self.get(*c))).sum()
    }

    /// Breakdown proportional to an overall score, used on the fallback path
    pub fn proportional(score: u8) -> Self {
        let mut breakdown = Self::default();
        let score = u32::from(score.min(100));
        for category in ScoreCategory::ALL {
            let points = u32::from(category.max_points()) * score / 100;
            breakdown.set(category, points as u8);
        }
        breakdown
    }
}

/// Strength of a category insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    High,
    Medium,
    Low,
}

/// Priority of an action item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub category: String,
    pub strength: Strength,
    pub summary: String,
    #[serde(default)]
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub priority: Priority,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub timeframe: String,
    #[serde(default)]
    pub impact: String,
}

/// Analysis tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionLevel {
    #[default]
    Standard,
    Premium,
}

/// The investment-readiness assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    /// 0-100, 100 = fully investment-ready
    pub score: u8,

    #[serde(default)]
    pub score_breakdown: ScoreBreakdown,

    #[serde(default)]
    pub insights: Vec<Insight>,

    /// Answer key → critique; keys are a subset of `answers`
    #[serde(default)]
    pub feedback: BTreeMap<String, String>,

    #[serde(default)]
    pub action_items: Vec<ActionItem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium_analysis: Option<PremiumAnalysis>,

    #[serde(default)]
    pub subscription_level: SubscriptionLevel,

    /// True when any standard field came from fallback defaults rather than
    /// a genuine model assessment
    #[serde(default)]
    pub provisional: bool,

    /// Input snapshot, kept so a premium upgrade can reuse it
    #[serde(default)]
    pub answers: AnswerSet,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// The company has a website the questionnaire could draw on
    #[serde(default)]
    pub has_website: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitors: Option<Vec<Competitor>>,

    #[serde(default = "Utc::now")]
    pub generated_at: DateTime<Utc>,
}

impl Analysis {
    /// Subscription level implied by the premium payload
    pub fn level_for(premium: &Option<PremiumAnalysis>) -> SubscriptionLevel {
        if premium.is_some() {
            SubscriptionLevel::Premium
        } else {
            SubscriptionLevel::Standard
        }
    }

    /// Produce a new Analysis carrying this one's standard fields plus `premium`
    ///
    /// Standard fields are moved over untouched; only `premium_analysis` and
    /// `subscription_level` change.
    pub fn with_premium(self, premium: PremiumAnalysis) -> Analysis {
        let premium_analysis = Some(premium);
        Analysis {
            subscription_level: Self::level_for(&premium_analysis),
            premium_analysis,
            ..self
        }
    }

    /// Clamp out-of-range values that may arrive from external callers
    pub fn normalized(mut self) -> Analysis {
        self.score = self.score.min(100);
        for category in ScoreCategory::ALL {
            let points = self.score_breakdown.get(category);
            self.score_breakdown.set(category, points);
        }
        self.subscription_level = Self::level_for(&self.premium_analysis);
        self
    }
}
