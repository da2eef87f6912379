//! Premium report payload
//!
//! Opaque to the pipeline beyond "present or defaulted": every struct here
//! deserializes from a partial object, filling gaps with empty values. Leaves
//! go through the `lenient` adapters, so a number where text was expected (or
//! the reverse) costs at most that one field.

use super::lenient;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Deal-ready score used when the premium pass produced no number
pub const FALLBACK_DEAL_READY_SCORE: u8 = 75;

fn fallback_deal_ready_score() -> u8 {
    FALLBACK_DEAL_READY_SCORE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PremiumAnalysis {
    #[serde(deserialize_with = "lenient::or_default")]
    pub swot: Swot,
    #[serde(deserialize_with = "lenient::or_default")]
    pub financial_projections: FinancialProjections,
    #[serde(deserialize_with = "lenient::or_default")]
    pub detailed_recommendations: DetailedRecommendations,
    #[serde(deserialize_with = "lenient::or_default")]
    pub benchmark_analysis: BenchmarkAnalysis,
    #[serde(deserialize_with = "lenient::or_default")]
    pub investment_proposal: InvestmentProposal,
    #[serde(deserialize_with = "lenient::or_default")]
    pub pitch_video: PitchVideo,
    #[serde(deserialize_with = "lenient::string_list")]
    pub market_trends: Vec<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub competitive_landscape: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub risk_mitigation: RiskMitigation,
    #[serde(deserialize_with = "lenient::items")]
    pub image_prompts: Vec<ImagePrompt>,
    #[serde(default = "fallback_deal_ready_score")]
    pub deal_ready_score: u8,
    /// True when this payload (or part of it) came from fallback defaults
    pub provisional: bool,
}

impl Default for PremiumAnalysis {
    fn default() -> Self {
        Self {
            swot: Swot::default(),
            financial_projections: FinancialProjections::default(),
            detailed_recommendations: DetailedRecommendations::default(),
            benchmark_analysis: BenchmarkAnalysis::default(),
            investment_proposal: InvestmentProposal::default(),
            pitch_video: PitchVideo::default(),
            market_trends: Vec::new(),
            competitive_landscape: String::new(),
            risk_mitigation: RiskMitigation::default(),
            image_prompts: Vec::new(),
            deal_ready_score: FALLBACK_DEAL_READY_SCORE,
            provisional: false,
        }
    }
}

impl PremiumAnalysis {
    /// Fully defaulted payload, flagged provisional
    pub fn provisional() -> Self {
        Self {
            provisional: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Swot {
    #[serde(deserialize_with = "lenient::string_list")]
    pub strengths: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub weaknesses: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub opportunities: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub threats: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct YearProjection {
    #[serde(deserialize_with = "lenient::amount")]
    pub revenue: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub costs: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub ebitda: f64,
    #[serde(deserialize_with = "lenient::count")]
    pub customers: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinancialProjections {
    #[serde(deserialize_with = "lenient::or_default")]
    pub year1: YearProjection,
    #[serde(deserialize_with = "lenient::or_default")]
    pub year2: YearProjection,
    #[serde(deserialize_with = "lenient::or_default")]
    pub year3: YearProjection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Recommendation {
    #[serde(deserialize_with = "lenient::text")]
    pub action: String,
    #[serde(deserialize_with = "lenient::text")]
    pub why: String,
    #[serde(deserialize_with = "lenient::text")]
    pub how: String,
    #[serde(deserialize_with = "lenient::text")]
    pub impact: String,
    #[serde(deserialize_with = "lenient::text")]
    pub resources: String,
    #[serde(deserialize_with = "lenient::text")]
    pub timeline: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetailedRecommendations {
    #[serde(deserialize_with = "lenient::items")]
    pub immediate: Vec<Recommendation>,
    #[serde(deserialize_with = "lenient::items")]
    pub short_term: Vec<Recommendation>,
    #[serde(deserialize_with = "lenient::items")]
    pub long_term: Vec<Recommendation>,
}

/// One metric compared against the industry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BenchmarkRow {
    #[serde(deserialize_with = "lenient::text")]
    pub us: String,
    #[serde(deserialize_with = "lenient::text")]
    pub industry: String,
    #[serde(deserialize_with = "lenient::text")]
    pub verdict: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PeerComparison {
    #[serde(alias = "company", alias = "companyName", deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub comparison: String,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "String::is_empty")]
    pub funding: String,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "String::is_empty")]
    pub revenue: String,
    #[serde(deserialize_with = "lenient::text", skip_serializing_if = "String::is_empty")]
    pub valuation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BenchmarkAnalysis {
    /// Metric name → comparison
    #[serde(deserialize_with = "lenient::entries")]
    pub industry_comparison: BTreeMap<String, BenchmarkRow>,
    #[serde(deserialize_with = "lenient::items")]
    pub peer_comparison: Vec<PeerComparison>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvestmentProposal {
    #[serde(deserialize_with = "lenient::text")]
    pub ask_amount: String,
    #[serde(deserialize_with = "lenient::text")]
    pub valuation: String,
    /// Spending category → share
    #[serde(deserialize_with = "lenient::string_map")]
    pub use_of_funds: BTreeMap<String, String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub key_metrics: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub investor_benefits: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PitchVideoScene {
    #[serde(deserialize_with = "lenient::text")]
    pub visual: String,
    #[serde(deserialize_with = "lenient::text")]
    pub narration: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PitchVideo {
    #[serde(deserialize_with = "lenient::text")]
    pub script: String,
    #[serde(deserialize_with = "lenient::seconds")]
    pub duration_seconds: u32,
    #[serde(deserialize_with = "lenient::items")]
    pub scenes: Vec<PitchVideoScene>,
    #[serde(deserialize_with = "lenient::text")]
    pub video_prompt: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskItem {
    #[serde(deserialize_with = "lenient::text")]
    pub risk: String,
    #[serde(deserialize_with = "lenient::text")]
    pub probability: String,
    #[serde(deserialize_with = "lenient::text")]
    pub impact: String,
    #[serde(deserialize_with = "lenient::text")]
    pub mitigation: String,
    #[serde(deserialize_with = "lenient::text")]
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskMitigation {
    #[serde(deserialize_with = "lenient::items")]
    pub identified_risks: Vec<RiskItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImagePrompt {
    #[serde(deserialize_with = "lenient::text")]
    pub purpose: String,
    #[serde(deserialize_with = "lenient::text")]
    pub prompt: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_payload_fills_missing_sections() {
        let premium: PremiumAnalysis = serde_json::from_value(json!({
            "swot": { "strengths": ["Clinic network"] },
            "pitchVideo": { "durationSeconds": 60 }
        }))
        .unwrap();

        assert_eq!(premium.swot.strengths, vec!["Clinic network"]);
        assert!(premium.swot.threats.is_empty());
        assert_eq!(premium.pitch_video.duration_seconds, 60);
        assert_eq!(premium.deal_ready_score, FALLBACK_DEAL_READY_SCORE);
        assert!(premium.financial_projections.year3.revenue.abs() < f64::EPSILON);
    }

    #[test]
    fn test_mistyped_leaves_keep_their_siblings() {
        let premium: PremiumAnalysis = serde_json::from_value(json!({
            "investmentProposal": {
                "askAmount": "4 MSEK",
                "valuation": "20 MSEK",
                "useOfFunds": {"product": 40, "sales": "35%"},
                "keyMetrics": {"mrr": "500k"},
                "investorBenefits": ["Board seat"]
            },
            "financialProjections": {
                "year1": {"revenue": "2 MSEK", "costs": 2500000, "customers": "40"},
                "year2": {"revenue": 5000000},
                "year3": {"revenue": 9000000.0, "ebitda": "n/a"}
            }
        }))
        .unwrap();

        let proposal = &premium.investment_proposal;
        assert_eq!(proposal.ask_amount, "4 MSEK");
        assert_eq!(proposal.valuation, "20 MSEK");
        assert_eq!(proposal.use_of_funds.get("product").map(String::as_str), Some("40"));
        assert_eq!(proposal.key_metrics, vec!["mrr: 500k"]);
        assert_eq!(proposal.investor_benefits, vec!["Board seat"]);

        let years = &premium.financial_projections;
        assert_eq!(years.year1.revenue, 2_000_000.0);
        assert_eq!(years.year1.costs, 2_500_000.0);
        assert_eq!(years.year1.customers, 40);
        assert_eq!(years.year2.revenue, 5_000_000.0);
        assert_eq!(years.year3.revenue, 9_000_000.0);
        assert_eq!(years.year3.ebitda, 0.0);
    }

    #[test]
    fn test_peer_rows_accept_company_shape() {
        let analysis: BenchmarkAnalysis = serde_json::from_value(json!({
            "peerComparison": [
                {
                    "company": "Doctolib",
                    "funding": "500 MEUR",
                    "revenue": 300000000,
                    "valuation": "5 BEUR"
                },
                "stray text"
            ]
        }))
        .unwrap();

        assert_eq!(analysis.peer_comparison.len(), 1);
        let peer = &analysis.peer_comparison[0];
        assert_eq!(peer.name, "Doctolib");
        assert_eq!(peer.funding, "500 MEUR");
        assert_eq!(peer.revenue, "300000000");
        assert_eq!(peer.valuation, "5 BEUR");
    }

    #[test]
    fn test_wrong_section_shape_defaults_that_section() {
        let premium: PremiumAnalysis = serde_json::from_value(json!({
            "swot": "not an object",
            "pitchVideo": {"durationSeconds": "90", "script": "Clinics lose hours."},
            "marketTrends": "Digital health"
        }))
        .unwrap();

        assert_eq!(premium.swot, Swot::default());
        assert_eq!(premium.pitch_video.duration_seconds, 90);
        assert_eq!(premium.market_trends, vec!["Digital health"]);
    }

    #[test]
    fn test_wire_names_are_camel_case() {
        let value = serde_json::to_value(PremiumAnalysis::default()).unwrap();
        assert!(value.get("financialProjections").is_some());
        assert!(value.get("dealReadyScore").is_some());
        assert!(value["detailedRecommendations"].get("shortTerm").is_some());
        assert!(value["riskMitigation"].get("identifiedRisks").is_some());
    }
}
