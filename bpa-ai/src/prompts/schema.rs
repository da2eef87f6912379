//! JSON skeletons embedded in prompts
//!
//! The premium skeleton is the standard one plus a `premiumAnalysis` object,
//! so any reader of the standard shape can read a premium answer.

use bpa_common::analysis::ScoreCategory;
use serde_json::{json, Map, Value};

/// Skeleton for the standard assessment
pub fn standard_schema() -> Value {
    let mut breakdown = Map::new();
    for category in ScoreCategory::ALL {
        breakdown.insert(
            category.key().to_string(),
            json!(format!("integer 0-{}", category.max_points())),
        );
    }

    json!({
        "score": "integer 0-100 (100 = fully investment-ready)",
        "scoreBreakdown": Value::Object(breakdown),
        "insights": [{
            "category": "one of the scoreBreakdown categories",
            "strength": "high | medium | low",
            "summary": "one sentence",
            "details": "2-4 sentences"
        }],
        "feedback": {
            "<answer key>": "concrete critique of that answer"
        },
        "actionItems": [{
            "priority": "high | medium | low",
            "title": "short imperative",
            "description": "what to do",
            "timeframe": "e.g. 0-3 months",
            "impact": "expected effect on investability"
        }]
    })
}

/// Premium-only section
pub fn premium_section_schema() -> Value {
    let recommendation = json!({
        "action": "", "why": "", "how": "", "impact": "", "resources": "", "timeline": ""
    });
    let year = json!({ "revenue": 0, "costs": 0, "ebitda": 0, "customers": 0 });

    json!({
        "swot": {
            "strengths": ["..."],
            "weaknesses": ["..."],
            "opportunities": ["..."],
            "threats": ["..."]
        },
        "financialProjections": { "year1": year, "year2": year, "year3": year },
        "detailedRecommendations": {
            "immediate": [recommendation],
            "shortTerm": [recommendation],
            "longTerm": [recommendation]
        },
        "benchmarkAnalysis": {
            "industryComparison": {
                "<metric>": { "us": "", "industry": "", "verdict": "" }
            },
            "peerComparison": [{ "name": "", "comparison": "" }]
        },
        "investmentProposal": {
            "askAmount": "",
            "valuation": "",
            "useOfFunds": { "<area>": "<share>" },
            "keyMetrics": ["..."],
            "investorBenefits": ["..."]
        },
        "pitchVideo": {
            "script": "",
            "durationSeconds": 60,
            "scenes": [{ "visual": "", "narration": "" }],
            "videoPrompt": ""
        },
        "marketTrends": ["..."],
        "competitiveLandscape": "",
        "riskMitigation": {
            "identifiedRisks": [{
                "risk": "", "probability": "low | medium | high",
                "impact": "low | medium | high", "mitigation": "", "status": ""
            }]
        },
        "imagePrompts": [{ "purpose": "", "prompt": "" }],
        "dealReadyScore": "integer 0-100"
    })
}

/// Standard skeleton plus `premiumAnalysis`
pub fn premium_schema() -> Value {
    let mut schema = standard_schema();
    if let Value::Object(ref mut fields) = schema {
        fields.insert("premiumAnalysis".to_string(), premium_section_schema());
    }
    schema
}

/// Skeleton for the competitor list call
pub fn competitor_list_schema() -> Value {
    json!([{ "name": "Company name", "url": "https://example.com or null" }])
}

/// Skeleton for the per-competitor summary call
pub fn competitor_summary_schema() -> Value {
    json!({
        "offeringSummary": "what they sell and to whom",
        "strengths": ["..."],
        "weaknesses": ["..."],
        "opportunities": ["openings for the submitted company"]
    })
}
