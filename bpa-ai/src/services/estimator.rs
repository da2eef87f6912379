//! Market estimators
//!
//! `StaticEstimator` answers from fixed industry tables scaled by region.
//! `ModelEstimator` asks the completion service for the headline market size
//! and falls back to the static tables on any failure.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

use crate::prompts::advisory;
use crate::types::{
    CompletionError, CompletionOptions, CompletionService, Estimator, IndustryBenchmarks,
    MarketData, MarketEstimate,
};
use crate::utils::{retry, RetryPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Industry {
    Saas,
    Fintech,
    Ecommerce,
}

impl Industry {
    /// Unknown industries use the SaaS row
    fn parse(raw: &str) -> Self {
        let key: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "fintech" | "finance" | "finans" => Industry::Fintech,
            "ehandel" | "ecommerce" | "retail" | "handel" => Industry::Ecommerce,
            _ => Industry::Saas,
        }
    }
}

/// Market-size multiplier relative to the global figure
pub fn region_multiplier(region: &str) -> f64 {
    match region.trim().to_lowercase().as_str() {
        "sverige" | "sweden" => 0.001,
        "norden" | "nordics" | "nordic" => 0.005,
        "europa" | "europe" => 0.15,
        _ => 1.0,
    }
}

type MarketRow = (
    f64,
    f64,
    &'static [&'static str],
    &'static [&'static str],
    &'static str,
);

fn base_market(industry: Industry) -> MarketRow {
    match industry {
        Industry::Saas => (
            195_000_000_000.0,
            18.5,
            &["Salesforce", "Microsoft", "Adobe", "SAP", "Oracle"],
            &[
                "AI-driven automation",
                "Vertical SaaS growth",
                "Usage-based pricing",
                "Low-code/no-code platforms",
            ],
            "Gartner Market Analysis 2024",
        ),
        Industry::Fintech => (
            310_000_000_000.0,
            23.8,
            &["Stripe", "Square", "PayPal", "Adyen", "Klarna"],
            &[
                "Embedded finance",
                "Open banking",
                "Cryptocurrency integration",
                "RegTech solutions",
            ],
            "McKinsey Fintech Report 2024",
        ),
        Industry::Ecommerce => (
            5_800_000_000_000.0,
            12.2,
            &["Amazon", "Alibaba", "Shopify", "eBay", "Zalando"],
            &[
                "Social commerce",
                "Sustainability focus",
                "Same-day delivery",
                "AR/VR shopping",
            ],
            "eMarketer Global Ecommerce 2024",
        ),
    }
}

/// Deterministic table-backed estimator
#[derive(Debug, Clone, Default)]
pub struct StaticEstimator;

impl StaticEstimator {
    pub fn market_data_sync(&self, industry: &str, region: &str) -> MarketData {
        let (size, growth, players, trends, source) = base_market(Industry::parse(industry));
        MarketData {
            industry: industry.to_string(),
            region: region.to_string(),
            total_market_size: size * region_multiplier(region),
            growth_rate: growth,
            top_players: players.iter().map(|s| s.to_string()).collect(),
            market_trends: trends.iter().map(|s| s.to_string()).collect(),
            source: source.to_string(),
        }
    }

    pub fn benchmarks_sync(&self, industry: &str) -> IndustryBenchmarks {
        let (cac, ltv, churn, margin, source) = match Industry::parse(industry) {
            Industry::Saas => (1200.0, 14400.0, 5.0, 80.0, "SaaS Capital Industry Report 2024"),
            Industry::Fintech => (800.0, 12000.0, 7.0, 70.0, "CB Insights Fintech Benchmarks 2024"),
            Industry::Ecommerce => (50.0, 250.0, 15.0, 40.0, "Shopify Commerce Report 2024"),
        };
        IndustryBenchmarks {
            industry: industry.to_string(),
            average_cac: cac,
            average_ltv: ltv,
            average_churn_rate: churn,
            average_gross_margin: margin,
            source: source.to_string(),
        }
    }

    pub fn market_estimate_sync(&self, industry: &str, region: &str) -> MarketEstimate {
        let data = self.market_data_sync(industry, region);
        MarketEstimate {
            estimate: format!("Market size: {} USD", format_amount(data.total_market_size)),
            source: format!("Source: {}", data.source),
            fallback: true,
        }
    }
}

/// Whole units with thousands separators
fn format_amount(value: f64) -> String {
    let digits = format!("{:.0}", value.max(0.0));
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

#[async_trait]
impl Estimator for StaticEstimator {
    async fn market_data(&self, industry: &str, region: &str) -> MarketData {
        self.market_data_sync(industry, region)
    }

    async fn benchmarks(&self, industry: &str) -> IndustryBenchmarks {
        self.benchmarks_sync(industry)
    }

    async fn market_estimate(&self, industry: &str, region: &str) -> MarketEstimate {
        self.market_estimate_sync(industry, region)
    }
}

static ESTIMATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)market\s*size:\s*([\d\s.,]+\s*[a-z]{0,12}?)\s*(?:\r?\n|$).*?source:\s*(.+)")
        .expect("valid regex")
});

/// Split a "Market size: ... / Source: ..." reply
pub fn parse_estimate_reply(text: &str) -> Option<(String, String)> {
    let caps = ESTIMATE_RE.captures(text)?;
    let amount = caps.get(1)?.as_str().trim();
    let source = caps.get(2)?.as_str().lines().next()?.trim();
    if amount.is_empty() {
        return None;
    }
    Some((format!("Market size: {}", amount), format!("Source: {}", source)))
}

/// Completion-backed estimator with static fallback
pub struct ModelEstimator {
    completion: Arc<dyn CompletionService>,
    model: String,
    fallback: StaticEstimator,
}

impl ModelEstimator {
    pub fn new(completion: Arc<dyn CompletionService>, model: impl Into<String>) -> Self {
        Self {
            completion,
            model: model.into(),
            fallback: StaticEstimator,
        }
    }
}

#[async_trait]
impl Estimator for ModelEstimator {
    async fn market_data(&self, industry: &str, region: &str) -> MarketData {
        self.fallback.market_data_sync(industry, region)
    }

    async fn benchmarks(&self, industry: &str) -> IndustryBenchmarks {
        self.fallback.benchmarks_sync(industry)
    }

    async fn market_estimate(&self, industry: &str, region: &str) -> MarketEstimate {
        let prompt = advisory::market_estimate(industry, region);
        let options = CompletionOptions {
            model: self.model.clone(),
            max_tokens: 300,
            temperature: 0.2,
            force_json_mode: false,
        };

        let reply = retry(
            "market_estimate",
            &RetryPolicy::none(),
            CompletionError::is_retryable,
            || self.completion.complete(&prompt, &options),
        )
        .await;

        match reply {
            Ok(completion) => match parse_estimate_reply(&completion.text) {
                Some((estimate, source)) => MarketEstimate {
                    estimate,
                    source,
                    fallback: false,
                },
                None => {
                    tracing::warn!(
                        "Market estimate reply not in expected format, using static tables"
                    );
                    self.fallback.market_estimate_sync(industry, region)
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Market estimate call failed, using static tables");
                self.fallback.market_estimate_sync(industry, region)
            }
        }
    }
}
