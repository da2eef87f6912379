use serde::{Deserialize, Serialize};

/// A competitor produced by competitor discovery
///
/// Only `name` is guaranteed. Entries whose enrichment failed are name-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competitor {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offering_summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strengths: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weaknesses: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opportunities: Option<Vec<String>>,
}

impl Competitor {
    pub fn name_only(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
            offering_summary: None,
            strengths: None,
            weaknesses: None,
            opportunities: None,
        }
    }

    /// True when nothing beyond the name is known
    pub fn is_name_only(&self) -> bool {
        self.url.is_none()
            && self.offering_summary.is_none()
            && self.strengths.is_none()
            && self.weaknesses.is_none()
            && self.opportunities.is_none()
    }
}
