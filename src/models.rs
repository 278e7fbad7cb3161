use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::AppError;
use crate::tier_policy::TrustTierPolicy;

/// Company descriptor submitted for analysis.
///
/// `cin` and `website` are independently optional. Absent means "unknown";
/// empty strings coming from a form are normalised to absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyInput {
    /// Legal or display name of the company.
    pub name: String,
    /// Government registration identifier (e.g. Indian CIN).
    #[serde(
        default,
        alias = "govt_id",
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub cin: Option<String>,
    /// Official website URL.
    #[serde(
        default,
        alias = "domain",
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub website: Option<String>,
}

impl CompanyInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cin: None,
            website: None,
        }
    }

    pub fn with_cin(mut self, cin: impl Into<String>) -> Self {
        self.cin = non_empty(cin.into());
        self
    }

    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = non_empty(website.into());
        self
    }

    /// The only precondition for sending: a non-blank name.
    pub fn validate_name(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Company name is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Advisory check of `website`. Bare domains such as `zomato.com` are
    /// accepted by the engine, so this never blocks a request.
    pub fn website_issue(&self) -> Option<String> {
        let website = self.website.as_deref()?;
        match url::Url::parse(website) {
            Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => None,
            Ok(parsed) => Some(format!(
                "website '{}' uses unexpected scheme '{}'",
                website,
                parsed.scheme()
            )),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                match url::Url::parse(&format!("https://{}", website)) {
                    Ok(_) => None,
                    Err(e) => Some(format!("website '{}' is not a valid URL: {}", website, e)),
                }
            }
            Err(e) => Some(format!("website '{}' is not a valid URL: {}", website, e)),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.and_then(non_empty))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Vec<String>> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

/// Accepts `120` and `120.0`; JSON has a single number type and some engines
/// emit counts as floats.
fn count_from_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value: Option<serde_json::Number> = Option::deserialize(deserializer)?;
    let Some(number) = value else {
        return Ok(None);
    };
    if let Some(n) = number.as_u64() {
        return Ok(Some(n));
    }
    match number.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(Some(f as u64)),
        _ => Err(D::Error::custom(format!(
            "review_count must be a non-negative integer, got {}",
            number
        ))),
    }
}

/// Coarse credibility bucket. Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrustTier {
    Low,
    Medium,
    High,
}

impl TrustTier {
    /// Human-facing badge text.
    pub fn label(&self) -> &'static str {
        match self {
            TrustTier::High => "HIGH TRUST",
            TrustTier::Medium => "REVIEW NEEDED",
            TrustTier::Low => "LOW TRUST",
        }
    }
}

impl fmt::Display for TrustTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrustTier::High => "HIGH",
            TrustTier::Medium => "MEDIUM",
            TrustTier::Low => "LOW",
        };
        write!(f, "{}", s)
    }
}

/// Engine-specific extra data attached to a report.
///
/// Engines either send a sentence (e.g. "No online reviews found.") or an
/// object. No particular keys may be relied upon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Details {
    Text(String),
    Fields(Map<String, Value>),
}

impl Details {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Details::Text(s) => Some(s.as_str()),
            Details::Fields(_) => None,
        }
    }

}

/// Aggregate credibility report returned by the analysis engine.
///
/// Only `trust_score` is mandatory. Everything else is tolerated as absent so
/// that partial reports from older engines still deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredibilityAnalysis {
    pub trust_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_tier: Option<TrustTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<String>,
    #[serde(
        default,
        deserialize_with = "count_from_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub review_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_summary: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub red_flags: Vec<String>,
    #[serde(default, alias = "sources", deserialize_with = "null_as_empty")]
    pub scraped_sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Details>,
    /// Top-level keys this crate does not know about.
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

impl CredibilityAnalysis {
    /// Tier reported by the engine, or the policy's classification of the
    /// score when the engine left it out.
    pub fn effective_tier(&self, policy: &TrustTierPolicy) -> TrustTier {
        self.trust_tier
            .unwrap_or_else(|| policy.classify(self.trust_score))
    }
}

/// Outcome of the registration check stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub is_registered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<String>,
    pub status: String,
    pub confidence_score: f64,
    pub verification_source: String,
    #[serde(default)]
    pub red_flags: Vec<String>,
    /// Whether later pipeline stages have enough identity to work with.
    #[serde(default)]
    pub can_proceed_to_scraping: bool,
}

impl Default for VerificationResult {
    fn default() -> Self {
        Self {
            is_registered: false,
            cin: None,
            registration_date: None,
            status: "Unknown".to_string(),
            confidence_score: 0.0,
            verification_source: "None".to_string(),
            red_flags: Vec::new(),
            can_proceed_to_scraping: false,
        }
    }
}
