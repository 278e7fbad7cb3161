use std::fmt;

use crate::models::{CredibilityAnalysis, TrustTier};
use crate::tier_policy::TrustTierPolicy;

/// Display-ready form of a [`CredibilityAnalysis`].
///
/// Missing optional fields become placeholders instead of errors.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportView {
    pub tier: TrustTier,
    pub tier_label: String,
    pub score_label: String,
    pub review_count_label: String,
    pub verification_status: Option<String>,
    pub sentiment_summary: Option<String>,
    pub red_flags: Vec<String>,
    /// Hostnames of the scraped sources, in engine order.
    pub source_hosts: Vec<String>,
    /// Free-text note from the engine's `details`, when it sent one.
    pub note: Option<String>,
}

impl ReportView {
    pub fn from_analysis(analysis: &CredibilityAnalysis, policy: &TrustTierPolicy) -> Self {
        let tier = analysis.effective_tier(policy);

        Self {
            tier,
            tier_label: tier.label().to_string(),
            score_label: format_score(analysis.trust_score),
            review_count_label: analysis
                .review_count
                .map(|count| count.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            verification_status: analysis.verification_status.clone(),
            sentiment_summary: analysis.sentiment_summary.clone(),
            red_flags: analysis.red_flags.clone(),
            source_hosts: analysis
                .scraped_sources
                .iter()
                .map(|source| source_host(source))
                .collect(),
            note: analysis
                .details
                .as_ref()
                .and_then(|d| d.as_text())
                .map(str::to_string),
        }
    }
}

/// `82` → `"82/100"`, `82.46` → `"82.5/100"`.
pub fn format_score(score: f64) -> String {
    // Round first so 99.96 reads "100/100", not "100.0/100"
    let rounded = (score * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{:.0}/100", rounded)
    } else {
        format!("{:.1}/100", rounded)
    }
}

/// Hostname of a source URL; anything unparseable is shown as given.
pub fn source_host(source: &str) -> String {
    url::Url::parse(source)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| source.to_string())
}

impl fmt::Display for ReportView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.tier_label)?;
        writeln!(f, "Trust score:      {}", self.score_label)?;
        writeln!(f, "Reviews analyzed: {}", self.review_count_label)?;
        if let Some(ref status) = self.verification_status {
            writeln!(f, "Verification:     {}", status)?;
        }
        if let Some(ref sentiment) = self.sentiment_summary {
            writeln!(f, "Sentiment:        {}", sentiment)?;
        }

        if self.red_flags.is_empty() {
            writeln!(f, "Red flags:        none")?;
        } else {
            writeln!(f, "Red flags:")?;
            for flag in &self.red_flags {
                writeln!(f, "  - {}", flag)?;
            }
        }

        if self.source_hosts.is_empty() {
            write!(f, "Sources found:    None")?;
        } else {
            write!(f, "Sources found:    {}", self.source_hosts.join(", "))?;
        }

        if let Some(ref note) = self.note {
            write!(f, "\nNote:             {}", note)?;
        }
        Ok(())
    }
}
