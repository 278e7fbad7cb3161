//! Local registration pre-check.
//!
//! Validates the shape of an Indian Corporate Identification Number without
//! contacting any registry. The result is a stage of its own and is never
//! folded into an engine report.

use regex::Regex;

use crate::models::{CompanyInput, VerificationResult};

pub const FORMAT_CHECK_SOURCE: &str = "Deep Formatting Check";
pub const INVALID_CIN_FLAG: &str = "Invalid CIN Format Provided";
pub const MISSING_CIN_FLAG: &str = "No CIN provided. Automatic Name Lookup not yet connected.";

/// Listing flag, industry (5 digits), state (2 letters), year of
/// incorporation (4 digits), ownership (3 letters), registration number (6 digits).
const CIN_PATTERN: &str = r"^([LU])[0-9]{5}[A-Z]{2}([0-9]{4})[A-Z]{3}[0-9]{6}$";

pub struct RegistryVerifier {
    cin_pattern: Regex,
}

impl RegistryVerifier {
    pub fn new() -> Self {
        Self {
            cin_pattern: Regex::new(CIN_PATTERN).expect("CIN pattern is a valid regex"),
        }
    }

    pub fn is_valid_cin(&self, cin: &str) -> bool {
        self.cin_pattern.is_match(&cin.trim().to_ascii_uppercase())
    }

    pub fn verify(&self, input: &CompanyInput) -> VerificationResult {
        let mut result = VerificationResult {
            cin: input.cin.clone(),
            ..VerificationResult::default()
        };

        let Some(ref raw_cin) = input.cin else {
            result.red_flags.push(MISSING_CIN_FLAG.to_string());
            result.confidence_score = 10.0;
            tracing::debug!("No CIN supplied for '{}'", input.name);
            return result;
        };

        let cin = raw_cin.trim().to_ascii_uppercase();
        let Some(captures) = self.cin_pattern.captures(&cin) else {
            tracing::info!("CIN format check failed for '{}': {}", input.name, raw_cin);
            result.red_flags.push(INVALID_CIN_FLAG.to_string());
            result.confidence_score = 0.0;
            return result;
        };

        let listing = match &captures[1] {
            "L" => "Listed",
            _ => "Unlisted",
        };

        result.is_registered = true;
        result.cin = Some(cin.clone());
        // A CIN only encodes the incorporation year
        result.registration_date = Some(captures[2].to_string());
        result.status = format!("Format Validated ({})", listing);
        result.confidence_score = 100.0;
        result.verification_source = FORMAT_CHECK_SOURCE.to_string();
        result.can_proceed_to_scraping = true;

        tracing::info!("✓ CIN format validated for '{}': {}", input.name, cin);
        result
    }
}

impl Default for RegistryVerifier {
    fn default() -> Self {
        Self::new()
    }
}
