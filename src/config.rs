use serde::Deserialize;

use crate::tier_policy::TrustTierPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    /// Full URL of the analysis engine's analyze endpoint.
    pub analysis_engine_url: String,
    pub analysis_timeout_secs: u64,
    /// Only an idempotent engine may be retried.
    pub analysis_engine_idempotent: bool,
    pub analysis_max_attempts: u32,
    pub analysis_retry_base_ms: u64,
    pub analysis_retry_max_ms: u64,
    pub trust_tier_high_above: f64,
    pub trust_tier_low_below: f64,
    pub max_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds and validates a configuration from any variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let config = Self {
            port: var("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            analysis_engine_url: var("ANALYSIS_ENGINE_URL")
                .ok_or_else(|| anyhow::anyhow!("ANALYSIS_ENGINE_URL environment variable required"))
                .and_then(|url| validate_engine_url(&url).map(|_| url))?,
            analysis_timeout_secs: var("ANALYSIS_TIMEOUT_SECS")
                .unwrap_or_else(|| "30".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("ANALYSIS_TIMEOUT_SECS must be a whole number"))
                .and_then(|secs: u64| {
                    if secs == 0 {
                        anyhow::bail!("ANALYSIS_TIMEOUT_SECS must be greater than zero");
                    }
                    Ok(secs)
                })?,
            analysis_engine_idempotent: parse_bool(
                "ANALYSIS_ENGINE_IDEMPOTENT",
                var("ANALYSIS_ENGINE_IDEMPOTENT"),
            )?,
            analysis_max_attempts: var("ANALYSIS_MAX_ATTEMPTS")
                .unwrap_or_else(|| "3".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("ANALYSIS_MAX_ATTEMPTS must be a whole number"))
                .and_then(|attempts: u32| {
                    if !(1..=10).contains(&attempts) {
                        anyhow::bail!("ANALYSIS_MAX_ATTEMPTS must be between 1 and 10");
                    }
                    Ok(attempts)
                })?,
            analysis_retry_base_ms: var("ANALYSIS_RETRY_BASE_MS")
                .unwrap_or_else(|| "200".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("ANALYSIS_RETRY_BASE_MS must be a whole number"))?,
            analysis_retry_max_ms: var("ANALYSIS_RETRY_MAX_MS")
                .unwrap_or_else(|| "2000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("ANALYSIS_RETRY_MAX_MS must be a whole number"))?,
            trust_tier_high_above: var("TRUST_TIER_HIGH_ABOVE")
                .unwrap_or_else(|| "80".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("TRUST_TIER_HIGH_ABOVE must be a number"))?,
            trust_tier_low_below: var("TRUST_TIER_LOW_BELOW")
                .unwrap_or_else(|| "40".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("TRUST_TIER_LOW_BELOW must be a number"))?,
            max_body_bytes: var("MAX_BODY_BYTES")
                .unwrap_or_else(|| "1048576".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("MAX_BODY_BYTES must be a whole number"))?,
        };

        if config.analysis_retry_base_ms > config.analysis_retry_max_ms {
            anyhow::bail!("ANALYSIS_RETRY_BASE_MS cannot exceed ANALYSIS_RETRY_MAX_MS");
        }
        // Fail at startup rather than on the first request
        config.tier_policy()?;

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Analysis engine URL: {}", config.analysis_engine_url);
        tracing::debug!(
            "Analysis timeout: {}s, idempotent engine: {}",
            config.analysis_timeout_secs,
            config.analysis_engine_idempotent
        );
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Configuration for a given engine endpoint with every other setting at
    /// its default.
    pub fn for_engine(analysis_engine_url: impl Into<String>) -> Self {
        Self {
            port: 3000,
            analysis_engine_url: analysis_engine_url.into(),
            analysis_timeout_secs: 30,
            analysis_engine_idempotent: false,
            analysis_max_attempts: 3,
            analysis_retry_base_ms: 200,
            analysis_retry_max_ms: 2000,
            trust_tier_high_above: 80.0,
            trust_tier_low_below: 40.0,
            max_body_bytes: 1024 * 1024,
        }
    }

    pub fn tier_policy(&self) -> anyhow::Result<TrustTierPolicy> {
        TrustTierPolicy::new(self.trust_tier_high_above, self.trust_tier_low_below)
    }
}

pub fn validate_engine_url(url: &str) -> anyhow::Result<()> {
    if url.trim().is_empty() {
        anyhow::bail!("ANALYSIS_ENGINE_URL cannot be empty");
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("ANALYSIS_ENGINE_URL must start with http:// or https://");
    }
    url::Url::parse(url)
        .map_err(|e| anyhow::anyhow!("ANALYSIS_ENGINE_URL is not a valid URL: {}", e))?;
    Ok(())
}

fn parse_bool(name: &str, value: Option<String>) -> anyhow::Result<bool> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) if v.is_empty() => Ok(false),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => anyhow::bail!("{} must be true or false", name),
        },
    }
}
