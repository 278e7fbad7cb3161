use crate::config::Config;
use crate::errors::AppError;
use crate::models::{CompanyInput, CredibilityAnalysis};
use std::time::Duration;

/// How many times a failed analysis may be attempted, and how long to wait
/// in between.
///
/// Analysis requests are POSTs, so anything beyond a single attempt is only
/// safe when the engine is known to be idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_millis(2000),
        }
    }

    pub fn exponential(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        let base_delay = base_delay.max(Duration::from_millis(1));
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        if !config.analysis_engine_idempotent {
            return Self::none();
        }
        Self::exponential(
            config.analysis_max_attempts,
            Duration::from_millis(config.analysis_retry_base_ms),
            Duration::from_millis(config.analysis_retry_max_ms),
        )
    }

    /// Wait before retry number `retry` (1-based): `base_delay * 2^(retry-1)`,
    /// capped at `max_delay`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Waits between consecutive attempts; one fewer than `max_attempts`.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..self.max_attempts).map(move |retry| self.delay_for(retry))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Client for the analysis engine's analyze endpoint.
#[derive(Clone)]
pub struct AnalysisClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl AnalysisClient {
    /// Creates a new `AnalysisClient`.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Full URL of the analyze endpoint (engine or gateway).
    /// * `timeout` - Limit for each individual attempt.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::InternalError(format!("Failed to create analysis client: {}", e))
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
            retry: RetryPolicy::none(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Ok(Self::new(
            config.analysis_engine_url.clone(),
            Duration::from_secs(config.analysis_timeout_secs),
        )?
        .with_retry(RetryPolicy::from_config(config)))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Requests a credibility analysis for a company.
    ///
    /// # Arguments
    ///
    /// * `input` - The company to analyze. `name` must not be blank; every
    ///   other field is sent as given.
    ///
    /// # Returns
    ///
    /// * `Result<CredibilityAnalysis, AppError>` - The engine's report, unvalidated
    ///   beyond deserialization.
    pub async fn analyze(&self, input: &CompanyInput) -> Result<CredibilityAnalysis, AppError> {
        if let Err(e) = input.validate_name() {
            tracing::error!("Analysis input rejected: {}", e);
            return Err(e);
        }

        tracing::info!("Requesting analysis for '{}' from {}", input.name, self.endpoint);

        let mut attempt = 1;
        loop {
            match self.send_once(input).await {
                Ok(report) => {
                    tracing::info!(
                        "✓ Analysis received for '{}': score {}",
                        input.name,
                        report.trust_score
                    );
                    return Ok(report);
                }
                Err(e) if e.is_transient() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        "Analysis attempt {} for '{}' failed ({}), retrying in {:?}",
                        attempt,
                        input.name,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(
                        status = ?e.upstream_status(),
                        "API Error after {} attempt(s): {}",
                        attempt,
                        e
                    );
                    return Err(e);
                }
            }
        }
    }

    async fn send_once(&self, input: &CompanyInput) -> Result<CredibilityAnalysis, AppError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(input)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.map_err(|e| {
                AppError::Transport(format!("Failed to read analysis error body: {}", e))
            })?;
            return Err(AppError::Upstream { status, body });
        }

        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;
        serde_json::from_slice(&bytes).map_err(|e| {
            AppError::Transport(format!("Failed to parse analysis response: {}", e))
        })
    }

    fn classify(&self, err: reqwest::Error) -> AppError {
        if err.is_timeout() {
            AppError::Timeout(self.timeout)
        } else {
            AppError::Transport(format!("Analysis request failed: {}", err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let client = AnalysisClient::new("https://example.com/analyze", Duration::from_secs(5));
        assert!(client.is_ok());
        assert_eq!(client.unwrap().endpoint(), "https://example.com/analyze");
    }

    #[test]
    fn test_no_retry_has_no_delays() {
        assert_eq!(RetryPolicy::none().delays().count(), 0);
    }

    #[test]
    fn test_exponential_delays_are_bounded() {
        let policy =
            RetryPolicy::exponential(5, Duration::from_millis(100), Duration::from_millis(400));
        let delays: Vec<Duration> = policy.delays().collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(400),
            ]
        );
    }

    #[test]
    fn test_sub_second_delays_with_large_attempt_counts() {
        let policy =
            RetryPolicy::exponential(10, Duration::from_millis(200), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(64), Duration::from_millis(2000));
        assert_eq!(policy.delays().count(), 9);
    }

    #[test]
    fn test_retry_only_for_idempotent_engine() {
        let mut config = Config::for_engine("http://localhost:8000/analyze");
        assert_eq!(RetryPolicy::from_config(&config).max_attempts, 1);

        config.analysis_engine_idempotent = true;
        config.analysis_max_attempts = 4;
        assert_eq!(RetryPolicy::from_config(&config).max_attempts, 4);
    }

    #[tokio::test]
    async fn test_blank_name_never_sent() {
        let client =
            AnalysisClient::new("http://127.0.0.1:1/analyze", Duration::from_secs(1)).unwrap();
        let err = client.analyze(&CompanyInput::new("")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_analyze_sends_valid_input() {
        use wiremock::matchers::{body_json, method};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(serde_json::json!({
                "name": "Zomato",
                "website": "zomato.com"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "trust_score": 64 })),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = AnalysisClient::new(mock_server.uri(), Duration::from_secs(5)).unwrap();
        let input = CompanyInput::new("Zomato").with_website("zomato.com");
        let report = client.analyze(&input).await.unwrap();
        assert_eq!(report.trust_score, 64.0);
    }

    #[tokio::test]
    async fn test_analyze_with_default_retry_settings() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "trust_score": 90 })),
            )
            .mount(&mock_server)
            .await;

        let mut config = Config::for_engine(mock_server.uri());
        config.analysis_engine_idempotent = true;
        let client = AnalysisClient::from_config(&config).unwrap();

        let report = client.analyze(&CompanyInput::new("Acme Corp")).await.unwrap();
        assert_eq!(report.trust_score, 90.0);
    }
}
