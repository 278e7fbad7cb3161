use crate::config::Config;
use crate::errors::AppError;
use crate::models::{CompanyInput, VerificationResult};
use crate::registry::RegistryVerifier;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Path the presentation layer posts analyses to.
pub const ANALYZE_PATH: &str = "/api/analyze";
pub const VERIFY_PATH: &str = "/api/verify";
pub const HEALTH_PATH: &str = "/health";

/// Shared application state injected into handlers.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Outbound client used to reach the analysis engine.
    pub http: reqwest::Client,
    /// Local registration pre-check.
    pub registry: RegistryVerifier,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.analysis_timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create analysis engine client: {}", e))?;

        Ok(Self {
            config,
            http,
            registry: RegistryVerifier::new(),
        })
    }
}

/// Builds the gateway's routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_body_bytes;

    let api_routes = Router::new()
        .route(ANALYZE_PATH, post(analyze_proxy))
        .route(VERIFY_PATH, post(verify_registration))
        .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(body_limit)));

    Router::new()
        .route(HEALTH_PATH, get(health))
        .merge(api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Health check endpoint.
///
/// Returns the service status and version.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "trust-gateway",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /api/analyze
///
/// Forwards the request body, byte for byte, to the analysis engine and relays
/// its answer.
///
/// * Engine success: the engine's JSON body with 200.
/// * Engine non-success: the engine's status with
///   `{"error": "Backend Analysis Failed", "details": <engine text>}`.
/// * Malformed JSON on either side, or an unreachable engine: 500 with
///   `{"error": "Internal Server Error"}`.
pub async fn analyze_proxy(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, AppError> {
    tracing::info!("POST {} - {} bytes", ANALYZE_PATH, body.len());

    // Only checked, never re-serialized
    serde_json::from_slice::<serde_json::Value>(&body)
        .map_err(|e| AppError::Transport(format!("Malformed request JSON: {}", e)))?;

    let response = state
        .http
        .post(&state.config.analysis_engine_url)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
        .map_err(|e| AppError::Transport(format!("Analysis engine request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.map_err(|e| {
            AppError::Transport(format!("Failed to read analysis engine error body: {}", e))
        })?;
        return Err(AppError::Upstream {
            status,
            body: error_text,
        });
    }

    let payload = response.bytes().await.map_err(|e| {
        AppError::Transport(format!("Failed to read analysis engine response: {}", e))
    })?;
    serde_json::from_slice::<serde_json::Value>(&payload).map_err(|e| {
        AppError::Transport(format!("Analysis engine returned malformed JSON: {}", e))
    })?;

    tracing::info!("✓ Relayed analysis ({} bytes)", payload.len());
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        payload,
    )
        .into_response())
}

/// POST /api/verify
///
/// Runs the local registration pre-check for a company.
pub async fn verify_registration(
    State(state): State<Arc<AppState>>,
    Json(input): Json<CompanyInput>,
) -> Result<Json<VerificationResult>, AppError> {
    tracing::info!("POST {} - company: {}", VERIFY_PATH, input.name);

    input.validate_name()?;

    Ok(Json(state.registry.verify(&input)))
}
