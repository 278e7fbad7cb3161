/// Transport client tests against a mocked analysis engine
use std::time::Duration;
use trust_gateway::analysis_client::{AnalysisClient, RetryPolicy};
use trust_gateway::config::Config;
use trust_gateway::errors::AppError;
use trust_gateway::models::{CompanyInput, TrustTier};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> AnalysisClient {
    AnalysisClient::new(format!("{}/analyze", server.uri()), Duration::from_secs(5)).unwrap()
}

fn acme_report() -> serde_json::Value {
    serde_json::json!({
        "trust_score": 82,
        "trust_tier": "HIGH",
        "verification_status": "Format Validated (Listed)",
        "review_count": 120,
        "sentiment_summary": "Mostly positive",
        "red_flags": [],
        "scraped_sources": ["https://acme.example.com"]
    })
}

#[tokio::test]
async fn test_sends_exactly_one_post_with_input_body() {
    let mock_server = MockServer::start().await;
    let input = CompanyInput::new("Acme Corp")
        .with_cin("L93030DL2010PLC198141")
        .with_website("https://acme.example.com");

    Mock::given(method("POST"))
        .and(path("/analyze"))
        .and(header("content-type", "application/json"))
        .and(body_json(&input))
        .respond_with(ResponseTemplate::new(200).set_body_json(acme_report()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = client_for(&mock_server).analyze(&input).await.unwrap();

    assert_eq!(report.trust_score, 82.0);
    assert_eq!(report.trust_tier, Some(TrustTier::High));
    assert_eq!(report.review_count, Some(120));
    assert_eq!(report.scraped_sources, vec!["https://acme.example.com"]);
}

#[tokio::test]
async fn test_absent_fields_are_not_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_json(serde_json::json!({ "name": "Acme Corp" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(acme_report()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server)
        .analyze(&CompanyInput::new("Acme Corp"))
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_engine_error_text_is_surfaced() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("engine down"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .analyze(&CompanyInput::new("Acme Corp"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("engine down"));
    assert_eq!(err.upstream_status().map(|s| s.as_u16()), Some(500));
}

#[tokio::test]
async fn test_empty_error_body_uses_generic_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(422))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .analyze(&CompanyInput::new("Acme Corp"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Analysis failed");
}

#[tokio::test]
async fn test_empty_success_body_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .analyze(&CompanyInput::new("Acme Corp"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Transport(_)));
}

#[tokio::test]
async fn test_unreachable_engine_is_transport_failure() {
    let client =
        AnalysisClient::new("http://127.0.0.1:1/analyze", Duration::from_secs(2)).unwrap();

    let err = client
        .analyze(&CompanyInput::new("Acme Corp"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Transport(_)));
}

#[tokio::test]
async fn test_slow_engine_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(acme_report())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let client =
        AnalysisClient::new(format!("{}/analyze", mock_server.uri()), Duration::from_millis(300))
            .unwrap();
    let err = client
        .analyze(&CompanyInput::new("Acme Corp"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Timeout(_)));
}

#[tokio::test]
async fn test_non_idempotent_engine_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = Config::for_engine(format!("{}/analyze", mock_server.uri()));
    let client = AnalysisClient::from_config(&config).unwrap();

    assert!(client
        .analyze(&CompanyInput::new("Acme Corp"))
        .await
        .is_err());
}

#[tokio::test]
async fn test_idempotent_engine_retries_server_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(acme_report()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).with_retry(RetryPolicy::exponential(
        3,
        Duration::from_millis(10),
        Duration::from_millis(50),
    ));

    let report = client
        .analyze(&CompanyInput::new("Acme Corp"))
        .await
        .unwrap();
    assert_eq!(report.trust_score, 82.0);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("name missing"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).with_retry(RetryPolicy::exponential(
        5,
        Duration::from_millis(10),
        Duration::from_millis(50),
    ));

    let err = client
        .analyze(&CompanyInput::new("Acme Corp"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "name missing");
}

#[tokio::test]
async fn test_retries_stop_at_max_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server).with_retry(RetryPolicy::exponential(
        3,
        Duration::from_millis(10),
        Duration::from_millis(20),
    ));

    let err = client
        .analyze(&CompanyInput::new("Acme Corp"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "bad gateway");
}

#[tokio::test]
async fn test_truncated_error_body_is_transport_failure() {
    use tokio::io::AsyncWriteExt;

    // Promises 100 bytes of error text, sends 7, then hangs up
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        let _ = tokio::io::AsyncReadExt::read(&mut socket, &mut buf).await;
        socket
            .write_all(
                b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 100\r\n\r\npartial",
            )
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let client =
        AnalysisClient::new(format!("http://{}/analyze", addr), Duration::from_secs(5)).unwrap();
    let err = client
        .analyze(&CompanyInput::new("Acme Corp"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Transport(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_bare_domain_website_is_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_json(serde_json::json!({
            "name": "Zomato Limited",
            "website": "zomato.com"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(acme_report()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let input = CompanyInput::new("Zomato Limited").with_website("zomato.com");
    client_for(&mock_server).analyze(&input).await.unwrap();
}
