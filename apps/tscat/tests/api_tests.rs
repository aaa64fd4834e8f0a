//! Integration tests for the tscat HTTP API.
//!
//! Uses axum-test to exercise the router without binding a socket.

#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use serde_json::json;
use tscat::api::{
    AppState, ExportResponse, HashResponse, HealthResponse, LintResponse, LookupResponse,
    ReloadResponse, StatusResponse, create_router,
};
use tscat::config::TscatConfig;
use tscat_core::{CatalogSession, load_compiled, primitives::MAX_KEY_LENGTH};

const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE TS>
<TS version="2.1" language="uk">
<context>
    <name>MainWindow</name>
    <message>
        <source>Open collection</source>
        <translation>Відкрити колекцію</translation>
    </message>
    <message>
        <source>Seller</source>
        <translation type="unfinished"></translation>
    </message>
</context>
<context>
    <name>ListView</name>
    <message numerus="yes">
        <source>%n coin(s) selected</source>
        <translation>
            <numerusform>%n монету вибрано</numerusform>
            <numerusform>%n монети вибрано</numerusform>
            <numerusform>%n монет вибрано</numerusform>
        </translation>
    </message>
</context>
</TS>
"#;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn test_config() -> TscatConfig {
    let mut config = TscatConfig::default();
    config.server.rate_limit = 0;
    config
}

fn server_with(config: TscatConfig) -> TestServer {
    let session = CatalogSession::from_ts(SAMPLE).unwrap();
    TestServer::new(create_router(AppState::new(session, config))).unwrap()
}

fn create_test_server() -> TestServer {
    server_with(test_config())
}

fn create_auth_test_server(api_key: &str) -> TestServer {
    let mut config = test_config();
    config.server.api_key = Some(api_key.to_string());
    server_with(config)
}

fn bearer(key: &str) -> HeaderValue {
    format!("Bearer {}", key).parse().unwrap()
}

// =============================================================================
// HEALTH / STATUS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_status_reports_counts() {
    let server = create_test_server();

    let response = server.get("/status").await;

    response.assert_status_ok();
    let status: StatusResponse = response.json();
    assert_eq!(status.language.as_deref(), Some("uk"));
    assert_eq!(status.contexts, 2);
    assert_eq!(status.messages, 3);
    assert_eq!(status.finished, 2);
    assert_eq!(status.unfinished, 1);
    assert_eq!(status.numerus, 1);
    assert_eq!(status.entries, 2);
    assert_eq!(status.percent_complete, 66);
}

// =============================================================================
// LOOKUP
// =============================================================================

#[tokio::test]
async fn test_lookup_finished_translation() {
    let server = create_test_server();

    let response = server
        .post("/lookup")
        .json(&json!({"context": "MainWindow", "source": "Open collection"}))
        .await;

    response.assert_status_ok();
    let lookup: LookupResponse = response.json();
    assert!(lookup.found);
    assert_eq!(lookup.translation, "Відкрити колекцію");
    assert!(lookup.error.is_none());
}

#[tokio::test]
async fn test_lookup_unfinished_falls_back_to_source() {
    let server = create_test_server();

    let response = server
        .post("/lookup")
        .json(&json!({"context": "MainWindow", "source": "Seller"}))
        .await;

    response.assert_status_ok();
    let lookup: LookupResponse = response.json();
    assert!(!lookup.found);
    assert_eq!(lookup.translation, "Seller");
}

#[tokio::test]
async fn test_lookup_unknown_context_falls_back_to_source() {
    let server = create_test_server();

    let response = server
        .post("/lookup")
        .json(&json!({"context": "NoSuchDialog", "source": "Open collection"}))
        .await;

    let lookup: LookupResponse = response.json();
    assert!(!lookup.found);
    assert_eq!(lookup.translation, "Open collection");
}

#[tokio::test]
async fn test_lookup_plural_selects_form() {
    let server = create_test_server();

    for (n, expected) in [
        (1, "1 монету вибрано"),
        (3, "3 монети вибрано"),
        (5, "5 монет вибрано"),
        (21, "21 монету вибрано"),
    ] {
        let response = server
            .post("/lookup")
            .json(&json!({"context": "ListView", "source": "%n coin(s) selected", "n": n}))
            .await;
        let lookup: LookupResponse = response.json();
        assert!(lookup.found);
        assert_eq!(lookup.translation, expected, "n = {}", n);
    }
}

#[tokio::test]
async fn test_lookup_empty_source_rejected() {
    let server = create_test_server();

    let response = server
        .post("/lookup")
        .json(&json!({"context": "MainWindow", "source": ""}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let lookup: LookupResponse = response.json();
    assert!(lookup.error.is_some());
}

#[tokio::test]
async fn test_lookup_oversized_key_rejected() {
    let server = create_test_server();

    let response = server
        .post("/lookup")
        .json(&json!({"context": "x".repeat(MAX_KEY_LENGTH + 1), "source": "Seller"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

// =============================================================================
// LINT / EXPORT / HASH
// =============================================================================

#[tokio::test]
async fn test_lint_reports_unfinished() {
    let server = create_test_server();

    let response = server.get("/lint").await;

    response.assert_status_ok();
    let lint: LintResponse = response.json();
    assert!(lint.passed);
    assert_eq!(lint.errors, 0);
    assert!(lint.findings.iter().any(|f| f.source.as_deref() == Some("Seller")));
}

#[tokio::test]
async fn test_export_returns_loadable_compiled_catalog() {
    let server = create_test_server();

    let response = server.post("/export").await;

    response.assert_status_ok();
    let export: ExportResponse = response.json();
    assert!(export.success);

    let data = base64::Engine::decode(
        &base64::engine::general_purpose::STANDARD,
        export.data.unwrap(),
    )
    .unwrap();
    let compiled = load_compiled(&data).unwrap();
    assert_eq!(compiled.entries.len(), 2);
    assert_eq!(Some(compiled.checksum()), export.checksum);
}

#[tokio::test]
async fn test_hash_is_stable() {
    let server = create_test_server();

    let first: HashResponse = server.get("/hash").await.json();
    let second: HashResponse = server.get("/hash").await.json();

    assert!(first.success);
    assert_eq!(first.algorithm, "blake3");
    assert_eq!(first.hash.as_ref().map(String::len), Some(64));
    assert_eq!(first.hash, second.hash);
}

// =============================================================================
// RELOAD
// =============================================================================

#[tokio::test]
async fn test_reload_without_source_conflicts() {
    let server = create_test_server();

    let response = server.post("/reload").await;

    response.assert_status(StatusCode::CONFLICT);
    let reload: ReloadResponse = response.json();
    assert!(!reload.success);
}

#[tokio::test]
async fn test_reload_picks_up_file_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lang_uk.ts");
    std::fs::write(&path, SAMPLE).unwrap();

    let session = tscat::cli::load_session(&path).unwrap();
    let state = AppState::new(session, test_config()).with_source(path.clone());
    let server = TestServer::new(create_router(state)).unwrap();

    let updated = SAMPLE.replace(
        r#"<translation type="unfinished"></translation>"#,
        "<translation>Продавець</translation>",
    );
    std::fs::write(&path, updated).unwrap();

    let response = server.post("/reload").await;
    response.assert_status_ok();
    let reload: ReloadResponse = response.json();
    assert_eq!(reload.entries, Some(3));

    let lookup: LookupResponse = server
        .post("/lookup")
        .json(&json!({"context": "MainWindow", "source": "Seller"}))
        .await
        .json();
    assert!(lookup.found);
    assert_eq!(lookup.translation, "Продавець");
}

#[tokio::test]
async fn test_failed_reload_keeps_serving() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lang_uk.ts");
    std::fs::write(&path, SAMPLE).unwrap();

    let session = tscat::cli::load_session(&path).unwrap();
    let state = AppState::new(session, test_config()).with_source(path.clone());
    let server = TestServer::new(create_router(state)).unwrap();

    std::fs::write(&path, "<TS><context>").unwrap();

    let response = server.post("/reload").await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let lookup: LookupResponse = server
        .post("/lookup")
        .json(&json!({"context": "MainWindow", "source": "Open collection"}))
        .await
        .json();
    assert!(lookup.found);
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

#[tokio::test]
async fn test_404_on_unknown_endpoint() {
    let server = create_test_server();

    server.get("/unknown").await.assert_status_not_found();
}

#[tokio::test]
async fn test_method_not_allowed() {
    let server = create_test_server();

    let response = server.post("/health").await;
    assert_eq!(response.status_code(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_invalid_json_body() {
    let server = create_test_server();

    let response = server
        .post("/lookup")
        .bytes(bytes::Bytes::from("not valid json"))
        .content_type("application/json")
        .await;

    assert!(response.status_code().is_client_error());
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let server = create_test_server();

    let response = server
        .post("/lookup")
        .json(&json!({"context": "MainWindow", "source": "x".repeat(3 * 1024 * 1024)}))
        .await;

    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
}

// =============================================================================
// CORS
// =============================================================================

#[tokio::test]
async fn test_cors_allows_localhost_by_default() {
    let server = create_test_server();

    let response = server
        .get("/health")
        .add_header(header::ORIGIN, HeaderValue::from_static("http://localhost:3000"))
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
        Some(&HeaderValue::from_static("http://localhost:3000"))
    );
}

#[tokio::test]
async fn test_cors_ignores_foreign_origin() {
    let server = create_test_server();

    let response = server
        .get("/health")
        .add_header(header::ORIGIN, HeaderValue::from_static("https://evil.example"))
        .await;

    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}

#[tokio::test]
async fn test_cors_configured_origin() {
    let mut config = test_config();
    config.server.cors_origins = Some(vec!["https://translate.example.org".to_string()]);
    let server = server_with(config);

    let response = server
        .get("/health")
        .add_header(
            header::ORIGIN,
            HeaderValue::from_static("https://translate.example.org"),
        )
        .await;

    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
        Some(&HeaderValue::from_static("https://translate.example.org"))
    );
}

// =============================================================================
// RATE LIMITING
// =============================================================================

#[tokio::test]
async fn test_rate_limit_returns_429() {
    let mut config = test_config();
    config.server.rate_limit = 2;
    let server = server_with(config);

    server.get("/health").await.assert_status_ok();
    server.get("/health").await.assert_status_ok();
    server
        .get("/health")
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}

// =============================================================================
// AUTHENTICATION
// =============================================================================

#[tokio::test]
async fn test_auth_valid_bearer_token() {
    let api_key = "test-secret-key-12345";
    let server = create_auth_test_server(api_key);

    let response = server
        .get("/status")
        .add_header(header::AUTHORIZATION, bearer(api_key))
        .await;

    response.assert_status_ok();
    let status: StatusResponse = response.json();
    assert_eq!(status.messages, 3);
}

#[tokio::test]
async fn test_auth_valid_raw_token() {
    let api_key = "test-raw-key-67890";
    let server = create_auth_test_server(api_key);

    let response = server
        .get("/status")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("test-raw-key-67890"))
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_invalid_token_rejected() {
    let server = create_auth_test_server("correct-key");

    let response = server
        .post("/lookup")
        .add_header(header::AUTHORIZATION, bearer("wrong-key"))
        .json(&json!({"context": "MainWindow", "source": "Open collection"}))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_auth_missing_header_rejected() {
    let server = create_auth_test_server("correct-key");

    server.get("/status").await.assert_status_unauthorized();
    server.post("/reload").await.assert_status_unauthorized();
}

#[tokio::test]
async fn test_auth_health_endpoint_bypasses_auth() {
    let server = create_auth_test_server("correct-key");

    server.get("/health").await.assert_status_ok();
}

#[tokio::test]
async fn test_auth_bearer_prefix_only_rejected() {
    let server = create_auth_test_server("correct-key");

    let response = server
        .get("/status")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer "))
        .await;

    response.assert_status_unauthorized();
}
