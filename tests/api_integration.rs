//! HTTP API integration tests.
//!
//! These tests drive the router with axum's test utilities. None of them
//! needs Windows: every call exercised here is resolved before a process
//! would be spawned.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wsl_win_bridge::security::{AllowlistPolicy, ApiKeyStore};
use wsl_win_bridge::server::{create_router, AppState};
use wsl_win_bridge::{BridgeConfig, ToolBox};

fn app_with(config: BridgeConfig, keys: ApiKeyStore) -> Router {
    let tools = Arc::new(ToolBox::new(Arc::new(config)));
    create_router(AppState::new(tools), keys)
}

fn app() -> Router {
    app_with(BridgeConfig::default(), ApiKeyStore::disabled())
}

/// Helper to create a JSON request.
fn json_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    match body {
        Some(json) => builder.body(Body::from(json.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Helper to extract body as string.
async fn response_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&body).to_string()
}

/// Helper to extract JSON from response.
async fn response_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}

// ============================================================================
// Health & Info Tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let response = app()
        .oneshot(json_request(Method::GET, "/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_text(response).await, "OK");
}

#[tokio::test]
async fn test_api_info_endpoint() {
    let response = app()
        .oneshot(json_request(Method::GET, "/api/v1/", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["name"], "wsl-win-bridge");
    assert_eq!(json["status"], "running");
}

#[tokio::test]
async fn test_list_tools() {
    let response = app()
        .oneshot(json_request(Method::GET, "/api/v1/tools", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    let names: Vec<&str> = json["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        [
            "win.exec",
            "path.wsl_to_win",
            "path.win_to_wsl",
            "hdc.run",
            "hdc.list_targets",
            "hdc.shell",
            "rk3588s.shell",
            "rk3588s.dir_tree",
        ]
    );
}

// ============================================================================
// Tool Call Tests
// ============================================================================

#[tokio::test]
async fn test_unknown_tool_is_404() {
    let response = app()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/tools/hdc.reboot",
            Some(json!({})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = response_json(response).await;
    assert_eq!(json["code"], "UNKNOWN_TOOL");
}

#[tokio::test]
async fn test_invalid_arguments_are_400() {
    let response = app()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/tools/rk3588s.dir_tree",
            Some(json!({"maxDepth": 99})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = response_json(response).await;
    assert_eq!(json["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_policy_violation_is_tool_error() {
    let config = BridgeConfig {
        allowlist: AllowlistPolicy::from_csv("hdc.exe"),
        ..BridgeConfig::default()
    };
    let response = app_with(config, ApiKeyStore::disabled())
        .oneshot(json_request(
            Method::POST,
            "/api/v1/tools/win.exec",
            Some(json!({"exe": r"C:\Windows\System32\calc.exe"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["isError"], true);
    assert_eq!(
        json["content"][0]["text"],
        r#"Executable "C:\Windows\System32\calc.exe" not in allowlist: hdc.exe"#
    );
}

#[tokio::test]
async fn test_hdc_shell_missing_key() {
    let response = app()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/tools/hdc.shell",
            Some(json!({"command": "ls /data"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["isError"], true);
    assert_eq!(json["structuredContent"]["exitCode"], -1);
    assert_eq!(json["structuredContent"]["timedOut"], false);
    assert_eq!(json["structuredContent"]["durationMs"], 0);
    assert!(json["structuredContent"]["stderr"]
        .as_str()
        .unwrap()
        .starts_with("Missing connectKey"));
}

#[tokio::test]
async fn test_rk3588s_missing_key() {
    let response = app()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/tools/rk3588s.dir_tree",
            Some(json!({})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = response_json(response).await;
    assert_eq!(json["isError"], true);
    assert!(json["structuredContent"]["stderr"]
        .as_str()
        .unwrap()
        .starts_with("Missing RK3588S_CONNECTKEY"));
}

// ============================================================================
// Authentication Tests
// ============================================================================

#[tokio::test]
async fn test_auth_required_when_keys_configured() {
    let app = app_with(BridgeConfig::default(), ApiKeyStore::new(["secret"]));

    let response = app
        .clone()
        .oneshot(json_request(Method::GET, "/api/v1/tools", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/tools")
        .header(header::AUTHORIZATION, "Bearer secret")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request(Method::GET, "/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_wrong_key_rejected() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/")
        .header(header::AUTHORIZATION, "Bearer nope")
        .body(Body::empty())
        .unwrap();
    let response = app_with(BridgeConfig::default(), ApiKeyStore::new(["secret"]))
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
