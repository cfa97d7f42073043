//! HTTP transport.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::ServerConfig;
use crate::error::BridgeError;
use crate::security::{auth_middleware, ApiKeyStore};
use crate::tools::{descriptors, CallToolResult, ToolBox, ToolDescriptor};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub tools: Arc<ToolBox>,
}

impl AppState {
    pub fn new(tools: Arc<ToolBox>) -> Self {
        Self { tools }
    }
}

/// Error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "UNKNOWN_TOOL").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(err: BridgeError) -> ApiError {
    let (status, code) = match err {
        BridgeError::UnknownTool(_) => (StatusCode::NOT_FOUND, "UNKNOWN_TOOL"),
        BridgeError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    };
    (status, Json(ErrorResponse::new(code, err.to_string())))
}

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}

/// API information endpoint.
pub async fn api_info() -> Json<Value> {
    Json(serde_json::json!({
        "name": "wsl-win-bridge",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

/// Tool listing.
#[derive(Debug, Serialize)]
pub struct ListToolsResponse {
    pub tools: Vec<ToolDescriptor>,
}

/// List tool descriptors.
pub async fn list_tools() -> Json<ListToolsResponse> {
    Json(ListToolsResponse {
        tools: descriptors(),
    })
}

/// Call a tool. Tool-level failures are `200` with `isError` set.
pub async fn call_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(arguments): Json<Value>,
) -> Result<Json<CallToolResult>, ApiError> {
    let output = state.tools.call(&name, arguments).await.map_err(api_error)?;
    Ok(Json(output.to_call_result()))
}

/// Create the router. Authentication is enforced when `keys` is non-empty.
pub fn create_router(state: AppState, keys: ApiKeyStore) -> Router {
    let api_v1 = Router::new()
        .route("/", get(api_info))
        .route("/tools", get(list_tools))
        .route("/tools/{name}", post(call_tool));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_v1)
        .layer(middleware::from_fn_with_state(Arc::new(keys), auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: &ServerConfig, tools: Arc<ToolBox>) -> crate::Result<()> {
    let addr = config.bind_address();
    let keys = ApiKeyStore::new(config.api_keys.iter().cloned());
    if !keys.is_enabled() {
        tracing::warn!("HTTP authentication disabled");
    }
    let router = create_router(AppState::new(tools), keys);

    tracing::info!("Starting wsl-win-bridge HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| BridgeError::Io(std::io::Error::other(e.to_string())))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down HTTP server");
}
