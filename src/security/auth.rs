//! Bearer API key authentication for the HTTP transport.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::Response,
};

const BEARER_PREFIX: &str = "Bearer ";

/// Immutable set of accepted API keys.
///
/// With no keys configured, authentication is disabled.
#[derive(Debug, Clone, Default)]
pub struct ApiKeyStore {
    keys: HashSet<String>,
}

impl ApiKeyStore {
    /// Create a store accepting the given keys.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys
                .into_iter()
                .map(Into::into)
                .filter(|k: &String| !k.is_empty())
                .collect(),
        }
    }

    /// Create a store with authentication disabled.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Check if authentication is enabled.
    pub fn is_enabled(&self) -> bool {
        !self.keys.is_empty()
    }

    /// Check if a key is valid.
    pub fn is_valid(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Extract API key from an authorization header value.
    pub fn extract_key(header_value: &str) -> Option<&str> {
        header_value.strip_prefix(BEARER_PREFIX)
    }
}

/// Authentication middleware for axum.
pub async fn auth_middleware(
    State(store): State<Arc<ApiKeyStore>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if !store.is_enabled() || request.uri().path() == "/health" {
        return Ok(next.run(request).await);
    }

    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(ApiKeyStore::extract_key)
        .is_some_and(|key| store.is_valid(key));

    if authorized {
        Ok(next.run(request).await)
    } else {
        tracing::warn!(path = %request.uri().path(), "rejected unauthenticated request");
        Err(StatusCode::UNAUTHORIZED)
    }
}
