//! Error types for wsl-win-bridge.

use thiserror::Error;

/// Main error type for bridge operations.
///
/// Spawn failures, timeouts and non-zero exits are not errors: they are
/// reported through [`crate::execution::ExecutionResult`].
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Executable is not in the configured allowlist.
    #[error("Executable \"{exe}\" not in allowlist: {}", allowlist.join(", "))]
    PolicyViolation { exe: String, allowlist: Vec<String> },

    /// The path translator exited non-zero. Carries its error text verbatim.
    #[error("{0}")]
    PathConversion(String),

    /// Tool input failed validation at the boundary.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// No tool is registered under the given name.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience Result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
