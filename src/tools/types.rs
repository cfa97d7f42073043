//! Tool input and output types.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::device::{probe, DirTreeRequest};
use crate::error::BridgeError;
use crate::Result;

/// Input of `win.exec`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinExecInput {
    pub exe: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub env: Option<BTreeMap<String, String>>,
}

/// Input of `path.wsl_to_win` and `path.win_to_wsl`.
#[derive(Debug, Clone, Deserialize)]
pub struct PathInput {
    pub path: String,
}

/// Input of `hdc.run`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HdcRunInput {
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub connect_key: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// Input of `hdc.list_targets`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HdcListTargetsInput {
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// Input of `hdc.shell`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HdcShellInput {
    #[serde(default)]
    pub connect_key: Option<String>,
    pub command: String,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub use_busybox: bool,
}

/// Input of `rk3588s.shell`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardShellInput {
    pub command: String,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub use_busybox: bool,
}

/// Input of `rk3588s.dir_tree`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirTreeInput {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub max_depth: Option<u32>,
    #[serde(default)]
    pub dirs_only: Option<bool>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl DirTreeInput {
    /// Apply defaults and bounds.
    pub fn to_request(&self) -> Result<DirTreeRequest> {
        DirTreeRequest::new(
            self.path.as_deref().unwrap_or(probe::DEFAULT_PATH),
            self.max_depth.unwrap_or(probe::DEFAULT_MAX_DEPTH),
            self.dirs_only.unwrap_or(true),
        )
    }
}

/// Decode tool arguments. A missing or `null` argument object counts as
/// `{}`.
pub fn parse_input<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| BridgeError::InvalidRequest(e.to_string()))
}

/// `timeoutMs` must be a positive integer when present.
pub fn timeout_from_ms(timeout_ms: Option<u64>) -> Result<Option<Duration>> {
    match timeout_ms {
        Some(0) => Err(BridgeError::InvalidRequest(
            "timeoutMs must be a positive integer".to_string(),
        )),
        other => Ok(other.map(Duration::from_millis)),
    }
}

/// What a tool call returns to the hosting protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Human-readable rendering.
    pub text: String,
    /// The structured result.
    pub structured: Value,
    /// Whether the call failed.
    pub is_error: bool,
}

impl ToolOutput {
    pub fn new(text: impl Into<String>, structured: Value, is_error: bool) -> Self {
        Self {
            text: text.into(),
            structured,
            is_error,
        }
    }

    /// A failed call carrying only an error message.
    pub fn error(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            structured: json!({ "error": message }),
            text: message,
            is_error: true,
        }
    }

    /// MCP `tools/call` result shape.
    pub fn to_call_result(&self) -> CallToolResult {
        CallToolResult {
            content: vec![TextContent {
                kind: "text",
                text: self.text.clone(),
            }],
            structured_content: self.structured.clone(),
            is_error: self.is_error,
        }
    }
}

/// Wire form of a tool result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    pub content: Vec<TextContent>,
    pub structured_content: Value,
    pub is_error: bool,
}

/// A text content block.
#[derive(Debug, Clone, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}
