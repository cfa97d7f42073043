//! Transports that expose the tool surface.
//!
//! ## stdio (default)
//!
//! Line-delimited JSON-RPC 2.0 on stdin/stdout, speaking the subset of MCP
//! a tool server needs: `initialize`, `ping`, `tools/list`, `tools/call`.
//!
//! ## http
//!
//! - `GET /health` - Health check
//! - `GET /api/v1/` - API information
//! - `GET /api/v1/tools` - Tool descriptors
//! - `POST /api/v1/tools/{name}` - Call a tool with a JSON argument body
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wsl_win_bridge::{server, BridgeConfig, ToolBox};
//!
//! #[tokio::main]
//! async fn main() -> wsl_win_bridge::Result<()> {
//!     let tools = Arc::new(ToolBox::new(Arc::new(BridgeConfig::default())));
//!     server::serve(server::ServerConfig::default(), tools).await
//! }
//! ```

pub mod http;
pub mod stdio;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::tools::ToolBox;

pub use http::{create_router, AppState};
pub use stdio::serve_lines;

/// Which transport to serve tools over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Stdio,
    Http,
}

impl FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            other => Err(format!("unknown transport: {other}")),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
        })
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Transport to serve.
    pub transport: Transport,
    /// Host address to bind to (http).
    pub host: String,
    /// Port to listen on (http).
    pub port: u16,
    /// Accepted bearer keys (http); empty disables authentication.
    pub api_keys: Vec<String>,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: Transport::Stdio,
            host: "127.0.0.1".to_string(),
            port: 3000,
            api_keys: Vec::new(),
        }
    }
}

/// Serve `tools` over the configured transport until it closes.
pub async fn serve(config: ServerConfig, tools: Arc<ToolBox>) -> crate::Result<()> {
    match config.transport {
        Transport::Stdio => stdio::serve(tools).await,
        Transport::Http => http::serve(&config, tools).await,
    }
}
