//! # wsl-win-bridge
//!
//! Tool server that lets an agent running in WSL drive Windows executables
//! and, through the Windows-resident `hdc.exe`, OpenHarmony devices.
//!
//! Every Windows program is launched through one constant PowerShell
//! script passed as `-EncodedCommand`; the executable, arguments, working
//! directory and environment travel as JSON on the child's stdin and are
//! never interpolated into a command line.
//!
//! ## Features
//!
//! - **Executable allowlist**: checked on the lowercased name and basename
//!   before any process is spawned
//! - **Forced-kill timeouts**: every call is bounded, the child is killed
//!   when the timer fires
//! - **Path translation**: WSL <-> Windows through `wslpath`
//! - **Device access**: `hdc` invocations with connect key fallbacks, a
//!   fixed RK3588S target and a directory listing probe
//! - **Transports**: line-delimited JSON-RPC on stdio, or an HTTP API
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use wsl_win_bridge::{BridgeConfig, ToolBox};
//!
//! #[tokio::main]
//! async fn main() -> wsl_win_bridge::Result<()> {
//!     wsl_win_bridge::logging::try_init(None).ok();
//!
//!     let tools = ToolBox::new(Arc::new(BridgeConfig::default()));
//!     let output = tools
//!         .call("hdc.list_targets", json!({ "verbose": true }))
//!         .await?;
//!
//!     println!("{}", output.text);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod device;
pub mod error;
pub mod execution;
pub mod logging;
pub mod path;
pub mod security;
pub mod server;
pub mod tools;

// Re-export commonly used types
pub use config::{BridgeConfig, Config, ConfigError};
pub use device::{ConnectKeyResolution, DeviceShell, DirTreeRequest, ProbeResult};
pub use error::{BridgeError, Result};
pub use execution::{ExecutionRequest, ExecutionResult, Executor, WinExecutor};
pub use path::PathTranslator;
pub use security::AllowlistPolicy;
pub use server::{ServerConfig, Transport};
pub use tools::{ToolBox, ToolOutput};
