//! Windows command execution engine.
//!
//! This module provides:
//! - The constant PowerShell transport script and its encoding
//! - Allowlist-checked execution with a forced-kill timeout
//! - Buffered stdout/stderr capture
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use wsl_win_bridge::config::BridgeConfig;
//! use wsl_win_bridge::execution::{ExecutionRequest, WinExecutor};
//!
//! # async fn demo() -> wsl_win_bridge::Result<()> {
//! let executor = WinExecutor::new(Arc::new(BridgeConfig::default()));
//! let request = ExecutionRequest::new("hdc.exe")
//!     .args(["list", "targets"])
//!     .timeout(Duration::from_secs(10));
//! let result = executor.run(&request).await?;
//! println!("{}", result.to_content_text());
//! # Ok(())
//! # }
//! ```

mod request;
mod result;
mod runner;
pub mod script;

pub use request::{ExecutionRequest, TransportPayload};
pub use result::{ExecutionResult, SPAWN_FAILED_EXIT_CODE};
pub use runner::{run_with_input, Executor, WinExecutor, OUTPUT_DRAIN_GRACE};
