//! Security module for wsl-win-bridge.
//!
//! ## Features
//!
//! - **Executable Allowlist**: only configured Windows executables may be
//!   launched; checked before any process is spawned
//! - **API Key Authentication**: Bearer token authentication for the HTTP
//!   transport
//!
//! ## Example
//!
//! ```rust
//! use wsl_win_bridge::security::AllowlistPolicy;
//!
//! let policy = AllowlistPolicy::from_csv("hdc.exe,cmd.exe");
//! assert!(policy.ensure_allowed(r"C:\Tools\hdc\hdc.exe").is_ok());
//! assert!(policy.ensure_allowed("calc.exe").is_err());
//! ```

pub mod allowlist;
pub mod auth;

pub use allowlist::{normalize, AllowlistPolicy, NormalizedExe, DEFAULT_ALLOWLIST};
pub use auth::{auth_middleware, ApiKeyStore};
