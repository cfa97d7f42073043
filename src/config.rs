//! Configuration management for wsl-win-bridge.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values
//!
//! The result is frozen into a [`BridgeConfig`] once at startup and shared
//! read-only with every component.

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::security::{AllowlistPolicy, DEFAULT_ALLOWLIST};
use crate::server::{ServerConfig, Transport};

/// Default execution timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Executables and execution defaults.
    pub bridge: BridgeSection,
    /// Default device connect keys.
    pub device: DeviceSection,
    /// Transport configuration.
    pub server: ServerSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Bridge configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSection {
    /// Foreign shell used as the launcher.
    pub powershell_exe: String,
    /// Device-bridge executable.
    pub hdc_exe: String,
    /// Path translator.
    pub wslpath_exe: String,
    /// Default timeout in milliseconds.
    pub default_timeout_ms: u64,
    /// Allowed executables; empty means unrestricted.
    pub allow_exe: Vec<String>,
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            powershell_exe: "powershell.exe".to_string(),
            hdc_exe: "hdc.exe".to_string(),
            wslpath_exe: "wslpath".to_string(),
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            allow_exe: DEFAULT_ALLOWLIST.split(',').map(str::to_string).collect(),
        }
    }
}

/// Device configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSection {
    /// Connect key used by the hdc tools when none is given.
    pub hdc_connect_key: Option<String>,
    /// Generic fallback connect key.
    pub default_connect_key: Option<String>,
    /// Connect key of the fixed RK3588S board.
    pub rk3588s_connect_key: Option<String>,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Transport to serve tools over.
    pub transport: Transport,
    /// Host address to bind to (http only).
    pub host: String,
    /// Port to listen on (http only).
    pub port: u16,
    /// Bearer API keys (http only); empty disables authentication.
    pub api_keys: Vec<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            transport: Transport::Stdio,
            host: "127.0.0.1".to_string(),
            port: 3000,
            api_keys: Vec::new(),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log filter (e.g. `info`, `wsl_win_bridge=debug`).
    pub level: Option<String>,
}

/// Immutable runtime configuration shared by the runner and device layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub powershell_exe: String,
    pub hdc_exe: String,
    pub wslpath_exe: String,
    pub default_timeout: Duration,
    pub allowlist: AllowlistPolicy,
    pub hdc_connect_key: Option<String>,
    pub default_connect_key: Option<String>,
    pub rk3588s_connect_key: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Config::default().bridge_config()
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply environment overrides using the given lookup.
    ///
    /// Empty values count as unset.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(exe) = get("WIN_PS_EXE") {
            self.bridge.powershell_exe = exe;
        }
        if let Some(exe) = get("HDC_EXE") {
            self.bridge.hdc_exe = exe;
        }
        if let Some(exe) = get("WSLPATH_EXE") {
            self.bridge.wslpath_exe = exe;
        }
        if let Some(ms) = get("DEFAULT_TIMEOUT_MS").and_then(|v| parse_timeout_ms(&v)) {
            self.bridge.default_timeout_ms = ms;
        }
        if let Some(list) = get("ALLOW_EXE") {
            self.bridge.allow_exe = list.split(',').map(str::to_string).collect();
        }

        if let Some(key) = get("HDC_CONNECT_KEY") {
            self.device.hdc_connect_key = Some(key);
        }
        if let Some(key) = get("DEFAULT_CONNECT_KEY") {
            self.device.default_connect_key = Some(key);
        }
        if let Some(key) = get("RK3588S_CONNECTKEY").or_else(|| get("RK3588S_CONNECT_KEY")) {
            self.device.rk3588s_connect_key = Some(key);
        }

        if let Some(key) = get("BRIDGE_API_KEY") {
            if !self.server.api_keys.contains(&key) {
                self.server.api_keys.push(key);
            }
        }
        if let Some(level) = get("BRIDGE_LOG_LEVEL") {
            self.logging.level = Some(level);
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(transport) = args.transport {
            self.server.transport = transport;
        }
        if let Some(host) = args.host {
            self.server.host = host.to_string();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(ref key) = args.api_key {
            if !self.server.api_keys.contains(key) {
                self.server.api_keys.push(key.clone());
            }
        }
        if args.no_auth {
            self.server.api_keys.clear();
        }
        if let Some(ms) = args.timeout_ms {
            self.bridge.default_timeout_ms = ms;
        }
        if let Some(ref level) = args.log_level {
            self.logging.level = Some(level.clone());
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };
        config.apply_env();
        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    /// Reject values no component can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bridge.default_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "default_timeout_ms",
                "must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("powershell_exe", &self.bridge.powershell_exe),
            ("hdc_exe", &self.bridge.hdc_exe),
            ("wslpath_exe", &self.bridge.wslpath_exe),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue(name, "must not be empty".to_string()));
            }
        }
        Ok(())
    }

    /// Freeze into the runtime configuration.
    pub fn bridge_config(&self) -> BridgeConfig {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        BridgeConfig {
            powershell_exe: self.bridge.powershell_exe.clone(),
            hdc_exe: self.bridge.hdc_exe.clone(),
            wslpath_exe: self.bridge.wslpath_exe.clone(),
            default_timeout: Duration::from_millis(self.bridge.default_timeout_ms),
            allowlist: AllowlistPolicy::new(&self.bridge.allow_exe),
            hdc_connect_key: non_empty(&self.device.hdc_connect_key),
            default_connect_key: non_empty(&self.device.default_connect_key),
            rk3588s_connect_key: non_empty(&self.device.rk3588s_connect_key),
        }
    }

    /// Convert to the transport configuration.
    pub fn server_config(&self) -> Result<ServerConfig, ConfigError> {
        let host: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.server.host.clone()))?;

        Ok(ServerConfig {
            transport: self.server.transport,
            host: host.to_string(),
            port: self.server.port,
            api_keys: self.server.api_keys.clone(),
        })
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> Option<&str> {
        self.logging.level.as_deref()
    }
}

/// `DEFAULT_TIMEOUT_MS` must be a positive integer; anything else is ignored.
fn parse_timeout_ms(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().filter(|ms| *ms > 0)
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Invalid host address.
    InvalidHost(String),
    /// A setting has an unusable value.
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidHost(host) => write!(f, "invalid host address: {}", host),
            Self::InvalidValue(name, reason) => write!(f, "invalid {}: {}", name, reason),
        }
    }
}

impl std::error::Error for ConfigError {}
