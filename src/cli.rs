//! Command-line interface for wsl-win-bridge.
//!
//! Uses lexopt; every option is optional so unset flags fall through to
//! environment variables and the config file.

use std::ffi::OsString;
use std::net::IpAddr;
use std::path::PathBuf;

use crate::server::Transport;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Transport to serve tools over.
    pub transport: Option<Transport>,
    /// Host address to bind to (http).
    pub host: Option<IpAddr>,
    /// Port to listen on (http).
    pub port: Option<u16>,
    /// API key for authentication (http).
    pub api_key: Option<String>,
    /// Disable authentication.
    pub no_auth: bool,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Default execution timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('t') | Long("transport") => {
                let value: String = parser.value()?.parse()?;
                result.transport = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("transport", value))?,
                );
            }
            Short('H') | Long("host") => {
                let value: String = parser.value()?.parse()?;
                result.host = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("host", value))?,
                );
            }
            Short('p') | Long("port") => {
                let value: String = parser.value()?.parse()?;
                result.port = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("port", value))?,
                );
            }
            Short('k') | Long("api-key") => {
                result.api_key = Some(parser.value()?.parse()?);
            }
            Long("no-auth") => {
                result.no_auth = true;
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Long("timeout-ms") => {
                let value: String = parser.value()?.parse()?;
                let ms = value
                    .parse::<u64>()
                    .ok()
                    .filter(|ms| *ms > 0)
                    .ok_or(ArgsError::InvalidValue("timeout-ms", value))?;
                result.timeout_ms = Some(ms);
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"wsl-win-bridge {version}
Run allowlisted Windows executables and hdc device commands from WSL

USAGE:
    wsl-win-bridge [OPTIONS]

OPTIONS:
    -t, --transport <T>     Transport: stdio or http [default: stdio]
    -H, --host <ADDR>       Host address to bind (http) [default: 127.0.0.1]
    -p, --port <PORT>       Port to listen on (http) [default: 3000]
    -c, --config <FILE>     Path to configuration file (JSON)
    -k, --api-key <KEY>     API key for authentication (http)
    -l, --log-level <LVL>   Log level (error, warn, info, debug, trace)
        --timeout-ms <MS>   Default execution timeout [default: 30000]
        --no-auth           Disable authentication (http)
    -h, --help              Print help
    -V, --version           Print version

ENVIRONMENT VARIABLES:
    WIN_PS_EXE              PowerShell executable [default: powershell.exe]
    HDC_EXE                 hdc executable [default: hdc.exe]
    WSLPATH_EXE             Path translator [default: wslpath]
    DEFAULT_TIMEOUT_MS      Default execution timeout in milliseconds
    ALLOW_EXE               Comma-separated executable allowlist; a list with
                            no entries (e.g. ",") allows everything
                            [default: hdc.exe,powershell.exe,cmd.exe]
    HDC_CONNECT_KEY         Default hdc connect key
    DEFAULT_CONNECT_KEY     Generic fallback connect key
    RK3588S_CONNECTKEY      Connect key of the RK3588S board
    BRIDGE_API_KEY          API key (http)
    BRIDGE_LOG_LEVEL        Log level
    RUST_LOG                Alternative log level setting

EXAMPLES:
    # Serve MCP over stdio (logs go to stderr)
    wsl-win-bridge

    # Serve the HTTP API with an API key
    wsl-win-bridge -t http -p 8080 -k my-secret-key

    # Only allow hdc
    ALLOW_EXE=hdc.exe wsl-win-bridge
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("wsl-win-bridge {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}
