//! Execution request and the JSON payload handed to the transport script.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

/// A request to run a Windows executable through the foreign shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    /// Executable name or full path, e.g. `hdc.exe` or `C:\Tools\hdc.exe`.
    pub exe: String,
    /// Arguments, passed through verbatim.
    pub args: Vec<String>,
    /// Working directory in either WSL or Windows form.
    pub cwd: Option<String>,
    /// Environment variables to set for the invoked program.
    pub env: Option<BTreeMap<String, String>>,
    /// Maximum execution time; the configured default applies when unset.
    pub timeout: Option<Duration>,
}

impl ExecutionRequest {
    /// Create a new request for the given executable.
    pub fn new(exe: impl Into<String>) -> Self {
        Self {
            exe: exe.into(),
            args: Vec::new(),
            cwd: None,
            env: None,
            timeout: None,
        }
    }

    /// Append an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, dir: impl Into<String>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Add an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Set the execution timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Set the execution timeout if one is given.
    pub fn maybe_timeout(mut self, duration: Option<Duration>) -> Self {
        if duration.is_some() {
            self.timeout = duration;
        }
        self
    }
}

/// Payload written to the transport script's stdin.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TransportPayload<'a> {
    pub exe: &'a str,
    pub args: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<&'a BTreeMap<String, String>>,
}

impl<'a> TransportPayload<'a> {
    /// Build the payload, substituting an already-translated working directory.
    pub fn new(request: &'a ExecutionRequest, windows_cwd: Option<&'a str>) -> Self {
        Self {
            exe: &request.exe,
            args: &request.args,
            cwd: windows_cwd,
            env: request.env.as_ref(),
        }
    }

    /// Serialize to the JSON text the transport script expects.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
