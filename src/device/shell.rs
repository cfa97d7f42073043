//! `hdc.exe` invocations layered on the Windows executor.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::connect_key::ConnectKeyResolution;
use super::probe::{self, DirTreeRequest, ProbeResult};
use crate::config::BridgeConfig;
use crate::execution::{ExecutionRequest, ExecutionResult, Executor};
use crate::Result;

/// Remediation text when `hdc.shell` has no connect key.
pub const MISSING_CONNECT_KEY_HINT: &str = "Missing connectKey. Provide arguments.connectKey, \
     or set HDC_CONNECT_KEY / DEFAULT_CONNECT_KEY, or run hdc.list_targets.";

/// Remediation text when the RK3588S board key is not configured.
pub const MISSING_RK3588S_KEY_HINT: &str = "Missing RK3588S_CONNECTKEY. Set it in the bridge \
     environment, or use hdc.list_targets + hdc.shell with connectKey.";

/// A device-side shell command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceShellRequest {
    /// Target device; falls back to the configured defaults.
    pub connect_key: Option<String>,
    /// Device-side shell text. Pipelines stay inside this string.
    pub command: String,
    /// Wrap as `busybox sh -c "<command>"`.
    pub use_busybox: bool,
}

impl DeviceShellRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::default()
        }
    }

    pub fn connect_key(mut self, key: impl Into<String>) -> Self {
        self.connect_key = Some(key.into());
        self
    }

    pub fn busybox(mut self, use_busybox: bool) -> Self {
        self.use_busybox = use_busybox;
        self
    }
}

/// Execution result annotated with the hdc invocation that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRunResult {
    pub exe: String,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_key: Option<String>,
    #[serde(flatten)]
    pub result: ExecutionResult,
}

impl DeviceRunResult {
    fn missing_key(exe: &str, hint: &str) -> Self {
        tracing::info!(exe, "no connect key resolved");
        Self {
            exe: exe.to_string(),
            args: Vec::new(),
            connect_key: None,
            result: ExecutionResult::missing_connect_key(hint),
        }
    }
}

/// Wrap a command for the device's busybox shell.
///
/// Only `"` is escaped. Backslashes, `$` and backticks pass through and are
/// interpreted by the device shell; callers are responsible for them.
pub fn wrap_busybox(command: &str) -> String {
    format!("busybox sh -c \"{}\"", command.replace('"', "\\\""))
}

/// Builds and runs `hdc.exe` invocations.
#[derive(Debug, Clone)]
pub struct DeviceShell<E> {
    executor: E,
    config: Arc<BridgeConfig>,
}

impl<E: Executor> DeviceShell<E> {
    pub fn new(executor: E, config: Arc<BridgeConfig>) -> Self {
        Self { executor, config }
    }

    /// The underlying executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    fn resolve(&self, connect_key: Option<&str>, use_default: bool) -> ConnectKeyResolution {
        let resolved = if use_default {
            ConnectKeyResolution::resolve(
                connect_key,
                self.config.hdc_connect_key.as_deref(),
                self.config.default_connect_key.as_deref(),
            )
        } else {
            ConnectKeyResolution::explicit_only(connect_key)
        };
        if let Some(source) = resolved.source() {
            tracing::debug!(key = resolved.key(), ?source, "connect key resolved");
        }
        resolved
    }

    /// Run `hdc.exe [-t <key>] <args>`.
    ///
    /// A key is optional: without one hdc picks its own target, or the
    /// command needs none (e.g. `list targets`).
    pub async fn run(
        &self,
        args: Vec<String>,
        connect_key: Option<&str>,
        timeout: Option<Duration>,
        use_default: bool,
    ) -> Result<DeviceRunResult> {
        let resolved = self.resolve(connect_key, use_default);
        let mut final_args = Vec::with_capacity(args.len() + 2);
        if let Some(key) = resolved.key() {
            final_args.push("-t".to_string());
            final_args.push(key.to_string());
        }
        final_args.extend(args);

        self.invoke(final_args, resolved.key().map(str::to_string), timeout)
            .await
    }

    /// `hdc list targets [-v]`. Never applies a default key.
    pub async fn list_targets(
        &self,
        verbose: bool,
        timeout: Option<Duration>,
    ) -> Result<DeviceRunResult> {
        let mut args = vec!["list".to_string(), "targets".to_string()];
        if verbose {
            args.push("-v".to_string());
        }
        self.run(args, None, timeout, false).await
    }

    /// `hdc -t <key> shell <command>`.
    ///
    /// Without a resolvable key this returns the missing-key result and
    /// never reaches the executor.
    pub async fn shell(
        &self,
        request: &DeviceShellRequest,
        timeout: Option<Duration>,
    ) -> Result<DeviceRunResult> {
        match self.resolve(request.connect_key.as_deref(), true).key() {
            Some(key) => {
                self.shell_on(key, &request.command, request.use_busybox, timeout)
                    .await
            }
            None => Ok(DeviceRunResult::missing_key(
                &self.config.hdc_exe,
                MISSING_CONNECT_KEY_HINT,
            )),
        }
    }

    /// Run a device shell command against a known key.
    pub async fn shell_on(
        &self,
        key: &str,
        command: &str,
        use_busybox: bool,
        timeout: Option<Duration>,
    ) -> Result<DeviceRunResult> {
        let device_command = if use_busybox {
            wrap_busybox(command)
        } else {
            command.to_string()
        };
        let args = vec![
            "-t".to_string(),
            key.to_string(),
            "shell".to_string(),
            device_command,
        ];
        self.invoke(args, Some(key.to_string()), timeout).await
    }

    /// The RK3588S board, keyed only by its dedicated setting.
    pub fn rk3588s(&self) -> FixedTarget<'_, E> {
        FixedTarget {
            shell: self,
            key: self.config.rk3588s_connect_key.as_deref(),
            missing_hint: MISSING_RK3588S_KEY_HINT,
        }
    }

    async fn invoke(
        &self,
        args: Vec<String>,
        connect_key: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<DeviceRunResult> {
        let exe = self.config.hdc_exe.clone();
        let request = ExecutionRequest::new(exe.as_str())
            .args(args.iter().cloned())
            .maybe_timeout(timeout);
        let result = self.executor.execute(&request).await?;
        Ok(DeviceRunResult {
            exe,
            args,
            connect_key,
            result,
        })
    }
}

/// A device whose connect key comes only from configuration.
///
/// Caller-supplied keys and the generic defaults are never consulted.
#[derive(Debug)]
pub struct FixedTarget<'a, E> {
    shell: &'a DeviceShell<E>,
    key: Option<&'a str>,
    missing_hint: &'static str,
}

impl<'a, E: Executor> FixedTarget<'a, E> {
    /// The configured key, if any.
    pub fn key(&self) -> Option<&'a str> {
        self.key.filter(|k| !k.is_empty())
    }

    /// Run a device shell command on this target.
    pub async fn shell(
        &self,
        command: &str,
        use_busybox: bool,
        timeout: Option<Duration>,
    ) -> Result<DeviceRunResult> {
        match self.key() {
            Some(key) => self.shell.shell_on(key, command, use_busybox, timeout).await,
            None => Ok(DeviceRunResult::missing_key(
                &self.shell.config.hdc_exe,
                self.missing_hint,
            )),
        }
    }

    /// List a directory tree on this target through the probe chain.
    pub async fn dir_tree(
        &self,
        request: &DirTreeRequest,
        timeout: Option<Duration>,
    ) -> Result<ProbeResult> {
        match self.key() {
            Some(key) => probe::dir_tree(self.shell, key, request, timeout).await,
            None => Ok(ProbeResult::missing_key(DeviceRunResult::missing_key(
                &self.shell.config.hdc_exe,
                self.missing_hint,
            ))),
        }
    }
}
