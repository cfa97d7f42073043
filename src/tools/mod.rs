//! The tool surface shared by the stdio and HTTP transports.
//!
//! [`ToolBox::call`] returns `Err` only for problems with the call itself
//! (unknown tool, malformed arguments). Everything that goes wrong while
//! running a tool, including allowlist rejections and failed path
//! conversions, comes back as a [`ToolOutput`] with `is_error` set.

mod catalog;
mod types;

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

pub use catalog::{descriptors, is_known, ToolDescriptor, TOOL_NAMES};
pub use types::{
    parse_input, timeout_from_ms, BoardShellInput, CallToolResult, DirTreeInput,
    HdcListTargetsInput, HdcRunInput, HdcShellInput, PathInput, TextContent, ToolOutput,
    WinExecInput,
};

use crate::config::BridgeConfig;
use crate::device::{DeviceRunResult, DeviceShell, DeviceShellRequest};
use crate::error::BridgeError;
use crate::execution::{ExecutionRequest, ExecutionResult, Executor, WinExecutor};
use crate::path::PathTranslator;
use crate::Result;

/// Dispatches tool calls onto the executor, path translator and device
/// layer.
#[derive(Debug)]
pub struct ToolBox<E = WinExecutor> {
    device: DeviceShell<E>,
    paths: PathTranslator,
}

impl ToolBox<WinExecutor> {
    /// Tools backed by the real PowerShell executor.
    pub fn new(config: Arc<BridgeConfig>) -> Self {
        Self::with_executor(WinExecutor::new(Arc::clone(&config)), config)
    }
}

impl<E: Executor> ToolBox<E> {
    /// Tools backed by a custom executor.
    pub fn with_executor(executor: E, config: Arc<BridgeConfig>) -> Self {
        let paths = PathTranslator::new(config.wslpath_exe.clone());
        Self {
            device: DeviceShell::new(executor, config),
            paths,
        }
    }

    /// The device layer.
    pub fn device(&self) -> &DeviceShell<E> {
        &self.device
    }

    /// Run tool `name` with JSON `arguments`.
    pub async fn call(&self, name: &str, arguments: Value) -> Result<ToolOutput> {
        if !is_known(name) {
            return Err(BridgeError::UnknownTool(name.to_string()));
        }
        debug!(tool = name, "tool call");

        let outcome = match name {
            catalog::WIN_EXEC => self.win_exec(parse_input(arguments)?).await,
            catalog::PATH_WSL_TO_WIN => {
                let input: PathInput = parse_input(arguments)?;
                Ok(path_output(self.paths.wsl_to_win(&input.path).await))
            }
            catalog::PATH_WIN_TO_WSL => {
                let input: PathInput = parse_input(arguments)?;
                Ok(path_output(self.paths.win_to_wsl(&input.path).await))
            }
            catalog::HDC_RUN => self.hdc_run(parse_input(arguments)?).await,
            catalog::HDC_LIST_TARGETS => self.hdc_list_targets(parse_input(arguments)?).await,
            catalog::HDC_SHELL => self.hdc_shell(parse_input(arguments)?).await,
            catalog::RK3588S_SHELL => self.rk3588s_shell(parse_input(arguments)?).await,
            catalog::RK3588S_DIR_TREE => self.rk3588s_dir_tree(parse_input(arguments)?).await,
            other => return Err(BridgeError::UnknownTool(other.to_string())),
        };

        match outcome {
            Ok(output) => Ok(output),
            Err(e @ BridgeError::InvalidRequest(_)) => Err(e),
            Err(e) => {
                info!(tool = name, error = %e, "tool call failed");
                Ok(ToolOutput::error(e.to_string()))
            }
        }
    }

    async fn win_exec(&self, input: WinExecInput) -> Result<ToolOutput> {
        if input.exe.trim().is_empty() {
            return Err(BridgeError::InvalidRequest("exe must not be empty".to_string()));
        }
        let mut request = ExecutionRequest::new(input.exe)
            .args(input.args)
            .maybe_timeout(timeout_from_ms(input.timeout_ms)?);
        if let Some(cwd) = input.cwd {
            request = request.cwd(cwd);
        }
        if let Some(env) = input.env {
            request.env = Some(env);
        }

        let result = self.device.executor().execute(&request).await?;
        execution_output(&result, &result)
    }

    async fn hdc_run(&self, input: HdcRunInput) -> Result<ToolOutput> {
        let timeout = timeout_from_ms(input.timeout_ms)?;
        let run = self
            .device
            .run(input.args, input.connect_key.as_deref(), timeout, true)
            .await?;
        device_output(&run)
    }

    async fn hdc_list_targets(&self, input: HdcListTargetsInput) -> Result<ToolOutput> {
        let timeout = timeout_from_ms(input.timeout_ms)?;
        let run = self.device.list_targets(input.verbose, timeout).await?;
        device_output(&run)
    }

    async fn hdc_shell(&self, input: HdcShellInput) -> Result<ToolOutput> {
        let timeout = timeout_from_ms(input.timeout_ms)?;
        let mut request = DeviceShellRequest::new(input.command).busybox(input.use_busybox);
        if let Some(key) = input.connect_key {
            request = request.connect_key(key);
        }
        let run = self.device.shell(&request, timeout).await?;
        device_output(&run)
    }

    async fn rk3588s_shell(&self, input: BoardShellInput) -> Result<ToolOutput> {
        let timeout = timeout_from_ms(input.timeout_ms)?;
        let run = self
            .device
            .rk3588s()
            .shell(&input.command, input.use_busybox, timeout)
            .await?;
        device_output(&run)
    }

    async fn rk3588s_dir_tree(&self, input: DirTreeInput) -> Result<ToolOutput> {
        let timeout = timeout_from_ms(input.timeout_ms)?;
        let request = input.to_request()?;
        let probe = self.device.rk3588s().dir_tree(&request, timeout).await?;
        Ok(ToolOutput::new(
            probe.run.result.to_content_text(),
            serde_json::to_value(&probe)?,
            probe.is_error || probe.run.result.is_error(),
        ))
    }
}

fn execution_output<T: Serialize>(result: &ExecutionResult, structured: &T) -> Result<ToolOutput> {
    Ok(ToolOutput::new(
        result.to_content_text(),
        serde_json::to_value(structured)?,
        result.is_error(),
    ))
}

fn device_output(run: &DeviceRunResult) -> Result<ToolOutput> {
    execution_output(&run.result, run)
}

fn path_output(converted: Result<String>) -> ToolOutput {
    match converted {
        Ok(path) => ToolOutput::new(path.clone(), json!({ "path": path }), false),
        Err(e) => ToolOutput::error(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::testing::ScriptedExecutor;
    use crate::device::MISSING_RK3588S_KEY_HINT;
    use crate::security::AllowlistPolicy;
    use std::time::Duration;

    fn toolbox(config: BridgeConfig, results: Vec<ExecutionResult>) -> ToolBox<ScriptedExecutor> {
        ToolBox::with_executor(ScriptedExecutor::new(results), Arc::new(config))
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let tools = toolbox(BridgeConfig::default(), vec![]);
        let err = tools.call("hdc.reboot", json!({})).await.unwrap_err();
        assert!(matches!(err, BridgeError::UnknownTool(name) if name == "hdc.reboot"));
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_errors() {
        let tools = toolbox(BridgeConfig::default(), vec![]);
        for (name, args) in [
            ("win.exec", json!({})),
            ("win.exec", json!({"exe": "hdc.exe", "timeoutMs": 0})),
            ("hdc.shell", json!({"connectKey": "k"})),
            ("rk3588s.dir_tree", json!({"maxDepth": 0})),
            ("path.wsl_to_win", json!({"path": 3})),
        ] {
            let err = tools.call(name, args).await.unwrap_err();
            assert!(matches!(err, BridgeError::InvalidRequest(_)), "{name}");
        }
        assert!(tools.device().executor().calls().is_empty());
    }

    #[tokio::test]
    async fn test_win_exec_builds_request() {
        let tools = toolbox(
            BridgeConfig::default(),
            vec![ExecutionResult::exited(
                0,
                "ok\n".into(),
                String::new(),
                Duration::from_millis(12),
            )],
        );
        let out = tools
            .call(
                "win.exec",
                json!({
                    "exe": "cmd.exe",
                    "args": ["/c", "echo", "ok"],
                    "timeoutMs": 2500,
                    "env": {"FOO": "bar"}
                }),
            )
            .await
            .unwrap();

        assert!(!out.is_error);
        assert_eq!(out.text, "exitCode=0\nstdout:\nok\n\nstderr:\n");
        assert_eq!(out.structured["exitCode"], 0);
        assert_eq!(out.structured["durationMs"], 12);
        assert_eq!(out.structured["timedOut"], false);

        let calls = tools.device().executor().calls();
        assert_eq!(calls[0].exe, "cmd.exe");
        assert_eq!(calls[0].args, vec!["/c", "echo", "ok"]);
        assert_eq!(calls[0].timeout, Some(Duration::from_millis(2500)));
        assert_eq!(
            calls[0].env.as_ref().and_then(|e| e.get("FOO")).map(String::as_str),
            Some("bar")
        );
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_error() {
        let tools = toolbox(
            BridgeConfig::default(),
            vec![ExecutionResult::exited(
                3,
                String::new(),
                "bad".into(),
                Duration::ZERO,
            )],
        );
        let out = tools
            .call("hdc.run", json!({"args": ["version"]}))
            .await
            .unwrap();
        assert!(out.is_error);
        assert_eq!(out.structured["exe"], "hdc.exe");
        assert_eq!(out.structured["args"], json!(["version"]));
    }

    #[tokio::test]
    async fn test_timeout_text() {
        let tools = toolbox(
            BridgeConfig::default(),
            vec![ExecutionResult::timed_out(
                String::new(),
                String::new(),
                Duration::from_millis(500),
            )],
        );
        let out = tools
            .call("hdc.list_targets", json!({"timeoutMs": 500}))
            .await
            .unwrap();
        assert!(out.is_error);
        assert_eq!(out.text, "Timed out after 500 ms");
        assert!(out.structured["exitCode"].is_null());
    }

    #[tokio::test]
    async fn test_policy_violation_becomes_tool_error() {
        let config = BridgeConfig {
            allowlist: AllowlistPolicy::from_csv("hdc.exe"),
            ..BridgeConfig::default()
        };
        let tools = ToolBox::new(Arc::new(config));
        let out = tools
            .call("win.exec", json!({"exe": "calc.exe"}))
            .await
            .unwrap();
        assert!(out.is_error);
        assert_eq!(out.text, "Executable \"calc.exe\" not in allowlist: hdc.exe");
        assert_eq!(out.structured["error"], out.text);
    }

    #[tokio::test]
    async fn test_rk3588s_missing_key() {
        let tools = toolbox(BridgeConfig::default(), vec![]);
        let out = tools
            .call("rk3588s.shell", json!({"command": "uname -a"}))
            .await
            .unwrap();
        assert!(out.is_error);
        assert_eq!(out.structured["exitCode"], -1);
        assert_eq!(out.structured["stderr"], MISSING_RK3588S_KEY_HINT);

        let out = tools.call("rk3588s.dir_tree", json!({})).await.unwrap();
        assert!(out.is_error);
        assert!(tools.device().executor().calls().is_empty());
    }

    #[tokio::test]
    async fn test_dir_tree_reports_attempt() {
        let config = BridgeConfig {
            rk3588s_connect_key: Some("board".into()),
            ..BridgeConfig::default()
        };
        let tools = toolbox(
            config,
            vec![
                ExecutionResult::exited(127, String::new(), String::new(), Duration::ZERO),
                ExecutionResult::exited(0, ".\n./data\n".into(), String::new(), Duration::ZERO),
            ],
        );
        let out = tools
            .call("rk3588s.dir_tree", json!({"path": "/data", "maxDepth": 1}))
            .await
            .unwrap();
        assert!(!out.is_error);
        assert_eq!(
            out.structured["attemptedCommand"],
            "cd '/data' && find . -maxdepth 1 -type d -print"
        );
        assert_eq!(out.structured["connectKey"], "board");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_path_conversion_failure_is_tool_error() {
        let config = BridgeConfig {
            wslpath_exe: "false".into(),
            ..BridgeConfig::default()
        };
        let tools = toolbox(config, vec![]);
        let out = tools
            .call("path.wsl_to_win", json!({"path": "/mnt/c"}))
            .await
            .unwrap();
        assert!(out.is_error);
        assert_eq!(out.text, "false failed for /mnt/c");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_path_conversion_success() {
        // `echo -w /x` prints its arguments back
        let config = BridgeConfig {
            wslpath_exe: "echo".into(),
            ..BridgeConfig::default()
        };
        let tools = toolbox(config, vec![]);
        let out = tools
            .call("path.wsl_to_win", json!({"path": "/mnt/c"}))
            .await
            .unwrap();
        assert!(!out.is_error);
        assert_eq!(out.structured["path"], "-w /mnt/c");
    }
}
