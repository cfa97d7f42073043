//! Directory listing with a fallback chain.
//!
//! Devices differ in what they ship: some have busybox, some a system
//! `find`, some only `ls`. Candidates are tried one at a time, most capable
//! first, and never concurrently: they share the device's shell state.

use std::time::Duration;

use serde::Serialize;

use super::shell::{DeviceRunResult, DeviceShell};
use crate::error::BridgeError;
use crate::execution::Executor;
use crate::Result;

/// Default directory to list.
pub const DEFAULT_PATH: &str = "/";
/// Default `-maxdepth`.
pub const DEFAULT_MAX_DEPTH: u32 = 3;
/// Largest accepted `-maxdepth`.
pub const MAX_DEPTH_LIMIT: u32 = 20;

/// Parameters of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirTreeRequest {
    pub path: String,
    pub max_depth: u32,
    pub dirs_only: bool,
}

impl DirTreeRequest {
    /// Build a request, rejecting a depth outside `1..=20`.
    pub fn new(path: impl Into<String>, max_depth: u32, dirs_only: bool) -> Result<Self> {
        if !(1..=MAX_DEPTH_LIMIT).contains(&max_depth) {
            return Err(BridgeError::InvalidRequest(format!(
                "maxDepth must be between 1 and {MAX_DEPTH_LIMIT}, got {max_depth}"
            )));
        }
        Ok(Self {
            path: path.into(),
            max_depth,
            dirs_only,
        })
    }
}

impl Default for DirTreeRequest {
    fn default() -> Self {
        Self {
            path: DEFAULT_PATH.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            dirs_only: true,
        }
    }
}

/// Outcome of the probe chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    #[serde(flatten)]
    pub run: DeviceRunResult,
    /// The candidate command whose result this is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempted_command: Option<String>,
    /// Set when no candidate succeeded.
    #[serde(skip)]
    pub is_error: bool,
}

impl ProbeResult {
    pub(crate) fn missing_key(run: DeviceRunResult) -> Self {
        Self {
            run,
            attempted_command: None,
            is_error: true,
        }
    }
}

/// Quote for a POSIX shell: wrap in `'...'` and turn each embedded `'`
/// into `'\''`.
pub fn quote_sh_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// The three candidates, most capable first.
pub fn candidate_commands(request: &DirTreeRequest) -> [String; 3] {
    let quoted = quote_sh_single(&request.path);
    let type_flag = if request.dirs_only { "-type d " } else { "" };
    let depth = request.max_depth;
    [
        format!("cd {quoted} && busybox find . -maxdepth {depth} {type_flag}-print"),
        format!("cd {quoted} && find . -maxdepth {depth} {type_flag}-print"),
        format!("cd {quoted} && ls -la"),
    ]
}

/// Try each candidate in order on `key` and return the first success, or
/// the last attempt marked as an error.
pub async fn dir_tree<E: Executor>(
    shell: &DeviceShell<E>,
    key: &str,
    request: &DirTreeRequest,
    timeout: Option<Duration>,
) -> Result<ProbeResult> {
    let mut last = None;
    for command in candidate_commands(request) {
        // busybox is already named explicitly where wanted
        let run = shell.shell_on(key, &command, false, timeout).await?;
        if run.result.success() {
            return Ok(ProbeResult {
                run,
                attempted_command: Some(command),
                is_error: false,
            });
        }
        tracing::debug!(command = %command, exit_code = ?run.result.exit_code, "dir tree candidate failed");
        last = Some((run, command));
    }

    let (run, command) = last.ok_or_else(|| {
        BridgeError::InvalidRequest("no directory listing candidates".to_string())
    })?;
    Ok(ProbeResult {
        run,
        attempted_command: Some(command),
        is_error: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;
    use crate::device::testing::ScriptedExecutor;
    use crate::execution::ExecutionResult;
    use std::sync::Arc;

    fn exited(code: i32, out: &str) -> ExecutionResult {
        ExecutionResult::exited(code, out.into(), String::new(), Duration::from_millis(5))
    }

    fn shell(results: Vec<ExecutionResult>) -> DeviceShell<ScriptedExecutor> {
        DeviceShell::new(
            ScriptedExecutor::new(results),
            Arc::new(BridgeConfig::default()),
        )
    }

    #[test]
    fn test_quote_sh_single() {
        assert_eq!(quote_sh_single("/data"), "'/data'");
        assert_eq!(quote_sh_single("it's"), r"'it'\''s'");
        assert_eq!(quote_sh_single(""), "''");
        assert_eq!(quote_sh_single("''"), r"''\'''\'''");
    }

    #[cfg(unix)]
    #[test]
    fn test_quote_round_trips_through_sh() {
        for input in ["it's", "a b", "$(id) `id` \"q\" \\ ;|&", "''", ""] {
            let script = format!("printf %s {}", quote_sh_single(input));
            let out = std::process::Command::new("sh")
                .arg("-c")
                .arg(&script)
                .output()
                .unwrap();
            assert_eq!(String::from_utf8(out.stdout).unwrap(), input);
        }
    }

    #[test]
    fn test_candidate_commands() {
        let request = DirTreeRequest::new("/data/it's", 2, true).unwrap();
        let [first, second, third] = candidate_commands(&request);
        assert_eq!(
            first,
            r"cd '/data/it'\''s' && busybox find . -maxdepth 2 -type d -print"
        );
        assert_eq!(second, r"cd '/data/it'\''s' && find . -maxdepth 2 -type d -print");
        assert_eq!(third, r"cd '/data/it'\''s' && ls -la");
    }

    #[test]
    fn test_candidate_commands_all_entries() {
        let request = DirTreeRequest::new("/", 3, false).unwrap();
        assert_eq!(
            candidate_commands(&request)[0],
            "cd '/' && busybox find . -maxdepth 3 -print"
        );
    }

    #[test]
    fn test_depth_bounds() {
        assert!(DirTreeRequest::new("/", 0, true).is_err());
        assert!(DirTreeRequest::new("/", 21, true).is_err());
        assert!(DirTreeRequest::new("/", 20, true).is_ok());
        assert_eq!(DirTreeRequest::default().max_depth, 3);
    }

    #[tokio::test]
    async fn test_first_success_stops_chain() {
        let shell = shell(vec![exited(0, "./a\n")]);
        let out = dir_tree(&shell, "board", &DirTreeRequest::default(), None)
            .await
            .unwrap();
        assert!(!out.is_error);
        assert_eq!(out.run.result.stdout, "./a\n");
        assert_eq!(shell.executor().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_falls_back_to_third_candidate() {
        let shell = shell(vec![exited(127, ""), exited(1, ""), exited(0, "total 0\n")]);
        let request = DirTreeRequest::default();
        let out = dir_tree(&shell, "board", &request, None).await.unwrap();

        assert!(!out.is_error);
        assert_eq!(out.run.result.stdout, "total 0\n");
        assert_eq!(out.attempted_command.as_deref(), Some("cd '/' && ls -la"));

        let calls = shell.executor().calls();
        assert_eq!(calls.len(), 3);
        for (call, command) in calls.iter().zip(candidate_commands(&request)) {
            assert_eq!(call.args, vec!["-t".to_string(), "board".into(), "shell".into(), command]);
        }
    }

    #[tokio::test]
    async fn test_all_fail_returns_last_attempt() {
        let shell = shell(vec![exited(127, ""), exited(2, ""), exited(1, "ls: denied")]);
        let request = DirTreeRequest::new("/root", 1, false).unwrap();
        let out = dir_tree(&shell, "board", &request, None).await.unwrap();

        assert!(out.is_error);
        assert_eq!(out.run.result.exit_code, Some(1));
        assert_eq!(out.run.result.stdout, "ls: denied");
        assert_eq!(out.attempted_command.as_deref(), Some("cd '/root' && ls -la"));
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let shell = shell(vec![
            ExecutionResult::timed_out(String::new(), String::new(), Duration::from_secs(1)),
            exited(0, "ok"),
        ]);
        let out = dir_tree(&shell, "board", &DirTreeRequest::default(), None)
            .await
            .unwrap();
        assert!(!out.is_error);
        assert_eq!(shell.executor().calls().len(), 2);
    }

    #[tokio::test]
    async fn test_serialized_result_carries_attempted_command() {
        let shell = shell(vec![exited(0, "x")]);
        let out = dir_tree(&shell, "board", &DirTreeRequest::default(), None)
            .await
            .unwrap();
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(
            json["attemptedCommand"],
            "cd '/' && busybox find . -maxdepth 3 -type d -print"
        );
        assert_eq!(json["connectKey"], "board");
        assert_eq!(json["exitCode"], 0);
        assert!(json.get("isError").is_none());
    }
}
