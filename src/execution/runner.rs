//! Foreign-shell process runner.
//!
//! Each call spawns one PowerShell process carrying the encoded transport
//! script, writes the JSON payload to its stdin, and races process exit
//! against a single timeout timer.

use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::request::{ExecutionRequest, TransportPayload};
use super::result::{ExecutionResult, SPAWN_FAILED_EXIT_CODE};
use super::script::transport_shell_args;
use crate::config::BridgeConfig;
use crate::path::PathTranslator;
use crate::Result;

/// Buffer size for reading child output.
const READ_BUFFER_SIZE: usize = 8192;

/// How long output pipes may keep draining after the child has terminated.
/// Grandchildren that inherited the pipes can otherwise hold them open
/// indefinitely.
pub const OUTPUT_DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Something that runs an [`ExecutionRequest`] to completion.
///
/// `Err` is reserved for rejections that happen before any process exists
/// (policy violation, path conversion). Spawn failures, timeouts and
/// non-zero exits are all `Ok` results.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult>;
}

/// Runs Windows executables through `powershell.exe -EncodedCommand`.
#[derive(Debug, Clone)]
pub struct WinExecutor {
    config: Arc<BridgeConfig>,
    paths: PathTranslator,
}

impl WinExecutor {
    /// Create an executor over the shared configuration.
    pub fn new(config: Arc<BridgeConfig>) -> Self {
        let paths = PathTranslator::new(config.wslpath_exe.clone());
        Self { config, paths }
    }

    /// The configuration this executor was built with.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The path translator used for working directories.
    pub fn paths(&self) -> &PathTranslator {
        &self.paths
    }

    /// Validate, translate and run one request.
    pub async fn run(&self, request: &ExecutionRequest) -> Result<ExecutionResult> {
        self.config.allowlist.ensure_allowed(&request.exe)?;

        let cwd = match request.cwd.as_deref() {
            Some(dir) if !dir.is_empty() => Some(self.paths.to_windows_maybe(dir).await?),
            _ => None,
        };
        let payload = TransportPayload::new(request, cwd.as_deref()).to_json()?;
        let timeout = request.timeout.unwrap_or(self.config.default_timeout);

        debug!(
            exe = %request.exe,
            args = request.args.len(),
            timeout_ms = timeout.as_millis() as u64,
            "running windows executable"
        );

        Ok(run_with_input(
            &self.config.powershell_exe,
            &transport_shell_args(),
            payload,
            timeout,
        )
        .await)
    }
}

#[async_trait]
impl Executor for WinExecutor {
    async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult> {
        self.run(request).await
    }
}

/// Spawn `program`, write `input` to its stdin, and wait for it to exit or
/// for `timeout` to elapse, whichever comes first.
///
/// On timeout the child is killed without a grace period and the result
/// reports `timed_out` with no exit code.
pub async fn run_with_input(
    program: &str,
    args: &[String],
    input: String,
    timeout: Duration,
) -> ExecutionResult {
    let start = Instant::now();

    let spawned = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(e) => {
            warn!(program, error = %e, "failed to spawn foreign shell");
            return ExecutionResult::spawn_failed(
                String::new(),
                String::new(),
                &format!("failed to spawn {program}: {e}"),
                start.elapsed(),
            );
        }
    };

    let stdout = Arc::new(Mutex::new(Vec::new()));
    let stderr = Arc::new(Mutex::new(Vec::new()));
    let stdout_task = child
        .stdout
        .take()
        .map(|pipe| tokio::spawn(drain(pipe, Arc::clone(&stdout))));
    let stderr_task = child
        .stderr
        .take()
        .map(|pipe| tokio::spawn(drain(pipe, Arc::clone(&stderr))));

    if let Some(mut stdin) = child.stdin.take() {
        tokio::spawn(async move {
            if let Err(e) = stdin.write_all(input.as_bytes()).await {
                debug!(error = %e, "child closed stdin before payload was written");
            }
            // Dropping stdin closes the pipe and signals end of input.
            let _ = stdin.shutdown().await;
        });
    }

    let timer = tokio::time::sleep(timeout);
    tokio::pin!(timer);

    let (status, timed_out) = tokio::select! {
        biased;
        status = child.wait() => (status, false),
        _ = &mut timer => {
            warn!(program, timeout_ms = timeout.as_millis() as u64, "timeout exceeded, killing child");
            if let Err(e) = child.start_kill() {
                debug!(error = %e, "kill failed, child already exited");
            }
            (child.wait().await, true)
        }
    };

    let deadline = Instant::now() + OUTPUT_DRAIN_GRACE;
    collect(stdout_task, deadline).await;
    collect(stderr_task, deadline).await;
    let duration = start.elapsed();

    let stdout = take_text(&stdout);
    let stderr = take_text(&stderr);

    if timed_out {
        return ExecutionResult::timed_out(stdout, stderr, duration);
    }

    match status {
        Ok(status) => ExecutionResult::exited(exit_code(status), stdout, stderr, duration),
        Err(e) => ExecutionResult::spawn_failed(
            stdout,
            stderr,
            &format!("failed to wait for {program}: {e}"),
            duration,
        ),
    }
}

async fn drain<R>(mut pipe: R, sink: Arc<Mutex<Vec<u8>>>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; READ_BUFFER_SIZE];
    loop {
        match pipe.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if let Ok(mut out) = sink.lock() {
                    out.extend_from_slice(&buf[..n]);
                }
            }
            Err(e) => {
                debug!(error = %e, "output pipe read failed");
                break;
            }
        }
    }
}

async fn collect(task: Option<JoinHandle<()>>, deadline: Instant) {
    let Some(mut task) = task else {
        return;
    };
    if tokio::time::timeout_at(deadline, &mut task).await.is_err() {
        debug!("output pipe still open after child exit, abandoning it");
        task.abort();
    }
}

fn take_text(sink: &Mutex<Vec<u8>>) -> String {
    sink.lock()
        .map(|mut buf| String::from_utf8_lossy(&std::mem::take(&mut *buf)).into_owned())
        .unwrap_or_default()
}

/// Exit code of a terminated process. Signal deaths map to `128 + signal`,
/// the shell convention, so that `None` stays reserved for timeouts.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    SPAWN_FAILED_EXIT_CODE
}
