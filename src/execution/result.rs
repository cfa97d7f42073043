//! Execution result types.

use std::time::Duration;

use serde::{Serialize, Serializer};

/// Exit code reported when the foreign shell could not be started.
pub const SPAWN_FAILED_EXIT_CODE: i32 = -1;

/// Result of one bridged execution.
///
/// Exactly one outcome holds: a normal exit (`exit_code` is the program's
/// code), a timeout (`exit_code` is `None`, `timed_out` is set), or a spawn
/// failure (`exit_code` is `-1`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Exit code, `None` exactly when timed out.
    pub exit_code: Option<i32>,
    /// Accumulated standard output.
    pub stdout: String,
    /// Accumulated standard error.
    pub stderr: String,
    /// Elapsed wall time.
    #[serde(rename = "durationMs", serialize_with = "serialize_millis")]
    pub duration: Duration,
    /// Whether execution was forcibly terminated by the timeout.
    pub timed_out: bool,
}

impl ExecutionResult {
    /// A process that terminated on its own.
    pub fn exited(code: i32, stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code: Some(code),
            stdout,
            stderr,
            duration,
            timed_out: false,
        }
    }

    /// A process killed after exceeding its timeout.
    pub fn timed_out(stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code: None,
            stdout,
            stderr,
            duration,
            timed_out: true,
        }
    }

    /// A process that could not be started. The diagnostic is appended to
    /// whatever stderr was collected.
    pub fn spawn_failed(
        stdout: String,
        stderr: String,
        diagnostic: &str,
        duration: Duration,
    ) -> Self {
        Self {
            exit_code: Some(SPAWN_FAILED_EXIT_CODE),
            stdout,
            stderr: format!("{stderr}\n{diagnostic}"),
            duration,
            timed_out: false,
        }
    }

    /// Canned result for a device-shell call with no connect key. No
    /// process was involved.
    pub fn missing_connect_key(hint: impl Into<String>) -> Self {
        Self {
            exit_code: Some(SPAWN_FAILED_EXIT_CODE),
            stdout: String::new(),
            stderr: hint.into(),
            duration: Duration::ZERO,
            timed_out: false,
        }
    }

    /// Exit code 0 and not timed out.
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Tool-level error flag: timed out, or any exit code other than 0.
    pub fn is_error(&self) -> bool {
        self.timed_out || self.exit_code.unwrap_or(1) != 0
    }

    /// Elapsed wall time in whole milliseconds.
    pub fn duration_ms(&self) -> u64 {
        u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX)
    }

    /// Human-readable rendering used as tool text content.
    pub fn to_content_text(&self) -> String {
        if self.timed_out {
            return format!("Timed out after {} ms", self.duration_ms());
        }
        let code = self
            .exit_code
            .map_or_else(|| "null".to_string(), |c| c.to_string());
        format!(
            "exitCode={code}\nstdout:\n{}\nstderr:\n{}",
            self.stdout, self.stderr
        )
    }
}

impl Default for ExecutionResult {
    fn default() -> Self {
        Self::exited(0, String::new(), String::new(), Duration::ZERO)
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}
