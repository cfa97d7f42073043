//! WSL <-> Windows path translation through `wslpath`.

use tokio::process::Command;

use crate::error::BridgeError;
use crate::Result;

/// Which way to translate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `/mnt/c/x` -> `C:\x` (`wslpath -w`).
    ToWindows,
    /// `C:\x` -> `/mnt/c/x` (`wslpath -u`).
    ToWsl,
}

impl Direction {
    fn flag(self) -> &'static str {
        match self {
            Self::ToWindows => "-w",
            Self::ToWsl => "-u",
        }
    }
}

/// Thin wrapper around the external path translator.
#[derive(Debug, Clone)]
pub struct PathTranslator {
    program: String,
}

impl PathTranslator {
    /// Create a translator invoking the given program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Return `path` in Windows form, translating only if it does not
    /// already look like one.
    pub async fn to_windows_maybe(&self, path: &str) -> Result<String> {
        if looks_like_windows(path) {
            return Ok(path.to_string());
        }
        self.translate(path, Direction::ToWindows).await
    }

    /// Convert a WSL path to a Windows path.
    pub async fn wsl_to_win(&self, path: &str) -> Result<String> {
        if path.is_empty() {
            return Err(BridgeError::PathConversion("Empty path".into()));
        }
        self.to_windows_maybe(path).await
    }

    /// Convert a Windows path to a WSL path.
    pub async fn win_to_wsl(&self, path: &str) -> Result<String> {
        if path.is_empty() {
            return Err(BridgeError::PathConversion("Empty path".into()));
        }
        self.translate(path, Direction::ToWsl).await
    }

    /// Run the translator and return its trimmed stdout.
    pub async fn translate(&self, path: &str, direction: Direction) -> Result<String> {
        let output = Command::new(&self.program)
            .arg(direction.flag())
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| BridgeError::PathConversion(format!("{}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            return Err(BridgeError::PathConversion(if stderr.is_empty() {
                format!("{} failed for {path}", self.program)
            } else {
                stderr
            }));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for PathTranslator {
    fn default() -> Self {
        Self::new("wslpath")
    }
}

/// Whether a path is already in Windows form: a drive root such as `C:\`
/// or anything containing a backslash.
pub fn looks_like_windows(path: &str) -> bool {
    let bytes = path.as_bytes();
    let drive_root =
        bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'\\';
    drive_root || path.contains('\\')
}
