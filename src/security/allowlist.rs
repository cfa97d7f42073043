//! Executable allowlist.
//!
//! Requests name Windows executables either bare (`hdc.exe`) or by path in
//! either convention (`C:\Tools\hdc.exe`, `/mnt/c/Tools/hdc.exe`). The guard
//! matches the lowercased literal or its canonical basename against the
//! configured set.

use std::collections::BTreeSet;

use crate::error::BridgeError;
use crate::Result;

/// Executables allowed when `ALLOW_EXE` is unset.
pub const DEFAULT_ALLOWLIST: &str = "hdc.exe,powershell.exe,cmd.exe";

/// Set of lowercase executable names or basenames.
///
/// An empty policy allows everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowlistPolicy {
    entries: BTreeSet<String>,
}

/// A candidate executable in both normalized forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedExe {
    /// The whole candidate, lowercased.
    pub lower: String,
    /// The shorter of the POSIX and Windows basenames.
    pub base: String,
}

impl AllowlistPolicy {
    /// Create a policy from explicit entries.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Parse a comma-separated list, trimming and dropping empty items.
    pub fn from_csv(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// A policy that allows every executable.
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Whether the policy allows everything.
    pub fn is_unrestricted(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured entries, sorted.
    pub fn entries(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    /// Check whether `exe` may be launched.
    pub fn is_allowed(&self, exe: &str) -> bool {
        if self.is_unrestricted() {
            return true;
        }
        let normalized = normalize(exe);
        self.entries.contains(&normalized.lower) || self.entries.contains(&normalized.base)
    }

    /// Reject `exe` with a [`BridgeError::PolicyViolation`] unless allowed.
    pub fn ensure_allowed(&self, exe: &str) -> Result<()> {
        if self.is_allowed(exe) {
            return Ok(());
        }
        tracing::warn!(exe, "executable rejected by allowlist");
        Err(BridgeError::PolicyViolation {
            exe: exe.to_string(),
            allowlist: self.entries(),
        })
    }
}

/// Normalize a candidate executable.
///
/// The POSIX basename does not split on `\`, so a Windows path would
/// survive it whole; the shorter of the two basenames wins.
pub fn normalize(exe: &str) -> NormalizedExe {
    let lower = exe.to_lowercase();
    let posix = posix_basename(&lower);
    let win = windows_basename(&lower);
    let base = if posix.len() <= win.len() { posix } else { win };
    NormalizedExe {
        base: base.to_string(),
        lower,
    }
}

/// Last component of a `/`-separated path, ignoring trailing separators.
pub fn posix_basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "";
    }
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Last component of a Windows path, where both `\` and `/` separate and a
/// leading drive designator such as `C:` is not part of the name.
pub fn windows_basename(path: &str) -> &str {
    let without_drive = strip_drive(path);
    let trimmed = without_drive.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() {
        return "";
    }
    trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed)
}

fn strip_drive(path: &str) -> &str {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        &path[2..]
    } else {
        path
    }
}
