//! Transport script and its `-EncodedCommand` encoding.
//!
//! The script is constant. Everything caller-controlled (executable,
//! arguments, working directory, environment) reaches PowerShell as JSON on
//! stdin, never as script text.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Exit code the transport script uses for empty input or a missing `exe`.
pub const RESERVED_EXIT_CODE: i32 = 87;

/// Reads `{exe, args, cwd?, env?}` from stdin, applies `cwd`/`env`, runs
/// `exe` with `args` and exits with its exit code.
pub const TRANSPORT_SCRIPT: &str = r#"
$ErrorActionPreference = "Stop"
$raw = [Console]::In.ReadToEnd()
if (-not $raw) { exit 87 }
$req = $raw | ConvertFrom-Json

if (-not $req.exe) {
  Write-Error "Missing exe"
  exit 87
}

if ($req.cwd) {
  Set-Location -LiteralPath $req.cwd
}

if ($req.env) {
  foreach ($p in $req.env.PSObject.Properties) {
    $name = $p.Name
    if ($name) { Set-Item -LiteralPath ("Env:" + $name) -Value ([string]$p.Value) }
  }
}

$argv = @()
if ($req.args) {
  foreach ($a in $req.args) {
    $argv += [string]$a
  }
}

& $req.exe @argv
exit $LASTEXITCODE
"#;

/// Encode a script for `-EncodedCommand`: UTF-16LE, then standard base64.
pub fn encode_script(script: &str) -> String {
    let bytes: Vec<u8> = script.encode_utf16().flat_map(u16::to_le_bytes).collect();
    BASE64.encode(bytes)
}

/// Full argument vector for the foreign shell.
pub fn shell_args(encoded: &str) -> Vec<String> {
    [
        "-NoProfile",
        "-NonInteractive",
        "-ExecutionPolicy",
        "Bypass",
        "-EncodedCommand",
        encoded,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Argument vector carrying the encoded [`TRANSPORT_SCRIPT`].
pub fn transport_shell_args() -> Vec<String> {
    shell_args(&encode_script(TRANSPORT_SCRIPT))
}
