//! Tool descriptors advertised through `tools/list` and `GET /api/v1/tools`.

use serde::Serialize;
use serde_json::{json, Value};

pub const WIN_EXEC: &str = "win.exec";
pub const PATH_WSL_TO_WIN: &str = "path.wsl_to_win";
pub const PATH_WIN_TO_WSL: &str = "path.win_to_wsl";
pub const HDC_RUN: &str = "hdc.run";
pub const HDC_LIST_TARGETS: &str = "hdc.list_targets";
pub const HDC_SHELL: &str = "hdc.shell";
pub const RK3588S_SHELL: &str = "rk3588s.shell";
pub const RK3588S_DIR_TREE: &str = "rk3588s.dir_tree";

/// Every tool name, in advertised order.
pub const TOOL_NAMES: [&str; 8] = [
    WIN_EXEC,
    PATH_WSL_TO_WIN,
    PATH_WIN_TO_WSL,
    HDC_RUN,
    HDC_LIST_TARGETS,
    HDC_SHELL,
    RK3588S_SHELL,
    RK3588S_DIR_TREE,
];

/// One advertised tool.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

fn timeout_schema() -> Value {
    json!({ "type": "integer", "minimum": 1, "description": "Timeout in milliseconds" })
}

fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

/// Build the descriptor list.
pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: WIN_EXEC,
            title: "Run Windows executable",
            description: "Run an allowlisted Windows executable from WSL via powershell.exe \
                          and return exitCode/stdout/stderr.",
            input_schema: object(
                json!({
                    "exe": { "type": "string", "description": "Executable name or path" },
                    "args": { "type": "array", "items": { "type": "string" } },
                    "cwd": { "type": "string", "description": "WSL or Windows working directory" },
                    "timeoutMs": timeout_schema(),
                    "env": { "type": "object", "additionalProperties": { "type": "string" } }
                }),
                &["exe"],
            ),
        },
        ToolDescriptor {
            name: PATH_WSL_TO_WIN,
            title: "WSL path to Windows",
            description: "Convert a WSL path to a Windows path with wslpath -w.",
            input_schema: object(json!({ "path": { "type": "string" } }), &["path"]),
        },
        ToolDescriptor {
            name: PATH_WIN_TO_WSL,
            title: "Windows path to WSL",
            description: "Convert a Windows path to a WSL path with wslpath -u.",
            input_schema: object(json!({ "path": { "type": "string" } }), &["path"]),
        },
        ToolDescriptor {
            name: HDC_RUN,
            title: "Run hdc",
            description: "Run hdc.exe with arbitrary arguments, optionally against a target \
                          connect key.",
            input_schema: object(
                json!({
                    "args": { "type": "array", "items": { "type": "string" } },
                    "connectKey": { "type": "string" },
                    "timeoutMs": timeout_schema()
                }),
                &[],
            ),
        },
        ToolDescriptor {
            name: HDC_LIST_TARGETS,
            title: "List hdc targets",
            description: "Run hdc.exe list targets [-v].",
            input_schema: object(
                json!({
                    "verbose": { "type": "boolean" },
                    "timeoutMs": timeout_schema()
                }),
                &[],
            ),
        },
        ToolDescriptor {
            name: HDC_SHELL,
            title: "hdc shell",
            description: "Run a shell command on a device: hdc.exe -t <connectKey> shell <command>.",
            input_schema: object(
                json!({
                    "connectKey": { "type": "string" },
                    "command": { "type": "string" },
                    "timeoutMs": timeout_schema(),
                    "useBusybox": { "type": "boolean" }
                }),
                &["command"],
            ),
        },
        ToolDescriptor {
            name: RK3588S_SHELL,
            title: "RK3588S shell",
            description: "Run a shell command on the RK3588S board configured by RK3588S_CONNECTKEY.",
            input_schema: object(
                json!({
                    "command": { "type": "string" },
                    "timeoutMs": timeout_schema(),
                    "useBusybox": { "type": "boolean" }
                }),
                &["command"],
            ),
        },
        ToolDescriptor {
            name: RK3588S_DIR_TREE,
            title: "RK3588S directory tree",
            description: "List a directory tree on the RK3588S board, falling back from \
                          busybox find to find to ls -la.",
            input_schema: object(
                json!({
                    "path": { "type": "string", "default": "/" },
                    "maxDepth": { "type": "integer", "minimum": 1, "maximum": 20, "default": 3 },
                    "dirsOnly": { "type": "boolean", "default": true },
                    "timeoutMs": timeout_schema()
                }),
                &[],
            ),
        },
    ]
}

/// Whether `name` is a known tool.
pub fn is_known(name: &str) -> bool {
    TOOL_NAMES.contains(&name)
}
