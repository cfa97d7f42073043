//! Device access through the Windows-resident `hdc.exe`.
//!
//! - Connect key resolution (explicit, `HDC_CONNECT_KEY`, `DEFAULT_CONNECT_KEY`)
//! - `hdc [-t key] ...` and `hdc -t key shell <cmd>` invocations
//! - A fixed RK3588S target keyed only by its own setting
//! - A directory listing probe with find/ls fallbacks

mod connect_key;
pub mod probe;
mod shell;

pub use connect_key::{ConnectKeyResolution, KeySource};
pub use probe::{quote_sh_single, DirTreeRequest, ProbeResult};
pub use shell::{
    wrap_busybox, DeviceRunResult, DeviceShell, DeviceShellRequest, FixedTarget,
    MISSING_CONNECT_KEY_HINT, MISSING_RK3588S_KEY_HINT,
};
