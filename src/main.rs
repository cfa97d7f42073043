//! wsl-win-bridge binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use tracing::info;
use wsl_win_bridge::{cli, logging, server, Config, ToolBox};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("Run with --help for usage.");
            return ExitCode::FAILURE;
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(config.log_filter());

    let server_config = match config.server_config() {
        Ok(server_config) => server_config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let bridge = Arc::new(config.bridge_config());
    info!(
        "wsl-win-bridge v{} (transport: {}, allowlist: {})",
        env!("CARGO_PKG_VERSION"),
        server_config.transport,
        if bridge.allowlist.is_unrestricted() {
            "*".to_string()
        } else {
            bridge.allowlist.entries().join(",")
        }
    );

    let tools = Arc::new(ToolBox::new(bridge));
    match server::serve(server_config, tools).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
