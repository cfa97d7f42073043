//! Logging initialization and configuration.
//!
//! All log output goes to stderr: in stdio mode stdout carries protocol
//! traffic only.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor a configured level is present.
pub const DEFAULT_FILTER: &str = "wsl_win_bridge=info";

fn build_filter(level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .ok()
        .or_else(|| level.and_then(|l| EnvFilter::try_new(l).ok()))
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize the logging system.
///
/// `RUST_LOG` wins over `level`; if neither parses, defaults to
/// `wsl_win_bridge=info`.
///
/// # Panics
///
/// Panics if called more than once, or if another tracing subscriber
/// has already been set.
pub fn init(level: Option<&str>) {
    tracing_subscriber::registry()
        .with(build_filter(level))
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Try to initialize the logging system.
///
/// Returns `Ok(())` if successful, or `Err` if logging has already been
/// initialized.
pub fn try_init(level: Option<&str>) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(build_filter(level))
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_init_idempotent() {
        let _ = try_init(None);
        let _ = try_init(Some("debug"));
    }

    #[test]
    fn test_logging_works() {
        let _ = try_init(Some("wsl_win_bridge=debug"));

        tracing::info!("test info message");
        tracing::debug!("test debug message");
        tracing::warn!("test warn message");
    }
}
