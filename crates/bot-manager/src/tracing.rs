//! # Observability & Tracing
//!
//! [`setup_tracing`] installs the global `tracing` subscriber for an application built on the
//! manager.
//!
//! The manager logs with structured fields rather than formatted messages:
//!
//! - **Registry changes**: `Registered`, `Removed`, `Stopping all bots` with `token`, `name`,
//!   `size` and `count`
//! - **Bot tasks**: `Running`, `Run finished`, `Run failed` with `token` and `reason`
//! - **Caller errors**: `Duplicate token`, `Not found`
//!
//! ```bash
//! RUST_LOG=info cargo run          # registry changes only
//! RUST_LOG=debug cargo run         # plus per-task transitions
//! RUST_LOG=bot_manager=debug cargo run
//! ```

use tracing_subscriber::EnvFilter;

/// Output format for [`setup_tracing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Single-line human readable output.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

/// Initializes the global tracing subscriber.
///
/// `RUST_LOG` wins when it is set; otherwise `default_directive` (e.g. `"info"`) is used.
///
/// # Panics
/// Panics if a global subscriber has already been installed.
pub fn setup_tracing(format: LogFormat, default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    match format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
    }
}
