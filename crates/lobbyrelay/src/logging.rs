//! Logging setup for the relay binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events are shown at `default_level` unless `RUST_LOG` says
/// otherwise.
const LOG_TARGETS: &[&str] = &[
    "lobbyrelay",
    "lobbyrelay_transport",
    "lobbyrelay_protocol",
    "lobbyrelay_room",
    "tower_http",
];

/// Builds the filter used when `RUST_LOG` is unset.
pub fn default_filter(binary_name: &str, default_level: &str) -> String {
    LOG_TARGETS
        .iter()
        .copied()
        .chain(std::iter::once(binary_name))
        .map(|target| format!("{}={}", target.replace('-', "_"), default_level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The level can be overridden using the `RUST_LOG` environment variable.
/// Call once, at the top of `main`.
///
/// # Examples
///
/// ```no_run
/// lobbyrelay::init_tracing("lobbyrelay", "info");
/// ```
pub fn init_tracing(binary_name: &str, default_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(binary_name, default_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
