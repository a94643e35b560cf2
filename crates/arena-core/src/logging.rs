//! `tracing` subscriber setup.
//!
//! Library crates only emit events through `tracing`; applications embedding
//! the client call [`init_subscriber`] once at startup.

use tracing_subscriber::EnvFilter;

/// Default filter when neither `RUST_LOG` nor settings provide one.
pub const DEFAULT_LEVEL: &str = "warn";

/// Initialize the global tracing subscriber with compact stderr output.
///
/// `RUST_LOG` takes precedence over `level`. Subsequent calls are no-ops.
pub fn init_subscriber(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // set_global_default is a no-op if already set
    let _ = subscriber.try_init();
}

/// Initialize the global subscriber with JSON lines on stderr.
///
/// Intended for headless game servers and bots whose logs are shipped to an
/// aggregator. Same precedence rules as [`init_subscriber`].
pub fn init_json_subscriber(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json();

    let _ = subscriber.try_init();
}
