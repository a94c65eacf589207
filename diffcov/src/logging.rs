//! Tracing subscriber setup.
//!
//! Libraries only emit `tracing` events; the binary and tests install the
//! subscriber. Filtering follows `RUST_LOG`.

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a stderr `fmt` subscriber filtered by `RUST_LOG` (default
/// `warn`). Returns `false` if a global subscriber was already set.
pub fn init_tracing_once() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
