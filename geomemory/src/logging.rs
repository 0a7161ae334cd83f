//! Logging infrastructure for GeoMemory binaries.
//!
//! The library itself only emits `tracing` events; binaries call
//! [`init_logging`] to install a console subscriber. Verbosity is controlled
//! through the `RUST_LOG` environment variable and defaults to `info`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging() -> Result<(), TryInitError> {
    // Default to INFO if RUST_LOG is not set
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_reports_conflict() {
        // First call wins (or a subscriber already exists); either way a
        // repeat must report the conflict rather than panic.
        let _ = init_logging();
        assert!(init_logging().is_err());
    }
}
