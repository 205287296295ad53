//! Logging setup.
//!
//! All crates in the workspace log through `tracing`; this module installs
//! the subscriber from the logging configuration. The base level comes from
//! the config, a set `RUST_LOG` environment variable wins.

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingSection};

/// Initializes the global subscriber from configuration.
///
/// Safe to call more than once — subsequent calls (for example from tests)
/// are no-ops.
pub fn init_from_config(config: &LoggingSection) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    // Already-initialized is the only expected failure; nothing to do then.
    let result = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Full => builder.try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    let _ = result;
}
