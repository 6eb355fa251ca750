//! Logging initialization for the host
//!
//! - Respects the RUST_LOG environment variable
//! - Falls back to the configured filter, then to "info"
//! - Optional JSON output behind the `json-logging` feature
//!
//! # Usage
//! ```rust
//! use modhost::utils::init_logging;
//!
//! init_logging(None); // Uses RUST_LOG or defaults to "info"
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// RUST_LOG if set, else `filter`, else "info"
fn build_filter(filter: Option<&str>) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }
    EnvFilter::new(filter.unwrap_or("info"))
}

/// Initialize human-readable logging
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_logging(filter: Option<&str>) -> bool {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(std::env::var("NO_COLOR").is_err()),
        )
        .with(build_filter(filter))
        .try_init()
        .is_ok()
}

/// Initialize logging with JSON output (for log aggregation systems)
#[cfg(feature = "json-logging")]
pub fn init_json_logging(filter: Option<&str>) -> bool {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_span_list(true),
        )
        .with(build_filter(filter))
        .try_init()
        .is_ok()
}

/// Initialize logging from host configuration
pub fn init_logging_from_config(config: &LoggingConfig) -> bool {
    let filter = config.filter.as_deref();

    if config.json_format {
        #[cfg(feature = "json-logging")]
        {
            return init_json_logging(filter);
        }
        #[cfg(not(feature = "json-logging"))]
        {
            // Fall back to regular logging if json-logging feature not enabled
            return init_logging(filter);
        }
    }
    init_logging(filter)
}
