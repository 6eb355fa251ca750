//! Error handling utilities for log-and-continue paths
//!
//! Registry and dispatch operations never surface errors to their callers;
//! these helpers turn a fallible step into a logged fallback.

use tracing::{debug, warn};

/// Execute an operation and log errors without failing
///
/// Returns `Some(T)` on success, `None` on error (after logging).
///
/// # Example
/// ```rust
/// use modhost::utils::log_error;
///
/// let parsed = log_error(|| "42".parse::<u32>(), "Failed to parse");
/// assert_eq!(parsed, Some(42));
/// ```
pub fn log_error<F, T, E>(operation: F, context: &str) -> Option<T>
where
    F: FnOnce() -> Result<T, E>,
    E: std::fmt::Display,
{
    match operation() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{}: {}", context, e);
            None
        }
    }
}

/// Execute an operation and return a default value on error
///
/// Logs at debug level; for failures that are expected and harmless.
pub fn with_default<F, T, E>(operation: F, default: T, context: &str) -> T
where
    F: FnOnce() -> Result<T, E>,
    E: std::fmt::Display,
{
    match operation() {
        Ok(value) => value,
        Err(e) => {
            debug!("{}: {}, using default", context, e);
            default
        }
    }
}
