//! Utility modules: logging setup, log-and-continue helpers, event timing

pub mod error;
pub mod logging;
pub mod profiler;

// Re-export commonly used items
pub use error::{log_error, with_default};
#[cfg(feature = "json-logging")]
pub use logging::init_json_logging;
pub use logging::{init_logging, init_logging_from_config};
pub use profiler::{EventTimeProfiler, TimeProfiler, TimingSample, TimingStats};
