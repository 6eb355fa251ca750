//! Event timing
//!
//! The dispatcher records one labelled sample per handler invocation. The
//! default recorder keeps the most recent samples with the time elapsed since
//! the profiler was created and since the previous sample.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Timing collaborator used by the dispatcher
pub trait TimeProfiler: Send + Sync {
    fn record_event_time(&self, label: &str);
}

/// One recorded sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSample {
    pub label: String,
    /// Time since the profiler was created
    pub elapsed: Duration,
    /// Time since the previous sample (or since creation for the first one)
    pub delta: Duration,
}

/// Summary over the retained samples
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimingStats {
    /// Number of samples
    pub count: usize,
    /// Elapsed time of the latest sample (milliseconds)
    pub span_ms: f64,
    /// Largest gap between consecutive samples (milliseconds)
    pub max_delta_ms: f64,
    /// Label of the sample that closed the largest gap
    pub slowest: Option<String>,
}

/// Bounded in-memory recorder
pub struct EventTimeProfiler {
    started: Instant,
    samples: Mutex<VecDeque<TimingSample>>,
    max_samples: usize,
}

impl EventTimeProfiler {
    /// Create a profiler keeping at most `max_samples` samples
    pub fn new(max_samples: usize) -> Self {
        Self {
            started: Instant::now(),
            samples: Mutex::new(VecDeque::new()),
            max_samples: max_samples.max(1),
        }
    }

    pub fn samples(&self) -> Vec<TimingSample> {
        self.samples.lock().iter().cloned().collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.samples.lock().iter().map(|s| s.label.clone()).collect()
    }

    pub fn clear(&self) {
        self.samples.lock().clear();
    }

    pub fn stats(&self) -> TimingStats {
        let samples = self.samples.lock();
        let Some(last) = samples.back() else {
            return TimingStats::default();
        };
        let slowest = samples.iter().max_by_key(|s| s.delta);

        TimingStats {
            count: samples.len(),
            span_ms: last.elapsed.as_secs_f64() * 1000.0,
            max_delta_ms: slowest.map(|s| s.delta.as_secs_f64() * 1000.0).unwrap_or_default(),
            slowest: slowest.map(|s| s.label.clone()),
        }
    }
}

impl TimeProfiler for EventTimeProfiler {
    fn record_event_time(&self, label: &str) {
        let elapsed = self.started.elapsed();
        let mut samples = self.samples.lock();
        let previous = samples.back().map(|s| s.elapsed).unwrap_or_default();
        let delta = elapsed.saturating_sub(previous);
        trace!("{} at {:?} (+{:?})", label, elapsed, delta);

        samples.push_back(TimingSample {
            label: label.to_string(),
            elapsed,
            delta,
        });
        if samples.len() > self.max_samples {
            samples.pop_front();
        }
    }
}

impl Default for EventTimeProfiler {
    fn default() -> Self {
        Self::new(1000) // Keep last 1000 samples
    }
}
