//! Sample aggregator
//!
//! Thread-safe collector shared by every in-flight query task. All appends
//! go through one mutex; statistics are computed from a snapshot.

use parking_lot::Mutex;

use super::stats::{Sample, StatsSummary};
use crate::utils::Result;

/// Collects latency samples from concurrent tasks
#[derive(Default)]
pub struct Aggregator {
    samples: Mutex<Vec<Sample>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size the sample buffer
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    /// Record a sample; returns once the sample is stored
    #[inline]
    pub fn record(&self, sample: Sample) {
        self.samples.lock().push(sample);
    }

    /// Number of recorded samples
    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compute summary statistics over everything recorded so far
    ///
    /// Call only after the scheduler's barrier; samples recorded concurrently
    /// with this call may or may not be included.
    pub fn finalize(&self) -> Result<StatsSummary> {
        let latencies = self
            .samples
            .lock()
            .iter()
            .map(Sample::latency_secs)
            .collect();
        StatsSummary::from_samples(latencies)
    }
}
