//! Latency samples and summary statistics

use std::time::Duration;

use serde::Serialize;

use crate::utils::{BenchmarkError, Result};

/// One measured query latency
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Sample {
    latency_secs: f64,
}

impl Sample {
    /// Negative or non-finite inputs are clamped to zero.
    pub fn from_secs(latency_secs: f64) -> Self {
        let latency_secs = if latency_secs.is_finite() && latency_secs > 0.0 {
            latency_secs
        } else {
            0.0
        };
        Self { latency_secs }
    }

    pub fn from_duration(elapsed: Duration) -> Self {
        Self::from_secs(elapsed.as_secs_f64())
    }

    #[inline]
    pub fn latency_secs(&self) -> f64 {
        self.latency_secs
    }
}

/// Descriptive statistics over every recorded sample, in seconds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    pub count: usize,
    pub total: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub p95: f64,
    pub p99: f64,
}

impl StatsSummary {
    /// Compute the summary from unordered latencies
    ///
    /// Fails with [`BenchmarkError::EmptyResult`] when there are no samples.
    pub fn from_samples(mut latencies: Vec<f64>) -> Result<Self> {
        if latencies.is_empty() {
            return Err(BenchmarkError::EmptyResult);
        }

        latencies.sort_by(f64::total_cmp);

        let count = latencies.len();
        let total: f64 = latencies.iter().sum();
        let mid = count / 2;
        let median = if count % 2 == 0 {
            (latencies[mid - 1] + latencies[mid]) / 2.0
        } else {
            latencies[mid]
        };

        Ok(Self {
            count,
            total,
            min: latencies[0],
            max: latencies[count - 1],
            // Float summation can drift a hair outside [min, max] for equal samples.
            mean: (total / count as f64).clamp(latencies[0], latencies[count - 1]),
            median,
            p95: nearest_rank(&latencies, 95.0),
            p99: nearest_rank(&latencies, 99.0),
        })
    }

    /// Format as one-line summary
    pub fn summary(&self) -> String {
        format!(
            "Queries: {} | Total: {:.6}s | min={:.6}s max={:.6}s mean={:.6}s median={:.6}s",
            self.count, self.total, self.min, self.max, self.mean, self.median
        )
    }
}

/// Nearest-rank percentile of an ascending, non-empty slice
fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    let rank = (p * sorted.len() as f64 / 100.0).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}
