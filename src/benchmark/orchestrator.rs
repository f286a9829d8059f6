//! Benchmark orchestrator
//!
//! Loads the workload, drives the scheduler, and times the whole run.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::scheduler::Scheduler;
use crate::client::QueryExecutor;
use crate::config::BenchConfig;
use crate::metrics::{Aggregator, StatsSummary};
use crate::utils::Result;
use crate::workload::{WorkItem, WorkloadSource};

/// Benchmark result summary
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    /// Workload file replayed
    pub workload: PathBuf,
    /// Concurrency ceiling used
    pub concurrency: usize,
    /// Wall-clock time from first dispatch to barrier
    pub duration: Duration,
    /// Latency statistics
    pub summary: StatsSummary,
}

impl BenchmarkResult {
    /// Completed queries per wall-clock second
    pub fn throughput(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.summary.count as f64 / secs
        } else {
            0.0
        }
    }

    /// Convert to JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "workload": self.workload,
            "concurrency": self.concurrency,
            "duration_secs": self.duration.as_secs_f64(),
            "throughput": self.throughput(),
            "summary": self.summary,
        })
    }
}

/// Benchmark orchestrator
pub struct Orchestrator {
    config: BenchConfig,
}

impl Orchestrator {
    pub fn new(config: BenchConfig) -> Self {
        Self { config }
    }

    /// Read and validate the entire workload
    ///
    /// Any malformed row fails the run here, before a query is sent.
    pub fn load_workload(&self) -> Result<Vec<WorkItem>> {
        let path = &self.config.workload_path;
        info!("Loading workload from: {:?}", path);

        let items = WorkloadSource::open(path)?.load()?;
        info!("Loaded {} queries", items.len());
        Ok(items)
    }

    /// Replay already-loaded items through `executor`
    pub fn execute(
        &self,
        items: Vec<WorkItem>,
        executor: &dyn QueryExecutor,
    ) -> Result<BenchmarkResult> {
        let total = items.len();
        let scheduler =
            Scheduler::new(self.config.concurrency)?.with_progress(self.progress_bar(total as u64));
        let aggregator = Aggregator::with_capacity(total);

        let start = Instant::now();
        let summary = scheduler.run(items, executor, &aggregator)?;
        let duration = start.elapsed();

        info!("{}", summary.summary());

        Ok(BenchmarkResult {
            workload: self.config.workload_path.clone(),
            concurrency: self.config.concurrency,
            duration,
            summary,
        })
    }

    /// Load the workload, then replay it
    pub fn run(&self, executor: &dyn QueryExecutor) -> Result<BenchmarkResult> {
        let items = self.load_workload()?;
        self.execute(items, executor)
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if self.config.quiet {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{BenchmarkError, WorkloadError};
    use crate::workload::QueryTemplate;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config(path: PathBuf) -> BenchConfig {
        BenchConfig {
            workload_path: path,
            db_uri: "postgres://localhost/test".to_string(),
            acquire_timeout: Duration::from_secs(1),
            concurrency: 4,
            template: QueryTemplate::default(),
            output_path: None,
            quiet: true,
            verbose: false,
        }
    }

    fn workload(rows: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "hostname,start_time,end_time").unwrap();
        for row in rows {
            writeln!(file, "{}", row).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_run_end_to_end() {
        let file = workload(&[
            "host_000008,2017-01-01 08:59:22,2017-01-01 09:59:22",
            "host_000001,2017-01-02 13:02:02,2017-01-02 14:02:02",
            "host_000008,2017-01-02 18:50:28,2017-01-02 19:50:28",
        ]);
        let executor = |item: &WorkItem| -> Result<Duration> {
            Ok(if item.host == "host_000001" {
                Duration::from_millis(30)
            } else {
                Duration::from_millis(10)
            })
        };

        let orchestrator = Orchestrator::new(config(file.path().to_path_buf()));
        let result = orchestrator.run(&executor).unwrap();

        assert_eq!(result.summary.count, 3);
        assert_eq!(result.summary.median, 0.01);
        assert_eq!(result.summary.max, 0.03);
        assert_eq!(result.concurrency, 4);
        assert_eq!(result.to_json()["summary"]["count"], 3);
    }

    #[test]
    fn test_malformed_input_never_dispatches() {
        let file = workload(&[
            "host_000008,2017-01-01 08:59:22,2017-01-01 09:59:22",
            "host_000001,2017-01-02 13:02:02",
        ]);
        let calls = AtomicUsize::new(0);
        let executor = |_item: &WorkItem| -> Result<Duration> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Duration::from_millis(1))
        };

        let orchestrator = Orchestrator::new(config(file.path().to_path_buf()));
        let err = orchestrator.run(&executor).unwrap_err();

        assert!(matches!(
            err,
            BenchmarkError::Workload(WorkloadError::MalformedRecord { found: 2, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_header_only_is_empty_result() {
        let file = workload(&[]);
        let executor = |_item: &WorkItem| -> Result<Duration> { Ok(Duration::from_millis(1)) };

        let orchestrator = Orchestrator::new(config(file.path().to_path_buf()));
        let err = orchestrator.run(&executor).unwrap_err();
        assert!(matches!(err, BenchmarkError::EmptyResult));
    }

    #[test]
    fn test_throughput() {
        let result = BenchmarkResult {
            workload: PathBuf::from("q.csv"),
            concurrency: 10,
            duration: Duration::from_millis(500),
            summary: StatsSummary::from_samples(vec![0.1; 100]).unwrap(),
        };
        assert_eq!(result.throughput(), 200.0);

        let instant = BenchmarkResult {
            duration: Duration::ZERO,
            ..result
        };
        assert_eq!(instant.throughput(), 0.0);
    }
}
