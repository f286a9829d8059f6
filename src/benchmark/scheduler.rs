//! Bounded-concurrency scheduler
//!
//! Runs one scoped thread per work item, never more than `concurrency` at
//! a time. The dispatch loop blocks on the semaphore when every slot is
//! taken; that is the only backpressure point.
//!
//! ## Task protocol
//!
//! 1. The dispatch loop takes a permit and moves it into the new task
//! 2. The task calls the executor
//! 3. On success the sample is recorded in the aggregator
//! 4. The permit is dropped, freeing the slot for the next item
//!
//! The first failure stops admission. Tasks already running are left to
//! finish, then the error is returned in place of a summary.

use std::fmt;
use std::thread;

use indicatif::ProgressBar;
use parking_lot::Mutex;
use tracing::{debug, error, info};

use super::counters::{RunCounters, RunCounts};
use super::semaphore::Semaphore;
use crate::client::QueryExecutor;
use crate::metrics::{Aggregator, Sample, StatsSummary};
use crate::utils::{BenchmarkError, Result};
use crate::workload::WorkItem;

/// Default ceiling on queries in flight
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Lifecycle of a scheduler run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No run started yet
    Idle,
    /// Admitting work items while slots are free
    Dispatching,
    /// Source exhausted or a task failed; waiting for in-flight tasks
    Draining,
    /// Every task succeeded
    Completed,
    /// At least one task failed
    Aborted,
}

impl SchedulerState {
    pub fn is_running(self) -> bool {
        matches!(self, SchedulerState::Dispatching | SchedulerState::Draining)
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SchedulerState::Idle => "idle",
            SchedulerState::Dispatching => "dispatching",
            SchedulerState::Draining => "draining",
            SchedulerState::Completed => "completed",
            SchedulerState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Dispatches work items to an executor under a concurrency ceiling
pub struct Scheduler {
    concurrency: usize,
    state: Mutex<SchedulerState>,
    counters: RunCounters,
    progress: ProgressBar,
}

impl Scheduler {
    /// Create a scheduler admitting at most `concurrency` tasks at once
    pub fn new(concurrency: usize) -> Result<Self> {
        if concurrency == 0 {
            return Err(BenchmarkError::Config(
                "Concurrency must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            concurrency,
            state: Mutex::new(SchedulerState::Idle),
            counters: RunCounters::new(),
            progress: ProgressBar::hidden(),
        })
    }

    /// Attach a progress bar, advanced once per finished task
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.lock()
    }

    /// Counters from the current or most recent run
    pub fn counts(&self) -> RunCounts {
        self.counters.snapshot()
    }

    fn transition(&self, next: SchedulerState) {
        let mut state = self.state.lock();
        debug!("Scheduler: {} -> {}", *state, next);
        *state = next;
    }

    /// Run every item through `executor` and summarize the latencies
    ///
    /// Returns only after all spawned tasks have finished. On failure the
    /// first error is returned and no summary is computed.
    pub fn run<I, E>(
        &self,
        items: I,
        executor: &E,
        aggregator: &Aggregator,
    ) -> Result<StatsSummary>
    where
        I: IntoIterator<Item = WorkItem>,
        E: QueryExecutor + ?Sized,
    {
        {
            let mut state = self.state.lock();
            if state.is_running() {
                return Err(BenchmarkError::Config(
                    "Scheduler is already running".to_string(),
                ));
            }
            debug!("Scheduler: {} -> {}", *state, SchedulerState::Dispatching);
            *state = SchedulerState::Dispatching;
        }
        self.counters.reset();

        let semaphore = Semaphore::new(self.concurrency);
        let first_error: Mutex<Option<BenchmarkError>> = Mutex::new(None);
        let counters = &self.counters;
        let progress = &self.progress;

        info!("Dispatching queries (concurrency: {})", self.concurrency);

        thread::scope(|scope| {
            for (idx, item) in items.into_iter().enumerate() {
                if counters.is_aborted() {
                    break;
                }

                let permit = semaphore.acquire();

                // A task may have failed while we waited for the slot.
                if counters.is_aborted() {
                    break;
                }
                counters.record_dispatched();

                let first_error = &first_error;
                let spawned = thread::Builder::new()
                    .name(format!("query-{}", idx))
                    .spawn_scoped(scope, move || {
                        counters.enter();
                        let outcome = executor.execute(&item);
                        counters.exit();

                        match outcome {
                            Ok(elapsed) => {
                                aggregator.record(Sample::from_duration(elapsed));
                                counters.record_finished();
                            }
                            Err(e) => {
                                counters.record_failure();
                                let mut slot = first_error.lock();
                                if slot.is_none() {
                                    error!("Query {} ({}) failed: {}", idx, item, e);
                                    *slot = Some(e);
                                }
                                drop(slot);
                                counters.signal_abort();
                            }
                        }
                        progress.inc(1);

                        // Released only once the sample or error is stored.
                        drop(permit);
                    });

                if let Err(e) = spawned {
                    let mut slot = first_error.lock();
                    if slot.is_none() {
                        *slot = Some(BenchmarkError::Io(e));
                    }
                    drop(slot);
                    counters.signal_abort();
                    break;
                }
            }

            self.transition(SchedulerState::Draining);
        });

        let free = semaphore.available();
        debug!("Drained: {}/{} slots free", free, self.concurrency);
        debug_assert_eq!(free, self.concurrency);

        let counts = self.counters.snapshot();
        if let Some(e) = first_error.into_inner() {
            self.transition(SchedulerState::Aborted);
            progress.abandon();
            info!(
                "Run aborted: {} dispatched, {} succeeded, {} failed",
                counts.dispatched, counts.finished, counts.failed
            );
            return Err(e);
        }

        self.transition(SchedulerState::Completed);
        progress.finish();
        info!(
            "Run completed: {} queries (peak in flight: {})",
            counts.finished, counts.peak_in_flight
        );

        aggregator.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ExecutionError;
    use crate::workload::parse_timestamp;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn items(n: usize) -> Vec<WorkItem> {
        let start = parse_timestamp("2017-01-01 08:00:00").unwrap();
        let end = parse_timestamp("2017-01-01 09:00:00").unwrap();
        (0..n)
            .map(|i| WorkItem::new(format!("host_{:06}", i), start, end))
            .collect()
    }

    fn fixed_latency(_item: &WorkItem) -> Result<Duration> {
        Ok(Duration::from_millis(5))
    }

    fn query_error(host: &str) -> BenchmarkError {
        ExecutionError {
            host: host.to_string(),
            source: sqlx::Error::Protocol("relation \"cpu_usage\" does not exist".to_string()),
        }
        .into()
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        assert!(matches!(Scheduler::new(0), Err(BenchmarkError::Config(_))));
    }

    #[test]
    fn test_all_items_recorded() {
        for _ in 0..20 {
            let scheduler = Scheduler::new(DEFAULT_CONCURRENCY).unwrap();
            let aggregator = Aggregator::new();

            let stats = scheduler.run(items(500), &fixed_latency, &aggregator).unwrap();

            assert_eq!(stats.count, 500);
            assert_eq!(aggregator.len(), 500);
            assert_eq!(stats.min, 0.005);
            assert_eq!(stats.max, 0.005);
            assert_eq!(scheduler.state(), SchedulerState::Completed);

            let counts = scheduler.counts();
            assert_eq!(counts.dispatched, 500);
            assert_eq!(counts.finished, 500);
            assert_eq!(counts.failed, 0);
        }
    }

    #[test]
    fn test_every_item_executed_once() {
        let seen = Mutex::new(Vec::new());
        let executor = |item: &WorkItem| -> Result<Duration> {
            seen.lock().push(item.host.clone());
            Ok(Duration::from_micros(100))
        };

        let scheduler = Scheduler::new(DEFAULT_CONCURRENCY).unwrap();
        scheduler.run(items(500), &executor, &Aggregator::new()).unwrap();

        let mut seen = seen.into_inner();
        seen.sort();
        let mut expected: Vec<String> = items(500).into_iter().map(|i| i.host).collect();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_concurrency_never_exceeds_ceiling() {
        let current = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let executor = |_item: &WorkItem| -> Result<Duration> {
            let now = current.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(2));
            current.fetch_sub(1, Ordering::SeqCst);
            Ok(Duration::from_millis(2))
        };

        let scheduler = Scheduler::new(DEFAULT_CONCURRENCY).unwrap();
        let stats = scheduler.run(items(200), &executor, &Aggregator::new()).unwrap();

        assert_eq!(stats.count, 200);
        let peak = peak.load(Ordering::SeqCst);
        assert!(peak <= DEFAULT_CONCURRENCY, "peak {} exceeded ceiling", peak);
        assert!(peak > 1, "tasks never overlapped");
        assert!(scheduler.counts().peak_in_flight <= DEFAULT_CONCURRENCY);
    }

    #[test]
    fn test_single_slot_is_sequential() {
        let current = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let executor = |_item: &WorkItem| -> Result<Duration> {
            let now = current.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            current.fetch_sub(1, Ordering::SeqCst);
            Ok(Duration::from_millis(1))
        };

        let scheduler = Scheduler::new(1).unwrap();
        scheduler.run(items(50), &executor, &Aggregator::new()).unwrap();
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_slot_released_after_record() {
        let aggregator = Aggregator::new();
        let calls = AtomicUsize::new(0);
        let executor = |_item: &WorkItem| -> Result<Duration> {
            let before = calls.fetch_add(1, Ordering::SeqCst);
            // With one slot, the previous task's sample must already be stored.
            assert_eq!(aggregator.len(), before);
            Ok(Duration::from_micros(50))
        };

        let scheduler = Scheduler::new(1).unwrap();
        let stats = scheduler.run(items(300), &executor, &aggregator).unwrap();

        assert_eq!(stats.count, 300);
        assert_eq!(calls.load(Ordering::SeqCst), 300);
    }

    #[test]
    fn test_fail_fast() {
        let failing_host = items(500)[249].host.clone();
        let executor = |item: &WorkItem| -> Result<Duration> {
            if item.host == failing_host {
                return Err(query_error(&item.host));
            }
            std::thread::sleep(Duration::from_millis(1));
            Ok(Duration::from_millis(1))
        };

        let scheduler = Scheduler::new(DEFAULT_CONCURRENCY).unwrap();
        let aggregator = Aggregator::new();
        let err = scheduler.run(items(500), &executor, &aggregator).unwrap_err();

        match err {
            BenchmarkError::Execution(e) => assert_eq!(e.host, failing_host),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(scheduler.state(), SchedulerState::Aborted);

        let counts = scheduler.counts();
        assert_eq!(counts.failed, 1);
        assert!(counts.dispatched < 500, "admission continued after failure");
        assert_eq!(counts.finished + counts.failed, counts.dispatched);
    }

    #[test]
    fn test_first_error_wins() {
        let executor = |item: &WorkItem| -> Result<Duration> { Err(query_error(&item.host)) };

        let scheduler = Scheduler::new(1).unwrap();
        let err = scheduler.run(items(10), &executor, &Aggregator::new()).unwrap_err();

        match err {
            BenchmarkError::Execution(e) => assert_eq!(e.host, "host_000000"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(scheduler.counts().dispatched, 1);
    }

    #[test]
    fn test_connection_error_surfaces() {
        let executor = |_item: &WorkItem| -> Result<Duration> {
            Err(crate::utils::ConnectionError::Acquire(sqlx::Error::PoolTimedOut).into())
        };

        let scheduler = Scheduler::new(DEFAULT_CONCURRENCY).unwrap();
        let err = scheduler.run(items(20), &executor, &Aggregator::new()).unwrap_err();
        assert!(matches!(err, BenchmarkError::Connection(_)));
    }

    #[test]
    fn test_empty_workload() {
        let scheduler = Scheduler::new(DEFAULT_CONCURRENCY).unwrap();
        let err = scheduler
            .run(Vec::new(), &fixed_latency, &Aggregator::new())
            .unwrap_err();

        assert!(matches!(err, BenchmarkError::EmptyResult));
        assert_eq!(scheduler.state(), SchedulerState::Completed);
    }

    #[test]
    fn test_state_starts_idle_and_reruns() {
        let scheduler = Scheduler::new(2).unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        scheduler.run(items(5), &fixed_latency, &Aggregator::new()).unwrap();
        let stats = scheduler.run(items(3), &fixed_latency, &Aggregator::new()).unwrap();

        assert_eq!(stats.count, 3);
        assert_eq!(scheduler.counts().dispatched, 3);
    }

    #[test]
    fn test_lazy_source_is_consumed_once() {
        let pulled = AtomicUsize::new(0);
        let source = items(100).into_iter().inspect(|_| {
            pulled.fetch_add(1, Ordering::SeqCst);
        });

        let scheduler = Scheduler::new(4).unwrap();
        let stats = scheduler.run(source, &fixed_latency, &Aggregator::new()).unwrap();

        assert_eq!(stats.count, 100);
        assert_eq!(pulled.load(Ordering::SeqCst), 100);
    }
}
