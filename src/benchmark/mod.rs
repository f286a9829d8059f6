//! Benchmark orchestration and dispatch
//!
//! This module provides the concurrent replay engine:
//! - Semaphore: counting semaphore bounding queries in flight
//! - RunCounters: atomic progress counters shared with query tasks
//! - Scheduler: bounded fan-out of work items with fail-fast abort
//! - Orchestrator: loads the workload and runs the scheduler

pub mod counters;
pub mod orchestrator;
pub mod scheduler;
pub mod semaphore;

pub use counters::{RunCounters, RunCounts};
pub use orchestrator::{BenchmarkResult, Orchestrator};
pub use scheduler::{Scheduler, SchedulerState, DEFAULT_CONCURRENCY};
pub use semaphore::Semaphore;
