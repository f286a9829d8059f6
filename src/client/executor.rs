//! Query executor trait
//!
//! The scheduler calls `execute` once per work item, from many threads at
//! once. Acquiring a connection and running the query are one blocking call:
//! the executor returns the measured latency or the first error it hit.

use std::time::Duration;

use crate::utils::Result;
use crate::workload::WorkItem;

/// Runs the query for one work item and reports how long it took
pub trait QueryExecutor: Send + Sync {
    fn execute(&self, item: &WorkItem) -> Result<Duration>;
}

impl<F> QueryExecutor for F
where
    F: Fn(&WorkItem) -> Result<Duration> + Send + Sync,
{
    fn execute(&self, item: &WorkItem) -> Result<Duration> {
        self(item)
    }
}
