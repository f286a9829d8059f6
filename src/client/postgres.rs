//! PostgreSQL / TimescaleDB executor
//!
//! Wraps an sqlx connection pool behind the blocking [`QueryExecutor`]
//! interface. A dedicated tokio runtime drives the pool; every scheduler
//! thread enters it with `block_on`.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

use super::executor::QueryExecutor;
use crate::utils::{BenchmarkError, ConnectionError, ExecutionError, Result};
use crate::workload::{QueryTemplate, WorkItem};

const RUNTIME_WORKER_THREADS: usize = 2;

/// Executes the aggregation query against a pooled PostgreSQL connection
pub struct PgExecutor {
    runtime: Runtime,
    pool: PgPool,
    sql: String,
}

impl PgExecutor {
    /// Connect to the database and size the pool
    ///
    /// `max_connections` should be at least the scheduler's concurrency,
    /// otherwise tasks queue on connection acquisition.
    pub fn connect(
        uri: &str,
        max_connections: u32,
        acquire_timeout: Duration,
        template: &QueryTemplate,
    ) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(RUNTIME_WORKER_THREADS)
            .thread_name("timebench-db")
            .enable_all()
            .build()
            .map_err(ConnectionError::Runtime)?;

        let pool = runtime
            .block_on(
                PgPoolOptions::new()
                    .max_connections(max_connections)
                    .acquire_timeout(acquire_timeout)
                    .connect(uri),
            )
            .map_err(ConnectionError::Connect)?;

        info!("Connected to database (pool size: {})", max_connections);

        let sql = template.sql();
        debug!("Query template: {}", sql);

        Ok(Self { runtime, pool, sql })
    }

    /// Close all pooled connections
    pub fn close(&self) {
        self.runtime.block_on(self.pool.close());
    }
}

impl QueryExecutor for PgExecutor {
    fn execute(&self, item: &WorkItem) -> Result<Duration> {
        self.runtime.block_on(async {
            let mut conn = self
                .pool
                .acquire()
                .await
                .map_err(ConnectionError::Acquire)?;

            // Only the query round trip is timed, not pool acquisition.
            let start = Instant::now();
            sqlx::query(&self.sql)
                .bind(item.host.as_str())
                .bind(item.range_start)
                .bind(item.range_end)
                .fetch_all(&mut *conn)
                .await
                .map_err(|source| ExecutionError {
                    host: item.host.clone(),
                    source,
                })?;

            Ok::<_, BenchmarkError>(start.elapsed())
        })
    }
}
