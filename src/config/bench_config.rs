//! Benchmark configuration derived from CLI arguments

use std::path::PathBuf;
use std::time::Duration;

use super::cli::StartArgs;
use crate::benchmark::DEFAULT_CONCURRENCY;
use crate::utils::{BenchmarkError, ConnectionError, Result};
use crate::workload::QueryTemplate;

/// Complete configuration for a `start` run
#[derive(Debug, Clone)]
pub struct BenchConfig {
    // Input
    pub workload_path: PathBuf,

    // Connection
    pub db_uri: String,
    pub acquire_timeout: Duration,

    // Parallelism; not exposed on the command line
    pub concurrency: usize,

    // Query
    pub template: QueryTemplate,

    // Output
    pub output_path: Option<PathBuf>,
    pub quiet: bool,
    pub verbose: bool,
}

impl BenchConfig {
    /// Create configuration from `start` arguments
    pub fn from_cli(args: &StartArgs, verbose: bool, quiet: bool) -> Result<Self> {
        let db_uri = args
            .db_uri
            .as_deref()
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
            .ok_or(ConnectionError::MissingUri)?
            .to_string();

        if !is_identifier(&args.table) {
            return Err(BenchmarkError::Config(format!(
                "Invalid table name: {:?}",
                args.table
            )));
        }
        if !is_interval(&args.bucket) {
            return Err(BenchmarkError::Config(format!(
                "Invalid bucket interval: {:?}",
                args.bucket
            )));
        }
        if args.acquire_timeout_secs == 0 {
            return Err(BenchmarkError::Config(
                "--acquire-timeout-secs must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            workload_path: args.file.clone(),
            db_uri,
            acquire_timeout: Duration::from_secs(args.acquire_timeout_secs),
            concurrency: DEFAULT_CONCURRENCY,
            template: QueryTemplate {
                table: args.table.clone(),
                bucket: args.bucket.clone(),
                bounds: args.range_bounds.into(),
            },
            output_path: args.output.clone(),
            quiet,
            verbose,
        })
    }

    /// Pool size matching the concurrency ceiling
    pub fn pool_size(&self) -> u32 {
        u32::try_from(self.concurrency).unwrap_or(u32::MAX)
    }
}

/// `name` or `schema.name`, letters, digits and underscores only
fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.split('.').all(|part| {
            !part.is_empty()
                && !part.starts_with(|c: char| c.is_ascii_digit())
                && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

/// Interval literal such as `1 minute` or `30 seconds`
fn is_interval(s: &str) -> bool {
    !s.trim().is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ')
}
