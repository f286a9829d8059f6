//! Command-line argument parsing

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::workload::query::{DEFAULT_BUCKET, DEFAULT_TABLE};
use crate::workload::RangeBounds;

/// A CLI to generate query latency statistics on TimescaleDB
#[derive(Parser, Debug, Clone)]
#[command(name = "timebench")]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    /// Verbose output (debug logging)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Only print errors and the final statistics
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start benchmarking: replay every query in the workload file
    Start(StartArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StartArgs {
    /// Input CSV file (header, then host,start_time,end_time rows)
    #[arg(long = "file")]
    pub file: PathBuf,

    /// Database connection URI
    #[arg(long = "db-uri", env = "DB_CONN_URI", hide_env_values = true)]
    pub db_uri: Option<String>,

    /// Whether the end of each time range is included in the filter
    #[arg(long = "range-bounds", value_enum, default_value_t = BoundsArg::Inclusive)]
    pub range_bounds: BoundsArg,

    /// Hypertable to query
    #[arg(long = "table", default_value = DEFAULT_TABLE)]
    pub table: String,

    /// time_bucket interval
    #[arg(long = "bucket", default_value = DEFAULT_BUCKET)]
    pub bucket: String,

    /// Seconds to wait for a pooled connection before failing
    #[arg(long = "acquire-timeout-secs", default_value_t = 30)]
    pub acquire_timeout_secs: u64,

    /// Write the statistics as JSON to this file
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

/// Time range boundary handling
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsArg {
    /// start <= ts <= end
    Inclusive,
    /// start <= ts < end
    HalfOpen,
}

impl From<BoundsArg> for RangeBounds {
    fn from(arg: BoundsArg) -> Self {
        match arg {
            BoundsArg::Inclusive => RangeBounds::Inclusive,
            BoundsArg::HalfOpen => RangeBounds::HalfOpen,
        }
    }
}

impl CliArgs {
    /// Parse arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
