//! Error types for timebench

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum BenchmarkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Workload error: {0}")]
    Workload(#[from] WorkloadError),

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("No query latencies were recorded (empty workload)")]
    EmptyResult,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Workload file errors
///
/// All of these are raised while loading the workload, before any query
/// is dispatched.
#[derive(Error, Debug)]
pub enum WorkloadError {
    #[error("Invalid file extension for {path:?}: expected .csv")]
    InvalidExtension { path: PathBuf },

    #[error("Unable to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unable to read workload: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed record at line {line}: expected 3 fields, found {found}")]
    MalformedRecord { line: u64, found: usize },

    #[error("Invalid timestamp at line {line} in field '{field}': {value:?}")]
    InvalidTimestamp {
        line: u64,
        field: &'static str,
        value: String,
    },

    #[error("Inverted range at line {line}: range_end precedes range_start")]
    InvertedRange { line: u64 },
}

/// Database connection errors
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("No database URI given (use --db-uri or DB_CONN_URI)")]
    MissingUri,

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("Unable to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Unable to acquire connection: {0}")]
    Acquire(#[source] sqlx::Error),
}

/// A query failed while executing
#[derive(Error, Debug)]
#[error("Query for host '{host}' failed: {source}")]
pub struct ExecutionError {
    pub host: String,
    #[source]
    pub source: sqlx::Error,
}

pub type Result<T> = std::result::Result<T, BenchmarkError>;
