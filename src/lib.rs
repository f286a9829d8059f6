//! timebench library
//!
//! Replays time-range queries against TimescaleDB under a fixed concurrency
//! ceiling and summarizes their latencies.

pub mod benchmark;
pub mod client;
pub mod config;
pub mod metrics;
pub mod utils;
pub mod workload;
