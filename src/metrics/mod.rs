//! Latency collection and reporting
//!
//! This module provides:
//! - Sample / StatsSummary data model and statistics
//! - Aggregator shared by concurrent query tasks
//! - Console and JSON reporting

pub mod aggregator;
pub mod reporter;
pub mod stats;

pub use aggregator::Aggregator;
pub use reporter::MetricsReporter;
pub use stats::{Sample, StatsSummary};
