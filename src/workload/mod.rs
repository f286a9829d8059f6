//! Workload definition
//!
//! - WorkItem: one host/time-range query to replay
//! - WorkloadSource: lazy CSV reader producing work items
//! - QueryTemplate: SQL rendered for each work item

pub mod item;
pub mod query;
pub mod source;

pub use item::WorkItem;
pub use query::{QueryTemplate, RangeBounds};
pub use source::{parse_timestamp, WorkloadSource};
