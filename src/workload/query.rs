//! Query text for a work item
//!
//! Builds the time-bucketed min/max aggregation issued once per work item.
//! Host and range are bound as parameters (`$1`..`$3`), never interpolated.

use std::fmt;

/// Whether the upper end of the time range is part of the filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeBounds {
    /// `start <= ts <= end`, same as SQL `BETWEEN`
    #[default]
    Inclusive,
    /// `start <= ts < end`
    HalfOpen,
}

impl RangeBounds {
    fn upper_op(self) -> &'static str {
        match self {
            RangeBounds::Inclusive => "<=",
            RangeBounds::HalfOpen => "<",
        }
    }
}

impl fmt::Display for RangeBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeBounds::Inclusive => write!(f, "inclusive"),
            RangeBounds::HalfOpen => write!(f, "half-open"),
        }
    }
}

pub const DEFAULT_TABLE: &str = "cpu_usage";
pub const DEFAULT_BUCKET: &str = "1 minute";

/// Template for the per-item aggregation query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate {
    pub table: String,
    pub bucket: String,
    pub bounds: RangeBounds,
}

impl Default for QueryTemplate {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
            bounds: RangeBounds::default(),
        }
    }
}

impl QueryTemplate {
    /// Render the SQL statement
    ///
    /// Parameters: `$1` host, `$2` range start, `$3` range end.
    pub fn sql(&self) -> String {
        format!(
            "SELECT time_bucket('{bucket}', ts) AS time, \
             max(usage) AS max_usage, \
             min(usage) AS min_usage \
             FROM {table} \
             WHERE host = $1 AND ts >= $2 AND ts {op} $3 \
             GROUP BY time",
            bucket = self.bucket,
            table = self.table,
            op = self.bounds.upper_op(),
        )
    }
}
