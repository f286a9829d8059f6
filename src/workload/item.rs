//! Work item: one replayed query

use std::fmt;

use chrono::NaiveDateTime;

/// One unit of replay work: a host plus the time range to query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub host: String,
    pub range_start: NaiveDateTime,
    pub range_end: NaiveDateTime,
}

impl WorkItem {
    pub fn new(
        host: impl Into<String>,
        range_start: NaiveDateTime,
        range_end: NaiveDateTime,
    ) -> Self {
        Self {
            host: host.into(),
            range_start,
            range_end,
        }
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{} .. {}]", self.host, self.range_start, self.range_end)
    }
}
