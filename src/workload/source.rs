//! CSV workload source
//!
//! Reads `host,range_start,range_end` rows after a header line. Rows are
//! parsed lazily, one per iteration step; [`WorkloadSource::load`] drains the
//! whole file so that a bad row is reported before any query is dispatched.

use std::fs::File;
use std::io;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter, Trim};

use super::item::WorkItem;
use crate::utils::WorkloadError;

/// Number of fields in every data row
pub const FIELDS_PER_RECORD: usize = 3;

const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Ordered, single-pass sequence of work items
pub struct WorkloadSource<R: io::Read> {
    records: StringRecordsIntoIter<R>,
}

impl WorkloadSource<File> {
    /// Open a workload file, rejecting anything that is not `.csv`
    pub fn open(path: &Path) -> Result<Self, WorkloadError> {
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if !is_csv {
            return Err(WorkloadError::InvalidExtension {
                path: path.to_path_buf(),
            });
        }

        let file = File::open(path).map_err(|source| WorkloadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_reader(file))
    }
}

impl<R: io::Read> WorkloadSource<R> {
    /// Wrap any reader; the first record is treated as a header and skipped
    pub fn from_reader(reader: R) -> Self {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            // Field counts are checked per row so the error names the line.
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);
        Self {
            records: reader.into_records(),
        }
    }

    /// Read every remaining item, stopping at the first bad row
    pub fn load(self) -> Result<Vec<WorkItem>, WorkloadError> {
        self.collect()
    }
}

impl<R: io::Read> Iterator for WorkloadSource<R> {
    type Item = Result<WorkItem, WorkloadError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(record.map_err(WorkloadError::from).and_then(|r| parse_record(&r)))
    }
}

fn parse_record(record: &StringRecord) -> Result<WorkItem, WorkloadError> {
    let line = record.position().map(|p| p.line()).unwrap_or(0);

    if record.len() != FIELDS_PER_RECORD {
        return Err(WorkloadError::MalformedRecord {
            line,
            found: record.len(),
        });
    }

    let range_start = parse_field(record, 1, "range_start", line)?;
    let range_end = parse_field(record, 2, "range_end", line)?;
    if range_end < range_start {
        return Err(WorkloadError::InvertedRange { line });
    }

    Ok(WorkItem::new(&record[0], range_start, range_end))
}

fn parse_field(
    record: &StringRecord,
    idx: usize,
    field: &'static str,
    line: u64,
) -> Result<NaiveDateTime, WorkloadError> {
    let value = &record[idx];
    parse_timestamp(value).ok_or_else(|| WorkloadError::InvalidTimestamp {
        line,
        field,
        value: value.to_string(),
    })
}

/// Parse a timestamp in one of the accepted formats
///
/// RFC 3339 values with an offset are converted to UTC.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.naive_utc()))
}
