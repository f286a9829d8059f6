//! Result reporting
//!
//! Supports:
//! - Console (human-readable)
//! - JSON file export

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::benchmark::BenchmarkResult;

/// Writes benchmark results to the console or to disk
pub struct MetricsReporter {
    quiet: bool,
}

impl MetricsReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    /// Print the statistics to stdout
    pub fn report_console(&self, result: &BenchmarkResult) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.write_console(&mut out, result)
    }

    /// Render the statistics block
    ///
    /// In quiet mode only the statistics are written, without the banner
    /// and run details.
    pub fn write_console<W: Write>(
        &self,
        out: &mut W,
        result: &BenchmarkResult,
    ) -> io::Result<()> {
        let s = &result.summary;

        if !self.quiet {
            writeln!(out, "\n====================================")?;
            writeln!(out, "BENCHMARK COMPLETE")?;
            writeln!(out, "====================================")?;
        }
        writeln!(out, "Total queries: {}", s.count)?;
        writeln!(out, "Total time (Seconds): {}", s.total)?;
        writeln!(out, "Minimum time (Seconds): {}", s.min)?;
        writeln!(out, "Maximum time (Seconds): {}", s.max)?;
        writeln!(out, "Mean time (Seconds): {}", s.mean)?;
        writeln!(out, "Median time (Seconds): {}", s.median)?;
        writeln!(out, "p95 time (Seconds): {}", s.p95)?;
        writeln!(out, "p99 time (Seconds): {}", s.p99)?;

        if !self.quiet {
            writeln!(
                out,
                "Wall clock: {:.2}s | Concurrency: {} | Throughput: {:.2} queries/s",
                result.duration.as_secs_f64(),
                result.concurrency,
                result.throughput()
            )?;
        }
        Ok(())
    }

    /// Write the result as pretty-printed JSON
    pub fn write_json_file(&self, path: &Path, result: &BenchmarkResult) -> io::Result<()> {
        let mut file = File::create(path)?;
        serde_json::to_writer_pretty(&mut file, &result.to_json())?;
        writeln!(file)?;
        Ok(())
    }
}
