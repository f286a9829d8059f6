//! timebench - query latency benchmark for TimescaleDB
//!
//! Replays a CSV workload of host/time-range queries with bounded
//! parallelism and prints latency statistics.

use anyhow::{Context, Result};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use timebench::benchmark::Orchestrator;
use timebench::client::PgExecutor;
use timebench::config::{BenchConfig, CliArgs, Command, StartArgs};
use timebench::metrics::MetricsReporter;

fn setup_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn print_banner(config: &BenchConfig) {
    if config.quiet {
        return;
    }

    println!("timebench v{}", env!("CARGO_PKG_VERSION"));
    println!("====================================");
    println!("Workload: {:?}", config.workload_path);
    println!(
        "Concurrency: {}, Table: {}, Bucket: {}, Range: {}",
        config.concurrency, config.template.table, config.template.bucket, config.template.bounds
    );
    println!("====================================\n");
}

fn run_start(args: &StartArgs, verbose: bool, quiet: bool) -> Result<()> {
    let config = BenchConfig::from_cli(args, verbose, quiet)?;
    print_banner(&config);

    let orchestrator = Orchestrator::new(config.clone());

    // Validate the whole workload before opening any connection.
    let items = orchestrator.load_workload()?;

    let executor = PgExecutor::connect(
        &config.db_uri,
        config.pool_size(),
        config.acquire_timeout,
        &config.template,
    )?;

    let result = orchestrator.execute(items, &executor);
    executor.close();
    let result = result?;

    let reporter = MetricsReporter::new(config.quiet);
    reporter
        .report_console(&result)
        .context("Failed to print statistics")?;

    if let Some(ref output_path) = config.output_path {
        info!("Writing results to: {:?}", output_path);
        reporter
            .write_json_file(output_path, &result)
            .with_context(|| format!("Failed to write {:?}", output_path))?;
    }

    Ok(())
}

fn run() -> Result<()> {
    let args = CliArgs::parse_args();
    setup_logging(args.verbose, args.quiet);

    match &args.command {
        Command::Start(start) => run_start(start, args.verbose, args.quiet),
    }
}

fn main() {
    if let Err(e) = run() {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
