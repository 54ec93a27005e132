//! Tsumugi main entry point
//!
//! Command-line interface for the Tsumugi product-page harvester.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tsumugi::config::load_config;
use tsumugi::input::load_work_items;
use tsumugi::pipeline::run_harvest;

/// Tsumugi: a concurrent product-page harvester
///
/// Tsumugi reads product ids and URLs from a tabular input file, fetches
/// each page through an isolated HTTP session, extracts product image
/// URLs, and writes two JSON snapshots: successful results and
/// permanently failed items.
#[derive(Parser, Debug)]
#[command(name = "tsumugi")]
#[command(version = "1.0.0")]
#[command(about = "A concurrent product-page harvester", long_about = None)]
struct Cli {
    /// Input CSV file (overrides INPUT_FILE from the environment)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate configuration and input, show what would run, then exit
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = load_config().context("failed to load configuration")?;
    if let Some(input) = &cli.input {
        config.input_file = input.display().to_string();
    }

    if cli.dry_run {
        return handle_dry_run(&config);
    }

    let cancel = CancellationToken::new();
    spawn_shutdown_listener(cancel.clone());

    let summary = run_harvest(config, cancel).await?;
    tracing::info!(
        "Harvest completed: {} succeeded, {} failed",
        summary.succeeded,
        summary.failed
    );

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tsumugi=info,warn"),
            1 => EnvFilter::new("tsumugi=debug,info"),
            2 => EnvFilter::new("tsumugi=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Cancels the token exactly once on the first interrupt
///
/// Further interrupts have no additional effect; the run drains and
/// finalizes its snapshot normally.
fn spawn_shutdown_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Interrupt received, shutting down gracefully...");
                cancel.cancel();
            }
            Err(e) => tracing::error!("Failed to listen for interrupt: {}", e),
        }
    });
}

/// Handles the --dry-run mode: validates config and input without fetching
fn handle_dry_run(config: &tsumugi::config::Config) -> anyhow::Result<()> {
    println!("=== Tsumugi Dry Run ===\n");

    println!("Input: {}", config.input_file);
    println!("\nOutput:");
    println!("  Results: {}", config.output.results_file);
    println!("  Failed items: {}", config.output.failures_file);

    println!("\nPipeline:");
    println!("  Workers: {}", config.pipeline.worker_count);
    println!("  Channel buffer: {}", config.pipeline.buffer_size);
    println!("  Max retries: {}", config.pipeline.max_retries);
    println!("  Retry delay: {:?}", config.pipeline.retry_delay);

    println!("\nFetcher:");
    println!("  Request timeout: {:?}", config.fetcher.request_timeout);
    println!("  Container selector: {}", config.fetcher.container_selector);
    println!(
        "  Image selector: {} [{}]",
        config.fetcher.image_selector, config.fetcher.image_attribute
    );

    let items = load_work_items(Path::new(&config.input_file))
        .context("failed to load work items")?;

    println!("\n✓ Configuration is valid");
    println!("✓ Would harvest {} items", items.len());

    Ok(())
}
