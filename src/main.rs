use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use davrun::batch::BatchRunner;
use davrun::config;

#[derive(Parser, Debug)]
#[command(
    name = "davrun",
    version,
    about = "Run a declared batch of WebDAV operations against a remote server"
)]
struct Cli {
    /// Path to the JSON batch file
    batch_file: PathBuf,

    /// Abort the batch on the first failed command (overrides the batch file)
    #[arg(long)]
    fail_on_error: bool,

    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let mut batch = config::load_batch(&cli.batch_file)?;
    if cli.fail_on_error {
        batch.fail_on_error = true;
    }

    let runner = BatchRunner::from_batch(batch)?;
    let report = runner.run().await?;

    for record in &report.records {
        info!("[{}] {}: {}", record.index + 1, record.description, record.outcome);
    }
    if report.skipped > 0 {
        info!("{} commands skipped after abort", report.skipped);
    }

    if let Some(failure) = report.aggregate_failure() {
        error!("❌ Batch run {} failed: {}", report.run_id, failure);
        std::process::exit(1);
    }

    info!(
        "✅ Batch run {} finished: {} commands, state {}",
        report.run_id,
        report.attempted(),
        report.state
    );
    Ok(())
}
