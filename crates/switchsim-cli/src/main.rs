//! switchsim - run simulated switches against a gateway

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use switchsim_cli::{cli::Cli, config, error::Result, summary};
use switchsim_runtime::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    setup_logging(cli.verbose);

    // Load configuration
    let config = config::load(cli.config.as_deref(), &cli.overrides())?;
    if cli.dump_config {
        println!("{}", config::render(&config)?);
        return Ok(());
    }

    std::fs::create_dir_all(&config.storage.output_dir).with_context(|| {
        format!(
            "can't create output directory {}",
            config.storage.output_dir.display()
        )
    })?;

    let orchestrator = Orchestrator::new(&config)?;
    info!(
        "Simulating {} switches against {}",
        config.switches.count,
        orchestrator.endpoint().session_url()
    );

    let report = orchestrator.run().await;
    println!("{}", summary::render(&report));

    if !report.is_clean() {
        error!("Simulation finished with failures");
        std::process::exit(1);
    }

    info!("Simulation finished");
    Ok(())
}

/// Setup logging based on verbosity level; `RUST_LOG` wins when set
fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
