use anyhow::{Context, Result};
use clap::Parser;
use http_loadgen::config::USAGE;
use http_loadgen::{Config, Dispatcher};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    let json = config.json;

    let run_config = match config.into_run_config() {
        Ok(run_config) => run_config,
        Err(e) => {
            error!("{}", e);
            println!("{}", USAGE);
            std::process::exit(1);
        }
    };

    // Print banner
    info!("════════════════════════════════════════════════════════════");
    info!("                 HTTP LOAD GENERATOR");
    info!("════════════════════════════════════════════════════════════");
    info!("Target: {}", run_config.url());
    info!("Connections: {}", run_config.connections());
    info!("Target RPS: {}", run_config.rps());
    info!("Duration: {}s", run_config.duration().as_secs());
    info!("Request Timeout: {}s", run_config.timeout().as_secs());
    info!("════════════════════════════════════════════════════════════");

    let dispatcher =
        Dispatcher::with_http(run_config).context("Failed to build HTTP client")?;
    let metrics = dispatcher.metrics();

    let stats = dispatcher.run().await;

    metrics.print_summary(&stats);

    if json {
        let summary = metrics
            .summary(&stats)
            .to_json()
            .context("Failed to serialize summary")?;
        println!("{}", summary);
    }

    info!("════════════════════════════════════════════════════════════");
    info!("                    LOAD TEST COMPLETE");
    info!("════════════════════════════════════════════════════════════");

    Ok(())
}
