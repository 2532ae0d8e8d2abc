use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use stock_watcher::config::MonitorConfig;
use stock_watcher::scheduler;
use stock_watcher::utils::logging;
use stock_watcher::StockMonitor;

/// Checks a product page once a day and emails the stock status.
#[derive(Debug, Parser)]
#[command(name = "stock-watcher", version, about)]
struct Args {
    /// Send a test email, run one check and exit
    #[arg(long)]
    test: bool,

    /// Optional configuration file, overridden by environment variables
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    // A missing .env is fine; the process environment may carry everything.
    dotenvy::dotenv().ok();

    // The file logger's settings come from this config, so its failures can
    // only go to the stdout fallback.
    let config = match MonitorConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => return fail_early(anyhow::Error::new(e).context("Invalid configuration")),
    };
    let _guard = match logging::init(&config.logging()) {
        Ok(guard) => guard,
        Err(e) => return fail_early(anyhow::Error::new(e).context("Failed to initialize logging")),
    };

    match run(args, &config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn fail_early(e: anyhow::Error) -> ExitCode {
    logging::init_console();
    error!("Error: {:#}", e);
    ExitCode::FAILURE
}

async fn run(args: Args, config: &MonitorConfig) -> Result<bool> {
    info!("Starting Stock Watcher v{}", env!("CARGO_PKG_VERSION"));

    let monitor = StockMonitor::from_config(config).context("Failed to set up stock monitor")?;

    if args.test {
        let success = monitor.run_test_check().await;
        info!(success, "Test check finished");
        return Ok(success);
    }

    let schedule = config.schedule().context("CHECK_TIME must be HH:MM")?;

    Ok(scheduler::run_scheduler(&monitor, schedule, config.poll_interval()).await)
}
