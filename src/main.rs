use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use statsync::bitcoind_flexible::FlexibleBitcoindClient;
use statsync::config::{AppConfig, CliArgs, LogFormat};
use statsync::runtime::dataset::partition_day_label;
use statsync::runtime::partition::today_utc;
use statsync::{SyncOutcome, run_sync};

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init(),
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
    }
}

fn main() -> Result<()> {
    let cli = CliArgs::parse();
    init_logging(cli.log_format);
    info!("=== BTC block stats updater ===");

    // Credentials are resolved before anything touches the dataset or the network.
    let cfg = AppConfig::load(&cli)?;
    info!(endpoints = cfg.endpoints.len(), "loaded provider endpoint(s)");

    let client = FlexibleBitcoindClient::new(&cfg.endpoints, 0, cfg.rpc_timeout)?;
    let layout = cfg.layout();
    let day = today_utc();
    info!(data_dir = %layout.data_dir().display(), partition_day = %partition_day_label(day), "starting sync");

    let outcome = run_sync(&client, &layout, &cfg.sync_options(), day).context("sync run failed")?;
    match &outcome {
        SyncOutcome::UpToDate(plan) => {
            info!(height = plan.local_last_height, "=== Done (up to date) ===")
        }
        SyncOutcome::NothingFetched { failed, .. } => {
            info!(failed = failed.len(), "=== Done (nothing fetched) ===")
        }
        SyncOutcome::Saved { fetched, write, .. } => {
            info!(saved = fetched, partition_rows = write.rows, "=== Done ===")
        }
    }
    Ok(())
}
