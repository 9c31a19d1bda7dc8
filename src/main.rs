use anyhow::{anyhow, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

use catalog_watcher::extractor::ProductExtractor;
use catalog_watcher::fetcher::HttpFetcher;
use catalog_watcher::logging;
use catalog_watcher::monitor::{Monitor, MonitorSettings, SystemClock};
use catalog_watcher::plugins::notifiers::{TelegramConfig, TelegramNotifier};
use catalog_watcher::plugins::NotifierPlugin;
use catalog_watcher::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "catalog-watcher", version, about = "Watch a catalog page for a target product and price")]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// File that log lines are appended to
    #[arg(long, default_value = "monitor.log")]
    log_file: PathBuf,

    /// Run a single check and exit
    #[arg(long)]
    once: bool,

    /// Verify the Telegram bot token and exit
    #[arg(long, conflicts_with = "once")]
    test_notifier: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let _guard = logging::init_logging(&cli.log_file)?;

    let config = match AppConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration from {}: {}", cli.config.display(), e);
            return Err(e.into());
        }
    };

    info!("Catalog watcher initialized");
    info!("Watching {} for {} @ ${}", config.catalog_url, config.target_product, config.target_price);

    if config.metrics.enabled {
        PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], config.metrics.port))
            .install()
            .map_err(|e| anyhow!("Failed to start metrics exporter: {}", e))?;
        info!("Metrics exported on port {}", config.metrics.port);
    }

    let notifier = Arc::new(TelegramNotifier::new(TelegramConfig::from_app_config(&config))?);

    if cli.test_notifier {
        return if notifier.test_connection().await? {
            info!("{} accepted the bot token", notifier.name());
            Ok(())
        } else {
            Err(anyhow!("{} rejected the bot token", notifier.name()))
        };
    }

    let mut monitor = Monitor::new(
        Arc::new(HttpFetcher::new()?),
        notifier,
        Arc::new(SystemClock),
        ProductExtractor::new(&config.selectors)?,
        config.target(),
        MonitorSettings::from_app_config(&config),
    );

    if cli.once {
        let outcome = monitor.run_cycle().await;
        info!("Single check finished: {:?}", outcome);
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Monitor stopped by user");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => warn!("Unable to listen for shutdown signal: {}", e),
        }
    });

    monitor.run(shutdown_rx).await;
    Ok(())
}
