use pi_wallet::config::PiConfig;
use pi_wallet::horizon::HorizonGateway;
use pi_wallet::keys::Sep5KeypairLoader;
use pi_wallet::web::{create_router, AppState};

use anyhow::{Context, Result};
use autopay_core::{
    setup_logger, AutoSubmitter, LedgerGateway, MetricsCollector, WalletStore, WorkerRunner,
};
use clap::Parser;
use dotenv::dotenv;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::time::{interval, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "chains/pi-wallet/config.toml")]
    config: String,
    /// Overrides `bind_addr` from the config file.
    #[arg(short, long)]
    bind: Option<String>,
    #[arg(short, long)]
    export_metrics: Option<String>,
    #[arg(long, default_value = "30")]
    metrics_interval: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = setup_logger();
    dotenv().ok();

    let args = Args::parse();
    info!("Loading config from: {}", args.config);

    let config = match PiConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {}", e);
            return Ok(());
        }
    };

    let gateway = HorizonGateway::new(&config)?;
    info!(
        "Using Horizon {} ({})",
        gateway.base_url(),
        config.network_passphrase
    );
    let gateway: Arc<dyn LedgerGateway> = Arc::new(gateway);

    let loader = Sep5KeypairLoader::new(config.coin_type);
    info!("Deriving keys along {}", loader.path());

    let metrics = Arc::new(MetricsCollector::default());
    let store = Arc::new(WalletStore::new());
    let submitter = Arc::new(AutoSubmitter::new(
        store.clone(),
        gateway.clone(),
        config.worker_config(),
        metrics.clone(),
    ));

    let token = CancellationToken::new();
    WorkerRunner::spawn_shutdown_listener(token.clone());

    let started = Instant::now();
    let worker = WorkerRunner::spawn_submitter(submitter.clone(), token.clone());

    let metrics_task = if let Some(ref metrics_path) = args.export_metrics {
        let path = metrics_path.clone();
        let interval_secs = args.metrics_interval.max(1);
        let metrics = metrics.clone();
        Some(tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(interval_secs));
            loop {
                interval.tick().await;
                if let Err(e) = metrics.export_to_file(&path).await {
                    error!("Metrics export failed: {}", e);
                } else {
                    info!("Metrics exported to {}", path);
                }
            }
        }))
    } else {
        None
    };

    let app = create_router(AppState {
        store,
        submitter,
        loader: Arc::new(loader),
        gateway,
        history_limit: config.history_limit,
    });

    let bind_addr = args.bind.unwrap_or_else(|| config.bind_addr.clone());
    let served = match TcpListener::bind(&bind_addr).await {
        Ok(listener) => {
            info!("Control surface listening on http://{}", bind_addr);
            println!("Pi wallet control surface: http://{}", bind_addr);
            let shutdown = token.clone();
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
                .context("HTTP server failed")
        }
        Err(e) => Err(e).with_context(|| format!("Failed to bind {}", bind_addr)),
    };

    // Stop the worker whether the server drained or failed.
    token.cancel();
    WorkerRunner::wait_for_submitter(worker, started).await;

    if let Some(task) = metrics_task {
        task.abort();
    }

    if let Some(metrics_path) = args.export_metrics {
        match metrics.export_to_file(&metrics_path).await {
            Ok(_) => info!("Final metrics exported to {}", metrics_path),
            Err(e) => error!("Failed to export final metrics: {}", e),
        }
    }

    served
}
