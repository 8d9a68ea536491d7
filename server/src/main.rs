// server/src/main.rs

// Entry point for the coordination API: loads configuration, opens the
// record store, wires the external clients and serves until a signal.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::oneshot;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use predictor::{HttpPredictor, PredictorEndpoints};
use rest_api::{load_app_config, load_responders, seed_responders, start_server, AppState};
use security::{CommsTokenIssuer, TokenIssuer};
use storage::SledRecordStore;

mod cli;
use crate::cli::CliArgs;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

// Panics are logged through tracing and end the process with a failure code.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!(panic = %panic_info, "Unrecoverable panic");
        std::process::exit(1);
    }));
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    install_panic_hook();

    let args = CliArgs::parse();
    let mut config = load_app_config(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let store = Arc::new(
        SledRecordStore::open_url(&config.database_url)
            .with_context(|| format!("Failed to open record store at {}", config.database_url))?,
    );
    if config.database_key.is_some() {
        info!("DATABASE_KEY is set; the embedded store does not use it");
    }
    if let Some(path) = config.responders_file.as_deref() {
        let responders = load_responders(path)?;
        let seeded = seed_responders(store.as_ref(), &responders).await?;
        info!(seeded, path = %path.display(), "Seeded responders");
    }

    let predictor = HttpPredictor::new(
        PredictorEndpoints {
            resources: config.ml_resource_endpoint.clone(),
            anomalies: config.ml_anomaly_endpoint.clone(),
            risk: config.ml_risk_endpoint.clone(),
        },
        config.ml_key.clone(),
        Duration::from_secs(config.predictor_timeout_secs),
    )
    .context("Failed to build predictor client")?;

    let comms = CommsTokenIssuer::from_connection_string(&config.comms_connection_string);
    if comms.is_none() {
        warn!("COMMS_CONNECTION_STRING could not be parsed; communication sessions will answer 501");
    }

    let tokens = TokenIssuer::new(config.jwt_secret.as_bytes(), config.token_ttl_secs);
    let state = AppState::new(store.clone(), Arc::new(predictor), tokens).with_comms(comms);

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(());
    });

    let served = start_server(&config, state, shutdown_rx).await;
    match store.flush().await {
        Ok(bytes) => info!(bytes, "Record store flushed"),
        Err(e) => error!(error = %e, "Failed to flush record store"),
    }
    served
}
