//! # cloudcfg
//!
//! Wires the file monitor, the `/monitor` webhook and the Vault transit
//! client into one process.

pub mod cli;
pub mod config;
pub mod logging;

use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use cloudcfg_monitor::{
    BroadcastBus, CompositeExtractor, FileMonitor, PropertyPathEndpoint, RefreshEvent, routes,
    spawn_poller,
};
use cloudcfg_vault::{TextEncryptor, TransitClient, VaultTextEncryptor, VaultTextEncryptorLocator};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cli::{Cli, Command, KeyArgs};
use crate::config::ServerConfig;

/// Execute a parsed command line.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ServerConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve { bind } => {
            let addr = bind.unwrap_or(config.server.bind);
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;
            serve(config, listener, shutdown_signal()).await
        }
        Command::Key(key) => {
            let encryptor = locate(&config, &key).await?;
            println!("{}", encryptor.public_key().unwrap_or_default());
            Ok(())
        }
        Command::Encrypt { key, text } => {
            let encryptor = locate(&config, &key).await?;
            let ciphertext = encryptor.encrypt(&text).await.context("encryption unavailable")?;
            println!("{ciphertext}");
            Ok(())
        }
        Command::Decrypt { key, ciphertext } => {
            let encryptor = locate(&config, &key).await?;
            let plaintext = encryptor
                .decrypt(&ciphertext)
                .await
                .context("decryption unavailable")?;
            println!("{plaintext}");
            Ok(())
        }
    }
}

/// Run the monitor and the webhook on `listener` until `shutdown` resolves.
pub async fn serve<F>(config: ServerConfig, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let cancel = CancellationToken::new();
    let bus = BroadcastBus::new(config.server.bus_capacity);
    let logger = spawn_refresh_logger(bus.subscribe(), cancel.clone());

    let mut endpoint = PropertyPathEndpoint::new(
        Arc::new(CompositeExtractor::with_defaults()),
        Arc::new(bus),
    );
    if let Some(context_id) = &config.server.context_id {
        endpoint = endpoint.with_context_id(context_id.clone());
    }
    let endpoint = Arc::new(endpoint);
    info!("Context id {}", endpoint.context_id());

    let monitor = Arc::new(FileMonitor::new(config.repository, &config.monitor));
    {
        let monitor = monitor.clone();
        tokio::task::spawn_blocking(move || monitor.start())
            .await
            .context("file monitor failed to start")?;
    }
    let poller = spawn_poller(
        monitor.clone(),
        endpoint.clone(),
        config.monitor.fixed_delay(),
        cancel.clone(),
    );

    let app = routes::router(endpoint, &config.server.monitor_path_prefix);
    info!(
        "Listening on http://{}{}",
        listener.local_addr()?,
        routes::monitor_path(&config.server.monitor_path_prefix)
    );
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("http server failed");

    cancel.cancel();
    for task in [poller, logger] {
        if let Err(e) = task.await {
            error!("Background task failed: {e}");
        }
    }
    tokio::task::spawn_blocking(move || monitor.stop())
        .await
        .context("file monitor failed to stop")?;

    info!("Shut down");
    served
}

/// Log every refresh event published in this process.
fn spawn_refresh_logger(
    mut rx: broadcast::Receiver<RefreshEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => break,
                received = rx.recv() => received,
            };

            match received {
                Ok(event) => debug!(
                    origin = %event.origin_service,
                    destination = %event.destination_service,
                    "Refresh event"
                ),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Refresh logger lagged, {skipped} events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

async fn locate(config: &ServerConfig, key: &KeyArgs) -> anyhow::Result<VaultTextEncryptor> {
    let vault = config.vault.clone().unwrap_or_default();
    let client = TransitClient::new(&vault).context("vault client unavailable")?;
    VaultTextEncryptorLocator::new(client)
        .locate_key(&key.to_keys())
        .await
        .with_context(|| format!("vault key for {} unavailable", key.name))
}
