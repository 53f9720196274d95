// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use watchtower::config::Config;
use watchtower::database::PostgresDatabase;
use watchtower::kubernetes::{wait_for_automation_controller_crd, KubeResources};
use watchtower::reconciler::WatchLoop;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting Watchtower v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: namespace={}, database={}",
        config.namespace,
        config.credentials.address()
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    // One signal listener for the CRD wait and the watch loop alike
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    info!("Waiting for AutomationController CRD to become available...");
    if wait_for_automation_controller_crd(&client, &mut shutdown).await? {
        let database = PostgresDatabase::new(config.credentials.clone(), config.settings);
        let resources = KubeResources::new(client, &config.namespace, &config.settings);
        let watch_loop = WatchLoop::new(database, resources, config.settings);

        watch_loop.run(&mut shutdown).await;
    }

    info!("Watchtower stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
