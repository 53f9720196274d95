// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD availability checking utilities

use crate::constants::crd::{POLL_INTERVAL_SECS, POLL_MAX_INTERVAL_SECS};
use crate::error::Result;
use crate::types::AutomationController;
use kube::{core::GroupVersionKind, discovery, Client, Resource};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

fn automation_controller_gvk() -> GroupVersionKind {
    GroupVersionKind::gvk(
        &AutomationController::group(&()),
        &AutomationController::version(&()),
        &AutomationController::kind(&()),
    )
}

/// Wait for the AutomationController CRD to be served by the API server, or
/// until `shutdown` resolves. Returns `false` when shutdown came first.
pub async fn wait_for_automation_controller_crd<F>(client: &Client, shutdown: F) -> Result<bool>
where
    F: Future<Output = ()>,
{
    tokio::select! {
        _ = shutdown => {
            info!("Shutdown requested while waiting for the AutomationController CRD");
            Ok(false)
        }
        result = poll_for_automation_controller_crd(client) => result.map(|()| true),
    }
}

/// Poll until the CRD is served, with exponential backoff starting at
/// POLL_INTERVAL_SECS seconds.
async fn poll_for_automation_controller_crd(client: &Client) -> Result<()> {
    let gvk = automation_controller_gvk();
    let mut interval = POLL_INTERVAL_SECS;

    loop {
        match automation_controller_crd_exists(client).await {
            Ok(true) => {
                info!("{} CRD ({}) is available", gvk.kind, gvk.api_version());
                return Ok(());
            }
            Ok(false) => {
                info!(
                    "{} CRD ({}) not yet available, waiting {} seconds...",
                    gvk.kind,
                    gvk.api_version(),
                    interval
                );
            }
            Err(e) => {
                warn!(
                    "Error checking for {} CRD: {}, retrying in {} seconds...",
                    gvk.kind, e, interval
                );
            }
        }

        sleep(Duration::from_secs(interval)).await;

        // Exponential backoff with max cap
        interval = (interval * 2).min(POLL_MAX_INTERVAL_SECS);
    }
}

/// Check if the AutomationController kind is served under its group/version.
pub async fn automation_controller_crd_exists(client: &Client) -> Result<bool> {
    match discovery::pinned_kind(client, &automation_controller_gvk()).await {
        Ok(_) => Ok(true),
        Err(kube::Error::Api(err)) if err.code == 404 => Ok(false),
        Err(kube::Error::Discovery(_)) => Ok(false),
        Err(e) => Err(e.into()),
    }
}
