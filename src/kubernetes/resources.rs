// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Listing and patching of the managed AutomationControllers

use crate::config::Settings;
use crate::error::{bounded, Result, WatchtowerError};
use crate::types::AutomationController;
use async_trait::async_trait;
use kube::{
    api::{ApiResource, DynamicObject, ListParams, Patch, PatchParams},
    Api, Client,
};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};

/// The cluster operations the watch loop needs
#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// All AutomationControllers in the managed namespace
    async fn list(&self) -> Result<Vec<AutomationController>>;

    /// Merge-patch `spec.replicas` of `name`, leaving every other field untouched.
    /// Always issues the write; callers skip it when nothing would change.
    async fn patch_replicas(&self, name: &str, replicas: u32) -> Result<()>;
}

/// Talks to the API server untyped: an item whose `spec` does not decode must
/// not hide its siblings, least of all from the scale-down path.
pub struct KubeResources {
    api: Api<DynamicObject>,
    timeout: Duration,
}

impl KubeResources {
    pub fn new(client: Client, namespace: &str, settings: &Settings) -> Self {
        Self {
            api: Api::namespaced_with(
                client,
                namespace,
                &ApiResource::erase::<AutomationController>(&()),
            ),
            timeout: settings.api_timeout,
        }
    }
}

/// Body of a merge patch that only touches `spec.replicas`
pub fn replicas_patch(replicas: u32) -> serde_json::Value {
    json!({ "spec": { "replicas": replicas } })
}

#[async_trait]
impl ResourceApi for KubeResources {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<AutomationController>> {
        let list = bounded(
            "listing AutomationControllers",
            self.timeout,
            self.api.list(&ListParams::default()),
        )
        .await?
        .map_err(WatchtowerError::List)?;

        debug!("Found {} AutomationControllers", list.items.len());
        Ok(list.items.into_iter().map(AutomationController::from).collect())
    }

    #[instrument(skip(self))]
    async fn patch_replicas(&self, name: &str, replicas: u32) -> Result<()> {
        let patch = replicas_patch(replicas);
        bounded(
            format!("patch of {}", name),
            self.timeout,
            self.api.patch(name, &PatchParams::default(), &Patch::Merge(&patch)),
        )
        .await?
        .map_err(|source| WatchtowerError::Patch {
            name: name.to_string(),
            source,
        })?;

        Ok(())
    }
}
