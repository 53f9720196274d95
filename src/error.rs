// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchtowerError {
    #[error("Database at {address} is unreachable: {reason}")]
    Unreachable { address: String, reason: String },

    #[error("Unable to connect to database: {0}")]
    Connection(String),

    #[error("Error checking database role: {0}")]
    RoleCheck(String),

    #[error("Failed to list AutomationControllers: {0}")]
    List(#[source] kube::Error),

    #[error("{name} has no {key} annotation")]
    MissingAnnotation { name: String, key: &'static str },

    #[error("Invalid {key} value in {name}: {value:?}")]
    InvalidAnnotation {
        name: String,
        key: &'static str,
        value: String,
    },

    #[error("Cannot read spec.replicas of {name}: {reason}")]
    ObservedValue { name: String, reason: String },

    #[error("Failed to patch {name}: {source}")]
    Patch {
        name: String,
        #[source]
        source: kube::Error,
    },

    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: String, after: Duration },

    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),
}

pub type Result<T> = std::result::Result<T, WatchtowerError>;

/// Run `fut` to completion or fail with [`WatchtowerError::Timeout`] once `after` elapses.
pub async fn bounded<F>(operation: impl Into<String>, after: Duration, fut: F) -> Result<F::Output>
where
    F: Future,
{
    tokio::time::timeout(after, fut)
        .await
        .map_err(|_| WatchtowerError::Timeout {
            operation: operation.into(),
            after,
        })
}
