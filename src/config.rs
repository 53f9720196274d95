// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{intervals, DEFAULT_DB_PORT};
use anyhow::{Context, Result};
use std::env;
use std::fmt;
use std::time::Duration;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Namespace holding the AutomationControllers to manage
    pub namespace: String,
    pub credentials: DatabaseCredentials,
    pub settings: Settings,
}

/// Connection parameters for the backing PostgreSQL database
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseCredentials {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl DatabaseCredentials {
    /// `host:port` of the database endpoint
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for DatabaseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseCredentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

/// Loop cadence and call bounds, fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub reconcile_interval: Duration,
    pub retry_interval: Duration,
    pub list_retry_interval: Duration,
    pub probe_timeout: Duration,
    pub connect_timeout: Duration,
    pub query_timeout: Duration,
    pub api_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reconcile_interval: Duration::from_secs(intervals::RECONCILE_SECS),
            retry_interval: Duration::from_secs(intervals::RETRY_SECS),
            list_retry_interval: Duration::from_secs(intervals::LIST_RETRY_SECS),
            probe_timeout: Duration::from_secs(intervals::PROBE_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(intervals::CONNECT_TIMEOUT_SECS),
            query_timeout: Duration::from_secs(intervals::QUERY_TIMEOUT_SECS),
            api_timeout: Duration::from_secs(intervals::API_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which resolves a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).with_context(|| format!("{} environment variable not set", key))
        };

        let namespace = required("AAP_NAMESPACE")?;

        let port = match lookup("DB_PORT") {
            Some(port) => port
                .parse()
                .with_context(|| format!("DB_PORT is not a valid port: {}", port))?,
            None => DEFAULT_DB_PORT,
        };

        let credentials = DatabaseCredentials {
            host: required("DB_HOST")?,
            port,
            user: required("DB_USER")?,
            password: required("DB_PASSWORD")?,
            database: required("DB_NAME")?,
        };

        let seconds = |key: &str, default: Duration| -> Result<Duration> {
            match lookup(key) {
                Some(value) => value
                    .parse()
                    .map(Duration::from_secs)
                    .with_context(|| format!("{} is not a whole number of seconds: {}", key, value)),
                None => Ok(default),
            }
        };

        let defaults = Settings::default();
        let settings = Settings {
            reconcile_interval: seconds("RECONCILE_INTERVAL_SECS", defaults.reconcile_interval)?,
            retry_interval: seconds("RETRY_INTERVAL_SECS", defaults.retry_interval)?,
            list_retry_interval: seconds("LIST_RETRY_INTERVAL_SECS", defaults.list_retry_interval)?,
            ..defaults
        };

        Ok(Config {
            namespace,
            credentials,
            settings,
        })
    }
}
