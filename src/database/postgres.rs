// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! PostgreSQL implementation of [`Database`]

use crate::config::{DatabaseCredentials, Settings};
use crate::database::{Database, Role};
use crate::error::{bounded, Result, WatchtowerError};
use async_trait::async_trait;
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, PgConnection};
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info, instrument};

/// Open and immediately drop a TCP connection to `address`, giving up after `within`.
#[instrument]
pub async fn probe(address: &str, within: Duration) -> Result<()> {
    bounded(
        format!("reachability probe of {}", address),
        within,
        TcpStream::connect(address),
    )
    .await?
    .map_err(|e| WatchtowerError::Unreachable {
        address: address.to_string(),
        reason: e.to_string(),
    })?;

    debug!("Database port {} is reachable", address);
    Ok(())
}

pub struct PostgresDatabase {
    credentials: DatabaseCredentials,
    settings: Settings,
}

impl PostgresDatabase {
    pub fn new(credentials: DatabaseCredentials, settings: Settings) -> Self {
        Self {
            credentials,
            settings,
        }
    }

    fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.credentials.host)
            .port(self.credentials.port)
            .username(&self.credentials.user)
            .password(&self.credentials.password)
            .database(&self.credentials.database)
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    type Connection = PgConnection;

    async fn probe(&self) -> Result<()> {
        probe(&self.credentials.address(), self.settings.probe_timeout).await
    }

    #[instrument(skip(self), fields(database = %self.credentials.address()))]
    async fn connect(&self) -> Result<PgConnection> {
        let options = self.connect_options();
        let conn = bounded(
            "database connection",
            self.settings.connect_timeout,
            PgConnection::connect_with(&options),
        )
        .await?
        .map_err(|e| WatchtowerError::Connection(e.to_string()))?;

        info!("Successfully connected to PostgreSQL");
        Ok(conn)
    }

    #[instrument(skip_all)]
    async fn check_role(&self, conn: &mut PgConnection) -> Result<Role> {
        let in_recovery: bool = bounded(
            "database role check",
            self.settings.query_timeout,
            sqlx::query_scalar::<_, bool>("SELECT pg_is_in_recovery()").fetch_one(&mut *conn),
        )
        .await?
        .map_err(|e| WatchtowerError::RoleCheck(e.to_string()))?;

        Ok(Role::from_recovery(in_recovery))
    }

    async fn release(&self, conn: PgConnection) {
        match bounded("database close", self.settings.query_timeout, conn.close()).await {
            Ok(Ok(())) => debug!("Database connection closed"),
            Ok(Err(e)) => debug!("Database connection closed uncleanly: {}", e),
            Err(e) => debug!("{}", e),
        }
    }
}
