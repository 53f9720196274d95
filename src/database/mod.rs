// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Database reachability and role detection.

pub mod postgres;

pub use postgres::{probe, PostgresDatabase};

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;

/// Whether the database currently accepts writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Primary,
    Standby,
}

impl Role {
    /// Map the answer of "is the database in recovery?" to a role
    pub fn from_recovery(in_recovery: bool) -> Self {
        if in_recovery {
            Role::Standby
        } else {
            Role::Primary
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Primary => f.write_str("Primary"),
            Role::Standby => f.write_str("Standby"),
        }
    }
}

/// The database operations one reconciliation cycle relies on.
///
/// A connection obtained from [`Database::connect`] is handed back through
/// [`Database::release`] within the same cycle.
#[async_trait]
pub trait Database: Send + Sync {
    type Connection: Send;

    /// Fast transport-level check that the endpoint accepts connections
    async fn probe(&self) -> Result<()>;

    async fn connect(&self) -> Result<Self::Connection>;

    async fn check_role(&self, conn: &mut Self::Connection) -> Result<Role>;

    async fn release(&self, conn: Self::Connection);
}
