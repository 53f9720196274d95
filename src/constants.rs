// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes annotation keys used by Watchtower
pub mod annotations {
    /// Replica count to run while the database is the writable primary
    pub const REPLICAS: &str = "watch-tower/replicas";
}

/// Loop cadence and call bounds, in seconds
pub mod intervals {
    /// Pause between two fully reconciled cycles
    pub const RECONCILE_SECS: u64 = 30;
    /// Pause after a defensive scale-down, so recovery is noticed quickly
    pub const RETRY_SECS: u64 = 10;
    /// Pause after the AutomationControllers could not be listed
    pub const LIST_RETRY_SECS: u64 = 30;
    /// Bare TCP reachability probe
    pub const PROBE_TIMEOUT_SECS: u64 = 2;
    /// PostgreSQL handshake and authentication
    pub const CONNECT_TIMEOUT_SECS: u64 = 3;
    /// Role query on an open connection
    pub const QUERY_TIMEOUT_SECS: u64 = 3;
    /// Any single Kubernetes API call
    pub const API_TIMEOUT_SECS: u64 = 10;
}

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}

/// Default PostgreSQL port when DB_PORT is not set
pub const DEFAULT_DB_PORT: u16 = 5432;
