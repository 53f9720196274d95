// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Keeps AutomationController replicas in line with the database role.

pub mod state;
pub mod watch_loop;

pub use state::{transition, Outcome, State};
pub use watch_loop::{CycleReport, WatchLoop};

use crate::database::Role;

/// Replicas an AutomationController should run given the database role
pub fn desired_replicas(role: Role, target: u32) -> u32 {
    match role {
        Role::Primary => target,
        Role::Standby => 0,
    }
}
