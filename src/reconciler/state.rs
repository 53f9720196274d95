// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! States of the watch loop and the transitions between them.

use crate::config::Settings;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    ProbeDb,
    ConnectDb,
    CheckRole,
    ListResources,
    ReconcileEach,
    /// Defensive scale-down after the database could not be trusted
    ScaleAllToZero,
    Sleep(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl<T, E> From<&Result<T, E>> for Outcome {
    fn from(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => Outcome::Success,
            Err(_) => Outcome::Failure,
        }
    }
}

/// Next state after `state` finished with `outcome`.
///
/// Database failures lead to a scale-down followed by the short retry interval.
/// A listing failure only says the cluster API is impaired, so nothing is scaled.
/// Per-resource failures never fail `ReconcileEach`.
pub fn transition(state: State, outcome: Outcome, settings: &Settings) -> State {
    use Outcome::*;
    use State::*;

    match (state, outcome) {
        (ProbeDb, Success) => ConnectDb,
        (ConnectDb, Success) => CheckRole,
        (CheckRole, Success) => ListResources,
        (ProbeDb | ConnectDb | CheckRole, Failure) => ScaleAllToZero,
        (ListResources, Success) => ReconcileEach,
        (ListResources, Failure) => Sleep(settings.list_retry_interval),
        (ReconcileEach, _) => Sleep(settings.reconcile_interval),
        (ScaleAllToZero, _) => Sleep(settings.retry_interval),
        (Sleep(_), _) => ProbeDb,
    }
}
