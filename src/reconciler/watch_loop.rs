// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The polling loop that drives [`State`] through one cycle after another.

use crate::config::Settings;
use crate::database::{Database, Role};
use crate::kubernetes::ResourceApi;
use crate::reconciler::desired_replicas;
use crate::reconciler::state::{transition, Outcome, State};
use crate::types::AutomationController;
use kube::ResourceExt;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// What happened to each AutomationController during one pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub patched: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Patched,
    Unchanged,
    Skipped,
    Failed,
}

impl CycleReport {
    fn record(&mut self, disposition: Disposition) {
        match disposition {
            Disposition::Patched => self.patched += 1,
            Disposition::Unchanged => self.unchanged += 1,
            Disposition::Skipped => self.skipped += 1,
            Disposition::Failed => self.failed += 1,
        }
    }
}

/// Data gathered while walking the states of a single cycle
struct Cycle<C> {
    connection: Option<C>,
    role: Option<Role>,
    controllers: Vec<AutomationController>,
}

impl<C> Cycle<C> {
    fn new() -> Self {
        Self {
            connection: None,
            role: None,
            controllers: Vec::new(),
        }
    }
}

pub struct WatchLoop<D, R> {
    database: D,
    resources: R,
    settings: Settings,
}

impl<D: Database, R: ResourceApi> WatchLoop<D, R> {
    pub fn new(database: D, resources: R, settings: Settings) -> Self {
        Self {
            database,
            resources,
            settings,
        }
    }

    /// Run cycles until `shutdown` resolves. Shutdown interrupts whatever call
    /// or sleep is in flight.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!("Starting watch loop for AutomationControllers");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping watch loop");
                    return;
                }
                _ = async {
                    let delay = self.run_cycle().await;
                    debug!("Next check in {:?}", delay);
                    sleep(delay).await;
                } => {}
            }
        }
    }

    /// Walk one cycle from [`State::ProbeDb`] up to the next [`State::Sleep`]
    /// and return how long to sleep.
    pub async fn run_cycle(&self) -> Duration {
        info!("Checking AutomationControllers and database role...");
        let mut cycle = Cycle::new();
        let mut state = State::ProbeDb;

        loop {
            if let State::Sleep(delay) = state {
                return delay;
            }
            let outcome = self.step(state, &mut cycle).await;
            state = transition(state, outcome, &self.settings);
        }
    }

    async fn step(&self, state: State, cycle: &mut Cycle<D::Connection>) -> Outcome {
        match state {
            State::ProbeDb => {
                let result = self.database.probe().await;
                if let Err(e) = &result {
                    warn!("{}, scaling down AutomationControllers immediately", e);
                }
                Outcome::from(&result)
            }
            State::ConnectDb => match self.database.connect().await {
                Ok(conn) => {
                    cycle.connection = Some(conn);
                    Outcome::Success
                }
                Err(e) => {
                    warn!("{}, scaling down AutomationControllers", e);
                    Outcome::Failure
                }
            },
            State::CheckRole => {
                let Some(mut conn) = cycle.connection.take() else {
                    return Outcome::Failure;
                };
                let result = self.database.check_role(&mut conn).await;
                self.database.release(conn).await;

                match result {
                    Ok(role) => {
                        info!("Database role: {}", role);
                        cycle.role = Some(role);
                        Outcome::Success
                    }
                    Err(e) => {
                        warn!("{}, scaling down AutomationControllers", e);
                        Outcome::Failure
                    }
                }
            }
            State::ListResources => match self.resources.list().await {
                Ok(controllers) => {
                    cycle.controllers = controllers;
                    Outcome::Success
                }
                Err(e) => {
                    error!("{}", e);
                    Outcome::Failure
                }
            },
            State::ReconcileEach => {
                // Without an observed role the database is never trusted as primary
                let role = cycle.role.unwrap_or(Role::Standby);
                let report = self.reconcile_each(role, &cycle.controllers).await;
                info!(
                    patched = report.patched,
                    unchanged = report.unchanged,
                    skipped = report.skipped,
                    failed = report.failed,
                    "Reconciled {} AutomationControllers",
                    cycle.controllers.len()
                );
                Outcome::Success
            }
            State::ScaleAllToZero => {
                let report = self.scale_all_to_zero().await;
                warn!(
                    patched = report.patched,
                    failed = report.failed,
                    "Retrying in {:?}",
                    self.settings.retry_interval
                );
                Outcome::Success
            }
            State::Sleep(_) => Outcome::Success,
        }
    }

    async fn reconcile_each(&self, role: Role, controllers: &[AutomationController]) -> CycleReport {
        let mut report = CycleReport::default();
        for controller in controllers {
            report.record(self.reconcile_controller(role, controller).await);
        }
        report
    }

    #[instrument(skip(self, controller), fields(controller = %controller.name_any()))]
    async fn reconcile_controller(&self, role: Role, controller: &AutomationController) -> Disposition {
        let name = controller.name_any();

        let target = match controller.target_replicas() {
            Ok(target) => target,
            Err(e) => {
                warn!("Skipping: {}", e);
                return Disposition::Skipped;
            }
        };
        let desired = desired_replicas(role, target);

        let current = match controller.observed_replicas() {
            Ok(current) => current,
            Err(e) => {
                error!("Failed to get current replicas: {}", e);
                return Disposition::Failed;
            }
        };

        if current == i64::from(desired) {
            info!("No update needed for {} (replicas already set to {})", name, desired);
            return Disposition::Unchanged;
        }

        match self.resources.patch_replicas(&name, desired).await {
            Ok(()) => {
                info!("Successfully patched {}: spec.replicas = {}", name, desired);
                Disposition::Patched
            }
            Err(e) => {
                error!("{}", e);
                Disposition::Failed
            }
        }
    }

    /// Patch every AutomationController to zero replicas, whatever it declares.
    /// Lists afresh since the database failed before this cycle could list.
    async fn scale_all_to_zero(&self) -> CycleReport {
        let mut report = CycleReport::default();

        let controllers = match self.resources.list().await {
            Ok(controllers) => controllers,
            Err(e) => {
                error!("Cannot scale down: {}", e);
                return report;
            }
        };

        for controller in &controllers {
            let name = controller.name_any();
            match self.resources.patch_replicas(&name, 0).await {
                Ok(()) => {
                    warn!("Scaled down {} to 0 due to database failure", name);
                    report.record(Disposition::Patched);
                }
                Err(e) => {
                    error!("Failed to scale down {}: {}", name, e);
                    report.record(Disposition::Failed);
                }
            }
        }

        report
    }
}
