// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for CRD discovery and AutomationController access.

pub mod crd;
pub mod resources;

pub use crd::wait_for_automation_controller_crd;
pub use resources::{KubeResources, ResourceApi};
