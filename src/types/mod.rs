// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Custom resource types managed by Watchtower.

pub mod automation_controller;

pub use automation_controller::{AutomationController, AutomationControllerSpec};
