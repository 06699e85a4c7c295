// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod bootstrap;
pub mod coordinator;
pub mod gate;

pub use bootstrap::GangAdmission;
pub use coordinator::AdmissionCoordinator;
pub use gate::{AdmissionGate, AdmissionOutcome};
