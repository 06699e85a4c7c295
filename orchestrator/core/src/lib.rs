// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `gang-admission-core` — Gang Admission Coordination
//!
//! Holds the members of a gang in a pending state until a quorum of them has
//! asked for admission, then releases them together.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `GroupState`, keys, decisions, store and pool ports, config, events |
//! | [`application`] | Application | `AdmissionCoordinator`, `AdmissionGate`, bootstrap |
//! | [`infrastructure`] | Infrastructure | in-memory stores, waiting pool, annotation extractor, event bus |
//!
//! ## Key Concepts
//!
//! - **Quorum**: minimum number of simultaneously-waiting members of a gang.
//! - **Release**: once quorum is met, every suspended member of the gang is
//!   allowed through in one pass. A released gang stays released until its
//!   last member departs.
//! - **Depart**: a member leaving tracking (finished, rejected or timed out).
//!   The state of a gang is dropped when nobody is left.
//!
//! State is in memory only and scoped to the process lifetime.

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
