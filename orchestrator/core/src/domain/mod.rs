// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Gang Admission Domain Layer
//!
//! Pure domain types and ports. No I/O beyond configuration file loading.
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`group`] | `GroupKey`, `MemberId`, `Quorum`, `GroupState` |
//! | [`admission`] | `AdmissionRequest`, `AdmissionDecision`, `GroupMetadataExtractor` |
//! | [`repository`] | `GroupStateStore`, `GroupStateGuard` |
//! | [`suspension`] | `SuspensionPool`, `SuspendedMember` |
//! | [`events`] | `GangEvent` |
//! | [`config`] | `GangAdmissionConfig` |

pub mod admission;
pub mod config;
pub mod events;
pub mod group;
pub mod repository;
pub mod suspension;

pub use admission::{AdmissionDecision, AdmissionRequest, GroupInfo, GroupMetadataExtractor, MetadataError};
pub use config::GangAdmissionConfig;
pub use events::GangEvent;
pub use group::{GroupKey, GroupPhase, GroupState, MemberId, Quorum};
pub use repository::{GroupStateGuard, GroupStateStore, StoreBackend};
pub use suspension::{SuspendedMember, SuspensionPool};
