// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Suspension pool port
//!
//! The pool of currently-suspended members is owned by the embedding
//! scheduler. The coordinator only enumerates it and allows members through
//! during a release pass.

use crate::domain::admission::AdmissionRequest;
use crate::domain::group::MemberId;

/// A member parked in the pool, with its originating request.
#[derive(Debug, Clone)]
pub struct SuspendedMember {
    pub member_id: MemberId,
    pub request: AdmissionRequest,
}

pub trait SuspensionPool: Send + Sync {
    /// Every member suspended at call time.
    fn suspended(&self) -> Vec<SuspendedMember>;

    /// Let a suspended member proceed.
    ///
    /// Returns `false` when the member is no longer suspended (already
    /// resumed, timed out, or withdrawn).
    fn allow(&self, member: &MemberId) -> bool;
}
