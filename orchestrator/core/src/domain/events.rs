// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::group::{GroupKey, MemberId, Quorum};

/// Gang admission lifecycle events
///
/// Published by the admission coordinator while it holds the group's store
/// guard, so one group's events arrive in the order its state changed.
/// `GroupReleased` is published after the release pass and can follow
/// `MemberDeparted` events of members it already allowed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GangEvent {
    GroupCreated {
        group: GroupKey,
        quorum: Quorum,
        created_at: DateTime<Utc>,
    },
    QuorumReconciled {
        group: GroupKey,
        previous: Quorum,
        current: Quorum,
        reconciled_at: DateTime<Utc>,
    },
    MemberWaiting {
        group: GroupKey,
        member: MemberId,
        waiting: usize,
        quorum: Quorum,
        queued_at: DateTime<Utc>,
    },
    GroupReleased {
        group: GroupKey,
        /// Size of the waiting set when quorum was met.
        member_count: usize,
        /// Suspended members actually allowed by the release pass.
        allowed: usize,
        released_at: DateTime<Utc>,
    },
    MemberDeparted {
        group: GroupKey,
        member: MemberId,
        remaining: usize,
        departed_at: DateTime<Utc>,
    },
    GroupDissolved {
        group: GroupKey,
        /// Whether the group had been released before it drained.
        released: bool,
        dissolved_at: DateTime<Utc>,
    },
}

impl GangEvent {
    pub fn group(&self) -> &GroupKey {
        match self {
            GangEvent::GroupCreated { group, .. }
            | GangEvent::QuorumReconciled { group, .. }
            | GangEvent::MemberWaiting { group, .. }
            | GangEvent::GroupReleased { group, .. }
            | GangEvent::MemberDeparted { group, .. }
            | GangEvent::GroupDissolved { group, .. } => group,
        }
    }
}
