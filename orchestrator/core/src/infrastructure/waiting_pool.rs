// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Waiting Pool - in-memory suspension pool
//!
//! Holds one oneshot channel per suspended member. A release pass resolves the
//! channel; the parked member awaits its [`WaitTicket`] with a timeout.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;

use crate::domain::admission::AdmissionRequest;
use crate::domain::group::MemberId;
use crate::domain::suspension::{SuspendedMember, SuspensionPool};

/// Sent to a parked member when it is allowed to proceed
#[derive(Debug, Clone, Copy)]
pub struct AllowSignal {
    pub allowed_at: DateTime<Utc>,
}

#[derive(Debug)]
struct ParkedMember {
    request: AdmissionRequest,
    parked_at: DateTime<Utc>,
    allow_tx: oneshot::Sender<AllowSignal>,
}

/// Handle kept by a parked member
#[derive(Debug)]
pub struct WaitTicket {
    pub member_id: MemberId,
    pub receiver: oneshot::Receiver<AllowSignal>,
}

/// Snapshot of a parked member (for CLI display)
#[derive(Debug, Clone)]
pub struct ParkedMemberInfo {
    pub member_id: MemberId,
    pub name: String,
    pub parked_at: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct InMemoryWaitingPool {
    parked: Arc<Mutex<HashMap<MemberId, ParkedMember>>>,
}

impl InMemoryWaitingPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a request. Parking the same member again replaces the earlier
    /// ticket, whose receiver then observes a closed channel. Member IDs are
    /// not scoped by group, so two groups must never share one.
    pub fn park(&self, request: AdmissionRequest) -> WaitTicket {
        let (allow_tx, receiver) = oneshot::channel();
        let member_id = request.member_id.clone();

        debug!(member = %member_id, name = %request.name, "Parking member");

        self.parked.lock().insert(
            member_id.clone(),
            ParkedMember {
                request,
                parked_at: Utc::now(),
                allow_tx,
            },
        );

        WaitTicket {
            member_id,
            receiver,
        }
    }

    /// Take a member out of the pool without allowing it.
    ///
    /// Returns `false` if it was already allowed or withdrawn.
    pub fn withdraw(&self, member: &MemberId) -> bool {
        self.parked.lock().remove(member).is_some()
    }

    pub fn contains(&self, member: &MemberId) -> bool {
        self.parked.lock().contains_key(member)
    }

    pub fn len(&self) -> usize {
        self.parked.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.parked.lock().is_empty()
    }

    pub fn list_parked(&self) -> Vec<ParkedMemberInfo> {
        let mut parked: Vec<_> = self
            .parked
            .lock()
            .values()
            .map(|p| ParkedMemberInfo {
                member_id: p.request.member_id.clone(),
                name: p.request.name.clone(),
                parked_at: p.parked_at,
            })
            .collect();
        parked.sort_by_key(|p| p.parked_at);
        parked
    }
}

impl SuspensionPool for InMemoryWaitingPool {
    fn suspended(&self) -> Vec<SuspendedMember> {
        self.parked
            .lock()
            .iter()
            .map(|(member_id, p)| SuspendedMember {
                member_id: member_id.clone(),
                request: p.request.clone(),
            })
            .collect()
    }

    fn allow(&self, member: &MemberId) -> bool {
        let Some(parked) = self.parked.lock().remove(member) else {
            return false;
        };

        // Receiver gone means the member stopped waiting; nothing to resume
        parked
            .allow_tx
            .send(AllowSignal {
                allowed_at: Utc::now(),
            })
            .is_ok()
    }
}
