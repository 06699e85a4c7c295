// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Admission Coordinator - Application Layer
//!
//! Decides for each admission request whether the member waits or proceeds,
//! and drives the quorum release protocol.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Orchestrates the group state store, the suspension pool and
//!   the metadata extractor
//!
//! # Locking
//!
//! The check-and-release decision runs under the store guard for the group,
//! so two concurrent joiners can neither both miss the quorum nor both
//! trigger a release. The waiting set is copied before the guard drops; the
//! suspension pool is enumerated afterwards so a slow pool never stalls other
//! groups.
//!
//! Lifecycle events are published while the guard is held, so for one group
//! they reach subscribers in the order the store applied them.
//! `GroupReleased` is the exception: it follows the release pass and may
//! trail departures of members that were already allowed.
//!
//! # Quorum reconciliation
//!
//! Every request reconciles the stored quorum to its own value, last write
//! wins. Members that disagree are not consulted, and concurrent requests
//! carrying different values leave the effective quorum at whichever guard
//! ran last. This is tolerated, not corrected.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::admission::{AdmissionDecision, GroupMetadataExtractor};
use crate::domain::events::GangEvent;
use crate::domain::group::{GroupKey, GroupState, MemberId, Quorum};
use crate::domain::repository::GroupStateStore;
use crate::domain::suspension::SuspensionPool;
use crate::infrastructure::event_bus::EventBus;

pub struct AdmissionCoordinator {
    store: Arc<dyn GroupStateStore>,
    pool: Arc<dyn SuspensionPool>,
    extractor: Arc<dyn GroupMetadataExtractor>,
    event_bus: EventBus,
    wait_timeout: Duration,
}

impl AdmissionCoordinator {
    pub fn new(
        store: Arc<dyn GroupStateStore>,
        pool: Arc<dyn SuspensionPool>,
        extractor: Arc<dyn GroupMetadataExtractor>,
        event_bus: EventBus,
        wait_timeout: Duration,
    ) -> Self {
        Self {
            store,
            pool,
            extractor,
            event_bus,
            wait_timeout,
        }
    }

    pub fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    /// Record `member` as waiting for `group` and decide its fate.
    ///
    /// Re-requesting with the same member never counts twice. Once a group is
    /// released every further request proceeds immediately, even if the
    /// waiting set has since dropped below quorum.
    pub fn request_admission(
        &self,
        group: &GroupKey,
        member: &MemberId,
        quorum: Quorum,
    ) -> AdmissionDecision {
        let now = Utc::now();

        let (decision, release) = {
            let mut events = Vec::new();
            let mut guard = self.store.lock(group);
            let entry = guard.get_or_create(group, quorum);

            if entry.created {
                metrics::gauge!("gang_admission_tracked_groups").increment(1.0);
                events.push(GangEvent::GroupCreated {
                    group: group.clone(),
                    quorum,
                    created_at: now,
                });
            }

            if let Some(previous) = entry.previous_quorum {
                warn!(
                    group = %group,
                    member = %member,
                    previous = %previous,
                    current = %quorum,
                    "Reconciled gang quorum to the latest request"
                );
                events.push(GangEvent::QuorumReconciled {
                    group: group.clone(),
                    previous,
                    current: quorum,
                    reconciled_at: now,
                });
            }

            let state = entry.state;
            state.insert_waiting(member.clone());

            let outcome = if state.is_released() {
                debug!(group = %group, member = %member, "Gang already released; admitting late member");
                (AdmissionDecision::Proceed, None)
            } else if state.is_quorum_met() {
                let mut members = state.mark_released();
                let member_count = members.len();
                // The requester proceeds on its own decision
                members.remove(member);
                (AdmissionDecision::Proceed, Some((member_count, members)))
            } else {
                let missing = state.missing();
                debug!(
                    group = %group,
                    member = %member,
                    quorum = %state.quorum(),
                    waiting = state.waiting_count(),
                    "Holding member for gang"
                );
                events.push(GangEvent::MemberWaiting {
                    group: group.clone(),
                    member: member.clone(),
                    waiting: state.waiting_count(),
                    quorum: state.quorum(),
                    queued_at: now,
                });
                (
                    AdmissionDecision::Wait {
                        timeout: self.wait_timeout,
                        missing,
                    },
                    None,
                )
            };

            self.publish_all(events);
            outcome
        };

        if let Some((member_count, members)) = release {
            let allowed = self.release(group, &members);
            info!(
                group = %group,
                waiting = member_count,
                allowed,
                "Releasing gang"
            );
            metrics::counter!("gang_admission_releases_total").increment(1);
            metrics::counter!("gang_admission_released_members_total").increment(allowed as u64);
            self.event_bus.publish(GangEvent::GroupReleased {
                group: group.clone(),
                member_count,
                allowed,
                released_at: Utc::now(),
            });
        }

        let label = if decision.is_proceed() { "proceed" } else { "wait" };
        metrics::counter!("gang_admission_requests_total", "decision" => label).increment(1);

        decision
    }

    /// Stop tracking `member`. Drops the group once nobody is left.
    ///
    /// Unknown groups and members are ignored, so calling this twice is safe.
    pub fn depart(&self, group: &GroupKey, member: &MemberId) {
        let now = Utc::now();

        {
            let mut guard = self.store.lock(group);
            let Some(state) = guard.get_mut(group) else {
                return;
            };
            if !state.remove_waiting(member) {
                return;
            }

            let remaining = state.waiting_count();
            let released = state.is_released();
            if state.is_drained() {
                guard.remove(group);
            }

            let mut events = vec![GangEvent::MemberDeparted {
                group: group.clone(),
                member: member.clone(),
                remaining,
                departed_at: now,
            }];
            if remaining == 0 {
                events.push(GangEvent::GroupDissolved {
                    group: group.clone(),
                    released,
                    dissolved_at: now,
                });
            }
            self.publish_all(events);

            debug!(group = %group, member = %member, remaining, "Member departed gang");
            if remaining == 0 {
                debug!(group = %group, released, "Gang drained; dropping state");
                metrics::gauge!("gang_admission_tracked_groups").decrement(1.0);
            }
        }

        metrics::counter!("gang_admission_departures_total").increment(1);
    }

    /// Current state of a group, if tracked.
    pub fn group_snapshot(&self, group: &GroupKey) -> Option<GroupState> {
        self.store.snapshot(group)
    }

    pub fn tracked_groups(&self) -> usize {
        self.store.tracked_groups()
    }

    /// Allow every suspended member of `group` that was waiting when the
    /// quorum was met. Members missing from the pool are skipped.
    fn release(&self, group: &GroupKey, members: &HashSet<MemberId>) -> usize {
        if members.is_empty() {
            return 0;
        }

        let mut allowed = 0;
        for suspended in self.pool.suspended() {
            let Some(info) = self.extractor.extract(&suspended.request) else {
                continue;
            };
            if &info.key != group || !members.contains(&suspended.member_id) {
                continue;
            }
            if self.pool.allow(&suspended.member_id) {
                allowed += 1;
            } else {
                debug!(group = %group, member = %suspended.member_id, "Member left the pool before release");
            }
        }

        allowed
    }

    fn publish_all(&self, events: Vec<GangEvent>) {
        for event in events {
            self.event_bus.publish(event);
        }
    }
}
