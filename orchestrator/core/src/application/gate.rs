// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Admission Gate - Application Layer
//!
//! Embedding-side lifecycle driver around the [`AdmissionCoordinator`]. It
//! plays the role a host scheduler plays: park the request, ask for a
//! decision, suspend until released or timed out, and report departure.
//!
//! | Hook | Coordinator call |
//! |------|------------------|
//! | [`AdmissionGate::admit`] | `request_admission`, then `depart` on timeout |
//! | [`AdmissionGate::complete`] | `depart` after the member finished |
//! | [`AdmissionGate::reject`] | `depart` after the member was rejected downstream |
//!
//! The request is parked before the coordinator decides, so a release
//! triggered by a concurrent joiner always finds it in the pool.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::application::coordinator::AdmissionCoordinator;
use crate::domain::admission::{AdmissionDecision, AdmissionRequest, GroupMetadataExtractor};
use crate::domain::group::{GroupKey, MemberId};
use crate::infrastructure::waiting_pool::InMemoryWaitingPool;

/// How an admission attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionOutcome {
    /// Request carries no gang metadata and proceeds unconditionally
    Bypassed,
    /// Member may start
    Admitted {
        group: GroupKey,
        /// Admitted on its own request rather than by another member's release
        immediate: bool,
    },
    /// Wait expired before the gang reached quorum; the member was departed
    TimedOut { group: GroupKey },
    /// The same member was parked again by a newer attempt, which now owns it
    Superseded { group: GroupKey },
}

impl AdmissionOutcome {
    pub fn is_admitted(&self) -> bool {
        matches!(self, AdmissionOutcome::Admitted { .. } | AdmissionOutcome::Bypassed)
    }
}

#[derive(Clone)]
pub struct AdmissionGate {
    coordinator: Arc<AdmissionCoordinator>,
    pool: InMemoryWaitingPool,
    extractor: Arc<dyn GroupMetadataExtractor>,
}

impl AdmissionGate {
    pub fn new(
        coordinator: Arc<AdmissionCoordinator>,
        pool: InMemoryWaitingPool,
        extractor: Arc<dyn GroupMetadataExtractor>,
    ) -> Self {
        Self {
            coordinator,
            pool,
            extractor,
        }
    }

    pub fn coordinator(&self) -> &Arc<AdmissionCoordinator> {
        &self.coordinator
    }

    pub fn pool(&self) -> &InMemoryWaitingPool {
        &self.pool
    }

    /// Run one admission attempt to completion.
    pub async fn admit(&self, request: AdmissionRequest) -> AdmissionOutcome {
        let Some(info) = self.extractor.extract(&request) else {
            debug!(member = %request.member_id, "Request does not participate in gang admission");
            return AdmissionOutcome::Bypassed;
        };

        let member = request.member_id.clone();
        let mut ticket = self.pool.park(request);

        match self.coordinator.request_admission(&info.key, &member, info.quorum) {
            AdmissionDecision::Proceed => {
                self.pool.withdraw(&member);
                AdmissionOutcome::Admitted {
                    group: info.key,
                    immediate: true,
                }
            }
            AdmissionDecision::Wait { timeout, missing } => {
                debug!(group = %info.key, member = %member, missing, "Suspending member");

                match tokio::time::timeout(timeout, &mut ticket.receiver).await {
                    Ok(Ok(_signal)) => AdmissionOutcome::Admitted {
                        group: info.key,
                        immediate: false,
                    },
                    Ok(Err(_)) => {
                        debug!(group = %info.key, member = %member, "Admission attempt superseded");
                        AdmissionOutcome::Superseded { group: info.key }
                    }
                    Err(_) => {
                        if self.pool.withdraw(&member) {
                            self.expire(&info.key, &member);
                            return AdmissionOutcome::TimedOut { group: info.key };
                        }
                        // Allowed between the deadline and the withdraw
                        match ticket.receiver.await {
                            Ok(_) => AdmissionOutcome::Admitted {
                                group: info.key,
                                immediate: false,
                            },
                            Err(_) => AdmissionOutcome::Superseded { group: info.key },
                        }
                    }
                }
            }
        }
    }

    /// The member finished; stop tracking it.
    pub fn complete(&self, request: &AdmissionRequest) {
        self.depart(request);
    }

    /// The member was rejected after admission; stop tracking it.
    pub fn reject(&self, request: &AdmissionRequest) {
        self.pool.withdraw(&request.member_id);
        self.depart(request);
    }

    fn depart(&self, request: &AdmissionRequest) {
        if let Some(info) = self.extractor.extract(request) {
            self.coordinator.depart(&info.key, &request.member_id);
        }
    }

    fn expire(&self, group: &GroupKey, member: &MemberId) {
        warn!(group = %group, member = %member, "Gang wait expired; departing member");
        self.coordinator.depart(group, member);
    }
}
