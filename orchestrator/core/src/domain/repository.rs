// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Group State Store Interface
//!
//! Storage contract for the [`GroupState`] aggregate. The interface lives in
//! the domain layer and is implemented in `crate::infrastructure::repositories`.
//!
//! | Implementation | Locking |
//! |----------------|---------|
//! | `InMemoryGroupStateStore` | one global mutex over every group |
//! | `ShardedGroupStateStore` | one mutex per key partition |
//!
//! Access goes through [`GroupStateStore::lock`], which returns a guard over
//! the partition holding `key`. Everything done through one guard is atomic
//! with respect to every other access to the same group, which is what lets
//! the coordinator run its check-and-release sequence without lost wakeups.

use crate::domain::group::{GroupKey, GroupState, Quorum};

/// Store backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Global,
    Sharded { shards: usize },
}

/// Result of [`GroupStateGuard::get_or_create`].
pub struct GroupEntry<'a> {
    pub state: &'a mut GroupState,
    /// The state did not exist before this call.
    pub created: bool,
    /// Quorum replaced by reconciliation, if it changed.
    pub previous_quorum: Option<Quorum>,
}

/// Exclusive access to the partition of the store that holds a key.
pub trait GroupStateGuard {
    /// Existing state reconciled to `quorum`, or a fresh one.
    fn get_or_create(&mut self, key: &GroupKey, quorum: Quorum) -> GroupEntry<'_>;

    fn get_mut(&mut self, key: &GroupKey) -> Option<&mut GroupState>;

    /// No-op when absent.
    fn remove(&mut self, key: &GroupKey) -> Option<GroupState>;
}

/// Concurrency-safe mapping from group key to [`GroupState`].
pub trait GroupStateStore: Send + Sync {
    /// Lock the partition holding `key`. Released when the guard drops.
    fn lock(&self, key: &GroupKey) -> Box<dyn GroupStateGuard + '_>;

    /// Clone of the current state, if tracked.
    fn snapshot(&self, key: &GroupKey) -> Option<GroupState>;

    /// Number of groups currently tracked.
    fn tracked_groups(&self) -> usize;
}
