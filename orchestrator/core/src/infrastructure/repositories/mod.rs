// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Group State Store Implementations
//!
//! Infrastructure implementations of the
//! [`GroupStateStore`](crate::domain::repository::GroupStateStore) contract.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Own every in-flight `GroupState` and serialize access to it
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! - **InMemoryGroupStateStore** - single `parking_lot::Mutex` over all groups
//! - **ShardedGroupStateStore** - one mutex per key partition, same per-group atomicity
//!
//! State is process-local and is lost on restart.

pub mod sharded;

use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::group::{GroupKey, GroupState, Quorum};
use crate::domain::repository::{
    GroupEntry, GroupStateGuard, GroupStateStore, StoreBackend,
};

pub use sharded::ShardedGroupStateStore;

pub(crate) type GroupMap = HashMap<GroupKey, GroupState>;

impl GroupStateGuard for MutexGuard<'_, GroupMap> {
    fn get_or_create(&mut self, key: &GroupKey, quorum: Quorum) -> GroupEntry<'_> {
        let mut created = false;
        let state = self.entry(key.clone()).or_insert_with(|| {
            created = true;
            GroupState::new(key.clone(), quorum)
        });
        let previous_quorum = state.reconcile_quorum(quorum);

        GroupEntry {
            state,
            created,
            previous_quorum,
        }
    }

    fn get_mut(&mut self, key: &GroupKey) -> Option<&mut GroupState> {
        HashMap::get_mut(self, key)
    }

    fn remove(&mut self, key: &GroupKey) -> Option<GroupState> {
        HashMap::remove(self, key)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryGroupStateStore {
    groups: Arc<Mutex<GroupMap>>,
}

impl InMemoryGroupStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GroupStateStore for InMemoryGroupStateStore {
    fn lock(&self, _key: &GroupKey) -> Box<dyn GroupStateGuard + '_> {
        Box::new(self.groups.lock())
    }

    fn snapshot(&self, key: &GroupKey) -> Option<GroupState> {
        self.groups.lock().get(key).cloned()
    }

    fn tracked_groups(&self) -> usize {
        self.groups.lock().len()
    }
}

/// Creates a GroupStateStore implementation based on the configured backend
pub fn create_group_state_store(backend: StoreBackend) -> Arc<dyn GroupStateStore> {
    match backend {
        StoreBackend::Global => Arc::new(InMemoryGroupStateStore::new()),
        StoreBackend::Sharded { shards } => Arc::new(ShardedGroupStateStore::new(shards)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quorum(n: u32) -> Quorum {
        Quorum::new(n).unwrap()
    }

    fn exercise_store(store: &dyn GroupStateStore) {
        let key = GroupKey::new("default", "g1");

        {
            let mut guard = store.lock(&key);
            let entry = guard.get_or_create(&key, quorum(3));
            assert!(entry.created);
            assert_eq!(entry.previous_quorum, None);
            entry.state.insert_waiting("a".into());
        }
        assert_eq!(store.tracked_groups(), 1);

        {
            let mut guard = store.lock(&key);
            let entry = guard.get_or_create(&key, quorum(5));
            assert!(!entry.created);
            assert_eq!(entry.previous_quorum, Some(quorum(3)));
            assert_eq!(entry.state.waiting_count(), 1);
        }

        let snapshot = store.snapshot(&key).unwrap();
        assert_eq!(snapshot.quorum(), quorum(5));

        {
            let mut guard = store.lock(&key);
            assert!(guard.remove(&key).is_some());
            assert!(guard.remove(&key).is_none());
            assert!(guard.get_mut(&key).is_none());
        }
        assert_eq!(store.tracked_groups(), 0);
        assert!(store.snapshot(&key).is_none());
    }

    #[test]
    fn test_in_memory_store() {
        exercise_store(&InMemoryGroupStateStore::new());
    }

    #[test]
    fn test_sharded_store() {
        exercise_store(&ShardedGroupStateStore::new(4));
    }

    #[test]
    fn test_factory_backends() {
        let global = create_group_state_store(StoreBackend::Global);
        let sharded = create_group_state_store(StoreBackend::Sharded { shards: 2 });
        exercise_store(global.as_ref());
        exercise_store(sharded.as_ref());
    }
}
