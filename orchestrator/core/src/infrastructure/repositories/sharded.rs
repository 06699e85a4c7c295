// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Sharded group state store
//!
//! Partitions groups across independent mutexes by key hash. A group always
//! maps to the same shard, so every access to one group is still serialized,
//! while unrelated groups on other shards proceed in parallel.

use parking_lot::Mutex;
use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;

use super::GroupMap;
use crate::domain::group::{GroupKey, GroupState};
use crate::domain::repository::{GroupStateGuard, GroupStateStore};

pub struct ShardedGroupStateStore {
    shards: Vec<Mutex<GroupMap>>,
    hasher: RandomState,
}

impl ShardedGroupStateStore {
    /// `shards` is clamped to at least one.
    pub fn new(shards: usize) -> Self {
        let shards = (0..shards.max(1))
            .map(|_| Mutex::new(GroupMap::new()))
            .collect();

        Self {
            shards,
            hasher: RandomState::new(),
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard(&self, key: &GroupKey) -> &Mutex<GroupMap> {
        let index = (self.hasher.hash_one(key) % self.shards.len() as u64) as usize;
        &self.shards[index]
    }
}

impl GroupStateStore for ShardedGroupStateStore {
    fn lock(&self, key: &GroupKey) -> Box<dyn GroupStateGuard + '_> {
        Box::new(self.shard(key).lock())
    }

    fn snapshot(&self, key: &GroupKey) -> Option<GroupState> {
        self.shard(key).lock().get(key).cloned()
    }

    fn tracked_groups(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::group::Quorum;

    #[test]
    fn test_zero_shards_clamped() {
        assert_eq!(ShardedGroupStateStore::new(0).shard_count(), 1);
    }

    #[test]
    fn test_groups_spread_and_counted() {
        let store = ShardedGroupStateStore::new(8);
        let quorum = Quorum::new(2).unwrap();

        for i in 0..32 {
            let key = GroupKey::new("default", &format!("gang-{}", i));
            let mut guard = store.lock(&key);
            guard.get_or_create(&key, quorum).state.insert_waiting("m".into());
        }

        assert_eq!(store.tracked_groups(), 32);
        let key = GroupKey::new("default", "gang-7");
        assert_eq!(store.snapshot(&key).unwrap().waiting_count(), 1);
    }
}
