// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Gang Group Aggregate
//!
//! Pure domain types for gang admission:
//!
//! - [`GroupKey`] — opaque identifier of a gang, unique per (namespace, group).
//! - [`MemberId`] — identifier of a single member request (pod UID style).
//! - [`Quorum`] — positive minimum number of simultaneously-waiting members.
//! - [`GroupState`] — in-flight admission state of one group.
//!
//! `GroupState` is owned exclusively by a [`GroupStateStore`](crate::domain::repository::GroupStateStore);
//! callers only ever see clones of it through snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

use crate::domain::admission::MetadataError;

/// Identifier of a gang, formatted as `namespace/group`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey(String);

impl GroupKey {
    /// Build the key for `group` inside `namespace`.
    pub fn new(namespace: &str, group: &str) -> Self {
        Self(format!("{}/{}", namespace, group))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for GroupKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identifier of a member request.
///
/// Must be unique across all groups: the waiting pool is keyed by it alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    /// Generate a new random `MemberId`.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for MemberId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Minimum number of simultaneously-waiting members required to release a group.
///
/// Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quorum(u32);

impl Quorum {
    /// Returns `None` for zero.
    pub fn new(value: u32) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Quorum {
    type Error = MetadataError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(MetadataError::InvalidQuorum {
            value: value.to_string(),
        })
    }
}

impl From<Quorum> for u32 {
    fn from(quorum: Quorum) -> Self {
        quorum.0
    }
}

impl fmt::Display for Quorum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Observable phase of a tracked group.
///
/// `Unseen` is represented by the absence of a [`GroupState`] in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupPhase {
    Waiting,
    Released,
}

/// In-flight admission state of one gang.
///
/// # Invariants
///
/// - `waiting` holds each member at most once.
/// - `released` never goes back to `false`.
/// - A state whose `waiting` set is empty is removed by its store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupState {
    key: GroupKey,
    quorum: Quorum,
    waiting: HashSet<MemberId>,
    released: bool,
    created_at: DateTime<Utc>,
    released_at: Option<DateTime<Utc>>,
}

impl GroupState {
    pub fn new(key: GroupKey, quorum: Quorum) -> Self {
        Self {
            key,
            quorum,
            waiting: HashSet::new(),
            released: false,
            created_at: Utc::now(),
            released_at: None,
        }
    }

    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    pub fn quorum(&self) -> Quorum {
        self.quorum
    }

    pub fn waiting(&self) -> &HashSet<MemberId> {
        &self.waiting
    }

    pub fn waiting_count(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_waiting(&self, member: &MemberId) -> bool {
        self.waiting.contains(member)
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn released_at(&self) -> Option<DateTime<Utc>> {
        self.released_at
    }

    pub fn phase(&self) -> GroupPhase {
        if self.released {
            GroupPhase::Released
        } else {
            GroupPhase::Waiting
        }
    }

    /// Last-write-wins quorum reconciliation.
    ///
    /// Returns the previous quorum when it differed from `quorum`. Members that
    /// registered under the old value are not consulted.
    pub fn reconcile_quorum(&mut self, quorum: Quorum) -> Option<Quorum> {
        if self.quorum == quorum {
            return None;
        }
        Some(std::mem::replace(&mut self.quorum, quorum))
    }

    /// Idempotent insert. Returns `true` when the member was not yet waiting.
    pub fn insert_waiting(&mut self, member: MemberId) -> bool {
        self.waiting.insert(member)
    }

    /// Returns `true` when the member was waiting.
    pub fn remove_waiting(&mut self, member: &MemberId) -> bool {
        self.waiting.remove(member)
    }

    pub fn is_quorum_met(&self) -> bool {
        self.waiting.len() >= self.quorum.get() as usize
    }

    /// Number of members still needed before the quorum is met.
    pub fn missing(&self) -> usize {
        (self.quorum.get() as usize).saturating_sub(self.waiting.len())
    }

    /// Nobody is tracked anymore; the store drops the state.
    pub fn is_drained(&self) -> bool {
        self.waiting.is_empty()
    }

    /// Flip to `Released` and return the waiting set as it is at this moment.
    pub fn mark_released(&mut self) -> HashSet<MemberId> {
        self.released = true;
        self.released_at = Some(Utc::now());
        self.waiting.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quorum(n: u32) -> Quorum {
        Quorum::new(n).unwrap()
    }

    #[test]
    fn test_group_key_format() {
        let key = GroupKey::new("default", "trainer");
        assert_eq!(key.as_str(), "default/trainer");
        assert_eq!(key.to_string(), "default/trainer");
    }

    #[test]
    fn test_quorum_rejects_zero() {
        assert!(Quorum::new(0).is_none());
        assert_eq!(Quorum::new(4).map(Quorum::get), Some(4));
        assert!(Quorum::try_from(0).is_err());
    }

    #[test]
    fn test_quorum_deserialize_rejects_zero() {
        assert!(serde_json::from_str::<Quorum>("0").is_err());
        assert_eq!(serde_json::from_str::<Quorum>("3").unwrap(), quorum(3));
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut state = GroupState::new("ns/g".into(), quorum(2));
        assert!(state.insert_waiting("a".into()));
        assert!(!state.insert_waiting("a".into()));
        assert_eq!(state.waiting_count(), 1);
        assert!(!state.is_quorum_met());
        assert_eq!(state.missing(), 1);
    }

    #[test]
    fn test_reconcile_quorum_last_write_wins() {
        let mut state = GroupState::new("ns/g".into(), quorum(3));
        assert_eq!(state.reconcile_quorum(quorum(3)), None);
        assert_eq!(state.reconcile_quorum(quorum(5)), Some(quorum(3)));
        assert_eq!(state.quorum(), quorum(5));
    }

    #[test]
    fn test_mark_released_is_sticky() {
        let mut state = GroupState::new("ns/g".into(), quorum(1));
        state.insert_waiting("a".into());
        assert_eq!(state.phase(), GroupPhase::Waiting);

        let snapshot = state.mark_released();
        assert!(snapshot.contains(&MemberId::from("a")));
        assert_eq!(state.phase(), GroupPhase::Released);
        assert!(state.released_at().is_some());

        state.remove_waiting(&"a".into());
        assert!(state.is_released());
        assert!(state.is_drained());
    }
}
