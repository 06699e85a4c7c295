// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Admission Requests and Decisions
//!
//! Boundary types between the embedding scheduler and the admission core:
//!
//! - [`AdmissionRequest`] — the originating request of a member (metadata only).
//! - [`GroupInfo`] — group identity and quorum extracted from a request.
//! - [`GroupMetadataExtractor`] — port deciding whether a request takes part in
//!   gang admission at all.
//! - [`AdmissionDecision`] — outcome of one admission attempt.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::domain::group::{GroupKey, MemberId, Quorum};

/// Metadata of a request asking to be admitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionRequest {
    pub member_id: MemberId,
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

impl AdmissionRequest {
    /// New request with a freshly generated member ID and no annotations.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            member_id: MemberId::generate(),
            namespace: namespace.into(),
            name: name.into(),
            annotations: HashMap::new(),
        }
    }

    pub fn with_member_id(mut self, member_id: impl Into<MemberId>) -> Self {
        self.member_id = member_id.into();
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }
}

/// Group identity and quorum of a participating request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    pub key: GroupKey,
    pub quorum: Quorum,
}

/// Why a request does not take part in gang admission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    #[error("request carries no group annotation '{annotation}'")]
    MissingGroup { annotation: String },

    #[error("request carries no quorum annotation '{annotation}'")]
    MissingQuorum { annotation: String },

    #[error("invalid quorum value '{value}': must be a positive integer")]
    InvalidQuorum { value: String },
}

/// Port for extracting gang metadata from a request.
///
/// `None` means the request bypasses the coordinator and proceeds
/// unconditionally. Malformed metadata (empty group, non-positive or
/// unparseable quorum) must also yield `None`.
pub trait GroupMetadataExtractor: Send + Sync {
    fn extract(&self, request: &AdmissionRequest) -> Option<GroupInfo>;
}

/// Outcome of a single admission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// The member may proceed now.
    Proceed,
    /// The member must stay suspended until released or until `timeout` elapses.
    Wait {
        timeout: Duration,
        /// Members the group still needs, counted at decision time.
        missing: usize,
    },
}

impl AdmissionDecision {
    pub fn is_proceed(&self) -> bool {
        matches!(self, AdmissionDecision::Proceed)
    }

    pub fn is_wait(&self) -> bool {
        matches!(self, AdmissionDecision::Wait { .. })
    }
}
