// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Annotation-based group metadata extraction
//!
//! A request joins a gang when it carries both the group annotation and a
//! positive integer quorum annotation. The group key is `namespace/group`.

use tracing::debug;

use crate::domain::admission::{
    AdmissionRequest, GroupInfo, GroupMetadataExtractor, MetadataError,
};
use crate::domain::config::{
    GangAdmissionConfig, DEFAULT_GROUP_ANNOTATION, DEFAULT_MIN_AVAILABLE_ANNOTATION,
};
use crate::domain::group::{GroupKey, Quorum};

#[derive(Debug, Clone)]
pub struct AnnotationGroupExtractor {
    group_annotation: String,
    min_available_annotation: String,
}

impl AnnotationGroupExtractor {
    pub fn new(group_annotation: impl Into<String>, min_available_annotation: impl Into<String>) -> Self {
        Self {
            group_annotation: group_annotation.into(),
            min_available_annotation: min_available_annotation.into(),
        }
    }

    pub fn from_config(config: &GangAdmissionConfig) -> Self {
        Self::new(&config.group_annotation, &config.min_available_annotation)
    }

    pub fn parse(&self, request: &AdmissionRequest) -> Result<GroupInfo, MetadataError> {
        let group = request
            .annotation(&self.group_annotation)
            .filter(|g| !g.is_empty())
            .ok_or_else(|| MetadataError::MissingGroup {
                annotation: self.group_annotation.clone(),
            })?;

        let raw = request
            .annotation(&self.min_available_annotation)
            .ok_or_else(|| MetadataError::MissingQuorum {
                annotation: self.min_available_annotation.clone(),
            })?;

        let quorum = raw
            .trim()
            .parse::<u32>()
            .ok()
            .and_then(Quorum::new)
            .ok_or_else(|| MetadataError::InvalidQuorum {
                value: raw.to_string(),
            })?;

        Ok(GroupInfo {
            key: GroupKey::new(&request.namespace, group),
            quorum,
        })
    }
}

impl Default for AnnotationGroupExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_GROUP_ANNOTATION, DEFAULT_MIN_AVAILABLE_ANNOTATION)
    }
}

impl GroupMetadataExtractor for AnnotationGroupExtractor {
    fn extract(&self, request: &AdmissionRequest) -> Option<GroupInfo> {
        match self.parse(request) {
            Ok(info) => Some(info),
            Err(e @ MetadataError::InvalidQuorum { .. }) => {
                debug!(
                    member = %request.member_id,
                    name = %request.name,
                    error = %e,
                    "Invalid quorum annotation; ignoring gang admission"
                );
                None
            }
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(group: Option<&str>, quorum: Option<&str>) -> AdmissionRequest {
        let mut request = AdmissionRequest::new("team-a", "worker-0");
        if let Some(group) = group {
            request = request.with_annotation(DEFAULT_GROUP_ANNOTATION, group);
        }
        if let Some(quorum) = quorum {
            request = request.with_annotation(DEFAULT_MIN_AVAILABLE_ANNOTATION, quorum);
        }
        request
    }

    #[test]
    fn test_extracts_namespaced_key() {
        let extractor = AnnotationGroupExtractor::default();
        let info = extractor.extract(&request(Some("trainer"), Some("4"))).unwrap();

        assert_eq!(info.key.as_str(), "team-a/trainer");
        assert_eq!(info.quorum.get(), 4);
    }

    #[test]
    fn test_non_participating_requests() {
        let extractor = AnnotationGroupExtractor::default();

        assert!(matches!(
            extractor.parse(&request(None, Some("2"))),
            Err(MetadataError::MissingGroup { .. })
        ));
        assert!(matches!(
            extractor.parse(&request(Some(""), Some("2"))),
            Err(MetadataError::MissingGroup { .. })
        ));
        assert!(matches!(
            extractor.parse(&request(Some("g"), None)),
            Err(MetadataError::MissingQuorum { .. })
        ));

        for bad in ["0", "-3", "three", ""] {
            assert_eq!(
                extractor.parse(&request(Some("g"), Some(bad))),
                Err(MetadataError::InvalidQuorum {
                    value: bad.to_string()
                })
            );
            assert!(extractor.extract(&request(Some("g"), Some(bad))).is_none());
        }
    }

    #[test]
    fn test_custom_annotation_keys() {
        let extractor = AnnotationGroupExtractor::new("example.com/gang", "example.com/size");
        let request = AdmissionRequest::new("ns", "p")
            .with_annotation("example.com/gang", "g")
            .with_annotation("example.com/size", "2");

        assert_eq!(extractor.extract(&request).unwrap().key.as_str(), "ns/g");
    }
}
