// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Bootstrap - Application Layer
//!
//! Wires the store, waiting pool, extractor and event bus into a ready
//! coordinator and gate from a [`GangAdmissionConfig`].

use std::sync::Arc;

use crate::application::coordinator::AdmissionCoordinator;
use crate::application::gate::AdmissionGate;
use crate::domain::config::GangAdmissionConfig;
use crate::infrastructure::annotation_extractor::AnnotationGroupExtractor;
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::repositories::create_group_state_store;
use crate::infrastructure::waiting_pool::InMemoryWaitingPool;

/// Fully wired in-process gang admission
#[derive(Clone)]
pub struct GangAdmission {
    pub coordinator: Arc<AdmissionCoordinator>,
    pub gate: AdmissionGate,
    pub event_bus: EventBus,
}

impl GangAdmission {
    pub fn from_config(config: &GangAdmissionConfig) -> Self {
        let store = create_group_state_store(config.store.backend());
        let pool = InMemoryWaitingPool::new();
        let extractor = Arc::new(AnnotationGroupExtractor::from_config(config));
        let event_bus = EventBus::new(config.event_bus_capacity);

        let coordinator = Arc::new(AdmissionCoordinator::new(
            store,
            Arc::new(pool.clone()),
            extractor.clone(),
            event_bus.clone(),
            config.wait_timeout,
        ));
        let gate = AdmissionGate::new(coordinator.clone(), pool, extractor);

        Self {
            coordinator,
            gate,
            event_bus,
        }
    }
}

impl Default for GangAdmission {
    fn default() -> Self {
        Self::from_config(&GangAdmissionConfig::default())
    }
}
