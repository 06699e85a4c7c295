// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod annotation_extractor;
pub mod event_bus;
pub mod repositories;
pub mod waiting_pool;

pub use annotation_extractor::AnnotationGroupExtractor;
pub use event_bus::{EventBus, EventBusError};
pub use repositories::{InMemoryGroupStateStore, ShardedGroupStateStore};
pub use waiting_pool::InMemoryWaitingPool;
