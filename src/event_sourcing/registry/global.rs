use once_cell::sync::Lazy;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::event_sourcing::core::{Aggregate, AggregateError, AggregateRoot, AggregateRootBase, AggregateType};
use super::aggregate_registry::{construct, AggregateRegistry};

// ============================================================================
// Process-Wide Registry
// ============================================================================
//
// One table per process, filled during startup and read afterwards. Writers
// take the lock exclusively; call `seal_registry` once startup is done.
// Constructors run after the lock is released, so they may call back in.
//
// ============================================================================

static REGISTRY: Lazy<RwLock<AggregateRegistry>> = Lazy::new(|| RwLock::new(AggregateRegistry::new()));

pub fn register_aggregate<A, F>(aggregate_type: AggregateType, constructor: F) -> Result<(), AggregateError>
where
    A: Aggregate,
    F: Fn(AggregateRootBase<A>) -> A + Send + Sync + 'static,
{
    REGISTRY.write().register(aggregate_type, constructor)
}

pub fn create_aggregate(aggregate_type: &AggregateType) -> Result<Box<dyn AggregateRoot>, AggregateError> {
    let (constructor, id) = {
        let registry = REGISTRY.read();
        (registry.constructor(aggregate_type)?, registry.config().id_strategy.generate())
    };
    construct(aggregate_type, &constructor, id, 0)
}

pub fn create_aggregate_from_id(
    aggregate_type: &AggregateType,
    id: Uuid,
) -> Result<Box<dyn AggregateRoot>, AggregateError> {
    create_aggregate_from_id_and_version(aggregate_type, id, 0)
}

pub fn create_aggregate_from_id_and_version(
    aggregate_type: &AggregateType,
    id: Uuid,
    version: i64,
) -> Result<Box<dyn AggregateRoot>, AggregateError> {
    let constructor = REGISTRY.read().constructor(aggregate_type)?;
    construct(aggregate_type, &constructor, id, version)
}

pub fn seal_registry() {
    REGISTRY.read().seal();
}

/// Run `f` against the process-wide registry under a read lock.
pub fn with_registry<R>(f: impl FnOnce(&AggregateRegistry) -> R) -> R {
    f(&REGISTRY.read())
}
