use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::event_sourcing::core::{
    Aggregate, AggregateError, AggregateRoot, AggregateRootBase, AggregateType, EventEnvelope,
};
use super::config::RegistryConfig;

// ============================================================================
// Aggregate Registry - Aggregate Type to Constructor
// ============================================================================
//
// create(type)                               -> fresh id, version 0
// create_with_id(type, id)                   -> rehydrate by id
// create_with_id_and_version(type, id, v)    -> rehydrate at a known version
//
// Every created aggregate gets the event applier its type declared. Appliers
// are built once at registration, so handler collisions fail `register`.
// A constructor must embed the base it was handed: anything else is rejected
// with `InvalidArgument` instead of being returned.
//
// ============================================================================

pub(crate) type Constructor =
    Arc<dyn Fn(Uuid, i64) -> Result<Box<dyn AggregateRoot>, AggregateError> + Send + Sync>;

struct Registration {
    constructor: Constructor,
    rust_type: TypeId,
    rust_type_name: &'static str,
}

pub struct AggregateRegistry {
    config: RegistryConfig,
    factories: HashMap<AggregateType, Registration>,
    sealed: AtomicBool,
}

impl AggregateRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            factories: HashMap::new(),
            sealed: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register the constructor for `aggregate_type`.
    ///
    /// The constructor receives the base state and must embed it in the
    /// aggregate it returns.
    pub fn register<A, F>(
        &mut self,
        aggregate_type: AggregateType,
        constructor: F,
    ) -> Result<(), AggregateError>
    where
        A: Aggregate,
        F: Fn(AggregateRootBase<A>) -> A + Send + Sync + 'static,
    {
        if self.is_sealed() {
            tracing::warn!(aggregate_type = %aggregate_type, "Registry is sealed, registration rejected");
            return Err(AggregateError::Sealed(aggregate_type));
        }

        if self.factories.contains_key(&aggregate_type) {
            tracing::warn!(aggregate_type = %aggregate_type, "Aggregate type already registered");
            return Err(AggregateError::AlreadyRegistered(aggregate_type));
        }

        let applier = A::event_applier()?;

        let constructor: Constructor = Arc::new(
            move |id: Uuid, version: i64| -> Result<Box<dyn AggregateRoot>, AggregateError> {
                let aggregate = constructor(AggregateRootBase::new(id, version));
                check_base(aggregate.base(), id, version)?;
                if !aggregate.base().attach_applier(Arc::clone(&applier)) {
                    return Err(foreign_base(id, "an event applier is already attached"));
                }
                Ok(Box::new(aggregate))
            },
        );

        tracing::info!(
            aggregate_type = %aggregate_type,
            rust_type = type_name::<A>(),
            "Registered aggregate type"
        );

        self.factories.insert(
            aggregate_type,
            Registration {
                constructor,
                rust_type: TypeId::of::<A>(),
                rust_type_name: type_name::<A>(),
            },
        );

        Ok(())
    }

    pub fn create(&self, aggregate_type: &AggregateType) -> Result<Box<dyn AggregateRoot>, AggregateError> {
        self.create_with_id(aggregate_type, self.config.id_strategy.generate())
    }

    pub fn create_with_id(
        &self,
        aggregate_type: &AggregateType,
        id: Uuid,
    ) -> Result<Box<dyn AggregateRoot>, AggregateError> {
        self.create_with_id_and_version(aggregate_type, id, 0)
    }

    pub fn create_with_id_and_version(
        &self,
        aggregate_type: &AggregateType,
        id: Uuid,
        version: i64,
    ) -> Result<Box<dyn AggregateRoot>, AggregateError> {
        let constructor = self.constructor(aggregate_type)?;
        construct(aggregate_type, &constructor, id, version)
    }

    /// Look up the constructor for `aggregate_type`, sealing the registry
    /// first when the config asks for it. The returned handle can be called
    /// after any lock around the registry has been released.
    pub(crate) fn constructor(&self, aggregate_type: &AggregateType) -> Result<Constructor, AggregateError> {
        let registration = self.registration(aggregate_type)?;

        if self.config.seal_on_first_create && !self.sealed.swap(true, Ordering::AcqRel) {
            tracing::info!("Registry sealed on first create");
        }

        Ok(Arc::clone(&registration.constructor))
    }

    /// Create and downcast to the concrete aggregate type in one step.
    ///
    /// Fails with `TypeMismatch` when `aggregate_type` is registered to a
    /// different Rust type than `A`.
    pub fn create_as<A: Aggregate>(&self, aggregate_type: &AggregateType) -> Result<Box<A>, AggregateError> {
        self.create_as_with_id_and_version(aggregate_type, self.config.id_strategy.generate(), 0)
    }

    pub fn create_as_with_id_and_version<A: Aggregate>(
        &self,
        aggregate_type: &AggregateType,
        id: Uuid,
        version: i64,
    ) -> Result<Box<A>, AggregateError> {
        self.check_type::<A>(aggregate_type)?;
        let aggregate = self.create_with_id_and_version(aggregate_type, id, version)?;
        downcast_aggregate(aggregate, aggregate_type)
    }

    /// Rebuild an aggregate from its stored history.
    ///
    /// The aggregate is created at the last sequence number and every event is
    /// replayed through `apply`. Sequence numbers must strictly increase and
    /// every envelope must belong to `id`.
    pub fn rehydrate(
        &self,
        aggregate_type: &AggregateType,
        id: Uuid,
        history: &[EventEnvelope],
    ) -> Result<Box<dyn AggregateRoot>, AggregateError> {
        let version = history_version(id, history)?;
        let mut aggregate = self.create_with_id_and_version(aggregate_type, id, version)?;

        for envelope in history {
            aggregate.apply(envelope.event())?;
        }

        tracing::debug!(
            aggregate_type = %aggregate_type,
            aggregate_id = %id,
            version = version,
            event_count = history.len(),
            "Rehydrated aggregate"
        );

        Ok(aggregate)
    }

    pub fn rehydrate_as<A: Aggregate>(
        &self,
        aggregate_type: &AggregateType,
        id: Uuid,
        history: &[EventEnvelope],
    ) -> Result<Box<A>, AggregateError> {
        self.check_type::<A>(aggregate_type)?;
        let aggregate = self.rehydrate(aggregate_type, id, history)?;
        downcast_aggregate(aggregate, aggregate_type)
    }

    /// Freeze the table. Later `register` calls fail with `Sealed`.
    pub fn seal(&self) {
        if !self.sealed.swap(true, Ordering::AcqRel) {
            tracing::info!(aggregate_types = self.factories.len(), "Registry sealed");
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    pub fn is_registered(&self, aggregate_type: &AggregateType) -> bool {
        self.factories.contains_key(aggregate_type)
    }

    /// Registered labels, sorted.
    pub fn registered_types(&self) -> Vec<AggregateType> {
        let mut types: Vec<_> = self.factories.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    fn registration(&self, aggregate_type: &AggregateType) -> Result<&Registration, AggregateError> {
        self.factories.get(aggregate_type).ok_or_else(|| {
            tracing::warn!(aggregate_type = %aggregate_type, "Aggregate type is not registered");
            AggregateError::NotRegistered(aggregate_type.clone())
        })
    }

    fn check_type<A: Aggregate>(&self, aggregate_type: &AggregateType) -> Result<(), AggregateError> {
        let registration = self.registration(aggregate_type)?;
        if registration.rust_type != TypeId::of::<A>() {
            tracing::warn!(
                aggregate_type = %aggregate_type,
                registered = registration.rust_type_name,
                requested = type_name::<A>(),
                "Aggregate type mismatch"
            );
            return Err(AggregateError::TypeMismatch {
                aggregate_type: aggregate_type.clone(),
                expected: type_name::<A>(),
            });
        }
        Ok(())
    }
}

impl Default for AggregateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AggregateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateRegistry")
            .field("config", &self.config)
            .field("aggregate_types", &self.registered_types())
            .field("sealed", &self.is_sealed())
            .finish()
    }
}

/// Downcast a created aggregate to its concrete type.
pub fn downcast_aggregate<A: Aggregate>(
    aggregate: Box<dyn AggregateRoot>,
    aggregate_type: &AggregateType,
) -> Result<Box<A>, AggregateError> {
    aggregate
        .into_any()
        .downcast::<A>()
        .map_err(|_| AggregateError::TypeMismatch {
            aggregate_type: aggregate_type.clone(),
            expected: type_name::<A>(),
        })
}

/// Run a constructor handle obtained from `AggregateRegistry::constructor`.
pub(crate) fn construct(
    aggregate_type: &AggregateType,
    constructor: &Constructor,
    id: Uuid,
    version: i64,
) -> Result<Box<dyn AggregateRoot>, AggregateError> {
    let aggregate = constructor(id, version).map_err(|err| {
        tracing::warn!(aggregate_type = %aggregate_type, aggregate_id = %id, error = %err, "Constructor rejected");
        err
    })?;

    tracing::debug!(
        aggregate_type = %aggregate_type,
        aggregate_id = %id,
        version = version,
        "Created aggregate"
    );

    Ok(aggregate)
}

fn check_base<A>(base: &AggregateRootBase<A>, id: Uuid, version: i64) -> Result<(), AggregateError> {
    if base.id() != id {
        return Err(foreign_base(id, &format!("returned id {}", base.id())));
    }
    if base.version() != version {
        return Err(foreign_base(id, &format!("returned version {} instead of {version}", base.version())));
    }
    if !base.uncommitted_events().is_empty() {
        return Err(foreign_base(id, "returned base already has uncommitted events"));
    }
    if base.has_applier() {
        return Err(foreign_base(id, "an event applier is already attached"));
    }
    Ok(())
}

fn foreign_base(id: Uuid, detail: &str) -> AggregateError {
    AggregateError::InvalidArgument(format!(
        "constructor for aggregate {id} did not use the base it was given: {detail}"
    ))
}

fn history_version(id: Uuid, history: &[EventEnvelope]) -> Result<i64, AggregateError> {
    let mut version = 0;
    for envelope in history {
        if envelope.aggregate_id != id {
            return Err(AggregateError::InvalidArgument(format!(
                "event {} belongs to aggregate {}, not {}",
                envelope.event_id, envelope.aggregate_id, id
            )));
        }
        if envelope.sequence_number <= version {
            return Err(AggregateError::InvalidVersion {
                current: version,
                requested: envelope.sequence_number,
            });
        }
        version = envelope.sequence_number;
    }
    Ok(version)
}

// ============================================================================
// Unit Tests
// ============================================================================
