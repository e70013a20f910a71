use once_cell::sync::OnceCell;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use super::dispatch::{DispatchTable, DispatchTableBuilder, EventApplier};
use super::error::AggregateError;
use super::event::DomainEvent;

// ============================================================================
// Aggregate Root Pattern - Event Sourcing Core
// ============================================================================
//
// Key Principles:
// 1. Every aggregate embeds an AggregateRootBase (identity, version, pending events)
// 2. In-memory state only changes through applied events
// 3. Raised events stay uncommitted until the persistence layer commits them
// 4. Each commit strictly increases the version
//
// Authors implement `Aggregate`; `AggregateRoot` comes for free.
//
// ============================================================================

/// The capability every aggregate exposes, uniform across concrete types.
pub trait AggregateRoot: Any + Send + Sync {
    fn id(&self) -> Uuid;

    fn version(&self) -> i64;

    /// Events raised since the last commit, oldest first.
    fn uncommitted_events(&self) -> &[Arc<dyn DomainEvent>];

    /// Acknowledge that everything up to `version` is durably stored.
    fn commit(&mut self, version: i64) -> Result<(), AggregateError>;

    /// Route `event` to its handler without recording it. Used for replay.
    fn apply(&mut self, event: &dyn DomainEvent) -> Result<(), AggregateError>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

/// Generic Aggregate trait - all event-sourced aggregates implement this
pub trait Aggregate: Sized + Send + Sync + 'static {
    fn base(&self) -> &AggregateRootBase<Self>;

    fn base_mut(&mut self) -> &mut AggregateRootBase<Self>;

    /// Declare which handler applies which event type.
    fn handlers(_table: &mut DispatchTableBuilder<Self>) {}

    /// The applier attached to every instance of this type.
    ///
    /// Defaults to a `DispatchTable` built from [`handlers`](Self::handlers).
    fn event_applier() -> Result<Arc<dyn EventApplier<Self>>, AggregateError> {
        let mut table = DispatchTable::builder();
        Self::handlers(&mut table);
        Ok(Arc::new(table.build()?))
    }

    /// Apply a new event and, if that succeeds, record it as uncommitted.
    fn raise<E: DomainEvent>(&mut self, event: E) -> Result<(), AggregateError> {
        let applier = self.base().applier()?;
        let event: Arc<dyn DomainEvent> = Arc::new(event);

        applier.apply(self, event.as_ref())?;
        self.base_mut().record(event);
        Ok(())
    }
}

impl<A: Aggregate> AggregateRoot for A {
    fn id(&self) -> Uuid {
        self.base().id()
    }

    fn version(&self) -> i64 {
        self.base().version()
    }

    fn uncommitted_events(&self) -> &[Arc<dyn DomainEvent>] {
        self.base().uncommitted_events()
    }

    fn commit(&mut self, version: i64) -> Result<(), AggregateError> {
        self.base_mut().commit(version)
    }

    fn apply(&mut self, event: &dyn DomainEvent) -> Result<(), AggregateError> {
        let applier = self.base().applier()?;
        applier.apply(self, event)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

impl dyn AggregateRoot {
    pub fn downcast_ref<A: Aggregate>(&self) -> Option<&A> {
        self.as_any().downcast_ref::<A>()
    }

    pub fn downcast_mut<A: Aggregate>(&mut self) -> Option<&mut A> {
        self.as_any_mut().downcast_mut::<A>()
    }
}

// ============================================================================
// Aggregate Root Base - Identity, Version, Pending Events
// ============================================================================

pub struct AggregateRootBase<A> {
    id: Uuid,
    version: i64,
    uncommitted_events: Vec<Arc<dyn DomainEvent>>,
    applier: OnceCell<Arc<dyn EventApplier<A>>>,
}

impl<A> AggregateRootBase<A> {
    pub fn new(id: Uuid, version: i64) -> Self {
        Self {
            id,
            version,
            uncommitted_events: Vec::new(),
            applier: OnceCell::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn uncommitted_events(&self) -> &[Arc<dyn DomainEvent>] {
        &self.uncommitted_events
    }

    pub fn commit(&mut self, version: i64) -> Result<(), AggregateError> {
        if version <= self.version {
            tracing::warn!(
                aggregate_id = %self.id,
                current = self.version,
                requested = version,
                "Rejected non-increasing commit version"
            );
            return Err(AggregateError::InvalidVersion {
                current: self.version,
                requested: version,
            });
        }

        self.version = version;
        self.uncommitted_events.clear();
        Ok(())
    }

    pub fn has_applier(&self) -> bool {
        self.applier.get().is_some()
    }

    /// Attach the applier. Returns false if one was already attached.
    pub(crate) fn attach_applier(&self, applier: Arc<dyn EventApplier<A>>) -> bool {
        self.applier.set(applier).is_ok()
    }

    pub(crate) fn applier(&self) -> Result<Arc<dyn EventApplier<A>>, AggregateError> {
        self.applier
            .get()
            .cloned()
            .ok_or(AggregateError::ApplierNotAttached(self.id))
    }

    pub(crate) fn record(&mut self, event: Arc<dyn DomainEvent>) {
        self.uncommitted_events.push(event);
    }
}

impl<A> Clone for AggregateRootBase<A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            version: self.version,
            uncommitted_events: self.uncommitted_events.clone(),
            applier: self.applier.clone(),
        }
    }
}

impl<A> fmt::Debug for AggregateRootBase<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateRootBase")
            .field("id", &self.id)
            .field("version", &self.version)
            .field("uncommitted_events", &self.uncommitted_events)
            .field("has_applier", &self.has_applier())
            .finish()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Pinged;

    #[derive(Debug)]
    struct Unknown;

    impl DomainEvent for Pinged {
        fn event_type(&self) -> &'static str {
            "Pinged"
        }
    }

    impl DomainEvent for Unknown {
        fn event_type(&self) -> &'static str {
            "Unknown"
        }
    }

    #[derive(Debug)]
    struct Pinger {
        base: AggregateRootBase<Self>,
        pings: u32,
    }

    impl Pinger {
        fn attached(id: Uuid, version: i64) -> Self {
            let pinger = Self {
                base: AggregateRootBase::new(id, version),
                pings: 0,
            };
            assert!(pinger.base.attach_applier(Self::event_applier().unwrap()));
            pinger
        }

        fn apply_pinged(&mut self, _event: &Pinged) {
            self.pings += 1;
        }
    }

    impl Aggregate for Pinger {
        fn base(&self) -> &AggregateRootBase<Self> {
            &self.base
        }

        fn base_mut(&mut self) -> &mut AggregateRootBase<Self> {
            &mut self.base
        }

        fn handlers(table: &mut DispatchTableBuilder<Self>) {
            table.on(Self::apply_pinged);
        }
    }

    #[test]
    fn test_new_base_state() {
        let id = Uuid::new_v4();
        let pinger = Pinger::attached(id, 5);

        assert_eq!(pinger.id(), id);
        assert_eq!(pinger.version(), 5);
        assert!(pinger.uncommitted_events().is_empty());
        assert!(pinger.base.has_applier());
    }

    #[test]
    fn test_raise_applies_then_records() {
        let mut pinger = Pinger::attached(Uuid::new_v4(), 0);

        pinger.raise(Pinged).unwrap();
        pinger.raise(Pinged).unwrap();

        assert_eq!(pinger.pings, 2);
        assert_eq!(pinger.uncommitted_events().len(), 2);
        assert!(pinger.uncommitted_events()[0].is::<Pinged>());
    }

    #[test]
    fn test_raise_unhandled_event_records_nothing() {
        let mut pinger = Pinger::attached(Uuid::new_v4(), 0);

        let result = pinger.raise(Unknown);

        assert!(matches!(result, Err(AggregateError::NoHandler { .. })));
        assert!(pinger.uncommitted_events().is_empty());
        assert_eq!(pinger.pings, 0);
    }

    #[test]
    fn test_apply_does_not_record() {
        let mut pinger = Pinger::attached(Uuid::new_v4(), 0);

        AggregateRoot::apply(&mut pinger, &Pinged).unwrap();

        assert_eq!(pinger.pings, 1);
        assert!(pinger.uncommitted_events().is_empty());
    }

    #[test]
    fn test_commit_advances_version_and_clears_events() {
        let mut pinger = Pinger::attached(Uuid::new_v4(), 0);
        pinger.raise(Pinged).unwrap();

        pinger.commit(1).unwrap();

        assert_eq!(pinger.version(), 1);
        assert!(pinger.uncommitted_events().is_empty());
    }

    #[test]
    fn test_commit_rejects_non_increasing_version() {
        let mut pinger = Pinger::attached(Uuid::new_v4(), 3);
        pinger.raise(Pinged).unwrap();

        for stale in [3, 2, 0, -1] {
            let result = pinger.commit(stale);
            assert_eq!(
                result,
                Err(AggregateError::InvalidVersion { current: 3, requested: stale })
            );
            assert_eq!(pinger.version(), 3);
            assert_eq!(pinger.uncommitted_events().len(), 1);
        }
    }

    #[test]
    fn test_repeated_commits_strictly_increase() {
        let mut pinger = Pinger::attached(Uuid::new_v4(), 0);

        for version in 1..=4 {
            pinger.raise(Pinged).unwrap();
            pinger.commit(version).unwrap();
        }
        assert_eq!(pinger.version(), 4);
        assert!(pinger.commit(4).is_err());
    }

    #[test]
    fn test_accessors_are_stable() {
        let pinger = Pinger::attached(Uuid::new_v4(), 9);
        let id = pinger.id();

        for _ in 0..3 {
            assert_eq!(pinger.id(), id);
            assert_eq!(pinger.version(), 9);
        }
    }

    #[test]
    fn test_applier_attaches_once() {
        let pinger = Pinger::attached(Uuid::new_v4(), 0);
        assert!(!pinger.base.attach_applier(Pinger::event_applier().unwrap()));
    }

    #[test]
    fn test_unattached_aggregate_cannot_raise() {
        let id = Uuid::new_v4();
        let mut pinger = Pinger {
            base: AggregateRootBase::new(id, 0),
            pings: 0,
        };

        assert_eq!(pinger.raise(Pinged), Err(AggregateError::ApplierNotAttached(id)));
        assert!(pinger.uncommitted_events().is_empty());
    }

    #[test]
    fn test_downcast_through_root() {
        let mut boxed: Box<dyn AggregateRoot> = Box::new(Pinger::attached(Uuid::new_v4(), 0));

        boxed.apply(&Pinged).unwrap();

        assert_eq!(boxed.downcast_ref::<Pinger>().map(|p| p.pings), Some(1));
        boxed.downcast_mut::<Pinger>().unwrap().pings = 10;
        assert_eq!(boxed.downcast_ref::<Pinger>().unwrap().pings, 10);
    }
}
