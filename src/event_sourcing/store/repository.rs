use std::sync::Arc;
use uuid::Uuid;

use crate::event_sourcing::core::{
    Aggregate, AggregateError, AggregateRoot, AggregateType, EventEnvelope,
};
use crate::event_sourcing::registry::{downcast_aggregate, AggregateRegistry};
use super::event_store::{EventSink, EventSource, StoreError};

// ============================================================================
// Repository - Load / Save Aggregates
// ============================================================================
//
// load: EventSource history -> registry.rehydrate
// save: uncommitted events -> EventSink append -> commit(new version)
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Repository<S> {
    registry: Arc<AggregateRegistry>,
    store: Arc<S>,
}

impl<S> Repository<S>
where
    S: EventSource + EventSink,
{
    pub fn new(registry: Arc<AggregateRegistry>, store: Arc<S>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &AggregateRegistry {
        &self.registry
    }

    /// Load an aggregate by replaying its stream. An empty stream yields a
    /// fresh aggregate at version 0 with the given id.
    pub async fn load(
        &self,
        aggregate_type: &AggregateType,
        aggregate_id: Uuid,
    ) -> Result<Box<dyn AggregateRoot>, RepositoryError> {
        let history = self.store.load_events(aggregate_id).await?;
        Ok(self.registry.rehydrate(aggregate_type, aggregate_id, &history)?)
    }

    pub async fn load_as<A: Aggregate>(
        &self,
        aggregate_type: &AggregateType,
        aggregate_id: Uuid,
    ) -> Result<Box<A>, RepositoryError> {
        let aggregate = self.load(aggregate_type, aggregate_id).await?;
        Ok(downcast_aggregate(aggregate, aggregate_type)?)
    }

    /// Persist uncommitted events and commit the aggregate to the new version.
    ///
    /// Returns the aggregate version after saving. With nothing to save the
    /// store is not touched.
    pub async fn save<R>(&self, aggregate: &mut R, correlation_id: Uuid) -> Result<i64, RepositoryError>
    where
        R: AggregateRoot + ?Sized,
    {
        let aggregate_id = aggregate.id();
        let expected_version = aggregate.version();

        if aggregate.uncommitted_events().is_empty() {
            return Ok(expected_version);
        }

        let envelopes: Vec<EventEnvelope> = aggregate
            .uncommitted_events()
            .iter()
            .zip(expected_version + 1..)
            .map(|(event, sequence_number)| {
                EventEnvelope::new(aggregate_id, sequence_number, Arc::clone(event), correlation_id)
            })
            .collect();
        let event_count = envelopes.len();

        let new_version = self
            .store
            .append_events(aggregate_id, expected_version, envelopes)
            .await?;

        if let Err(err) = aggregate.commit(new_version) {
            tracing::error!(
                aggregate_id = %aggregate_id,
                expected_version = expected_version,
                new_version = new_version,
                event_count = event_count,
                error = %err,
                "Events appended but aggregate commit failed"
            );
            return Err(err.into());
        }

        tracing::info!(
            aggregate_id = %aggregate_id,
            correlation_id = %correlation_id,
            new_version = new_version,
            event_count = event_count,
            "Saved aggregate"
        );

        Ok(new_version)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_sourcing::core::{AggregateRootBase, DispatchTableBuilder, DomainEvent};
    use crate::event_sourcing::store::InMemoryEventStore;

    #[derive(Debug)]
    struct Stamped {
        label: String,
    }

    impl DomainEvent for Stamped {
        fn event_type(&self) -> &'static str {
            "Stamped"
        }
    }

    #[derive(Debug)]
    struct Passport {
        base: AggregateRootBase<Self>,
        stamps: Vec<String>,
    }

    impl Passport {
        fn apply_stamped(&mut self, event: &Stamped) {
            self.stamps.push(event.label.clone());
        }
    }

    impl Aggregate for Passport {
        fn base(&self) -> &AggregateRootBase<Self> {
            &self.base
        }

        fn base_mut(&mut self) -> &mut AggregateRootBase<Self> {
            &mut self.base
        }

        fn handlers(table: &mut DispatchTableBuilder<Self>) {
            table.on(Self::apply_stamped);
        }
    }

    fn passport_type() -> AggregateType {
        AggregateType::new("Passport").unwrap()
    }

    fn repository() -> (Repository<InMemoryEventStore>, Arc<InMemoryEventStore>) {
        let mut registry = AggregateRegistry::new();
        registry
            .register(passport_type(), |base| Passport { base, stamps: Vec::new() })
            .unwrap();
        let store = Arc::new(InMemoryEventStore::new());
        (Repository::new(Arc::new(registry), Arc::clone(&store)), store)
    }

    /// Accepts every append but reports the version it was given.
    struct StaleSink;

    #[async_trait::async_trait]
    impl EventSource for StaleSink {
        async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<EventEnvelope>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[async_trait::async_trait]
    impl EventSink for StaleSink {
        async fn append_events(
            &self,
            _aggregate_id: Uuid,
            expected_version: i64,
            _events: Vec<EventEnvelope>,
        ) -> Result<i64, StoreError> {
            Ok(expected_version)
        }
    }

    fn stamp(label: &str) -> Stamped {
        Stamped { label: label.to_string() }
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let (repository, store) = repository();
        let mut passport = repository.registry().create_as::<Passport>(&passport_type()).unwrap();
        let id = passport.id();

        passport.raise(stamp("FR")).unwrap();
        passport.raise(stamp("JP")).unwrap();
        let version = repository.save(passport.as_mut(), Uuid::new_v4()).await.unwrap();

        assert_eq!(version, 2);
        assert_eq!(passport.version(), 2);
        assert!(passport.uncommitted_events().is_empty());
        assert_eq!(store.get_current_version(id).await, 2);

        let loaded = repository.load_as::<Passport>(&passport_type(), id).await.unwrap();
        assert_eq!(loaded.version(), 2);
        assert_eq!(loaded.stamps, vec!["FR".to_string(), "JP".to_string()]);
    }

    #[tokio::test]
    async fn test_save_without_events_is_noop() {
        let (repository, store) = repository();
        let mut passport = repository.registry().create(&passport_type()).unwrap();

        let version = repository.save(passport.as_mut(), Uuid::new_v4()).await.unwrap();

        assert_eq!(version, 0);
        assert_eq!(store.stream_count().await, 0);
    }

    #[tokio::test]
    async fn test_conflicting_save_leaves_aggregate_uncommitted() {
        let (repository, _store) = repository();
        let id = Uuid::new_v4();

        let mut first = repository.load_as::<Passport>(&passport_type(), id).await.unwrap();
        let mut second = repository.load_as::<Passport>(&passport_type(), id).await.unwrap();

        first.raise(stamp("DE")).unwrap();
        repository.save(first.as_mut(), Uuid::new_v4()).await.unwrap();

        second.raise(stamp("IT")).unwrap();
        let result = repository.save(second.as_mut(), Uuid::new_v4()).await;

        assert_eq!(
            result,
            Err(RepositoryError::Store(StoreError::ConcurrencyConflict { expected: 0, actual: 1 }))
        );
        assert_eq!(second.version(), 0);
        assert_eq!(second.uncommitted_events().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_sink_version_fails_commit() {
        let mut registry = AggregateRegistry::new();
        registry
            .register(passport_type(), |base| Passport { base, stamps: Vec::new() })
            .unwrap();
        let repository = Repository::new(Arc::new(registry), Arc::new(StaleSink));
        let mut passport = repository.registry().create_as::<Passport>(&passport_type()).unwrap();
        passport.raise(stamp("NL")).unwrap();

        let result = repository.save(passport.as_mut(), Uuid::new_v4()).await;

        assert_eq!(
            result,
            Err(RepositoryError::Aggregate(AggregateError::InvalidVersion { current: 0, requested: 0 }))
        );
        assert_eq!(passport.version(), 0);
        assert_eq!(passport.uncommitted_events().len(), 1);
    }

    #[tokio::test]
    async fn test_load_unregistered_type() {
        let (repository, _store) = repository();
        let unknown = AggregateType::new("Visa").unwrap();

        let result = repository.load(&unknown, Uuid::new_v4()).await;

        assert!(matches!(
            result,
            Err(RepositoryError::Aggregate(AggregateError::NotRegistered(_)))
        ));
    }
}
