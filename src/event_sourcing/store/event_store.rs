use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::event_sourcing::core::EventEnvelope;

// ============================================================================
// Event Store Ports - Persistence Collaborator Interfaces
// ============================================================================
//
// EventSource: historical events for an aggregate, oldest first
// EventSink:   durable append guarded by the expected stream version
//
// The append returns the version the caller passes to `commit`.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Cannot append empty event list")]
    EmptyAppend,

    #[error("Concurrency conflict: expected version {expected}, but current is {actual}")]
    ConcurrencyConflict { expected: i64, actual: i64 },

    #[error("Event store backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait EventSource: Send + Sync {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<EventEnvelope>, StoreError>;
}

#[async_trait]
pub trait EventSink: Send + Sync {
    /// Append events after `expected_version`. Returns the new version.
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<EventEnvelope>,
    ) -> Result<i64, StoreError>;
}

// ============================================================================
// In-Memory Event Store
// ============================================================================
//
// Reference implementation for tests and the demo binary. Streams live in a
// map keyed by aggregate id; the store assigns sequence numbers.
//
// ============================================================================

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    streams: RwLock<HashMap<Uuid, Vec<EventEnvelope>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current version of aggregate
    pub async fn get_current_version(&self, aggregate_id: Uuid) -> i64 {
        let streams = self.streams.read().await;
        stream_version(streams.get(&aggregate_id))
    }

    /// Check if aggregate exists
    pub async fn aggregate_exists(&self, aggregate_id: Uuid) -> bool {
        self.get_current_version(aggregate_id).await > 0
    }

    pub async fn stream_count(&self) -> usize {
        self.streams.read().await.len()
    }
}

fn stream_version(stream: Option<&Vec<EventEnvelope>>) -> i64 {
    stream
        .and_then(|events| events.last())
        .map_or(0, |envelope| envelope.sequence_number)
}

#[async_trait]
impl EventSource for InMemoryEventStore {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<EventEnvelope>, StoreError> {
        let streams = self.streams.read().await;
        let events = streams.get(&aggregate_id).cloned().unwrap_or_default();

        tracing::debug!(aggregate_id = %aggregate_id, event_count = events.len(), "Loaded events");
        Ok(events)
    }
}

#[async_trait]
impl EventSink for InMemoryEventStore {
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<EventEnvelope>,
    ) -> Result<i64, StoreError> {
        if events.is_empty() {
            return Err(StoreError::EmptyAppend);
        }

        let mut streams = self.streams.write().await;

        // Check optimistic concurrency
        let current_version = stream_version(streams.get(&aggregate_id));
        if current_version != expected_version {
            tracing::warn!(
                aggregate_id = %aggregate_id,
                expected_version = expected_version,
                current_version = current_version,
                "Concurrency conflict on append"
            );
            return Err(StoreError::ConcurrencyConflict {
                expected: expected_version,
                actual: current_version,
            });
        }

        let stream = streams.entry(aggregate_id).or_default();
        let event_count = events.len();
        let mut new_version = expected_version;
        for mut envelope in events {
            new_version += 1;
            envelope.aggregate_id = aggregate_id;
            envelope.sequence_number = new_version;
            stream.push(envelope);
        }

        tracing::debug!(
            aggregate_id = %aggregate_id,
            new_version = new_version,
            event_count = event_count,
            "Appended events to event store"
        );

        Ok(new_version)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
