use chrono::{DateTime, Utc};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// Domain Event Trait
// ============================================================================

/// Object-safe access to `Any` for every concrete event type.
///
/// Call it through `&dyn DomainEvent`, never on an `Arc` or `Box` holding one.
#[doc(hidden)]
pub trait EventAny {
    fn event_any(&self) -> &dyn Any;
}

impl<T: Any> EventAny for T {
    fn event_any(&self) -> &dyn Any {
        self
    }
}

/// A fact that happened to an aggregate.
///
/// Events carry no identity of their own; dispatch keys on the concrete Rust
/// type. `event_type` is the stable name recorded alongside the payload.
pub trait DomainEvent: EventAny + fmt::Debug + Send + Sync + 'static {
    fn event_type(&self) -> &'static str;

    fn event_version(&self) -> i32 {
        1
    }
}

impl dyn DomainEvent {
    /// True if the erased event is an `E`.
    pub fn is<E: DomainEvent>(&self) -> bool {
        self.event_any().is::<E>()
    }

    pub fn downcast_ref<E: DomainEvent>(&self) -> Option<&E> {
        self.event_any().downcast_ref::<E>()
    }

    /// `TypeId` of the concrete payload, the dispatch key.
    pub fn payload_type_id(&self) -> TypeId {
        self.event_any().type_id()
    }
}

// ============================================================================
// Event Envelope - Event Metadata
// ============================================================================
//
// Wraps a type-erased domain event with the metadata a persistence layer
// records next to it.
//
// ============================================================================

#[derive(Clone, Debug)]
pub struct EventEnvelope {
    // Event Identity
    pub event_id: Uuid,
    pub aggregate_id: Uuid,
    pub sequence_number: i64,

    // Event Type Information
    pub event_type: String,
    pub event_version: i32,

    // Event Payload
    pub event_data: Arc<dyn DomainEvent>,

    // Causation & Correlation
    pub causation_id: Option<Uuid>,
    pub correlation_id: Uuid,

    // Actor Information
    pub user_id: Option<Uuid>,

    // Timing
    pub timestamp: DateTime<Utc>,

    // Additional Metadata
    pub metadata: HashMap<String, String>,
}

impl EventEnvelope {
    pub fn new(
        aggregate_id: Uuid,
        sequence_number: i64,
        event_data: Arc<dyn DomainEvent>,
        correlation_id: Uuid,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            aggregate_id,
            sequence_number,
            event_type: event_data.event_type().to_string(),
            event_version: event_data.event_version(),
            event_data,
            causation_id: None,
            correlation_id,
            user_id: None,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_causation(mut self, causation_id: Uuid) -> Self {
        self.causation_id = Some(causation_id);
        self
    }

    pub fn with_metadata(mut self, key: String, value: String) -> Self {
        self.metadata.insert(key, value);
        self
    }

    /// Borrow the payload as an erased event.
    pub fn event(&self) -> &dyn DomainEvent {
        self.event_data.as_ref()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct TestEvent {
        data: String,
    }

    impl DomainEvent for TestEvent {
        fn event_type(&self) -> &'static str {
            "TestEvent"
        }
    }

    #[derive(Debug)]
    struct OtherEvent;

    impl DomainEvent for OtherEvent {
        fn event_type(&self) -> &'static str {
            "OtherEvent"
        }

        fn event_version(&self) -> i32 {
            3
        }
    }

    #[test]
    fn test_event_envelope_creation() {
        let aggregate_id = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();

        let envelope = EventEnvelope::new(
            aggregate_id,
            1,
            Arc::new(TestEvent { data: "test".to_string() }),
            correlation_id,
        );

        assert_eq!(envelope.aggregate_id, aggregate_id);
        assert_eq!(envelope.sequence_number, 1);
        assert_eq!(envelope.event_type, "TestEvent");
        assert_eq!(envelope.event_version, 1);
        assert_eq!(envelope.correlation_id, correlation_id);
        assert!(envelope.causation_id.is_none());
    }

    #[test]
    fn test_envelope_builders() {
        let user = Uuid::new_v4();
        let cause = Uuid::new_v4();

        let envelope = EventEnvelope::new(Uuid::new_v4(), 7, Arc::new(OtherEvent), Uuid::new_v4())
            .with_user(user)
            .with_causation(cause)
            .with_metadata("source".to_string(), "import".to_string());

        assert_eq!(envelope.event_version, 3);
        assert_eq!(envelope.user_id, Some(user));
        assert_eq!(envelope.causation_id, Some(cause));
        assert_eq!(envelope.metadata.get("source").map(String::as_str), Some("import"));
    }

    #[test]
    fn test_erased_event_downcast() {
        let event: Arc<dyn DomainEvent> = Arc::new(TestEvent { data: "payload".to_string() });

        assert!(event.is::<TestEvent>());
        assert!(!event.is::<OtherEvent>());
        assert_eq!(
            event.downcast_ref::<TestEvent>().map(|e| e.data.as_str()),
            Some("payload")
        );
        assert!(event.downcast_ref::<OtherEvent>().is_none());
        assert_eq!(event.payload_type_id(), TypeId::of::<TestEvent>());
    }
}
