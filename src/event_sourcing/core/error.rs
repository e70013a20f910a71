use super::aggregate_type::AggregateType;

// ============================================================================
// Aggregate Kernel Errors
// ============================================================================
//
// Every failure is returned to the immediate caller. Nothing here retries.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Aggregate type {0} already registered")]
    AlreadyRegistered(AggregateType),

    #[error("Aggregate type {0} is not registered")]
    NotRegistered(AggregateType),

    #[error("Aggregate type {aggregate_type} is not a {expected}")]
    TypeMismatch {
        aggregate_type: AggregateType,
        expected: &'static str,
    },

    #[error("Invalid version: {requested} must be greater than {current}")]
    InvalidVersion { current: i64, requested: i64 },

    /// Raised while applying an event, so it carries the event's stable
    /// `DomainEvent::event_type` name.
    #[error("Applier for event type {event_type} not found")]
    NoHandler { event_type: String },

    /// Raised while building a dispatch table, before any event exists, so it
    /// carries the Rust type path of the event (`std::any::type_name`).
    #[error("Event type {rust_type} has more than one handler")]
    HandlerCollision { rust_type: &'static str },

    #[error("Aggregate registry is sealed, cannot register {0}")]
    Sealed(AggregateType),

    #[error("Aggregate {0} has no event applier attached")]
    ApplierNotAttached(uuid::Uuid),
}
