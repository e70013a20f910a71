// ============================================================================
// Event Sourcing Core - Aggregate Modeling Kernel
// ============================================================================
//
// Generic building blocks shared by every aggregate:
// - AggregateType: the registry key
// - AggregateRoot / Aggregate / AggregateRootBase: identity, version, commit
// - DomainEvent / EventEnvelope: type-erased events and their metadata
// - EventApplier / DispatchTable: event-type to handler routing
//
// ============================================================================

pub mod aggregate;
pub mod aggregate_type;
pub mod dispatch;
pub mod error;
pub mod event;

// Re-export core types for convenience
pub use aggregate::{Aggregate, AggregateRoot, AggregateRootBase};
pub use aggregate_type::AggregateType;
pub use dispatch::{DispatchTable, DispatchTableBuilder, EventApplier};
pub use error::AggregateError;
pub use event::{DomainEvent, EventAny, EventEnvelope};
