// ============================================================================
// Event Sourcing Store - Persistence Collaborators
// ============================================================================
//
// Interfaces the kernel consumes from a persistence layer, an in-memory
// reference implementation, and the repository that ties them to the registry.
//
// ============================================================================

pub mod event_store;
pub mod repository;

pub use event_store::{EventSink, EventSource, InMemoryEventStore, StoreError};
pub use repository::{Repository, RepositoryError};
