// ============================================================================
// Aggregate Registry - Construction Protocol
// ============================================================================

pub mod aggregate_registry;
pub mod config;
pub mod global;

pub use aggregate_registry::{downcast_aggregate, AggregateRegistry};
pub use config::{IdStrategy, RegistryConfig};
pub use global::{
    create_aggregate, create_aggregate_from_id, create_aggregate_from_id_and_version,
    register_aggregate, seal_registry, with_registry,
};
