// ============================================================================
// Order Domain - Business Logic for Order Aggregate
// ============================================================================
//
// Order events form one closed enum, so the aggregate applies them with a
// `match` and supplies its own EventApplier instead of a dispatch table.
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;

// Re-export for convenience
pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
