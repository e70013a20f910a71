use crate::event_sourcing::core::AggregateError;
use super::value_objects::OrderStatus;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order already exists")]
    AlreadyCreated,

    #[error("Order is already cancelled")]
    AlreadyCancelled,

    #[error("Order must be confirmed before shipping")]
    NotConfirmed,

    #[error("Cannot modify order in status: {0:?}")]
    InvalidStatusTransition(OrderStatus),

    #[error("Order items cannot be empty")]
    EmptyItems,

    #[error("Invalid item quantity: {0}")]
    InvalidQuantity(i32),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}
