use crate::event_sourcing::core::AggregateError;

// ============================================================================
// Account Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Account is already open")]
    AlreadyOpen,

    #[error("Account is not open")]
    NotOpen,

    #[error("Owner name cannot be empty")]
    EmptyOwner,

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: u64, requested: u64 },

    #[error("Account still holds {0}")]
    NonZeroBalance(u64),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}
