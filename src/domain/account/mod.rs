// ============================================================================
// Account Domain - Business Logic for Account Aggregate
// ============================================================================
//
// - Events (AccountOpened, Deposited, Withdrawn)
// - Commands (OpenAccount, Deposit, Withdraw)
// - Errors (AccountError enum)
// - Aggregate (AccountAggregate, handlers declared in a dispatch table)
// - Command Handler (AccountCommandHandler)
//
// ============================================================================

pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod command_handler;

// Re-export for convenience
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use command_handler::*;
