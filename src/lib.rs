//! Write-side kernel for event-sourced aggregates.
//!
//! - [`AggregateRegistry`] maps an [`AggregateType`] label to a constructor and
//!   builds aggregates with a fresh id, an explicit id, or an id and version.
//! - [`AggregateRootBase`] holds identity, version and uncommitted events;
//!   [`AggregateRoot::commit`] only accepts strictly increasing versions.
//! - [`DispatchTable`] routes each event type to the handler an aggregate
//!   declared for it, so aggregates never write the dispatch switch by hand.
//!
//! ```
//! use aggregate_kernel::{
//!     Aggregate, AggregateRegistry, AggregateRoot, AggregateRootBase, AggregateType,
//!     DispatchTableBuilder, DomainEvent,
//! };
//!
//! #[derive(Debug)]
//! struct Deposited {
//!     amount: u64,
//! }
//!
//! impl DomainEvent for Deposited {
//!     fn event_type(&self) -> &'static str {
//!         "Deposited"
//!     }
//! }
//!
//! struct Account {
//!     base: AggregateRootBase<Self>,
//!     balance: u64,
//! }
//!
//! impl Aggregate for Account {
//!     fn base(&self) -> &AggregateRootBase<Self> {
//!         &self.base
//!     }
//!
//!     fn base_mut(&mut self) -> &mut AggregateRootBase<Self> {
//!         &mut self.base
//!     }
//!
//!     fn handlers(table: &mut DispatchTableBuilder<Self>) {
//!         table.on(|account: &mut Self, event: &Deposited| account.balance += event.amount);
//!     }
//! }
//!
//! # fn main() -> Result<(), aggregate_kernel::AggregateError> {
//! let account_type = AggregateType::new("Account")?;
//! let mut registry = AggregateRegistry::new();
//! registry.register(account_type.clone(), |base| Account { base, balance: 0 })?;
//!
//! let mut account = registry.create_as::<Account>(&account_type)?;
//! account.raise(Deposited { amount: 100 })?;
//! assert_eq!(account.balance, 100);
//!
//! account.commit(1)?;
//! assert_eq!(account.version(), 1);
//! assert!(account.commit(1).is_err());
//! # Ok(())
//! # }
//! ```

pub mod domain;
pub mod event_sourcing;

pub use event_sourcing::core::*;
pub use event_sourcing::registry::*;
pub use event_sourcing::store::*;
