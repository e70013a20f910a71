use serde::{Deserialize, Serialize};

use crate::event_sourcing::core::{
    Aggregate, AggregateError, AggregateRootBase, AggregateType, DispatchTableBuilder,
};
use crate::event_sourcing::registry::AggregateRegistry;
use super::commands::AccountCommand;
use super::errors::AccountError;
use super::events::*;

// ============================================================================
// Account Aggregate - Domain Logic
// ============================================================================

pub const ACCOUNT_AGGREGATE: &str = "Account";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    Pending,
    Open,
    Closed,
}

#[derive(Debug, Clone)]
pub struct AccountAggregate {
    base: AggregateRootBase<Self>,

    // Current State (derived from events)
    pub owner: Option<String>,
    pub balance: u64,
    pub status: AccountStatus,
}

impl AccountAggregate {
    /// Zero-balance account around the given base state
    pub fn new(base: AggregateRootBase<Self>) -> Self {
        Self {
            base,
            owner: None,
            balance: 0,
            status: AccountStatus::Pending,
        }
    }

    pub fn aggregate_type() -> Result<AggregateType, AggregateError> {
        AggregateType::new(ACCOUNT_AGGREGATE)
    }

    pub fn register(registry: &mut AggregateRegistry) -> Result<(), AggregateError> {
        registry.register(Self::aggregate_type()?, Self::new)
    }

    /// Validate a command and raise the resulting events
    pub fn handle(&mut self, command: &AccountCommand) -> Result<(), AccountError> {
        match command {
            AccountCommand::OpenAccount { owner } => {
                if self.status != AccountStatus::Pending {
                    return Err(AccountError::AlreadyOpen);
                }
                if owner.trim().is_empty() {
                    return Err(AccountError::EmptyOwner);
                }
                self.raise(AccountOpened { owner: owner.clone() })?;
            }

            AccountCommand::Deposit { amount } => {
                self.validate_open()?;
                Self::validate_amount(*amount)?;
                self.raise(Deposited { amount: *amount })?;
            }

            AccountCommand::Withdraw { amount } => {
                self.validate_open()?;
                Self::validate_amount(*amount)?;
                if *amount > self.balance {
                    return Err(AccountError::InsufficientFunds {
                        balance: self.balance,
                        requested: *amount,
                    });
                }
                self.raise(Withdrawn { amount: *amount })?;
            }

            AccountCommand::CloseAccount { reason } => {
                self.validate_open()?;
                if self.balance > 0 {
                    return Err(AccountError::NonZeroBalance(self.balance));
                }
                self.raise(AccountClosed { reason: reason.clone() })?;
            }
        }
        Ok(())
    }

    fn validate_open(&self) -> Result<(), AccountError> {
        match self.status {
            AccountStatus::Open => Ok(()),
            _ => Err(AccountError::NotOpen),
        }
    }

    fn validate_amount(amount: u64) -> Result<(), AccountError> {
        if amount == 0 {
            return Err(AccountError::ZeroAmount);
        }
        Ok(())
    }

    // Event handlers

    fn apply_opened(&mut self, event: &AccountOpened) {
        self.owner = Some(event.owner.clone());
        self.status = AccountStatus::Open;
    }

    fn apply_deposited(&mut self, event: &Deposited) {
        self.balance = self.balance.saturating_add(event.amount);
    }

    fn apply_withdrawn(&mut self, event: &Withdrawn) {
        self.balance = self.balance.saturating_sub(event.amount);
    }

    fn apply_closed(&mut self, _event: &AccountClosed) {
        self.status = AccountStatus::Closed;
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for AccountAggregate {
    fn base(&self) -> &AggregateRootBase<Self> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AggregateRootBase<Self> {
        &mut self.base
    }

    fn handlers(table: &mut DispatchTableBuilder<Self>) {
        table
            .on(Self::apply_opened)
            .on(Self::apply_deposited)
            .on(Self::apply_withdrawn)
            .on(Self::apply_closed);
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
