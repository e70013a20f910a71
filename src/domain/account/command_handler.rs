use anyhow::{Context, Result};
use std::sync::Arc;
use uuid::Uuid;

use crate::event_sourcing::core::AggregateType;
use crate::event_sourcing::store::{EventSink, EventSource, Repository};

use super::aggregate::AccountAggregate;
use super::commands::AccountCommand;

// ============================================================================
// Account Command Handler
// ============================================================================
//
// Orchestrates: Command → Aggregate → Events → Event Store → Commit
//
// ============================================================================

pub struct AccountCommandHandler<S> {
    repository: Arc<Repository<S>>,
    aggregate_type: AggregateType,
}

impl<S> AccountCommandHandler<S>
where
    S: EventSource + EventSink,
{
    pub fn new(repository: Arc<Repository<S>>) -> Result<Self> {
        Ok(Self {
            repository,
            aggregate_type: AccountAggregate::aggregate_type()?,
        })
    }

    /// Handle a command and persist resulting events
    pub async fn handle(
        &self,
        aggregate_id: Uuid,
        command: AccountCommand,
        correlation_id: Uuid,
    ) -> Result<i64> {
        // Load current aggregate state
        let mut account = self
            .repository
            .load_as::<AccountAggregate>(&self.aggregate_type, aggregate_id)
            .await
            .with_context(|| format!("Failed to load account {aggregate_id}"))?;

        account
            .handle(&command)
            .with_context(|| format!("Command failed for account {aggregate_id}"))?;

        let new_version = self
            .repository
            .save(account.as_mut(), correlation_id)
            .await
            .with_context(|| format!("Failed to save account {aggregate_id}"))?;

        Ok(new_version)
    }

    /// Current state of an account, rebuilt from its stream
    pub async fn get(&self, aggregate_id: Uuid) -> Result<AccountAggregate> {
        let account = self
            .repository
            .load_as::<AccountAggregate>(&self.aggregate_type, aggregate_id)
            .await?;
        Ok(*account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{AccountError, AccountStatus};
    use crate::event_sourcing::core::AggregateRoot;
    use crate::event_sourcing::registry::AggregateRegistry;
    use crate::event_sourcing::store::InMemoryEventStore;

    fn handler() -> AccountCommandHandler<InMemoryEventStore> {
        let mut registry = AggregateRegistry::new();
        AccountAggregate::register(&mut registry).unwrap();
        let repository = Repository::new(Arc::new(registry), Arc::new(InMemoryEventStore::new()));
        AccountCommandHandler::new(Arc::new(repository)).unwrap()
    }

    #[tokio::test]
    async fn test_commands_persist_and_reload() {
        let handler = handler();
        let id = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();

        let v1 = handler
            .handle(id, AccountCommand::OpenAccount { owner: "Ada".to_string() }, correlation_id)
            .await
            .unwrap();
        let v2 = handler
            .handle(id, AccountCommand::Deposit { amount: 100 }, correlation_id)
            .await
            .unwrap();
        let v3 = handler
            .handle(id, AccountCommand::Withdraw { amount: 40 }, correlation_id)
            .await
            .unwrap();

        assert_eq!((v1, v2, v3), (1, 2, 3));

        let account = handler.get(id).await.unwrap();
        assert_eq!(account.id(), id);
        assert_eq!(account.version(), 3);
        assert_eq!(account.balance, 60);
        assert_eq!(account.status, AccountStatus::Open);
    }

    #[tokio::test]
    async fn test_rejected_command_writes_nothing() {
        let handler = handler();
        let id = Uuid::new_v4();

        let err = handler
            .handle(id, AccountCommand::Withdraw { amount: 1 }, Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err.downcast_ref::<AccountError>(), Some(AccountError::NotOpen)));
        assert_eq!(handler.get(id).await.unwrap().version(), 0);
    }
}
