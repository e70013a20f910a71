use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use aggregate_kernel::domain::account::{AccountAggregate, AccountCommand, AccountCommandHandler};
use aggregate_kernel::domain::order::OrderAggregate;
use aggregate_kernel::{AggregateRegistry, InMemoryEventStore, RegistryConfig, Repository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,aggregate_kernel=debug")),
        )
        .init();

    tracing::info!("Starting aggregate kernel demo");

    // === 1. Register aggregate types, then seal ===
    let mut registry = AggregateRegistry::with_config(RegistryConfig::sealed_after_startup());
    AccountAggregate::register(&mut registry)?;
    OrderAggregate::register(&mut registry)?;
    tracing::info!(aggregate_types = ?registry.registered_types(), "Registry ready");

    // === 2. Wire repository over the in-memory store ===
    let store = Arc::new(InMemoryEventStore::new());
    let repository = Arc::new(Repository::new(Arc::new(registry), Arc::clone(&store)));
    let accounts = AccountCommandHandler::new(Arc::clone(&repository))?;

    // === 3. Run a few commands ===
    let account_id = Uuid::new_v4();
    let correlation_id = Uuid::new_v4();

    for command in [
        AccountCommand::OpenAccount { owner: "Ada".to_string() },
        AccountCommand::Deposit { amount: 100 },
        AccountCommand::Withdraw { amount: 30 },
    ] {
        let version = accounts.handle(account_id, command, correlation_id).await?;
        tracing::info!(account_id = %account_id, version, "Command committed");
    }

    if let Err(e) = accounts
        .handle(account_id, AccountCommand::Withdraw { amount: 500 }, correlation_id)
        .await
    {
        tracing::warn!(account_id = %account_id, error = %format!("{e:#}"), "Command rejected");
    }

    let account = accounts.get(account_id).await?;
    let stored_version = store.get_current_version(account_id).await;
    tracing::info!(
        account_id = %account_id,
        balance = account.balance,
        stored_version,
        "Final account state"
    );

    Ok(())
}
