use serde::{Deserialize, Serialize};

use crate::event_sourcing::core::DomainEvent;

// ============================================================================
// Account Events - one type per fact, dispatched by type
// ============================================================================

/// Account Opened - Initial event in account lifecycle
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AccountOpened {
    pub owner: String,
}

impl DomainEvent for AccountOpened {
    fn event_type(&self) -> &'static str {
        "AccountOpened"
    }
}

/// Deposited - Funds added
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Deposited {
    pub amount: u64,
}

impl DomainEvent for Deposited {
    fn event_type(&self) -> &'static str {
        "Deposited"
    }
}

/// Withdrawn - Funds removed
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Withdrawn {
    pub amount: u64,
}

impl DomainEvent for Withdrawn {
    fn event_type(&self) -> &'static str {
        "Withdrawn"
    }
}

/// Account Closed - Account lifecycle ended
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AccountClosed {
    pub reason: Option<String>,
}

impl DomainEvent for AccountClosed {
    fn event_type(&self) -> &'static str {
        "AccountClosed"
    }
}
