use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Registry Configuration
// ============================================================================

/// How `create` mints a fresh aggregate identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// UUID v4
    #[default]
    Random,
    /// UUID v7, sortable by creation time
    TimeOrdered,
}

impl IdStrategy {
    pub fn generate(self) -> Uuid {
        match self {
            IdStrategy::Random => Uuid::new_v4(),
            IdStrategy::TimeOrdered => Uuid::now_v7(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Identity generator used by `create`
    pub id_strategy: IdStrategy,
    /// Seal the registry the first time an aggregate is created
    pub seal_on_first_create: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            id_strategy: IdStrategy::Random,
            seal_on_first_create: false,
        }
    }
}

impl RegistryConfig {
    /// Registration is only allowed until the first aggregate is created
    pub fn sealed_after_startup() -> Self {
        Self {
            seal_on_first_create: true,
            ..Self::default()
        }
    }

    /// Time-ordered identities, useful when ids double as storage keys
    pub fn time_ordered() -> Self {
        Self {
            id_strategy: IdStrategy::TimeOrdered,
            ..Self::default()
        }
    }
}
