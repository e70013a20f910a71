use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::AggregateError;

// ============================================================================
// Aggregate Type - Registry Key
// ============================================================================
//
// An explicit label ("Account", "Order") identifying a class of aggregate.
// Two differently-configured constructors for the same Rust type can live
// under two labels.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AggregateType(String);

impl AggregateType {
    /// Create a new aggregate type label. Blank labels are rejected.
    pub fn new(label: impl Into<String>) -> Result<Self, AggregateError> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(AggregateError::InvalidArgument(
                "aggregate type label cannot be empty".to_string(),
            ));
        }
        Ok(Self(label))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AggregateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AggregateType {
    type Error = AggregateError;

    fn try_from(label: String) -> Result<Self, Self::Error> {
        Self::new(label)
    }
}

impl TryFrom<&str> for AggregateType {
    type Error = AggregateError;

    fn try_from(label: &str) -> Result<Self, Self::Error> {
        Self::new(label)
    }
}

impl From<AggregateType> for String {
    fn from(aggregate_type: AggregateType) -> Self {
        aggregate_type.0
    }
}

impl AsRef<str> for AggregateType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
