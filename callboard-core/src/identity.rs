//! Identity types for CALLBOARD entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Common behavior for backend-issued identifiers.
///
/// The backend issues opaque string ids (document ids); the client never
/// parses or generates them, it only echoes them back in paths and bodies.
pub trait EntityIdType: Clone + Eq + std::hash::Hash + fmt::Display {
    /// Human readable name of the entity kind, used in error messages.
    const ENTITY_NAME: &'static str;

    fn new(raw: impl Into<String>) -> Self;

    fn as_str(&self) -> &str;
}

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $name:ident, $entity:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl EntityIdType for $name {
            const ENTITY_NAME: &'static str = $entity;

            fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

define_entity_id!(
    /// Identifier of a contact (the backend calls them customers).
    ContactId,
    "contact"
);
define_entity_id!(
    /// Identifier of a project.
    ProjectId,
    "project"
);
define_entity_id!(
    /// Identifier of a stored call detail record.
    CallDetailId,
    "call detail"
);
define_entity_id!(
    /// Identifier of a search group.
    SearchGroupId,
    "search group"
);
define_entity_id!(FlowId, "flow");
define_entity_id!(
    /// Provider-side agent identifier.
    AgentId,
    "agent"
);
define_entity_id!(
    /// Provider-side LLM configuration identifier.
    LlmId,
    "llm"
);
