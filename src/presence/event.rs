//! Presence identifiers and events
//!
//! This is the shape in which a transport hands updates to the registry.
//! Events are applied in arrival order; ordering and deduplication are the
//! transport's concern.

use serde::{Deserialize, Serialize};

use crate::geometry::Position;

/// Stable identifier of a tracked entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create an identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Update delivered by the presence transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PresenceEvent {
    /// Entity observed for the first time
    Joined {
        /// Entity identifier
        id: EntityId,
        /// Reported position
        position: Position,
        /// Driven by this process (near-instant smoothing)
        #[serde(default)]
        local: bool,
    },

    /// New reported position
    Moved {
        /// Entity identifier
        id: EntityId,
        /// Reported position
        position: Position,
    },

    /// Entity departed
    Left {
        /// Entity identifier
        id: EntityId,
    },
}

impl PresenceEvent {
    /// Entity this event refers to
    pub fn id(&self) -> &EntityId {
        match self {
            Self::Joined { id, .. } | Self::Moved { id, .. } | Self::Left { id } => id,
        }
    }
}
