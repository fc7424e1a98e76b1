//! Audit log entries and append requests.
//!
//! `NewEntry` is what an admin route hands to the log. `LogEntry` is what the
//! log hands back: the same fields plus the creation timestamp, the chain
//! position and the two hashes. Entries are never modified after they are
//! written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{
    action::ActionTag,
    error::{WardenError, WardenResult},
    identity::{AdminId, EntityId},
};

/// Free-form structured payload attached to an entry.
///
/// Opaque to the chain logic; it is hashed in a canonical serialized form.
pub type Details = Map<String, Value>;

/// The `prev_hash` of the first entry ever written.
pub const GENESIS: &str = "GENESIS";

/// One hash-linked record of a privileged admin action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Transport identifier. Not part of the hash.
    pub id: Uuid,

    /// Position in creation order, starting at 0. Not part of the hash.
    pub sequence: u64,

    pub admin: AdminId,

    pub action: ActionTag,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_user: Option<EntityId>,

    #[serde(default)]
    pub details: Details,

    /// Creation time (UTC). Never earlier than the previous entry's.
    pub timestamp: DateTime<Utc>,

    /// Hash of the previous entry, or [`GENESIS`] for the first one.
    pub prev_hash: String,

    /// Lowercase hex SHA-256 over admin, action, target, details, timestamp
    /// and prev_hash.
    pub hash: String,
}

impl LogEntry {
    /// True if this entry claims to be the first in the chain.
    pub fn is_genesis(&self) -> bool {
        self.prev_hash == GENESIS
    }
}

/// A request to append one entry.
///
/// There is deliberately no way to supply `hash` or `prev_hash`; the log
/// computes both while holding its append lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    pub admin: AdminId,
    pub action: ActionTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_user: Option<EntityId>,
    #[serde(default)]
    pub details: Details,
}

impl NewEntry {
    pub fn new(admin: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            admin: AdminId::new(admin),
            action: ActionTag::new(action),
            target_user: None,
            details: Details::new(),
        }
    }

    /// Set the affected entity.
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target_user = Some(EntityId::new(target));
        self
    }

    /// Add one key to the details payload, replacing any previous value.
    pub fn detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Replace the whole details payload.
    pub fn details(mut self, details: Details) -> Self {
        self.details = details;
        self
    }

    /// Reject requests without an actor or an action tag.
    ///
    /// Whitespace-only values count as missing.
    pub fn validate(&self) -> WardenResult<()> {
        if self.admin.as_str().trim().is_empty() {
            return Err(WardenError::validation("admin", "is required"));
        }
        if self.action.as_str().trim().is_empty() {
            return Err(WardenError::validation("action", "is required"));
        }
        Ok(())
    }
}
