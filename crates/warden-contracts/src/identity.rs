//! Actor and target identifiers.
//!
//! WARDEN does not authenticate anyone. The hosting application resolves the
//! acting admin from its session layer and hands the identifier over as an
//! opaque string; the audit log only records it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of the admin performing a privileged action.
///
/// Example: `AdminId("adminA".into())`. Serialized as a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdminId(pub String);

impl AdminId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AdminId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for AdminId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identifier of the entity a privileged action was applied to.
///
/// Usually a user id, but post, product and purchase ids are recorded the
/// same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
