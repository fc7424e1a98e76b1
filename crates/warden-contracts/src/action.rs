//! Action tags recorded in the audit log.
//!
//! The set is open-ended: any non-empty string is a valid tag. The constants
//! below are the tags the admin console emits. Tags are hashed into every
//! entry, so renaming one splits the history into two spellings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A string tag naming the privileged action that was performed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionTag(pub String);

impl ActionTag {
    pub const USER_BAN: &'static str = "user_ban";
    pub const USER_UNBAN: &'static str = "user_unban";
    pub const ADMIN_PROMOTE: &'static str = "admin_promote";
    pub const ADMIN_DEMOTE: &'static str = "admin_demote";
    pub const UPDATE_PERMISSIONS: &'static str = "update_permissions";
    pub const USER_DELETE: &'static str = "user_delete";
    pub const POST_DELETE: &'static str = "post_delete";
    pub const PRODUCT_DELETE: &'static str = "product_delete";
    pub const REPORTS_CLEAR: &'static str = "reports_clear";
    pub const VERIFICATION_APPROVE: &'static str = "verification_approve";
    pub const VERIFICATION_REJECT: &'static str = "verification_reject";
    pub const PURCHASE_STATUS_UPDATE: &'static str = "purchase_status_update";

    /// Every tag the reference admin console emits.
    pub const CONVENTIONAL: [&'static str; 12] = [
        Self::USER_BAN,
        Self::USER_UNBAN,
        Self::ADMIN_PROMOTE,
        Self::ADMIN_DEMOTE,
        Self::UPDATE_PERMISSIONS,
        Self::USER_DELETE,
        Self::POST_DELETE,
        Self::PRODUCT_DELETE,
        Self::REPORTS_CLEAR,
        Self::VERIFICATION_APPROVE,
        Self::VERIFICATION_REJECT,
        Self::PURCHASE_STATUS_UPDATE,
    ];

    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if this tag is one of [`ActionTag::CONVENTIONAL`].
    pub fn is_conventional(&self) -> bool {
        Self::CONVENTIONAL.contains(&self.0.as_str())
    }
}

impl fmt::Display for ActionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for ActionTag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
