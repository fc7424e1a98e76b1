//! The admin console: every privileged marketplace operation, audited.
//!
//! Each operation follows the same path:
//!
//!   Lock state → Check actor is an admin → Describe the action → Gate
//!
//! where the gate applies the mutation and appends exactly one log entry, or
//! leaves both the state and the log untouched. Permission failures and
//! unknown targets are not audited, since nothing privileged happened.

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::json;
use tracing::debug;

use warden_audit::{ChainVerifier, LogChain};
use warden_contracts::{
    action::ActionTag,
    entry::{LogEntry, NewEntry},
    error::{WardenError, WardenResult},
    identity::AdminId,
    verify::{TipAnchor, VerificationResult},
};
use warden_core::{traits::AuditTrail, AuditGate};

use crate::model::{Marketplace, PurchaseStatus, Role, VerificationStatus};

/// Admin-facing operations over a [`Marketplace`].
pub struct AdminConsole {
    state: Mutex<Marketplace>,
    chain: Arc<LogChain>,
    gate: AuditGate,
    verifier: ChainVerifier,
}

impl AdminConsole {
    pub fn new(marketplace: Marketplace, chain: Arc<LogChain>) -> Self {
        let trail: Arc<dyn AuditTrail> = chain.clone();
        Self {
            state: Mutex::new(marketplace),
            gate: AuditGate::new(trail.clone()),
            verifier: ChainVerifier::new(trail),
            chain,
        }
    }

    fn lock(&self) -> WardenResult<MutexGuard<'_, Marketplace>> {
        self.state
            .lock()
            .map_err(|e| WardenError::storage(format!("marketplace state lock poisoned: {}", e)))
    }

    /// A copy of the current marketplace state.
    pub fn snapshot(&self) -> WardenResult<Marketplace> {
        Ok(self.lock()?.clone())
    }

    /// Run one privileged operation.
    ///
    /// `describe` reads the pre-mutation state and builds the log request;
    /// `apply` performs the mutation.
    fn audited<T, D, F>(
        &self,
        actor: &AdminId,
        action: &'static str,
        describe: D,
        apply: F,
    ) -> WardenResult<(T, LogEntry)>
    where
        D: FnOnce(&Marketplace) -> WardenResult<NewEntry>,
        F: FnOnce(&mut Marketplace) -> WardenResult<T>,
    {
        let mut state = self.lock()?;
        state.require_admin(actor, action)?;
        let request = describe(&*state)?;
        debug!(admin = %actor, action, "admin action requested");
        self.gate.perform(&mut *state, request, apply)
    }

    // ── Users ─────────────────────────────────────────────────────────────────

    pub fn ban_user(&self, actor: &AdminId, user_id: &str, reason: &str) -> WardenResult<LogEntry> {
        let action = ActionTag::USER_BAN;
        self.audited(
            actor,
            action,
            |m| {
                if m.user(user_id)?.banned {
                    return Err(WardenError::validation("targetUser", "is already banned"));
                }
                Ok(NewEntry::new(actor.as_str(), action)
                    .target(user_id)
                    .detail("reason", reason))
            },
            |m| {
                m.user_mut(user_id)?.banned = true;
                Ok(())
            },
        )
        .map(|(_, entry)| entry)
    }

    pub fn unban_user(&self, actor: &AdminId, user_id: &str) -> WardenResult<LogEntry> {
        let action = ActionTag::USER_UNBAN;
        self.audited(
            actor,
            action,
            |m| {
                if !m.user(user_id)?.banned {
                    return Err(WardenError::validation("targetUser", "is not banned"));
                }
                Ok(NewEntry::new(actor.as_str(), action).target(user_id))
            },
            |m| {
                m.user_mut(user_id)?.banned = false;
                Ok(())
            },
        )
        .map(|(_, entry)| entry)
    }

    pub fn promote_admin(&self, actor: &AdminId, user_id: &str) -> WardenResult<LogEntry> {
        self.set_role(actor, user_id, Role::Admin, ActionTag::ADMIN_PROMOTE)
    }

    /// Demote an admin to member. Admins cannot demote themselves.
    pub fn demote_admin(&self, actor: &AdminId, user_id: &str) -> WardenResult<LogEntry> {
        if actor.as_str() == user_id {
            return Err(WardenError::validation("targetUser", "cannot be the acting admin"));
        }
        self.set_role(actor, user_id, Role::Member, ActionTag::ADMIN_DEMOTE)
    }

    fn set_role(
        &self,
        actor: &AdminId,
        user_id: &str,
        role: Role,
        action: &'static str,
    ) -> WardenResult<LogEntry> {
        self.audited(
            actor,
            action,
            |m| {
                let previous = m.user(user_id)?.role;
                if previous == role {
                    return Err(WardenError::validation(
                        "targetUser",
                        format!("already has role {}", role.as_str()),
                    ));
                }
                Ok(NewEntry::new(actor.as_str(), action)
                    .target(user_id)
                    .detail("previousRole", previous.as_str())
                    .detail("newRole", role.as_str()))
            },
            |m| {
                m.user_mut(user_id)?.role = role;
                Ok(())
            },
        )
        .map(|(_, entry)| entry)
    }

    /// Replace a user's permission set.
    pub fn update_permissions(
        &self,
        actor: &AdminId,
        user_id: &str,
        permissions: &[&str],
    ) -> WardenResult<LogEntry> {
        let action = ActionTag::UPDATE_PERMISSIONS;
        let after: Vec<String> = {
            let mut p: Vec<String> = permissions.iter().map(|s| s.to_string()).collect();
            p.sort();
            p.dedup();
            p
        };

        self.audited(
            actor,
            action,
            |m| {
                let before: Vec<&String> = m.user(user_id)?.permissions.iter().collect();
                Ok(NewEntry::new(actor.as_str(), action)
                    .target(user_id)
                    .detail("before", json!(before))
                    .detail("after", json!(after)))
            },
            |m| {
                m.user_mut(user_id)?.permissions = after.iter().cloned().collect();
                Ok(())
            },
        )
        .map(|(_, entry)| entry)
    }

    /// Delete a user along with their posts, listings and open reports.
    pub fn delete_user(&self, actor: &AdminId, user_id: &str) -> WardenResult<LogEntry> {
        if actor.as_str() == user_id {
            return Err(WardenError::validation("targetUser", "cannot be the acting admin"));
        }
        let action = ActionTag::USER_DELETE;
        self.audited(
            actor,
            action,
            |m| {
                m.user(user_id)?;
                let posts = m.posts.values().filter(|p| p.author == user_id).count();
                let products = m.products.values().filter(|p| p.seller == user_id).count();
                Ok(NewEntry::new(actor.as_str(), action)
                    .target(user_id)
                    .detail("postsRemoved", posts)
                    .detail("productsRemoved", products))
            },
            |m| {
                m.users.remove(user_id);
                m.posts.retain(|_, p| p.author != user_id);
                m.products.retain(|_, p| p.seller != user_id);
                let remaining_targets: Vec<String> = m
                    .posts
                    .keys()
                    .chain(m.products.keys())
                    .chain(m.users.keys())
                    .cloned()
                    .collect();
                m.reports
                    .retain(|r| remaining_targets.iter().any(|id| *id == r.target_id));
                m.verification_requests.remove(user_id);
                Ok(())
            },
        )
        .map(|(_, entry)| entry)
    }

    // ── Content ───────────────────────────────────────────────────────────────

    pub fn delete_post(&self, actor: &AdminId, post_id: &str, reason: &str) -> WardenResult<LogEntry> {
        let action = ActionTag::POST_DELETE;
        self.audited(
            actor,
            action,
            |m| {
                let post = m.post(post_id)?;
                Ok(NewEntry::new(actor.as_str(), action)
                    .target(post.author.as_str())
                    .detail("postId", post_id)
                    .detail("reason", reason))
            },
            |m| {
                m.posts.remove(post_id);
                m.reports.retain(|r| r.target_id != post_id);
                Ok(())
            },
        )
        .map(|(_, entry)| entry)
    }

    pub fn delete_product(
        &self,
        actor: &AdminId,
        product_id: &str,
        reason: &str,
    ) -> WardenResult<LogEntry> {
        let action = ActionTag::PRODUCT_DELETE;
        self.audited(
            actor,
            action,
            |m| {
                let product = m.product(product_id)?;
                Ok(NewEntry::new(actor.as_str(), action)
                    .target(product.seller.as_str())
                    .detail("productId", product_id)
                    .detail("title", product.title.as_str())
                    .detail("reason", reason))
            },
            |m| {
                m.products.remove(product_id);
                m.reports.retain(|r| r.target_id != product_id);
                Ok(())
            },
        )
        .map(|(_, entry)| entry)
    }

    /// Dismiss every open report against `target_id`.
    pub fn clear_reports(&self, actor: &AdminId, target_id: &str) -> WardenResult<LogEntry> {
        let action = ActionTag::REPORTS_CLEAR;
        self.audited(
            actor,
            action,
            |m| {
                let open = m.open_reports(target_id);
                if open == 0 {
                    return Err(WardenError::NotFound {
                        kind: "reports for".to_string(),
                        id: target_id.to_string(),
                    });
                }
                Ok(NewEntry::new(actor.as_str(), action)
                    .target(target_id)
                    .detail("cleared", open))
            },
            |m| {
                m.reports.retain(|r| r.target_id != target_id);
                Ok(())
            },
        )
        .map(|(_, entry)| entry)
    }

    // ── Seller verification ───────────────────────────────────────────────────

    pub fn approve_verification(&self, actor: &AdminId, user_id: &str) -> WardenResult<LogEntry> {
        self.decide_verification(actor, user_id, VerificationStatus::Approved, None)
    }

    pub fn reject_verification(
        &self,
        actor: &AdminId,
        user_id: &str,
        reason: &str,
    ) -> WardenResult<LogEntry> {
        self.decide_verification(actor, user_id, VerificationStatus::Rejected, Some(reason))
    }

    fn decide_verification(
        &self,
        actor: &AdminId,
        user_id: &str,
        decision: VerificationStatus,
        reason: Option<&str>,
    ) -> WardenResult<LogEntry> {
        let action = match decision {
            VerificationStatus::Approved => ActionTag::VERIFICATION_APPROVE,
            _ => ActionTag::VERIFICATION_REJECT,
        };
        self.audited(
            actor,
            action,
            |m| {
                let pending = m
                    .verification_requests
                    .get(user_id)
                    .map(|r| r.status == VerificationStatus::Pending)
                    .unwrap_or(false);
                if !pending {
                    return Err(WardenError::NotFound {
                        kind: "pending verification request".to_string(),
                        id: user_id.to_string(),
                    });
                }
                let mut request = NewEntry::new(actor.as_str(), action).target(user_id);
                if let Some(reason) = reason {
                    request = request.detail("reason", reason);
                }
                Ok(request)
            },
            |m| {
                let request = m.verification_request_mut(user_id)?;
                request.status = decision;
                request.note = reason.map(str::to_string);
                m.user_mut(user_id)?.seller_verified = decision == VerificationStatus::Approved;
                Ok(())
            },
        )
        .map(|(_, entry)| entry)
    }

    // ── Purchases ─────────────────────────────────────────────────────────────

    pub fn update_purchase_status(
        &self,
        actor: &AdminId,
        purchase_id: &str,
        status: PurchaseStatus,
    ) -> WardenResult<LogEntry> {
        let action = ActionTag::PURCHASE_STATUS_UPDATE;
        self.audited(
            actor,
            action,
            |m| {
                let purchase = m.purchase(purchase_id)?;
                if purchase.status == status {
                    return Err(WardenError::validation(
                        "status",
                        format!("purchase is already {}", status.as_str()),
                    ));
                }
                Ok(NewEntry::new(actor.as_str(), action)
                    .target(purchase.buyer.as_str())
                    .detail("purchaseId", purchase_id)
                    .detail("from", purchase.status.as_str())
                    .detail("to", status.as_str()))
            },
            |m| {
                m.purchase_mut(purchase_id)?.status = status;
                Ok(())
            },
        )
        .map(|(_, entry)| entry)
    }

    // ── Audit trail ───────────────────────────────────────────────────────────

    /// The full audit trail, oldest first.
    pub fn audit_trail(&self) -> WardenResult<Vec<LogEntry>> {
        self.chain.list()
    }

    /// The "verify logs" action.
    pub fn verify_audit_trail(&self) -> WardenResult<VerificationResult> {
        self.verifier.verify()
    }

    pub fn audit_anchor(&self) -> WardenResult<Option<TipAnchor>> {
        self.chain.anchor()
    }
}
