//! In-memory marketplace state the admin console operates on.
//!
//! This stands in for the application's document store. Only the fields the
//! admin console touches are modelled.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use warden_contracts::{
    error::{WardenError, WardenResult},
    identity::AdminId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Member,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub role: Role,
    pub banned: bool,
    pub permissions: BTreeSet<String>,
    pub seller_verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub seller: String,
    pub title: String,
    pub price_cents: u64,
}

/// A user report against a post, product or user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub reporter: String,
    pub target_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

/// A seller's request to be marked as verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub user_id: String,
    pub status: VerificationStatus,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Refunded,
    Cancelled,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Paid => "paid",
            PurchaseStatus::Shipped => "shipped",
            PurchaseStatus::Delivered => "delivered",
            PurchaseStatus::Refunded => "refunded",
            PurchaseStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: String,
    pub buyer: String,
    pub product: String,
    pub status: PurchaseStatus,
}

/// Everything the admin console can read or change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marketplace {
    pub users: BTreeMap<String, User>,
    pub posts: BTreeMap<String, Post>,
    pub products: BTreeMap<String, Product>,
    pub reports: Vec<Report>,
    pub verification_requests: BTreeMap<String, VerificationRequest>,
    pub purchases: BTreeMap<String, Purchase>,
}

fn not_found(kind: &str, id: &str) -> WardenError {
    WardenError::NotFound {
        kind: kind.to_string(),
        id: id.to_string(),
    }
}

impl Marketplace {
    pub fn user(&self, id: &str) -> WardenResult<&User> {
        self.users.get(id).ok_or_else(|| not_found("user", id))
    }

    pub fn user_mut(&mut self, id: &str) -> WardenResult<&mut User> {
        self.users.get_mut(id).ok_or_else(|| not_found("user", id))
    }

    pub fn post(&self, id: &str) -> WardenResult<&Post> {
        self.posts.get(id).ok_or_else(|| not_found("post", id))
    }

    pub fn product(&self, id: &str) -> WardenResult<&Product> {
        self.products.get(id).ok_or_else(|| not_found("product", id))
    }

    pub fn purchase(&self, id: &str) -> WardenResult<&Purchase> {
        self.purchases.get(id).ok_or_else(|| not_found("purchase", id))
    }

    pub fn purchase_mut(&mut self, id: &str) -> WardenResult<&mut Purchase> {
        self.purchases.get_mut(id).ok_or_else(|| not_found("purchase", id))
    }

    pub fn verification_request_mut(&mut self, user_id: &str) -> WardenResult<&mut VerificationRequest> {
        self.verification_requests
            .get_mut(user_id)
            .ok_or_else(|| not_found("verification request", user_id))
    }

    /// Reject actors that are unknown, banned or not admins.
    pub fn require_admin(&self, actor: &AdminId, action: &str) -> WardenResult<()> {
        match self.users.get(actor.as_str()) {
            Some(user) if user.role == Role::Admin && !user.banned => Ok(()),
            _ => Err(WardenError::PermissionDenied {
                actor: actor.to_string(),
                action: action.to_string(),
            }),
        }
    }

    /// Number of open reports against `target_id`.
    pub fn open_reports(&self, target_id: &str) -> usize {
        self.reports.iter().filter(|r| r.target_id == target_id).count()
    }
}
