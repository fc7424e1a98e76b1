//! Seed data for the marketplace reference runtime.
//!
//! All names and listings are fictional.

use std::collections::BTreeSet;

use crate::model::{
    Marketplace, Post, Product, Purchase, PurchaseStatus, Report, Role, User,
    VerificationRequest, VerificationStatus,
};

fn user(id: &str, name: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        display_name: name.to_string(),
        role,
        banned: false,
        permissions: BTreeSet::new(),
        seller_verified: false,
    }
}

/// A small marketplace with two admins, four members, and some content.
///
/// - `adminA`, `adminB`: admins
/// - `userX`: spammer with two reported posts
/// - `userY`: seller awaiting verification, one listed product
/// - `userZ`: buyer with a paid purchase
/// - `userW`: quiet member
pub fn seed() -> Marketplace {
    let mut m = Marketplace::default();

    for u in [
        user("adminA", "Ada Admin", Role::Admin),
        user("adminB", "Bo Admin", Role::Admin),
        user("userX", "Xavi Spam", Role::Member),
        user("userY", "Yara Seller", Role::Member),
        user("userZ", "Zed Buyer", Role::Member),
        user("userW", "Wen Quiet", Role::Member),
    ] {
        m.users.insert(u.id.clone(), u);
    }

    for (id, author, body) in [
        ("post-1", "userX", "CHEAP WATCHES click here"),
        ("post-2", "userX", "CHEAP WATCHES again"),
        ("post-3", "userW", "Anyone selling a used bike?"),
        ("post-4", "userY", "New handmade mugs in my shop"),
    ] {
        m.posts.insert(
            id.to_string(),
            Post {
                id: id.to_string(),
                author: author.to_string(),
                body: body.to_string(),
            },
        );
    }

    for (id, seller, title, price_cents) in [
        ("prod-1", "userY", "Handmade mug", 1800u64),
        ("prod-2", "userX", "Replica watch", 999u64),
    ] {
        m.products.insert(
            id.to_string(),
            Product {
                id: id.to_string(),
                seller: seller.to_string(),
                title: title.to_string(),
                price_cents,
            },
        );
    }

    for (id, reporter, target_id, reason) in [
        ("rep-1", "userW", "post-1", "spam"),
        ("rep-2", "userZ", "post-1", "spam"),
        ("rep-3", "userW", "post-2", "spam"),
        ("rep-4", "userZ", "prod-2", "counterfeit"),
    ] {
        m.reports.push(Report {
            id: id.to_string(),
            reporter: reporter.to_string(),
            target_id: target_id.to_string(),
            reason: reason.to_string(),
        });
    }

    m.verification_requests.insert(
        "userY".to_string(),
        VerificationRequest {
            user_id: "userY".to_string(),
            status: VerificationStatus::Pending,
            note: None,
        },
    );

    m.purchases.insert(
        "pur-1".to_string(),
        Purchase {
            id: "pur-1".to_string(),
            buyer: "userZ".to_string(),
            product: "prod-1".to_string(),
            status: PurchaseStatus::Paid,
        },
    );

    m
}

/// A marketplace with one admin and `count` reported posts, for load runs.
pub fn seed_with_posts(count: usize) -> Marketplace {
    let mut m = Marketplace::default();
    m.users.insert("adminA".to_string(), user("adminA", "Ada Admin", Role::Admin));
    m.users.insert("userX".to_string(), user("userX", "Xavi Spam", Role::Member));
    for i in 0..count {
        let id = format!("post-{i}");
        m.posts.insert(
            id.clone(),
            Post {
                id,
                author: "userX".to_string(),
                body: format!("spam #{i}"),
            },
        );
    }
    m
}
