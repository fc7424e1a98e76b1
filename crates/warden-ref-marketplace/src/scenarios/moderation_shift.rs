//! Scenario 1: Moderation Shift
//!
//! Two admins work through the morning queue: a spammer is banned and their
//! posts removed, a seller is verified, a purchase is refunded, a moderator
//! is promoted. One request is refused (a member tries to ban someone) and
//! one fails on an unknown target; neither reaches the log. The trail is
//! then verified.

use std::sync::Arc;

use warden_audit::LogChain;
use warden_contracts::{
    error::{WardenError, WardenResult},
    identity::AdminId,
    verify::VerificationResult,
};

use crate::{console::AdminConsole, mock_data::seed, model::PurchaseStatus};

use super::print_trail;

/// What the shift left behind.
#[derive(Debug)]
pub struct ShiftOutcome {
    pub entries: usize,
    pub refused: usize,
    pub verification: VerificationResult,
}

/// Run the shift against `chain` and report the result.
pub fn run_shift(chain: Arc<LogChain>) -> WardenResult<ShiftOutcome> {
    let console = AdminConsole::new(seed(), chain);
    let ada = AdminId::new("adminA");
    let bo = AdminId::new("adminB");

    console.delete_post(&ada, "post-1", "spam")?;
    console.delete_post(&ada, "post-2", "spam")?;
    console.ban_user(&ada, "userX", "repeated spam")?;
    console.delete_product(&bo, "prod-2", "counterfeit listing")?;
    console.approve_verification(&bo, "userY")?;
    console.update_purchase_status(&bo, "pur-1", PurchaseStatus::Refunded)?;
    console.update_permissions(&ada, "userW", &["moderate_posts", "view_reports"])?;
    console.promote_admin(&ada, "userW")?;

    let refused = [
        console.ban_user(&AdminId::new("userZ"), "userY", "grudge"),
        console.delete_post(&bo, "post-404", "spam"),
    ]
    .into_iter()
    .filter(|attempt| {
        matches!(
            attempt,
            Err(WardenError::PermissionDenied { .. }) | Err(WardenError::NotFound { .. })
        )
    })
    .count();

    Ok(ShiftOutcome {
        entries: console.audit_trail()?.len(),
        refused,
        verification: console.verify_audit_trail()?,
    })
}

/// Run Scenario 1 against an in-memory log and print the trail.
pub fn run_scenario() -> WardenResult<()> {
    println!("=== Scenario 1: Moderation Shift ===");
    println!();

    let chain = Arc::new(LogChain::in_memory());
    let outcome = run_shift(chain.clone())?;

    print_trail(&chain.list()?);
    println!();
    println!("  Refused requests (not audited): {}", outcome.refused);
    println!(
        "  Audit chain integrity:          {} ({} entries)",
        if outcome.verification.valid { "VERIFIED" } else { "FAILED" },
        outcome.entries
    );
    if let Some(anchor) = chain.anchor()? {
        println!("  Publish this anchor:            #{} {}", anchor.sequence, anchor.hash);
    }
    println!();
    println!("  Scenario 1 complete.");
    println!();

    Ok(())
}
