//! Scenario 2: Tamper Drill
//!
//! adminA bans userX for spam and later lifts the ban. Someone with direct
//! database access then rewrites the ban's reason to make it look
//! unjustified. The drill shows:
//!
//! - the rewrite is reported at index 1, the entry after the edited one
//! - deleting the ban entry outright is reported too
//! - rewriting the newest entry together with its hash slips past the chain
//!   check, and is caught only against a previously published anchor

use std::sync::Arc;

use serde_json::json;

use warden_audit::{hash_entry, ChainVerifier, InMemoryEntryStore, LogChain};
use warden_contracts::{
    entry::LogEntry,
    error::WardenResult,
    identity::AdminId,
    verify::VerificationResult,
};

use crate::{console::AdminConsole, mock_data::seed};

/// Verification results for each tampering attempt.
#[derive(Debug)]
pub struct DrillOutcome {
    pub clean: VerificationResult,
    pub edited_reason: VerificationResult,
    pub deleted_entry: VerificationResult,
    pub forged_tip: VerificationResult,
    pub forged_tip_with_anchor: VerificationResult,
}

/// Load `entries` into a fresh store, as an attacker's edited copy would be.
fn verifier_over(entries: Vec<LogEntry>) -> ChainVerifier {
    let chain = LogChain::new(Arc::new(InMemoryEntryStore::from_entries(entries)));
    ChainVerifier::new(Arc::new(chain))
}

pub fn run_drill() -> WardenResult<DrillOutcome> {
    let chain = Arc::new(LogChain::in_memory());
    let console = AdminConsole::new(seed(), chain.clone());
    let ada = AdminId::new("adminA");

    console.ban_user(&ada, "userX", "spam")?;
    console.unban_user(&ada, "userX")?;
    console.clear_reports(&ada, "post-1")?;

    let clean = console.verify_audit_trail()?;
    let anchor = chain.anchor()?;
    let stored = chain.list()?;

    let mut edited = stored.clone();
    edited[0].details.insert("reason".to_string(), json!("tampered"));
    let edited_reason = verifier_over(edited).verify()?;

    let mut deleted = stored.clone();
    deleted.remove(1);
    let deleted_entry = verifier_over(deleted).verify()?;

    let mut forged = stored;
    if let Some(last) = forged.last_mut() {
        last.details.insert("cleared".to_string(), json!(0));
        last.hash = hash_entry(last);
    }
    let forged_verifier = verifier_over(forged);
    let forged_tip = forged_verifier.verify()?;
    let forged_tip_with_anchor = match &anchor {
        Some(anchor) => forged_verifier.verify_with_anchor(anchor)?,
        None => forged_tip.clone(),
    };

    Ok(DrillOutcome {
        clean,
        edited_reason,
        deleted_entry,
        forged_tip,
        forged_tip_with_anchor,
    })
}

fn describe(result: &VerificationResult) -> String {
    match (result.valid, result.tampered_index, result.breach) {
        (true, _, _) => "valid".to_string(),
        (false, Some(index), Some(breach)) => format!("TAMPERED at index {index} ({breach:?})"),
        (false, _, _) => "TAMPERED".to_string(),
    }
}

/// Run Scenario 2 and print each verification result.
pub fn run_scenario() -> WardenResult<()> {
    println!("=== Scenario 2: Tamper Drill ===");
    println!();

    let outcome = run_drill()?;

    println!("  Untouched trail:                    {}", describe(&outcome.clean));
    println!("  Ban reason rewritten in storage:    {}", describe(&outcome.edited_reason));
    println!("  Unban entry deleted:                {}", describe(&outcome.deleted_entry));
    println!("  Newest entry forged with new hash:  {}", describe(&outcome.forged_tip));
    println!(
        "  ...checked against published anchor: {}",
        describe(&outcome.forged_tip_with_anchor)
    );
    println!();
    println!("  Scenario 2 complete.");
    println!();

    Ok(())
}
