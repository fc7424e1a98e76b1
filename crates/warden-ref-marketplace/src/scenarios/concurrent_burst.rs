//! Scenario 3: Concurrent Burst
//!
//! A spam wave lands and several request handlers delete posts at the same
//! time, while a separate service writes to the same log through its own
//! `LogChain`. Appends from both are serialized, so the result is one
//! unbroken chain with no shared `prev_hash`.

use std::{collections::HashSet, sync::Arc, thread};

use warden_audit::{ChainVerifier, InMemoryEntryStore, LogChain};
use warden_contracts::{
    action::ActionTag,
    entry::NewEntry,
    error::{WardenError, WardenResult},
    identity::AdminId,
    verify::VerificationResult,
};
use warden_core::traits::EntryStore;

use crate::{console::AdminConsole, mock_data::seed_with_posts};

#[derive(Debug)]
pub struct BurstOutcome {
    pub entries: usize,
    pub distinct_prev_hashes: usize,
    pub verification: VerificationResult,
}

/// Delete `posts` posts from `handlers` threads while a second writer
/// appends `side_writes` entries.
pub fn run_burst(handlers: usize, posts: usize, side_writes: usize) -> WardenResult<BurstOutcome> {
    let store: Arc<dyn EntryStore> = Arc::new(InMemoryEntryStore::new());
    let console = Arc::new(AdminConsole::new(
        seed_with_posts(posts),
        Arc::new(LogChain::new(store.clone()).with_max_conflict_retries(64)),
    ));
    let side_chain = LogChain::new(store.clone()).with_max_conflict_retries(u32::MAX);

    let results: Vec<WardenResult<()>> = thread::scope(|scope| {
        let mut joins = Vec::new();

        for h in 0..handlers {
            let console = console.clone();
            joins.push(scope.spawn(move || -> WardenResult<()> {
                let admin = AdminId::new("adminA");
                for i in (h..posts).step_by(handlers.max(1)) {
                    console.delete_post(&admin, &format!("post-{i}"), "spam wave")?;
                }
                Ok(())
            }));
        }

        let side_chain = &side_chain;
        joins.push(scope.spawn(move || -> WardenResult<()> {
            for i in 0..side_writes {
                side_chain.append(
                    NewEntry::new("trust-and-safety-bot", ActionTag::REPORTS_CLEAR)
                        .detail("batch", i),
                )?;
            }
            Ok(())
        }));

        joins
            .into_iter()
            .map(|j| {
                j.join()
                    .unwrap_or_else(|_| Err(WardenError::storage("audit writer thread panicked")))
            })
            .collect()
    });
    for result in results {
        result?;
    }

    let entries = store.scan()?;
    let distinct_prev_hashes = entries
        .iter()
        .map(|e| e.prev_hash.as_str())
        .collect::<HashSet<_>>()
        .len();

    Ok(BurstOutcome {
        entries: entries.len(),
        distinct_prev_hashes,
        verification: ChainVerifier::new(Arc::new(LogChain::new(store))).verify()?,
    })
}

/// Run Scenario 3 and print the chain shape.
pub fn run_scenario() -> WardenResult<()> {
    println!("=== Scenario 3: Concurrent Burst ===");
    println!();

    let outcome = run_burst(8, 64, 16)?;

    println!("  Entries written:        {}", outcome.entries);
    println!("  Distinct prev hashes:   {}", outcome.distinct_prev_hashes);
    println!(
        "  Audit chain integrity:  {}",
        if outcome.verification.valid { "VERIFIED" } else { "FAILED" }
    );
    println!();
    println!("  Scenario 3 complete.");
    println!();

    Ok(())
}
