//! # warden-audit
//!
//! Append-only, SHA-256 hash-chained audit log of privileged admin actions.
//!
//! ## Overview
//!
//! Every admin action is appended to a [`LogChain`] as a [`LogEntry`] whose
//! `prev_hash` is the hash of the entry before it. [`ChainVerifier`] walks
//! the stored sequence and reports the first entry that no longer fits its
//! predecessor. Editing any entry except the last one, deleting an entry, or
//! reordering entries is detected.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use warden_audit::{ChainVerifier, LogChain};
//! use warden_contracts::NewEntry;
//!
//! let chain = Arc::new(LogChain::in_memory());
//! chain.append(NewEntry::new("adminA", "user_ban").target("userX").detail("reason", "spam"))?;
//!
//! let result = ChainVerifier::new(chain.clone()).verify()?;
//! assert!(result.valid);
//! ```
//!
//! [`LogEntry`]: warden_contracts::LogEntry

pub mod chain;
pub mod config;
pub mod jsonl;
pub mod memory;
pub mod store;
pub mod verifier;

pub use chain::{hash_entry, hash_fields, verify_against_anchor, verify_entries, CANONICAL_FORM};
pub use config::{StoreBackend, StoreConfig, WardenConfig};
pub use jsonl::JsonlEntryStore;
pub use memory::InMemoryEntryStore;
pub use store::LogChain;
pub use verifier::ChainVerifier;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::{
        collections::HashSet,
        sync::{Arc, Mutex},
    };

    use chrono::{DateTime, Duration, TimeZone, Utc};
    use serde_json::json;

    use warden_contracts::{
        entry::{LogEntry, NewEntry, GENESIS},
        error::WardenError,
        verify::{ChainBreach, VerificationResult},
    };
    use warden_core::traits::{Clock, EntryStore};

    use super::{hash_entry, verify_entries, ChainVerifier, InMemoryEntryStore, LogChain};

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// A clock the test moves by hand.
    struct ManualClock(Mutex<DateTime<Utc>>);

    impl ManualClock {
        fn at(ts: DateTime<Utc>) -> Arc<Self> {
            Arc::new(Self(Mutex::new(ts)))
        }

        fn set(&self, ts: DateTime<Utc>) {
            *self.0.lock().unwrap() = ts;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn ban(n: usize) -> NewEntry {
        NewEntry::new("adminA", "user_ban")
            .target(format!("user{n}"))
            .detail("reason", "spam")
            .detail("n", n)
    }

    /// A chain of `n` entries, returned as stored.
    fn chain_of(n: usize) -> Vec<LogEntry> {
        let chain = LogChain::in_memory();
        for i in 0..n {
            chain.append(ban(i)).unwrap();
        }
        chain.list().unwrap()
    }

    fn verify_stored(entries: Vec<LogEntry>) -> VerificationResult {
        let chain = Arc::new(LogChain::new(Arc::new(InMemoryEntryStore::from_entries(entries))));
        ChainVerifier::new(chain).verify().unwrap()
    }

    // ── Append ────────────────────────────────────────────────────────────────

    /// The first entry links to the genesis sentinel.
    #[test]
    fn test_genesis_prev_hash() {
        let chain = LogChain::in_memory();
        let first = chain.append(ban(0)).unwrap();

        assert_eq!(first.prev_hash, GENESIS);
        assert_eq!(first.sequence, 0);
        assert_eq!(hash_entry(&first), first.hash);
    }

    /// Every entry's prev_hash is its predecessor's hash.
    #[test]
    fn test_chain_linkage() {
        let entries = chain_of(5);
        for i in 1..entries.len() {
            assert_eq!(entries[i].prev_hash, entries[i - 1].hash, "link broken at {i}");
            assert_eq!(entries[i].sequence, i as u64);
        }
    }

    #[test]
    fn test_append_returns_stored_entry() {
        let chain = LogChain::in_memory();
        let appended = chain.append(ban(7)).unwrap();

        assert_eq!(chain.list().unwrap(), vec![appended.clone()]);
        assert_eq!(chain.tip().unwrap(), Some(appended));
        assert_eq!(chain.len().unwrap(), 1);
        assert!(!chain.is_empty().unwrap());
    }

    #[test]
    fn test_append_rejects_missing_fields() {
        let chain = LogChain::in_memory();

        let err = chain.append(NewEntry::new("", "user_ban")).unwrap_err();
        assert!(matches!(err, WardenError::Validation { ref field, .. } if field == "admin"));

        let err = chain.append(NewEntry::new("adminA", "")).unwrap_err();
        assert!(matches!(err, WardenError::Validation { ref field, .. } if field == "action"));

        assert!(chain.is_empty().unwrap(), "rejected requests must not be stored");
    }

    #[test]
    fn test_len_counts_stored_entries() {
        let mut entries = chain_of(4);
        entries.remove(1);

        let chain = LogChain::new(Arc::new(InMemoryEntryStore::from_entries(entries)));
        assert_eq!(chain.len().unwrap(), 3);
        assert_eq!(chain.tip().unwrap().map(|tip| tip.sequence), Some(3));
    }

    /// Two stores on one file would each append against their own cached tip.
    #[test]
    fn test_second_jsonl_writer_cannot_fork_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("admin.jsonl");

        let first = LogChain::new(Arc::new(super::JsonlEntryStore::open(&path).unwrap()));
        first.append(ban(0)).unwrap();

        let err = super::JsonlEntryStore::open(&path).err();
        assert!(matches!(err, Some(WardenError::Storage { .. })));

        first.append(ban(1)).unwrap();
        drop(first);

        let second = LogChain::new(Arc::new(super::JsonlEntryStore::open(&path).unwrap()));
        let third = second.append(ban(2)).unwrap();
        assert_eq!(third.sequence, 2);

        let entries = second.list().unwrap();
        let prev_hashes: HashSet<&str> = entries.iter().map(|e| e.prev_hash.as_str()).collect();
        assert_eq!(prev_hashes.len(), 3);
        assert_eq!(verify_entries(&entries), VerificationResult::intact(3));
    }

    #[test]
    fn test_entry_without_target_or_details() {
        let chain = LogChain::in_memory();
        let entry = chain.append(NewEntry::new("adminB", "reports_clear")).unwrap();

        assert!(entry.target_user.is_none());
        assert!(entry.details.is_empty());
        assert!(verify_entries(&chain.list().unwrap()).valid);
    }

    /// A clock that steps backwards never produces a timestamp earlier than
    /// the tip's.
    #[test]
    fn test_timestamps_never_run_backwards() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let clock = ManualClock::at(start);
        let chain = LogChain::in_memory().with_clock(clock.clone());

        let first = chain.append(ban(0)).unwrap();
        clock.set(start - Duration::minutes(5));
        let second = chain.append(ban(1)).unwrap();

        assert_eq!(second.timestamp, first.timestamp);
        assert_eq!(second.sequence, 1);
        assert!(verify_entries(&chain.list().unwrap()).valid);
    }

    // ── Verification ──────────────────────────────────────────────────────────

    #[test]
    fn test_verify_empty() {
        let result = ChainVerifier::new(Arc::new(LogChain::in_memory())).verify().unwrap();
        assert_eq!(result, VerificationResult::intact(0));
        assert!(verify_entries(&[]).valid);
    }

    #[test]
    fn test_clean_chain_is_valid() {
        let result = verify_stored(chain_of(6));
        assert_eq!(result, VerificationResult::intact(6));
    }

    /// ban → unban verifies; overwriting the first entry's details in storage
    /// is reported at index 1.
    #[test]
    fn test_ban_unban_scenario() {
        let chain = Arc::new(LogChain::in_memory());
        chain
            .append(NewEntry::new("adminA", "user_ban").target("userX").detail("reason", "spam"))
            .unwrap();
        chain
            .append(NewEntry::new("adminA", "user_unban").target("userX"))
            .unwrap();

        let verifier = ChainVerifier::new(chain.clone());
        assert!(verifier.verify().unwrap().valid);

        let mut stored = chain.list().unwrap();
        stored[0].details = json!({ "reason": "tampered" }).as_object().unwrap().clone();

        let result = verify_stored(stored);
        assert!(!result.valid);
        assert_eq!(result.tampered_index, Some(1));
    }

    /// Mutating details at k (not last) is reported at k + 1.
    #[test]
    fn test_content_mutation_reported_at_successor() {
        for k in 0..4 {
            let mut entries = chain_of(5);
            entries[k].details.insert("reason".into(), json!("harassment"));

            let result = verify_stored(entries);
            assert_eq!(
                result,
                VerificationResult::tampered(k + 1, ChainBreach::HashMismatch, 5),
                "mutation at {k}"
            );
        }
    }

    /// Rewriting content and recomputing the entry's own hash still breaks
    /// the successor's prev_hash.
    #[test]
    fn test_recomputed_hash_breaks_successor_link() {
        let mut entries = chain_of(4);
        entries[1].admin = "adminMallory".into();
        entries[1].hash = hash_entry(&entries[1]);

        let result = verify_stored(entries);
        assert_eq!(
            result,
            VerificationResult::tampered(2, ChainBreach::PrevHashMismatch, 4)
        );
    }

    /// Removing entry k is reported at the entry that now follows k - 1.
    #[test]
    fn test_deletion_detected() {
        for k in 1..5 {
            let mut entries = chain_of(6);
            entries.remove(k);

            let result = verify_stored(entries);
            assert!(!result.valid);
            assert_eq!(result.tampered_index, Some(k), "deletion at {k}");
            assert_eq!(result.breach, Some(ChainBreach::PrevHashMismatch));
        }
    }

    #[test]
    fn test_reordering_detected() {
        let mut entries = chain_of(4);
        entries.swap(1, 2);

        let result = verify_stored(entries);
        assert_eq!(result.tampered_index, Some(1));
    }

    /// A forged entry cannot be linked in without the predecessor's real hash.
    #[test]
    fn test_inserted_forgery_detected() {
        let mut entries = chain_of(3);
        let mut forged = entries[1].clone();
        forged.action = "admin_promote".into();
        forged.prev_hash = hash_entry(&entries[0]);
        forged.hash = hash_entry(&forged);
        entries.insert(2, forged);

        let result = verify_stored(entries);
        assert!(!result.valid);
        assert_eq!(result.tampered_index, Some(2));
    }

    /// Editing the last entry without fixing its hash is caught by the final
    /// self-check.
    #[test]
    fn test_last_entry_edit_without_rehash_detected() {
        let mut entries = chain_of(3);
        entries[2].details.insert("reason".into(), json!("edited"));

        let result = verify_stored(entries);
        assert_eq!(
            result,
            VerificationResult::tampered(2, ChainBreach::HashMismatch, 3)
        );
    }

    /// Known limitation: a self-consistent rewrite of the last entry passes.
    #[test]
    fn test_last_entry_self_consistent_forgery_is_not_detected() {
        let mut entries = chain_of(3);
        entries[2].details.insert("reason".into(), json!("forged"));
        entries[2].hash = hash_entry(&entries[2]);

        let result = verify_stored(entries);
        assert!(
            result.valid,
            "the chain alone cannot detect a rewritten tip; anchors exist for that"
        );
    }

    #[test]
    fn test_anchor_catches_rewritten_tip() {
        let chain = LogChain::in_memory();
        for i in 0..3 {
            chain.append(ban(i)).unwrap();
        }
        let anchor = chain.anchor().unwrap().unwrap();
        assert_eq!(anchor.sequence, 2);

        let mut entries = chain.list().unwrap();
        entries[2].details.insert("reason".into(), json!("forged"));
        entries[2].hash = hash_entry(&entries[2]);

        let forged = Arc::new(LogChain::new(Arc::new(InMemoryEntryStore::from_entries(entries))));
        let result = ChainVerifier::new(forged).verify_with_anchor(&anchor).unwrap();
        assert_eq!(
            result,
            VerificationResult::tampered(2, ChainBreach::AnchorMismatch, 3)
        );
    }

    #[test]
    fn test_anchor_survives_later_appends() {
        let chain = Arc::new(LogChain::in_memory());
        chain.append(ban(0)).unwrap();
        let anchor = chain.anchor().unwrap().unwrap();
        chain.append(ban(1)).unwrap();
        chain.append(ban(2)).unwrap();

        let result = ChainVerifier::new(chain).verify_with_anchor(&anchor).unwrap();
        assert_eq!(result, VerificationResult::intact(3));
    }

    #[test]
    fn test_anchor_missing_after_truncation() {
        let chain = LogChain::in_memory();
        for i in 0..3 {
            chain.append(ban(i)).unwrap();
        }
        let anchor = chain.anchor().unwrap().unwrap();

        let mut entries = chain.list().unwrap();
        entries.truncate(2);

        let result = super::verify_against_anchor(&entries, &anchor);
        assert_eq!(
            result,
            VerificationResult::tampered(2, ChainBreach::AnchorMissing, 2)
        );
    }

    // ── Concurrency ───────────────────────────────────────────────────────────

    /// N concurrent appends produce one linear chain of N entries.
    #[test]
    fn test_concurrent_appends_form_single_chain() {
        const THREADS: usize = 16;
        const PER_THREAD: usize = 8;

        let chain = Arc::new(LogChain::in_memory());
        std::thread::scope(|scope| {
            for t in 0..THREADS {
                let chain = chain.clone();
                scope.spawn(move || {
                    for i in 0..PER_THREAD {
                        chain
                            .append(
                                NewEntry::new(format!("admin{t}"), "post_delete")
                                    .target(format!("post-{t}-{i}")),
                            )
                            .unwrap();
                    }
                });
            }
        });

        let entries = chain.list().unwrap();
        assert_eq!(entries.len(), THREADS * PER_THREAD);

        let prev_hashes: HashSet<&str> = entries.iter().map(|e| e.prev_hash.as_str()).collect();
        assert_eq!(prev_hashes.len(), entries.len(), "no two entries may share a prev_hash");

        let result = ChainVerifier::new(chain.clone()).verify().unwrap();
        assert!(result.valid);
    }

    /// Two chains that do not share a lock still cannot fork a shared store.
    #[test]
    fn test_independent_writers_on_one_store_stay_linear() {
        let store: Arc<dyn EntryStore> = Arc::new(InMemoryEntryStore::new());
        let writers: Vec<Arc<LogChain>> = (0..2)
            .map(|_| Arc::new(LogChain::new(store.clone()).with_max_conflict_retries(10_000)))
            .collect();

        std::thread::scope(|scope| {
            for (w, chain) in writers.iter().enumerate() {
                let chain = chain.clone();
                scope.spawn(move || {
                    for i in 0..50 {
                        chain
                            .append(NewEntry::new(format!("admin{w}"), "user_ban").detail("i", i))
                            .unwrap();
                    }
                });
            }
        });

        let entries = store.scan().unwrap();
        assert_eq!(entries.len(), 100);
        assert!(verify_entries(&entries).valid);
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.sequence, i as u64);
        }
    }

    #[test]
    fn test_conflict_retries_exhausted_is_storage_error() {
        /// A store whose tip never matches.
        struct AlwaysMoved;

        impl EntryStore for AlwaysMoved {
            fn tip(&self) -> warden_contracts::WardenResult<Option<LogEntry>> {
                Ok(None)
            }

            fn append_if_tip(
                &self,
                _entry: &LogEntry,
            ) -> warden_contracts::WardenResult<warden_core::traits::AppendOutcome> {
                Ok(warden_core::traits::AppendOutcome::TipMoved {
                    current_tip: Some("ff".repeat(32)),
                })
            }

            fn scan(&self) -> warden_contracts::WardenResult<Vec<LogEntry>> {
                Ok(Vec::new())
            }
        }

        let chain = LogChain::new(Arc::new(AlwaysMoved)).with_max_conflict_retries(2);
        let err = chain.append(ban(0)).unwrap_err();
        assert!(matches!(err, WardenError::Storage { .. }));
    }

    // ── Persistence ───────────────────────────────────────────────────────────

    /// Editing the JSONL file behind the store's back is caught.
    #[test]
    fn test_on_disk_tamper_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("admin.jsonl");

        let store = Arc::new(super::JsonlEntryStore::open(&path).unwrap());
        let chain = Arc::new(LogChain::new(store));
        chain
            .append(NewEntry::new("adminA", "user_ban").target("userX").detail("reason", "spam"))
            .unwrap();
        chain
            .append(NewEntry::new("adminA", "user_unban").target("userX"))
            .unwrap();

        let verifier = ChainVerifier::new(chain.clone());
        assert!(verifier.verify().unwrap().valid);

        let contents = std::fs::read_to_string(&path).unwrap();
        let tampered = contents.replacen("\"spam\"", "\"tampered\"", 1);
        assert_ne!(contents, tampered);
        std::fs::write(&path, tampered).unwrap();

        let result = verifier.verify().unwrap();
        assert_eq!(result.tampered_index, Some(1));
    }

    /// A log file that cannot be read is a storage error, not `valid: false`.
    #[test]
    fn test_unreadable_store_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("admin.jsonl");
        let chain = Arc::new(LogChain::new(Arc::new(
            super::JsonlEntryStore::open(&path).unwrap(),
        )));
        std::fs::remove_file(&path).unwrap();

        let err = ChainVerifier::new(chain).verify().unwrap_err();
        assert!(matches!(err, WardenError::Storage { .. }));
    }

    // ── Properties ────────────────────────────────────────────────────────────

    mod properties {
        use chrono::{TimeZone, Utc};
        use proptest::prelude::*;
        use serde_json::Value;

        use warden_contracts::entry::{Details, NewEntry};

        use crate::{chain::hash_fields, verify_entries, LogChain};

        fn details_strategy() -> impl Strategy<Value = Details> {
            proptest::collection::btree_map("[a-z_]{1,8}", "[ -~]{0,16}", 0..5).prop_map(|m| {
                m.into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect::<Details>()
            })
        }

        proptest! {
            #[test]
            fn hash_is_deterministic(
                admin in "[a-zA-Z0-9]{1,12}",
                action in "[a-z_]{1,20}",
                target in proptest::option::of("[a-z0-9-]{0,12}"),
                details in details_strategy(),
                secs in 0i64..4_000_000_000,
                nanos in 0u32..1_000_000_000,
                prev in "[0-9a-f]{64}|GENESIS",
            ) {
                let ts = Utc.timestamp_opt(secs, nanos).unwrap();
                let target = target.map(warden_contracts::EntityId::new);
                let a = hash_fields(&admin, &action, target.as_ref(), &details, &ts, &prev);
                let b = hash_fields(&admin, &action, target.as_ref(), &details.clone(), &ts, &prev);
                prop_assert_eq!(a, b);
            }

            #[test]
            fn sequential_appends_always_verify(
                requests in proptest::collection::vec(
                    ("[a-zA-Z]{1,8}", "[a-z_]{1,12}", details_strategy()),
                    0..12,
                ),
            ) {
                let chain = LogChain::in_memory();
                for (admin, action, details) in requests {
                    chain.append(NewEntry::new(admin, action).details(details)).unwrap();
                }
                let entries = chain.list().unwrap();
                prop_assert!(verify_entries(&entries).valid);
            }
        }
    }
}
