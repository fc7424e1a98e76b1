//! The LogChain store: append-only, hash-linked admin audit log.
//!
//! `LogChain` turns `NewEntry` requests into sealed `LogEntry` values and
//! commits them to an `EntryStore`. Appends are serialized twice over:
//!
//! 1. An in-process `Mutex` makes "read tip, hash, write" a critical section
//!    for every caller sharing this `LogChain`.
//! 2. The store's conditional append refuses an entry whose `prev_hash` is no
//!    longer the tip, so writers that do not share the mutex (another
//!    `LogChain` on the same store) cannot fork the chain either. On such a
//!    conflict the append re-reads the tip and tries again.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use warden_contracts::{
    entry::{LogEntry, NewEntry, GENESIS},
    error::{WardenError, WardenResult},
    verify::TipAnchor,
};
use warden_core::traits::{AppendOutcome, AuditTrail, Clock, EntryStore, SystemClock};

use crate::{chain::seal, memory::InMemoryEntryStore};

/// How often an append re-reads the tip after losing a conditional write.
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 8;

/// The hash-chained audit log.
///
/// # Thread safety
///
/// `LogChain` is `Send + Sync`; share it behind an `Arc`. `list()` does not
/// take the append lock.
pub struct LogChain {
    store: Arc<dyn EntryStore>,
    clock: Arc<dyn Clock>,
    append_lock: Mutex<()>,
    max_conflict_retries: u32,
}

impl LogChain {
    /// Create a chain over `store`, stamping entries with the system clock.
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            append_lock: Mutex::new(()),
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }

    /// A chain over a fresh [`InMemoryEntryStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryEntryStore::new()))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    pub fn store(&self) -> &Arc<dyn EntryStore> {
        &self.store
    }

    /// Append one entry, linking it to the current tip.
    ///
    /// # Errors
    ///
    /// - `Validation` if `request` has no admin or no action.
    /// - `Storage` if the store fails, or if the tip kept moving for more
    ///   than `max_conflict_retries` attempts. In both cases nothing was
    ///   recorded.
    pub fn append(&self, request: NewEntry) -> WardenResult<LogEntry> {
        request.validate()?;

        let _guard = self
            .append_lock
            .lock()
            .map_err(|e| WardenError::storage(format!("append lock poisoned: {}", e)))?;

        let mut attempt = 0;
        loop {
            let tip = self.store.tip()?;
            let (sequence, prev_hash, floor) = match &tip {
                Some(tip) => (tip.sequence + 1, tip.hash.clone(), Some(tip.timestamp)),
                None => (0, GENESIS.to_string(), None),
            };
            let timestamp = not_before(self.clock.now(), floor);

            let entry = seal(request.clone(), sequence, timestamp, prev_hash);

            match self.store.append_if_tip(&entry)? {
                AppendOutcome::Committed => {
                    info!(
                        sequence = entry.sequence,
                        admin = %entry.admin,
                        action = %entry.action,
                        target_user = entry.target_user.as_ref().map(|t| t.as_str()).unwrap_or("-"),
                        hash = %entry.hash,
                        "audit entry appended"
                    );
                    return Ok(entry);
                }
                AppendOutcome::TipMoved { current_tip } => {
                    attempt += 1;
                    warn!(
                        attempt,
                        expected_prev = %entry.prev_hash,
                        current_tip = current_tip.as_deref().unwrap_or(GENESIS),
                        "audit tip moved during append"
                    );
                    if attempt > self.max_conflict_retries {
                        return Err(WardenError::storage(format!(
                            "audit append lost {} consecutive tip races",
                            attempt
                        )));
                    }
                }
            }
        }
    }

    /// Every entry in creation order.
    pub fn list(&self) -> WardenResult<Vec<LogEntry>> {
        let entries = self.store.scan()?;
        debug!(count = entries.len(), "audit trail listed");
        Ok(entries)
    }

    /// The most recent entry, if any.
    pub fn tip(&self) -> WardenResult<Option<LogEntry>> {
        self.store.tip()
    }

    /// A commitment to the current tip, for publication outside the store.
    pub fn anchor(&self) -> WardenResult<Option<TipAnchor>> {
        Ok(self.store.tip()?.map(|tip| TipAnchor {
            sequence: tip.sequence,
            hash: tip.hash,
        }))
    }

    /// Number of entries the store currently holds.
    ///
    /// Counted from a full scan, so entries removed behind the chain's back
    /// are not counted.
    pub fn len(&self) -> WardenResult<usize> {
        Ok(self.store.scan()?.len())
    }

    pub fn is_empty(&self) -> WardenResult<bool> {
        Ok(self.store.tip()?.is_none())
    }
}

/// Clamp `now` so timestamps never run backwards along the chain.
fn not_before(now: DateTime<Utc>, floor: Option<DateTime<Utc>>) -> DateTime<Utc> {
    match floor {
        Some(floor) if now < floor => floor,
        _ => now,
    }
}

impl AuditTrail for LogChain {
    fn append(&self, request: NewEntry) -> WardenResult<LogEntry> {
        LogChain::append(self, request)
    }

    fn list(&self) -> WardenResult<Vec<LogEntry>> {
        LogChain::list(self)
    }
}
