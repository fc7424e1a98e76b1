//! In-memory implementation of `EntryStore`.
//!
//! `InMemoryEntryStore` keeps all entries in a `Vec` behind a `Mutex`. It is
//! the default backend for tests and the reference runtime, and the model the
//! durable backends follow: one lock, complete entries pushed whole, and a
//! tip check inside the same critical section as the push.

use std::sync::{Mutex, MutexGuard};

use warden_contracts::{
    entry::{LogEntry, GENESIS},
    error::{WardenError, WardenResult},
};
use warden_core::traits::{AppendOutcome, EntryStore};

/// An in-memory, append-only entry store.
#[derive(Debug, Default)]
pub struct InMemoryEntryStore {
    entries: Mutex<Vec<LogEntry>>,
}

impl InMemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store that already holds `entries`, in the given order.
    ///
    /// Used to load an exported trail for offline verification. Entries are
    /// taken as-is; nothing is re-hashed.
    pub fn from_entries(entries: Vec<LogEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    fn lock(&self) -> WardenResult<MutexGuard<'_, Vec<LogEntry>>> {
        self.entries
            .lock()
            .map_err(|e| WardenError::storage(format!("entry store lock poisoned: {}", e)))
    }
}

impl EntryStore for InMemoryEntryStore {
    fn tip(&self) -> WardenResult<Option<LogEntry>> {
        Ok(self.lock()?.last().cloned())
    }

    fn append_if_tip(&self, entry: &LogEntry) -> WardenResult<AppendOutcome> {
        let mut entries = self.lock()?;

        let current_tip = entries.last().map(|e| e.hash.as_str()).unwrap_or(GENESIS);
        if current_tip != entry.prev_hash {
            return Ok(AppendOutcome::TipMoved {
                current_tip: entries.last().map(|e| e.hash.clone()),
            });
        }

        entries.push(entry.clone());
        Ok(AppendOutcome::Committed)
    }

    fn scan(&self) -> WardenResult<Vec<LogEntry>> {
        Ok(self.lock()?.clone())
    }
}
