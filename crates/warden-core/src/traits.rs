//! Trait seams between the audit log and the rest of the system.
//!
//! - `EntryStore`: the persistence substrate (atomic conditional append,
//!   ordered scan). Implemented by the in-memory and JSONL stores.
//! - `AuditTrail`: what admin route handlers talk to: append a request,
//!   list the trail. Implemented by `LogChain`.
//! - `Clock`: source of entry timestamps, swappable in tests.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use warden_contracts::{
    entry::{LogEntry, NewEntry},
    error::WardenResult,
};

/// Result of a conditional append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The entry is durable and visible to readers.
    Committed,
    /// Another writer advanced the chain first. Nothing was written.
    ///
    /// `current_tip` is the hash the store now holds as its tip, `None` if
    /// the store is empty.
    TipMoved { current_tip: Option<String> },
}

/// Durable, ordered storage for log entries.
///
/// Implementations must make each entry visible all-or-nothing: a reader
/// never observes a partially written entry, and a failed write leaves no
/// trace.
pub trait EntryStore: Send + Sync {
    /// The most recently committed entry, or `None` when the store is empty.
    fn tip(&self) -> WardenResult<Option<LogEntry>>;

    /// Commit `entry` only if the store's current tip hash equals
    /// `entry.prev_hash` (or the store is empty and `entry.prev_hash` is the
    /// genesis sentinel).
    ///
    /// This is the storage-level half of append serialization: two writers
    /// that read the same tip can never both commit.
    fn append_if_tip(&self, entry: &LogEntry) -> WardenResult<AppendOutcome>;

    /// Every committed entry, in creation order.
    fn scan(&self) -> WardenResult<Vec<LogEntry>>;
}

/// The audit interface admin handlers depend on.
pub trait AuditTrail: Send + Sync {
    /// Record one privileged action. Computes `hash` and `prev_hash`.
    ///
    /// An `Err` means the action was NOT recorded.
    fn append(&self, request: NewEntry) -> WardenResult<LogEntry>;

    /// All entries in creation order.
    fn list(&self) -> WardenResult<Vec<LogEntry>>;
}

impl<T: AuditTrail + ?Sized> AuditTrail for Arc<T> {
    fn append(&self, request: NewEntry) -> WardenResult<LogEntry> {
        (**self).append(request)
    }

    fn list(&self) -> WardenResult<Vec<LogEntry>> {
        (**self).list()
    }
}

/// Wall-clock source for entry timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real UTC clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
