//! Append-only JSON Lines implementation of `EntryStore`.
//!
//! One entry per line, written with a single `write_all` followed by
//! `sync_data`. A line is only considered committed once its terminating
//! newline is on disk:
//!
//! - On open, an unterminated trailing line (a torn write from a crash) is
//!   truncated away, even if it ends inside a multi-byte character.
//! - On scan, an unterminated trailing line (a write in flight) is ignored.
//! - If a write fails, the file is cut back to its previous length. If that
//!   also fails, the store refuses every further append.
//!
//! `open` takes an exclusive `fs2` lock on the file and holds it until the
//! store is dropped. A second opener, in this process or another, gets a
//! `Storage` error instead of appending against a stale tip.

use std::{
    fs::{File, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use fs2::FileExt;
use tracing::{debug, error, info, warn};

use warden_contracts::{
    entry::{LogEntry, GENESIS},
    error::{WardenError, WardenResult},
};
use warden_core::traits::{AppendOutcome, EntryStore};

struct JsonlState {
    file: File,
    /// Byte length of the committed prefix of the file.
    len: u64,
    tip: Option<LogEntry>,
    /// Set when a failed write could not be rolled back.
    poisoned: bool,
}

/// A durable entry store backed by an append-only `.jsonl` file.
pub struct JsonlEntryStore {
    path: PathBuf,
    state: Mutex<JsonlState>,
}

/// Committed entries parsed from `bytes`, and the byte length they cover.
///
/// Everything after the last newline is an unterminated fragment and is left
/// out before any UTF-8 decoding. Blank lines are skipped.
fn parse_committed(bytes: &[u8], path: &Path) -> WardenResult<(Vec<LogEntry>, u64)> {
    let committed = bytes
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |pos| pos + 1);

    let contents = std::str::from_utf8(&bytes[..committed]).map_err(|e| {
        WardenError::storage(format!(
            "audit log '{}' is not valid UTF-8: {}",
            path.display(),
            e
        ))
    })?;

    let mut entries = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let entry: LogEntry = serde_json::from_str(trimmed).map_err(|e| {
            WardenError::storage(format!(
                "corrupt audit record at {}:{}: {}",
                path.display(),
                line_no + 1,
                e
            ))
        })?;
        entries.push(entry);
    }

    Ok((entries, committed as u64))
}

fn read_log(path: &Path) -> WardenResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        WardenError::storage(format!("failed to read audit log '{}': {}", path.display(), e))
    })
}

impl JsonlEntryStore {
    /// Open (or create) the log at `path` and lock it for this store.
    ///
    /// Creates missing parent directories. Fails with `Storage` if the file
    /// cannot be opened, is already locked by another store, or holds a line
    /// that is not a valid entry.
    pub fn open(path: impl AsRef<Path>) -> WardenResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                WardenError::storage(format!(
                    "failed to create log directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)
            .map_err(|e| {
                WardenError::storage(format!(
                    "failed to open audit log '{}': {}",
                    path.display(),
                    e
                ))
            })?;

        file.try_lock_exclusive().map_err(|e| {
            if e.kind() == ErrorKind::WouldBlock {
                WardenError::storage(format!(
                    "audit log '{}' is held by another writer",
                    path.display()
                ))
            } else {
                WardenError::storage(format!(
                    "failed to lock audit log '{}': {}",
                    path.display(),
                    e
                ))
            }
        })?;

        let bytes = read_log(&path)?;
        let (mut entries, committed) = parse_committed(&bytes, &path)?;

        if committed < bytes.len() as u64 {
            warn!(
                path = %path.display(),
                dropped_bytes = bytes.len() as u64 - committed,
                "discarding torn trailing record"
            );
            file.set_len(committed).map_err(|e| {
                WardenError::storage(format!(
                    "failed to truncate torn record in '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }

        info!(
            path = %path.display(),
            entries = entries.len(),
            "opened audit log"
        );

        Ok(Self {
            path,
            state: Mutex::new(JsonlState {
                file,
                len: committed,
                tip: entries.pop(),
                poisoned: false,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> WardenResult<MutexGuard<'_, JsonlState>> {
        self.state
            .lock()
            .map_err(|e| WardenError::storage(format!("audit log lock poisoned: {}", e)))
    }
}

impl EntryStore for JsonlEntryStore {
    fn tip(&self) -> WardenResult<Option<LogEntry>> {
        Ok(self.lock()?.tip.clone())
    }

    fn append_if_tip(&self, entry: &LogEntry) -> WardenResult<AppendOutcome> {
        let mut state = self.lock()?;

        if state.poisoned {
            return Err(WardenError::storage(format!(
                "audit log '{}' holds an unrolled partial record; reopen it to recover",
                self.path.display()
            )));
        }

        let current_tip = state.tip.as_ref().map(|e| e.hash.as_str()).unwrap_or(GENESIS);
        if current_tip != entry.prev_hash {
            return Ok(AppendOutcome::TipMoved {
                current_tip: state.tip.as_ref().map(|e| e.hash.clone()),
            });
        }

        let mut line = serde_json::to_string(entry)
            .map_err(|e| WardenError::storage(format!("failed to encode audit record: {}", e)))?;
        line.push('\n');

        let file = &mut state.file;
        let written = file.write_all(line.as_bytes()).and_then(|()| file.sync_data());
        if let Err(e) = written {
            let len = state.len;
            if let Err(trunc) = state.file.set_len(len) {
                error!(
                    path = %self.path.display(),
                    error = %trunc,
                    "failed to roll back partial audit record, refusing further appends"
                );
                state.poisoned = true;
            }
            return Err(WardenError::storage(format!(
                "failed to write audit record to '{}': {}",
                self.path.display(),
                e
            )));
        }

        state.len += line.len() as u64;
        state.tip = Some(entry.clone());
        debug!(sequence = entry.sequence, "audit record committed");

        Ok(AppendOutcome::Committed)
    }

    /// Re-reads the file, so edits made on disk behind the store's back are
    /// visible to verification.
    fn scan(&self) -> WardenResult<Vec<LogEntry>> {
        let bytes = read_log(&self.path)?;
        let (entries, _) = parse_committed(&bytes, &self.path)?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::Utc;
    use serde_json::json;
    use tempfile::tempdir;

    use warden_contracts::entry::NewEntry;

    use super::*;
    use crate::chain::seal;

    fn first_entry() -> LogEntry {
        seal(
            NewEntry::new("adminA", "user_ban").target("userX").detail("reason", "spam"),
            0,
            Utc::now(),
            GENESIS.to_string(),
        )
    }

    #[test]
    fn entries_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit").join("admin.jsonl");

        let first = first_entry();
        {
            let store = JsonlEntryStore::open(&path).unwrap();
            assert_eq!(store.append_if_tip(&first).unwrap(), AppendOutcome::Committed);
        }

        let store = JsonlEntryStore::open(&path).unwrap();
        assert_eq!(store.tip().unwrap(), Some(first.clone()));
        assert_eq!(store.scan().unwrap(), vec![first]);
    }

    #[test]
    fn stale_tip_is_rejected() {
        let dir = tempdir().unwrap();
        let store = JsonlEntryStore::open(dir.path().join("admin.jsonl")).unwrap();

        let first = first_entry();
        store.append_if_tip(&first).unwrap();

        // A second writer that still believes the log is empty.
        let stale = seal(NewEntry::new("adminB", "post_delete"), 0, Utc::now(), GENESIS.to_string());
        let outcome = store.append_if_tip(&stale).unwrap();

        assert_eq!(
            outcome,
            AppendOutcome::TipMoved {
                current_tip: Some(first.hash.clone())
            }
        );
        assert_eq!(store.scan().unwrap().len(), 1);
    }

    #[test]
    fn torn_trailing_record_is_truncated_on_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("admin.jsonl");

        let first = first_entry();
        {
            let store = JsonlEntryStore::open(&path).unwrap();
            store.append_if_tip(&first).unwrap();
        }
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(br#"{"id":"00000000-0000-0000-0000-0000"#).unwrap();
        }

        let store = JsonlEntryStore::open(&path).unwrap();
        assert_eq!(store.scan().unwrap(), vec![first.clone()]);

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert!(on_disk.ends_with('\n'));
        assert_eq!(on_disk.lines().count(), 1);

        let second = seal(NewEntry::new("adminA", "user_unban"), 1, Utc::now(), first.hash.clone());
        assert_eq!(store.append_if_tip(&second).unwrap(), AppendOutcome::Committed);
        assert_eq!(store.scan().unwrap().len(), 2);
    }

    #[test]
    fn corrupt_middle_record_fails_to_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("admin.jsonl");
        let line = serde_json::to_string(&first_entry()).unwrap();
        std::fs::write(&path, format!("{line}\nnot json\n{line}\n")).unwrap();

        match JsonlEntryStore::open(&path) {
            Err(WardenError::Storage { reason }) => assert!(reason.contains(":2:"), "{reason}"),
            Err(other) => panic!("expected Storage, got {other:?}"),
            Ok(_) => panic!("expected corrupt log to be rejected"),
        }
    }

    #[test]
    fn scan_sees_edits_made_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("admin.jsonl");
        let store = JsonlEntryStore::open(&path).unwrap();
        store.append_if_tip(&first_entry()).unwrap();

        let mut value: serde_json::Value =
            serde_json::from_str(std::fs::read_to_string(&path).unwrap().trim()).unwrap();
        value["details"] = json!({ "reason": "tampered" });
        std::fs::write(&path, format!("{value}\n")).unwrap();

        let scanned = store.scan().unwrap();
        assert_eq!(scanned[0].details["reason"], json!("tampered"));
    }

    #[test]
    fn second_opener_is_refused_while_locked() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("admin.jsonl");

        let store = JsonlEntryStore::open(&path).unwrap();
        match JsonlEntryStore::open(&path) {
            Err(WardenError::Storage { reason }) => {
                assert!(reason.contains("another writer"), "{reason}")
            }
            Err(other) => panic!("expected Storage, got {other:?}"),
            Ok(_) => panic!("a second store on a locked log must be refused"),
        }

        drop(store);
        assert!(JsonlEntryStore::open(&path).is_ok());
    }

    #[test]
    fn torn_multibyte_tail_is_truncated_on_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("admin.jsonl");

        let first = first_entry();
        {
            let store = JsonlEntryStore::open(&path).unwrap();
            store.append_if_tip(&first).unwrap();
        }
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(b"{\"details\":{\"reason\":\"caf\xC3").unwrap();
        }

        let store = JsonlEntryStore::open(&path).unwrap();
        assert_eq!(store.tip().unwrap(), Some(first.clone()));
        assert_eq!(store.scan().unwrap(), vec![first]);
        assert!(std::fs::read(&path).unwrap().ends_with(b"\n"));
    }

    #[test]
    fn non_ascii_details_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("admin.jsonl");
        let entry = seal(
            NewEntry::new("adminA", "user_ban").detail("reason", "caf\u{e9} spam \u{1f6ab}"),
            0,
            Utc::now(),
            GENESIS.to_string(),
        );
        {
            let store = JsonlEntryStore::open(&path).unwrap();
            store.append_if_tip(&entry).unwrap();
        }

        let store = JsonlEntryStore::open(&path).unwrap();
        assert_eq!(store.scan().unwrap(), vec![entry]);
    }

    #[test]
    fn poisoned_store_refuses_appends() {
        let dir = tempdir().unwrap();
        let store = JsonlEntryStore::open(dir.path().join("admin.jsonl")).unwrap();
        store.lock().unwrap().poisoned = true;

        let err = store.append_if_tip(&first_entry()).unwrap_err();
        assert!(matches!(err, WardenError::Storage { .. }));
        assert!(store.scan().unwrap().is_empty());
    }
}
