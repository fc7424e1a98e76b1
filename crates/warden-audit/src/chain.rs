//! Hash-chain primitives: canonical form, hashing, and chain verification.
//!
//! Hash input layout (form `warden-chain/v1`). Every field is fed to
//! SHA-256 as an 8-byte little-endian length followed by its bytes, in this
//! order:
//!   1. the form label `warden-chain/v1`
//!   2. admin id as UTF-8
//!   3. action tag as UTF-8
//!   4. one presence byte (0 = no target, 1 = target) then, if present, the
//!      target id as UTF-8
//!   5. canonical JSON of details: object keys sorted by byte order at every
//!      depth, serde_json scalar formatting, no whitespace
//!   6. timestamp as RFC 3339 UTC with nanoseconds and a `Z` suffix
//!   7. prev_hash as UTF-8 (64 hex chars, or `GENESIS`)
//!
//! Historical entries only re-verify if this layout never changes. Any change
//! needs a new form label.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use warden_contracts::{
    entry::{Details, LogEntry, NewEntry},
    identity::EntityId,
    verify::{ChainBreach, TipAnchor, VerificationResult},
};

/// Label of the canonical form hashed into every entry.
pub const CANONICAL_FORM: &str = "warden-chain/v1";

/// Render `details` as canonical JSON.
pub fn canonical_details(details: &Details) -> String {
    let mut out = String::new();
    out.push('{');
    write_object(details, &mut out);
    out.push('}');
    out
}

fn write_object(map: &Details, out: &mut String) {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&Value::String(key.clone()).to_string());
        out.push(':');
        write_value(&map[key], out);
    }
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            out.push('{');
            write_object(map, out);
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        // Display on a scalar Value is its compact JSON text.
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// The timestamp rendering that is hashed.
pub fn canonical_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn feed(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

/// Compute the chain hash over the six hashed fields.
///
/// Returns a lowercase 64-character hex string.
pub fn hash_fields(
    admin: &str,
    action: &str,
    target_user: Option<&EntityId>,
    details: &Details,
    timestamp: &DateTime<Utc>,
    prev_hash: &str,
) -> String {
    let mut hasher = Sha256::new();
    feed(&mut hasher, CANONICAL_FORM.as_bytes());
    feed(&mut hasher, admin.as_bytes());
    feed(&mut hasher, action.as_bytes());
    match target_user {
        Some(target) => {
            hasher.update([1u8]);
            feed(&mut hasher, target.as_str().as_bytes());
        }
        None => hasher.update([0u8]),
    }
    feed(&mut hasher, canonical_details(details).as_bytes());
    feed(&mut hasher, canonical_timestamp(timestamp).as_bytes());
    feed(&mut hasher, prev_hash.as_bytes());

    hex::encode(hasher.finalize())
}

/// Recompute the hash of a stored entry from its own fields.
pub fn hash_entry(entry: &LogEntry) -> String {
    hash_fields(
        entry.admin.as_str(),
        entry.action.as_str(),
        entry.target_user.as_ref(),
        &entry.details,
        &entry.timestamp,
        &entry.prev_hash,
    )
}

/// Build the entry that `request` becomes at chain position `sequence`.
pub fn seal(
    request: NewEntry,
    sequence: u64,
    timestamp: DateTime<Utc>,
    prev_hash: String,
) -> LogEntry {
    let hash = hash_fields(
        request.admin.as_str(),
        request.action.as_str(),
        request.target_user.as_ref(),
        &request.details,
        &timestamp,
        &prev_hash,
    );

    LogEntry {
        id: Uuid::new_v4(),
        sequence,
        admin: request.admin,
        action: request.action,
        target_user: request.target_user,
        details: request.details,
        timestamp,
        prev_hash,
        hash,
    }
}

/// Verify a sequence of entries given in creation order.
///
/// For each entry `i >= 1` two things must hold, or `i` is reported:
///
/// 1. **Linkage**: `entries[i].prev_hash` equals `entries[i-1].hash`.
/// 2. **Predecessor content**: recomputing the hash of `entries[i-1]` from
///    its fields gives its stored hash.
///
/// An entry altered after creation is therefore reported at the index of its
/// successor. The first entry's `prev_hash` is not checked against the
/// genesis sentinel. After the scan, the final entry's own hash is
/// recomputed; a mismatch there is reported at the final index.
///
/// A final entry whose content AND hash were both rewritten is not detected.
/// Use [`verify_against_anchor`] with an externally held anchor for that.
///
/// An empty sequence is valid.
pub fn verify_entries(entries: &[LogEntry]) -> VerificationResult {
    let checked = entries.len();

    for i in 1..entries.len() {
        let prev = &entries[i - 1];
        let current = &entries[i];

        if current.prev_hash != prev.hash {
            return VerificationResult::tampered(i, ChainBreach::PrevHashMismatch, checked);
        }
        if hash_entry(prev) != prev.hash {
            return VerificationResult::tampered(i, ChainBreach::HashMismatch, checked);
        }
    }

    if let Some(last) = entries.last() {
        if hash_entry(last) != last.hash {
            return VerificationResult::tampered(checked - 1, ChainBreach::HashMismatch, checked);
        }
    }

    VerificationResult::intact(checked)
}

/// Verify `entries` and additionally check them against a published anchor.
///
/// The anchored entry is located by sequence number. If it is gone, the
/// result reports `AnchorMissing` at index `entries.len()`.
pub fn verify_against_anchor(entries: &[LogEntry], anchor: &TipAnchor) -> VerificationResult {
    let result = verify_entries(entries);
    if !result.valid {
        return result;
    }

    let checked = entries.len();
    match entries.iter().position(|e| e.sequence == anchor.sequence) {
        Some(index) if entries[index].hash == anchor.hash => result,
        Some(index) => VerificationResult::tampered(index, ChainBreach::AnchorMismatch, checked),
        None => VerificationResult::tampered(checked, ChainBreach::AnchorMissing, checked),
    }
}
