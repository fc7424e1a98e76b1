//! Marketplace admin-console demo scenarios.
//!
//! Each scenario wires a real `LogChain`, `AuditGate` and `ChainVerifier`
//! to seeded marketplace data and demonstrates one property of the audit
//! log.

pub mod concurrent_burst;
pub mod moderation_shift;
pub mod tamper_drill;

use warden_contracts::entry::LogEntry;

/// Print an audit trail as a table.
pub fn print_trail(entries: &[LogEntry]) {
    println!(
        "  {:>3}  {:<8} {:<24} {:<8} {}",
        "#", "admin", "action", "target", "hash"
    );
    for entry in entries {
        println!(
            "  {:>3}  {:<8} {:<24} {:<8} {}…",
            entry.sequence,
            entry.admin,
            entry.action,
            entry.target_user.as_ref().map(|t| t.as_str()).unwrap_or("-"),
            &entry.hash[..entry.hash.len().min(12)]
        );
    }
}
