//! # warden-core
//!
//! The seams of the WARDEN audit log and the gate that binds privileged
//! mutations to it.
//!
//! This crate provides:
//! - The three traits (`EntryStore`, `AuditTrail`, `Clock`)
//! - The `AuditGate` that refuses to let an admin action succeed unaudited
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warden_core::{AuditGate, traits::AuditTrail};
//!
//! let gate = AuditGate::new(trail);
//! let (_, entry) = gate.perform(&mut users, request, |users| ban(users, "userX"))?;
//! ```

pub mod gate;
pub mod traits;

pub use gate::AuditGate;

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    };

    use chrono::Utc;

    use warden_contracts::{
        entry::{LogEntry, NewEntry},
        error::{WardenError, WardenResult},
    };

    use crate::{traits::AuditTrail, AuditGate};

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// A trail that remembers requests and can be switched into failure mode.
    #[derive(Default)]
    struct RecordingTrail {
        requests: Mutex<Vec<NewEntry>>,
        fail: AtomicBool,
    }

    impl AuditTrail for RecordingTrail {
        fn append(&self, request: NewEntry) -> WardenResult<LogEntry> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(WardenError::storage("store offline"));
            }
            let mut requests = self.requests.lock().unwrap();
            let entry = LogEntry {
                id: uuid::Uuid::nil(),
                sequence: requests.len() as u64,
                admin: request.admin.clone(),
                action: request.action.clone(),
                target_user: request.target_user.clone(),
                details: request.details.clone(),
                timestamp: Utc::now(),
                prev_hash: "GENESIS".to_string(),
                hash: "00".to_string(),
            };
            requests.push(request);
            Ok(entry)
        }

        fn list(&self) -> WardenResult<Vec<LogEntry>> {
            Ok(Vec::new())
        }
    }

    fn gate_with(trail: &Arc<RecordingTrail>) -> AuditGate {
        AuditGate::new(trail.clone())
    }

    // ── Tests ─────────────────────────────────────────────────────────────────

    #[test]
    fn successful_mutation_is_audited_once() {
        let trail = Arc::new(RecordingTrail::default());
        let gate = gate_with(&trail);
        let mut banned: Vec<String> = Vec::new();

        let (count, entry) = gate
            .perform(
                &mut banned,
                NewEntry::new("adminA", "user_ban").target("userX"),
                |banned| {
                    banned.push("userX".to_string());
                    Ok(banned.len())
                },
            )
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(entry.action.as_str(), "user_ban");
        assert_eq!(banned, vec!["userX".to_string()]);
        assert_eq!(trail.requests.lock().unwrap().len(), 1);
    }

    #[test]
    fn trail_receives_request_as_submitted() {
        let trail = Arc::new(RecordingTrail::default());
        let gate = gate_with(&trail);
        let request = NewEntry::new("adminA", "update_permissions")
            .target("userW")
            .detail("after", "moderate_posts");

        gate.perform(&mut 0u32, request.clone(), |n| {
            *n += 1;
            Ok(())
        })
        .unwrap();

        assert_eq!(*trail.requests.lock().unwrap(), vec![request]);
    }

    #[test]
    fn audit_failure_rolls_back_state() {
        let trail = Arc::new(RecordingTrail::default());
        trail.fail.store(true, Ordering::SeqCst);
        let gate = gate_with(&trail);
        let mut banned: Vec<String> = vec!["userW".to_string()];

        let err = gate
            .perform(&mut banned, NewEntry::new("adminA", "user_ban"), |banned| {
                banned.push("userX".to_string());
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(err, WardenError::Storage { .. }));
        assert_eq!(banned, vec!["userW".to_string()], "mutation must be undone");
    }

    #[test]
    fn failed_mutation_is_not_audited() {
        let trail = Arc::new(RecordingTrail::default());
        let gate = gate_with(&trail);
        let mut banned: Vec<String> = Vec::new();

        let result: WardenResult<((), LogEntry)> =
            gate.perform(&mut banned, NewEntry::new("adminA", "user_ban"), |banned| {
                banned.push("half-done".to_string());
                Err(WardenError::NotFound {
                    kind: "user".to_string(),
                    id: "ghost".to_string(),
                })
            });

        assert!(matches!(result, Err(WardenError::NotFound { .. })));
        assert!(banned.is_empty());
        assert!(trail.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn invalid_request_never_runs_mutation() {
        let trail = Arc::new(RecordingTrail::default());
        let gate = gate_with(&trail);
        let mut touched = false;

        let result = gate.perform(&mut touched, NewEntry::new("adminA", ""), |touched| {
            *touched = true;
            Ok(())
        });

        assert!(matches!(result, Err(WardenError::Validation { .. })));
        assert!(!touched);
    }
}
