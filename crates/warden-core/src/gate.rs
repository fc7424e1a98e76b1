//! The audit gate: privileged mutations that cannot succeed unaudited.
//!
//! Every admin operation runs through `AuditGate::perform`:
//!
//!   Validate request → Snapshot state → Apply mutation → Append entry
//!
//! If the mutation fails nothing is logged. If the append fails the state is
//! restored from the snapshot and the append error is returned unchanged, so
//! the caller never reports success for an action the log does not know
//! about.

use std::sync::Arc;

use tracing::{debug, error, info};

use warden_contracts::{
    entry::{LogEntry, NewEntry},
    error::WardenResult,
};

use crate::traits::AuditTrail;

/// Wraps an [`AuditTrail`] and ties each mutation to exactly one entry.
#[derive(Clone)]
pub struct AuditGate {
    trail: Arc<dyn AuditTrail>,
}

impl AuditGate {
    pub fn new(trail: Arc<dyn AuditTrail>) -> Self {
        Self { trail }
    }

    /// The underlying trail, for read-side access.
    pub fn trail(&self) -> &Arc<dyn AuditTrail> {
        &self.trail
    }

    /// Apply `apply` to `state` and record `request`, atomically from the
    /// caller's point of view.
    ///
    /// # Errors
    ///
    /// - `Validation` if `request` lacks an admin or action; `apply` is not
    ///   called.
    /// - Whatever `apply` returns; `state` is restored and nothing is logged.
    /// - Whatever the trail's `append` returns; `state` is restored.
    pub fn perform<S, T, F>(
        &self,
        state: &mut S,
        request: NewEntry,
        apply: F,
    ) -> WardenResult<(T, LogEntry)>
    where
        S: Clone,
        F: FnOnce(&mut S) -> WardenResult<T>,
    {
        request.validate()?;

        let snapshot = state.clone();

        let value = match apply(state) {
            Ok(value) => value,
            Err(e) => {
                debug!(
                    admin = %request.admin,
                    action = %request.action,
                    error = %e,
                    "admin mutation failed, nothing audited"
                );
                *state = snapshot;
                return Err(e);
            }
        };

        let admin = request.admin.clone();
        let action = request.action.clone();

        match self.trail.append(request) {
            Ok(entry) => {
                info!(
                    admin = %entry.admin,
                    action = %entry.action,
                    sequence = entry.sequence,
                    "privileged action audited"
                );
                Ok((value, entry))
            }
            Err(e) => {
                error!(
                    admin = %admin,
                    action = %action,
                    error = %e,
                    "audit write failed, rolling back admin action"
                );
                *state = snapshot;
                Err(e)
            }
        }
    }
}
