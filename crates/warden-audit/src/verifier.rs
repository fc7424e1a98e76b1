//! The chain verifier.
//!
//! `ChainVerifier` is stateless: every call reads the whole trail and runs
//! [`verify_entries`](crate::chain::verify_entries) over it. A read failure
//! is returned as `Err`; an inconsistent chain is `Ok` with `valid == false`.

use std::sync::Arc;

use tracing::{info, warn};

use warden_contracts::{
    error::WardenResult,
    verify::{TipAnchor, VerificationResult},
};
use warden_core::traits::AuditTrail;

use crate::chain::{verify_against_anchor, verify_entries};

/// On-demand integrity check over an [`AuditTrail`].
#[derive(Clone)]
pub struct ChainVerifier {
    trail: Arc<dyn AuditTrail>,
}

impl ChainVerifier {
    pub fn new(trail: Arc<dyn AuditTrail>) -> Self {
        Self { trail }
    }

    /// Verify the full stored chain.
    pub fn verify(&self) -> WardenResult<VerificationResult> {
        let entries = self.trail.list()?;
        let result = verify_entries(&entries);
        report(&result);
        Ok(result)
    }

    /// Verify the chain and check it still contains `anchor`.
    pub fn verify_with_anchor(&self, anchor: &TipAnchor) -> WardenResult<VerificationResult> {
        let entries = self.trail.list()?;
        let result = verify_against_anchor(&entries, anchor);
        report(&result);
        Ok(result)
    }
}

fn report(result: &VerificationResult) {
    match (result.tampered_index, result.breach) {
        (Some(index), Some(breach)) => warn!(
            tampered_index = index,
            breach = ?breach,
            checked = result.checked,
            "audit chain integrity violation"
        ),
        _ => info!(checked = result.checked, "audit chain verified"),
    }
}
