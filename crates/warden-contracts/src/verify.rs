//! Chain verification results and tip anchors.

use serde::{Deserialize, Serialize};

/// Why verification stopped at `tampered_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainBreach {
    /// The entry's `prev_hash` does not equal its predecessor's stored hash.
    PrevHashMismatch,
    /// A stored hash does not match the hash recomputed from the entry's
    /// fields.
    HashMismatch,
    /// The entry at the anchored sequence carries a different hash than the
    /// anchor recorded.
    AnchorMismatch,
    /// The log no longer contains the anchored sequence.
    AnchorMissing,
}

/// Outcome of verifying the stored chain.
///
/// Serializes as `{"valid":true,"checked":n}` or
/// `{"valid":false,"tamperedIndex":i,"breach":"...","checked":n}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub valid: bool,

    /// 0-based index, in creation order, of the first inconsistent entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tampered_index: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breach: Option<ChainBreach>,

    /// Number of entries read.
    pub checked: usize,
}

impl VerificationResult {
    pub fn intact(checked: usize) -> Self {
        Self {
            valid: true,
            tampered_index: None,
            breach: None,
            checked,
        }
    }

    pub fn tampered(index: usize, breach: ChainBreach, checked: usize) -> Self {
        Self {
            valid: false,
            tampered_index: Some(index),
            breach: Some(breach),
            checked,
        }
    }
}

/// A published commitment to the chain tip at some point in time.
///
/// Held outside the store (printed, mailed, pinned in another system), it
/// lets verification catch a rewritten final entry, which the chain alone
/// cannot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TipAnchor {
    pub sequence: u64,
    pub hash: String,
}
