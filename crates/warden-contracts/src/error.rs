//! Error types for the WARDEN audit log.
//!
//! All fallible operations return `WardenResult<T>`. A detected integrity
//! violation is not an error: it is a `VerificationResult` with
//! `valid == false`. An `Err` from verification means the log could not be
//! read at all.

use thiserror::Error;

/// The unified error type for WARDEN.
#[derive(Debug, Error)]
pub enum WardenError {
    /// A required field of an append request is missing or empty.
    ///
    /// Recoverable: the caller fixes the input and may retry.
    #[error("invalid audit entry: {field} {reason}")]
    Validation { field: String, reason: String },

    /// The persistence layer is unavailable, rejected a write, or returned a
    /// record it could not decode.
    ///
    /// When returned from an append, the entry was NOT recorded and the
    /// triggering admin action must be treated as unaudited.
    #[error("audit storage error: {reason}")]
    Storage { reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// The actor is not allowed to perform a privileged action.
    #[error("'{actor}' is not permitted to perform '{action}'")]
    PermissionDenied { actor: String, action: String },

    /// The target of an admin action does not exist.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: String, id: String },
}

impl WardenError {
    pub fn storage(reason: impl Into<String>) -> Self {
        Self::Storage {
            reason: reason.into(),
        }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the WARDEN crates.
pub type WardenResult<T> = Result<T, WardenError>;
