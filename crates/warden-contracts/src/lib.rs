//! # warden-contracts
//!
//! Shared types and the error taxonomy for the WARDEN admin audit log.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions, request validation and error types.

pub mod action;
pub mod entry;
pub mod error;
pub mod identity;
pub mod verify;

pub use action::ActionTag;
pub use entry::{Details, LogEntry, NewEntry, GENESIS};
pub use error::{WardenError, WardenResult};
pub use identity::{AdminId, EntityId};
pub use verify::{ChainBreach, TipAnchor, VerificationResult};
