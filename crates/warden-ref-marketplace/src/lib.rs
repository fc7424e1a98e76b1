//! # warden-ref-marketplace
//!
//! Marketplace admin-console reference runtime for the WARDEN audit log.
//!
//! Demonstrates three scenarios using seeded data:
//!
//! 1. **Moderation Shift**: every privileged console operation appends one
//!    entry; refused and failed requests append none.
//! 2. **Tamper Drill**: edits, deletions and a forged tip are run against a
//!    copy of the trail and reported by the verifier.
//! 3. **Concurrent Burst**: parallel handlers and an independent writer
//!    share one store and still produce a single linear chain.
//!
//! All data is hardcoded and fictional.

pub mod console;
pub mod mock_data;
pub mod model;
pub mod scenarios;

pub use console::AdminConsole;
