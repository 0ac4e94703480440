//! # bidwatch-sync
//!
//! Key=value file editing, atomic replacement, and write verification.
//!
//! [`ConfigStore::apply`] rewrites the target file with an [`UpdateSet`] and
//! [`ConfigStore::confirm`] re-reads it to check every value landed.
//!
//! [`UpdateSet`]: bidwatch_core::UpdateSet

pub mod diff;
pub mod envfile;
pub mod error;
pub mod store;
pub mod writer;

pub use diff::preview;
pub use envfile::{Entry, KeyValueDocument, Line};
pub use error::SyncError;
pub use store::{ApplyOutcome, ConfigStore, ConfigTarget};
pub use writer::atomic_write;
