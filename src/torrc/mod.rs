//! torrc editing subsystem.
//!
//! # Data Flow
//! ```text
//! front end (HTTP handler / menu)
//!     → manager.rs (validate, take the mutation lock)
//!     → store.rs read → document.rs (lines)
//!     → mutation.rs apply (replace first match, append if absent)
//!     → store.rs write (backup, temp file, fsync, rename)
//!     → manager.rs reload via the service controller
//! ```
//!
//! # Design Decisions
//! - No torrc grammar: lines are matched on their leading token only
//! - Lines are bytes; only the leading token has to be UTF-8 to be edited
//! - Backup and reload are best-effort; their outcome is reported, not raised

pub mod countries;
pub mod document;
pub mod manager;
pub mod mutation;
pub mod store;

pub use document::{
    TorrcDocument, BRIDGE, DEFAULT_SOCKS_PORT, EXIT_NODES, SOCKS_PORT, USE_BRIDGES,
};
pub use manager::{MutationReport, ReloadOutcome, TorrcManager};
pub use mutation::{apply, BridgeSet, CountrySet, EditSet};
pub use store::{BackupOutcome, ConfigStore};
