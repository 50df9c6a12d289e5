//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load settings → apply flags → check token → build TorrcManager
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → HTTP server drains → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The menu needs no shutdown wiring; it ends on `0` or end of input

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{build_manager, require_token, StartupError};
