//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields, stderr)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → journald / log files via the service unit
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through the HTTP trace span
//! - Metrics are opt-in; the recorder macros are free when no exporter is set

pub mod logging;
pub mod metrics;
