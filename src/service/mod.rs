//! Daemon control subsystem.
//!
//! # Responsibilities
//! - controller.rs: reload/restart through `systemctl` or `service`
//! - probe.rs: short-timeout loopback connect to tell whether a port is taken
//!
//! # Design Decisions
//! - The controller is a trait so front ends and tests can swap it out
//! - Failures always come back as `ExternalCommand`; callers choose whether
//!   to surface or log them

pub mod controller;
pub mod probe;

pub use controller::{ServiceController, SystemServiceController};
pub use probe::PortProbe;
