//! mojenx: torrc manager for a local Tor daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!   interactive menu ──┐                 ┌──────────────────────────────┐
//!   (stdin/stdout)     │                 │         TorrcManager         │
//!                      ├──▶ Arc<...> ──▶ │  mutation lock               │
//!   HTTP API ──────────┘                 │  read → apply → write        │
//!   (bearer token)                       └──┬─────────┬─────────┬───────┘
//!                                           │         │         │
//!                                           ▼         ▼         ▼
//!                                     ConfigStore  Service   EgressChecker
//!                                     (backup,     Controller (SOCKS5 →
//!                                      atomic      (systemctl  echo endpoint)
//!                                      rename)      reload)
//! ```

// Core subsystems
pub mod config;
pub mod egress;
pub mod error;
pub mod service;
pub mod torrc;

// Front ends
pub mod http;
pub mod menu;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use error::{MojenxError, Result};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use torrc::TorrcManager;
