//! Exit IP check subsystem.
//!
//! # Data Flow
//! ```text
//! SocksPort from torrc (default 9050)
//!     → reqwest client proxied through socks5h://127.0.0.1:<port>
//!     → GET http://<echo_host>:<echo_port>/ (Tor resolves the host)
//!     → body read up to max_response_bytes
//!     → last line of the body, trimmed
//! ```

pub mod checker;

pub use checker::EgressChecker;
