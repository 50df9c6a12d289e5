//! Application settings subsystem.
//!
//! # Data Flow
//! ```text
//! mojenx.toml (optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → command-line flags / MOJENX_TOKEN override
//!     → AppConfig (immutable for the process lifetime)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow running with no settings file
//! - Validation separates syntactic (serde) from semantic checks
//! - These settings describe mojenx itself; the torrc is handled by `torrc`

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{finalize, load_config, ConfigError};
pub use schema::{
    ApiConfig, AppConfig, EgressConfig, ObservabilityConfig, ProbeConfig, ServiceConfig,
    ServiceManagerKind, TorrcConfig,
};
