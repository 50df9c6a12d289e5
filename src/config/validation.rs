//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - The missing-token check lives in startup, since the token may come from
//!   the environment after the file is loaded

use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};

use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.torrc.path.as_os_str().is_empty() {
        errors.push(ValidationError::new("torrc.path", "must not be empty"));
    }
    if config.torrc.backup_dir.as_os_str().is_empty() {
        errors.push(ValidationError::new("torrc.backup_dir", "must not be empty"));
    }

    if config.api.http_mode() && !resolves(&config.api.bind_address()) {
        errors.push(ValidationError::new(
            "api.listen_address",
            format!("'{}' is not a host:port address", config.api.listen_address),
        ));
    }
    if config.api.request_timeout_secs == 0 {
        errors.push(ValidationError::new("api.request_timeout_secs", "must be > 0"));
    }
    if config.api.max_body_bytes == 0 {
        errors.push(ValidationError::new("api.max_body_bytes", "must be > 0"));
    }

    if config.service.unit.as_deref().is_some_and(|unit| unit.trim().is_empty()) {
        errors.push(ValidationError::new("service.unit", "must not be empty"));
    }

    if config.egress.echo_host.trim().is_empty() {
        errors.push(ValidationError::new("egress.echo_host", "must not be empty"));
    }
    if config.egress.echo_host.len() > 255 {
        errors.push(ValidationError::new("egress.echo_host", "longer than 255 bytes"));
    }
    if config.egress.dial_timeout_ms == 0 {
        errors.push(ValidationError::new("egress.dial_timeout_ms", "must be > 0"));
    }
    if config.egress.max_response_bytes == 0 {
        errors.push(ValidationError::new("egress.max_response_bytes", "must be > 0"));
    }

    if config.probe.timeout_ms == 0 {
        errors.push(ValidationError::new("probe.timeout_ms", "must be > 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `host:port` with a numeric port and a host that resolves.
fn resolves(address: &str) -> bool {
    address
        .to_socket_addrs()
        .map(|mut addrs| addrs.next().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AppConfig::default();
        config.api.listen_address = "not-an-address".into();
        config.probe.timeout_ms = 0;
        config.service.unit = Some(" ".into());

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["api.listen_address", "service.unit", "probe.timeout_ms"]);
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = AppConfig::default();
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_listen_address_forms() {
        let mut config = AppConfig::default();
        config.api.token = "t".into();

        for listen in [":8080", "localhost:8080", "0.0.0.0:8080", "[::1]:8080"] {
            config.api.listen_address = listen.into();
            assert!(validate_config(&config).is_ok(), "{listen}");
        }
        for listen in ["8080", "localhost", ":http-alt", "127.0.0.1:99999"] {
            config.api.listen_address = listen.into();
            assert!(validate_config(&config).is_err(), "{listen}");
        }
    }
}
