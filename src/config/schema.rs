//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the TOML settings
//! file. Every section has defaults so an empty file (or no file) is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for mojenx.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Location of the torrc and its backups.
    pub torrc: TorrcConfig,

    /// HTTP API settings.
    pub api: ApiConfig,

    /// How the Tor daemon is reloaded and restarted.
    pub service: ServiceConfig,

    /// Exit IP check through the local SOCKS port.
    pub egress: EgressConfig,

    /// Port availability probe.
    pub probe: ProbeConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// torrc file configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TorrcConfig {
    /// Path to the torrc being managed.
    pub path: PathBuf,

    /// Directory receiving a timestamped copy before each write.
    pub backup_dir: PathBuf,
}

impl Default for TorrcConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/etc/tor/torrc"),
            backup_dir: PathBuf::from("/var/backups/mojenx"),
        }
    }
}

/// HTTP API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Bind address (e.g., "127.0.0.1:8088"). Empty runs the interactive menu.
    pub listen_address: String,

    /// Shared bearer token. Required when `listen_address` is set.
    pub token: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_address: String::new(),
            token: String::new(),
            request_timeout_secs: 30,
            max_body_bytes: 64 * 1024,
        }
    }
}

impl ApiConfig {
    /// True when the HTTP front end should run instead of the menu.
    pub fn http_mode(&self) -> bool {
        !self.listen_address.trim().is_empty()
    }

    /// `listen_address` in a form `TcpListener::bind` accepts.
    ///
    /// A bare `:8080` means every interface, as in Go's `net/http`.
    pub fn bind_address(&self) -> String {
        let address = self.listen_address.trim();
        match address.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{port}"),
            None => address.to_string(),
        }
    }
}

/// Service manager flavour used to drive the daemon.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceManagerKind {
    /// `systemctl <action> <unit>`
    #[default]
    Systemctl,
    /// `service <unit> <action>` (SysV / OpenRC style)
    Service,
}

/// Service controller configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Unit name of the daemon (e.g., "tor" or "tor@default").
    /// Unset means: `tor@default` if systemd lists it, else `tor`.
    pub unit: Option<String>,

    pub manager: ServiceManagerKind,
}

/// Exit IP check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EgressConfig {
    /// Host of the plaintext "echo my IP" endpoint, resolved by Tor.
    pub echo_host: String,

    pub echo_port: u16,

    /// Timeout for dialing the local SOCKS port, in milliseconds.
    pub dial_timeout_ms: u64,

    /// Upper bound on the response bytes read from the endpoint.
    pub max_response_bytes: usize,
}

impl Default for EgressConfig {
    fn default() -> Self {
        Self {
            echo_host: "checkip.amazonaws.com".to_string(),
            echo_port: 80,
            dial_timeout_ms: 1000,
            max_response_bytes: 4096,
        }
    }
}

impl EgressConfig {
    pub fn dial_timeout(&self) -> Duration {
        Duration::from_millis(self.dial_timeout_ms)
    }
}

/// Port probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Connect timeout in milliseconds; a timeout counts as "free".
    pub timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { timeout_ms: 1000 }
    }
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9464".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.torrc.path, PathBuf::from("/etc/tor/torrc"));
        assert_eq!(config.service.manager, ServiceManagerKind::Systemctl);
        assert_eq!(config.service.unit, None);
        assert_eq!(config.egress.echo_port, 80);
        assert!(!config.api.http_mode());
    }

    #[test]
    fn test_partial_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            [api]
            listen_address = "127.0.0.1:8088"
            token = "s3cret"

            [service]
            unit = "tor@default"
            manager = "service"
            "#,
        )
        .unwrap();

        assert!(config.api.http_mode());
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.service.unit.as_deref(), Some("tor@default"));
        assert_eq!(config.service.manager, ServiceManagerKind::Service);
    }

    #[test]
    fn test_bind_address_forms() {
        let api = |listen: &str| ApiConfig {
            listen_address: listen.to_string(),
            ..ApiConfig::default()
        };
        assert_eq!(api(":8080").bind_address(), "0.0.0.0:8080");
        assert_eq!(api(" localhost:8080 ").bind_address(), "localhost:8080");
        assert_eq!(api("127.0.0.1:8088").bind_address(), "127.0.0.1:8088");
    }
}
