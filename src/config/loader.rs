//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from a TOML file.
///
/// Only syntax is checked here. Command-line overrides are applied on top of
/// the result, so semantic validation runs afterwards through `finalize`.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Validate the fully merged configuration.
pub fn finalize(config: AppConfig) -> Result<AppConfig, ConfigError> {
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[torrc]\npath = \"/tmp/torrc\"").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.torrc.path, Path::new("/tmp/torrc"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/mojenx.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[api\nlisten_address = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error_message_lists_fields() {
        let config = parse_config("[probe]\ntimeout_ms = 0\n[egress]\ndial_timeout_ms = 0").unwrap();
        let msg = finalize(config).unwrap_err().to_string();
        assert!(msg.starts_with("Validation failed: "));
        assert!(msg.contains("egress.dial_timeout_ms"));
        assert!(msg.contains("probe.timeout_ms"));
    }

    #[test]
    fn test_override_can_repair_file_value() {
        let mut config = parse_config("[api]\nlisten_address = \"nonsense\"\ntoken = \"t\"").unwrap();
        assert!(finalize(config.clone()).is_err());

        config.api.listen_address = "127.0.0.1:8088".into();
        assert!(finalize(config).is_ok());
    }
}
