//! Error taxonomy shared by the store, the engine and both front ends.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, MojenxError>;

#[derive(Debug, Error)]
pub enum MojenxError {
    /// The torrc, its temp file or the backup directory could not be accessed.
    #[error("{context} {path}: {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Caller input rejected before touching the document.
    #[error("{0}")]
    Validation(String),

    /// The service manager could not be run or exited non-zero.
    #[error("{command} failed: {detail}")]
    ExternalCommand { command: String, detail: String },

    /// Proxy dial, SOCKS handshake or remote connect failed.
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("unauthorized")]
    Auth,
}

impl MojenxError {
    pub fn io(context: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            context,
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io",
            Self::Validation(_) => "validation",
            Self::ExternalCommand { .. } => "external_command",
            Self::Connect(_) => "connect",
            Self::Auth => "auth",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_names_path() {
        let err = MojenxError::io(
            "failed to read",
            Path::new("/etc/tor/torrc"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(err.to_string(), "failed to read /etc/tor/torrc: missing");
        assert_eq!(err.kind(), "io");
    }

    #[test]
    fn test_external_command_display() {
        let err = MojenxError::ExternalCommand {
            command: "systemctl reload tor".into(),
            detail: "exit status 5".into(),
        };
        assert_eq!(err.to_string(), "systemctl reload tor failed: exit status 5");
    }
}
