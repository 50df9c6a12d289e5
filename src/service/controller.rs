//! Reload and restart of the Tor daemon through the OS service manager.

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::{ServiceConfig, ServiceManagerKind};
use crate::error::{MojenxError, Result};
use crate::observability::metrics;

/// Unit used when none is configured and detection finds nothing better.
pub const DEFAULT_UNIT: &str = "tor";

/// Instance unit Debian and Ubuntu actually run the daemon under.
pub const DEBIAN_UNIT: &str = "tor@default";

/// Daemon actions the front ends can trigger.
///
/// Each call runs once: no retries, no timeout beyond the OS call itself.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceController: Send + Sync {
    async fn reload(&self) -> Result<()>;

    async fn restart(&self) -> Result<()>;
}

/// Drives the daemon with `systemctl` or `service`.
#[derive(Debug, Clone)]
pub struct SystemServiceController {
    manager: ServiceManagerKind,
    unit: String,
}

impl SystemServiceController {
    /// Controller for the configured unit, or `tor` when none is set.
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            manager: config.manager,
            unit: config.unit.clone().unwrap_or_else(|| DEFAULT_UNIT.to_string()),
        }
    }

    /// Like `new`, but an unset unit is looked up with `detect_unit`.
    pub async fn from_config(config: &ServiceConfig) -> Self {
        let unit = match &config.unit {
            Some(unit) => unit.clone(),
            None => detect_unit(config.manager).await,
        };
        Self {
            manager: config.manager,
            unit,
        }
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Program and arguments for `action`.
    pub fn command_line(&self, action: &str) -> (&'static str, Vec<String>) {
        match self.manager {
            ServiceManagerKind::Systemctl => {
                ("systemctl", vec![action.to_string(), self.unit.clone()])
            }
            ServiceManagerKind::Service => ("service", vec![self.unit.clone(), action.to_string()]),
        }
    }

    async fn run(&self, action: &'static str) -> Result<()> {
        let (program, args) = self.command_line(action);
        let command_text = format!("{} {}", program, args.join(" "));
        tracing::info!(command = %command_text, "invoking service manager");

        let result = Command::new(program).args(&args).output().await;
        let outcome = match result {
            Ok(output) if output.status.success() => Ok(()),
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let detail = match stderr.trim() {
                    "" => output.status.to_string(),
                    text => text.to_string(),
                };
                Err(MojenxError::ExternalCommand {
                    command: command_text,
                    detail,
                })
            }
            Err(e) => Err(MojenxError::ExternalCommand {
                command: command_text,
                detail: e.to_string(),
            }),
        };

        if let Err(e) = &outcome {
            tracing::error!(action, error = %e, "service action failed");
        }
        metrics::record_service_action(action, outcome.is_ok());
        outcome
    }
}

/// Pick the daemon unit from `systemctl list-units`.
///
/// Only systemd has instance units; the `service` manager always gets `tor`.
/// A failing or missing `systemctl` also falls back to `tor`.
pub async fn detect_unit(manager: ServiceManagerKind) -> String {
    if manager != ServiceManagerKind::Systemctl {
        return DEFAULT_UNIT.to_string();
    }

    let listing = Command::new("systemctl")
        .args(["list-units", "--type=service", "--no-pager", "--no-legend"])
        .output()
        .await;
    let unit = match listing {
        Ok(output) if output.status.success() => {
            unit_from_listing(&String::from_utf8_lossy(&output.stdout))
        }
        Ok(output) => {
            tracing::debug!(status = %output.status, "systemctl list-units failed");
            DEFAULT_UNIT
        }
        Err(e) => {
            tracing::debug!(error = %e, "systemctl not available");
            DEFAULT_UNIT
        }
    };
    tracing::info!(unit, "detected tor service unit");
    unit.to_string()
}

/// `tor@default` when the listing has that unit, `tor` otherwise.
pub fn unit_from_listing(listing: &str) -> &'static str {
    let has_instance = listing
        .split_whitespace()
        .any(|word| word == "tor@default.service");
    if has_instance {
        DEBIAN_UNIT
    } else {
        DEFAULT_UNIT
    }
}

#[async_trait]
impl ServiceController for SystemServiceController {
    async fn reload(&self) -> Result<()> {
        self.run("reload").await
    }

    async fn restart(&self) -> Result<()> {
        self.run("restart").await
    }
}
