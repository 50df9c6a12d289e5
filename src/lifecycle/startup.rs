//! Startup orchestration.
//!
//! # Responsibilities
//! - Refuse to start the HTTP API without a token
//! - Assemble the single `TorrcManager` both front ends share

use std::sync::Arc;

use crate::config::AppConfig;
use crate::egress::EgressChecker;
use crate::service::{PortProbe, SystemServiceController};
use crate::torrc::{ConfigStore, TorrcManager};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("API token required for HTTP mode. Provide --token or set MOJENX_TOKEN")]
    MissingToken,
}

pub fn require_token(config: &AppConfig) -> Result<(), StartupError> {
    if config.api.http_mode() && config.api.token.is_empty() {
        return Err(StartupError::MissingToken);
    }
    Ok(())
}

/// Resolves the service unit (detecting it when unset), then wires the store,
/// controller, probe and egress checker together.
pub async fn build_manager(config: &AppConfig) -> Arc<TorrcManager> {
    let store = ConfigStore::new(&config.torrc.path, &config.torrc.backup_dir);
    let service = SystemServiceController::from_config(&config.service).await;

    tracing::info!(
        torrc = %config.torrc.path.display(),
        backup_dir = %config.torrc.backup_dir.display(),
        unit = %service.unit(),
        "torrc manager ready"
    );

    Arc::new(TorrcManager::new(
        store,
        Arc::new(service),
        PortProbe::new(config.probe.timeout()),
        EgressChecker::new(config.egress.clone()),
    ))
}
