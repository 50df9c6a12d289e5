//! The single owner of torrc mutations.
//!
//! One `TorrcManager` is built at startup and shared (`Arc`) by the HTTP
//! handlers and the menu. Its mutex covers the whole read → apply → write
//! sequence, so concurrent edits serialize instead of racing on the
//! backup/rename. Plain reads skip the lock: the rename in `ConfigStore`
//! already guarantees they see a whole file. All store I/O runs on tokio's
//! blocking pool; the lock guard is held across that await.

use std::io;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::egress::EgressChecker;
use crate::error::{MojenxError, Result};
use crate::observability::metrics;
use crate::service::{PortProbe, ServiceController};
use crate::torrc::document::TorrcDocument;
use crate::torrc::mutation::{self, BridgeSet, CountrySet, EditSet};
use crate::torrc::store::{BackupOutcome, ConfigStore};

/// Result of the reload attempted after a successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReloadOutcome {
    Reloaded,
    Failed { error: String },
}

/// Secondary outcomes of a mutation whose primary step (the write) succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationReport {
    pub backup: BackupOutcome,
    pub reload: ReloadOutcome,
}

pub struct TorrcManager {
    store: ConfigStore,
    lock: Mutex<()>,
    service: Arc<dyn ServiceController>,
    probe: PortProbe,
    egress: EgressChecker,
}

impl TorrcManager {
    pub fn new(
        store: ConfigStore,
        service: Arc<dyn ServiceController>,
        probe: PortProbe,
        egress: EgressChecker,
    ) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
            service,
            probe,
            egress,
        }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub async fn read_document(&self) -> Result<TorrcDocument> {
        self.with_store(|store| store.read()).await
    }

    /// Locked read-modify-write. A missing torrc is treated as empty so the
    /// first edit creates it.
    pub async fn mutate(&self, edits: &EditSet) -> Result<BackupOutcome> {
        let _guard = self.lock.lock().await;

        let owned = edits.clone();
        let result = self
            .with_store(move |store| {
                let current = store.read_or_empty()?;
                store.write(&mutation::apply(&current, &owned))
            })
            .await;

        metrics::record_mutation(result.is_ok());
        match &result {
            Ok(_) => tracing::info!(
                directives = ?edits.keys().collect::<Vec<_>>(),
                "torrc updated"
            ),
            Err(e) => tracing::error!(error = %e, "torrc update failed"),
        }
        result
    }

    /// Validate and probe `port`, write it as `SocksPort`, then reload.
    pub async fn set_socks_port(&self, port: i64) -> Result<MutationReport> {
        let port = mutation::validate_port(port)?;
        if !self.probe.is_free(port).await {
            return Err(MojenxError::validation("port not available"));
        }
        self.edit_and_reload(EditSet::new().socks_port(port)).await
    }

    /// Parse `codes`, write them as `ExitNodes`, then reload.
    pub async fn set_exit_countries(&self, codes: &str) -> Result<MutationReport> {
        let countries = CountrySet::parse(codes)?;
        self.edit_and_reload(EditSet::new().exit_nodes(&countries)).await
    }

    /// Enable bridges with exactly `entries` as the bridge list, then reload.
    pub async fn set_bridges<S: AsRef<str>>(&self, entries: &[S]) -> Result<MutationReport> {
        let bridges = BridgeSet::parse(entries.iter().map(|entry| entry.as_ref()))?;
        self.edit_and_reload(EditSet::new().bridges(&bridges)).await
    }

    /// Disable bridges and drop every `Bridge` line, then reload.
    pub async fn disable_bridges(&self) -> Result<MutationReport> {
        self.edit_and_reload(EditSet::new().disable_bridges()).await
    }

    pub async fn reload(&self) -> Result<()> {
        self.service.reload().await
    }

    pub async fn restart(&self) -> Result<()> {
        self.service.restart().await
    }

    /// Exit IP as seen through the SOCKS port currently in the torrc.
    pub async fn current_exit_ip(&self) -> Result<String> {
        let port = self.with_store(|store| store.read_or_empty()).await?.socks_port();
        self.egress.exit_ip(port).await
    }

    async fn edit_and_reload(&self, edits: EditSet) -> Result<MutationReport> {
        let backup = self.mutate(&edits).await?;
        let reload = self.reload_after_write().await;
        Ok(MutationReport { backup, reload })
    }

    /// Run blocking store I/O (reads, copies, fsync) off the async workers.
    async fn with_store<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&ConfigStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| MojenxError::io("store task failed for", self.store.path(), io::Error::other(e)))?
    }

    async fn reload_after_write(&self) -> ReloadOutcome {
        match self.service.reload().await {
            Ok(()) => ReloadOutcome::Reloaded,
            Err(e) => {
                tracing::warn!(error = %e, "torrc written but reload failed");
                ReloadOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}
