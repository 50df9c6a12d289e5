//! torrc persistence: plain reads, atomic writes, timestamped backups.
//!
//! Everything here is blocking `std::fs`; async callers go through
//! `TorrcManager`, which moves these calls onto the blocking pool.
//!
//! Writes go to a temp file in the torrc's own directory and are renamed over
//! the target, so a reader sees either the old or the new file and never a
//! partial one. A crash mid-write can leave the temp file behind; the live
//! torrc is never touched until the rename.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{MojenxError, Result};
use crate::observability::metrics;
use crate::torrc::document::TorrcDocument;

/// What happened to the pre-write copy of the torrc.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BackupOutcome {
    Created { path: PathBuf },
    /// There was no existing file to copy.
    Skipped,
    Failed { error: String },
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    backup_dir: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backup_dir: backup_dir.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn read(&self) -> Result<TorrcDocument> {
        let content =
            fs::read(&self.path).map_err(|e| MojenxError::io("failed to read", &self.path, e))?;
        Ok(TorrcDocument::parse(content))
    }

    /// Like `read`, but a missing file is an empty document.
    pub fn read_or_empty(&self) -> Result<TorrcDocument> {
        match fs::read(&self.path) {
            Ok(content) => Ok(TorrcDocument::parse(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(TorrcDocument::default()),
            Err(e) => Err(MojenxError::io("failed to read", &self.path, e)),
        }
    }

    /// Back up the current file (best-effort), then atomically replace it.
    pub fn write(&self, document: &TorrcDocument) -> Result<BackupOutcome> {
        let backup = self.backup();

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir)
            .map_err(|e| MojenxError::io("failed to create temp file in", dir, e))?;

        // Tor runs unprivileged and must still be able to read the file.
        let permissions = match fs::metadata(&self.path) {
            Ok(meta) => Some(meta.permissions()),
            Err(_) => default_permissions(),
        };
        if let Some(permissions) = permissions {
            temp.as_file()
                .set_permissions(permissions)
                .map_err(|e| MojenxError::io("failed to set permissions on", temp.path(), e))?;
        }

        temp.write_all(&document.render())
            .map_err(|e| MojenxError::io("failed to write", temp.path(), e))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| MojenxError::io("failed to sync", temp.path(), e))?;

        temp.persist(&self.path)
            .map_err(|e| MojenxError::io("failed to replace", &self.path, e.error))?;

        tracing::info!(
            path = %self.path.display(),
            lines = document.lines().len(),
            "torrc written"
        );
        Ok(backup)
    }

    fn backup(&self) -> BackupOutcome {
        if !self.path.exists() {
            return BackupOutcome::Skipped;
        }

        let outcome = match self.copy_to_backup() {
            Ok(path) => {
                tracing::debug!(backup = %path.display(), "torrc backed up");
                BackupOutcome::Created { path }
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    backup_dir = %self.backup_dir.display(),
                    error = %e,
                    "torrc backup failed, continuing with write"
                );
                BackupOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        metrics::record_backup(&outcome);
        outcome
    }

    fn copy_to_backup(&self) -> Result<PathBuf> {
        fs::create_dir_all(&self.backup_dir)
            .map_err(|e| MojenxError::io("failed to create", &self.backup_dir, e))?;

        let stem = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "torrc".to_string());
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");

        // Second resolution: a second write in the same second gets a suffix.
        let mut target = self.backup_dir.join(format!("{stem}.{timestamp}.bak"));
        let mut n = 1;
        while target.exists() {
            target = self.backup_dir.join(format!("{stem}.{timestamp}-{n}.bak"));
            n += 1;
        }

        fs::copy(&self.path, &target).map_err(|e| MojenxError::io("failed to copy to", &target, e))?;
        Ok(target)
    }
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> ConfigStore {
        ConfigStore::new(dir.path().join("torrc"), dir.path().join("backups"))
    }

    fn backups(store: &ConfigStore) -> Vec<PathBuf> {
        match fs::read_dir(store.backup_dir()) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(matches!(store.read(), Err(MojenxError::Io { .. })));
        assert!(store.read_or_empty().unwrap().is_empty());
    }

    #[test]
    fn test_read_empty_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "").unwrap();
        assert!(store.read().unwrap().is_empty());
    }

    #[test]
    fn test_write_new_file_skips_backup() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let outcome = store.write(&TorrcDocument::parse("SocksPort 9050")).unwrap();
        assert_eq!(outcome, BackupOutcome::Skipped);
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "SocksPort 9050\n");
        assert!(backups(&store).is_empty());
    }

    #[test]
    fn test_write_backs_up_previous_content() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "SocksPort 9050").unwrap();

        let outcome = store.write(&TorrcDocument::parse("SocksPort 9150")).unwrap();
        let BackupOutcome::Created { path } = outcome else {
            panic!("expected a backup, got {outcome:?}");
        };
        assert!(path.starts_with(store.backup_dir()));
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("torrc."));
        assert_eq!(fs::read_to_string(path).unwrap(), "SocksPort 9050");
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "SocksPort 9150\n");
    }

    #[test]
    fn test_backups_within_same_second_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "v0").unwrap();

        for i in 1..=3 {
            store.write(&TorrcDocument::parse(&format!("v{i}"))).unwrap();
        }
        assert_eq!(backups(&store).len(), 3);
    }

    #[test]
    fn test_backup_failure_does_not_block_write() {
        let dir = TempDir::new().unwrap();
        // A regular file where the backup directory should be.
        let blocker = dir.path().join("backups");
        fs::write(&blocker, "not a directory").unwrap();
        let store = ConfigStore::new(dir.path().join("torrc"), &blocker);
        fs::write(store.path(), "old").unwrap();

        let outcome = store.write(&TorrcDocument::parse("new")).unwrap();
        assert!(matches!(outcome, BackupOutcome::Failed { .. }));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "new\n");
    }

    #[test]
    fn test_round_trip_is_noop() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let original = "# managed\n  Log notice stdout\n\nSocksPort 9050\n";
        fs::write(store.path(), original).unwrap();

        store.write(&store.read().unwrap()).unwrap();
        assert_eq!(fs::read_to_string(store.path()).unwrap(), original);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_keeps_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "x").unwrap();
        fs::set_permissions(store.path(), fs::Permissions::from_mode(0o640)).unwrap();

        store.write(&TorrcDocument::parse("y")).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[test]
    fn test_non_utf8_torrc_round_trips_byte_identical() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let original: &[u8] = b"# caf\xe9 exit policy\nSocksPort 9050\n";
        fs::write(store.path(), original).unwrap();

        let document = store.read().unwrap();
        store.write(&document).unwrap();
        assert_eq!(fs::read(store.path()).unwrap(), original);
    }
}
