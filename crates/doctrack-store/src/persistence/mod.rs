//! Loading and saving the tracking file.
//!
//! # Save sequence
//!
//! 1. If the tracking file exists and backups are enabled, copy it into the
//!    backups directory and prune save backups to the newest K.
//! 2. Serialize the store into a temporary file in the tracking file's
//!    directory and fsync it.
//! 3. Rename the temporary file over the tracking file.
//!
//! A failure before step 3 leaves the tracking file untouched. A failed
//! rename removes the temporary file. Backup problems are logged and never
//! block a save.
//!
//! # Load
//!
//! A missing file yields an empty store. A file that cannot be parsed into a
//! store is copied to `corrupted_tracking_<ts>.json` and an empty store is
//! returned. Anything else goes through [`migration::migrate`].

mod backups;
mod migration;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use doctrack_core::{TrackerSettings, TrackingError, TrackingStore};
use tempfile::NamedTempFile;

pub use backups::{CORRUPT_BACKUP_PREFIX, SAVE_BACKUP_PREFIX};

/// How the manager treats backups and legacy data.
#[derive(Debug, Clone)]
pub struct PersistenceOptions {
    /// Where save and corrupt-load backups are written.
    pub backups_dir: PathBuf,
    /// Copy the previous file aside before each save.
    pub backup_on_save: bool,
    /// Save backups kept after pruning.
    pub backup_keep: usize,
    /// Directory assumed for records migrated from a bare identifier list.
    pub legacy_download_dir: PathBuf,
}

impl PersistenceOptions {
    pub fn from_settings(settings: &TrackerSettings) -> Self {
        Self {
            backups_dir: settings.effective_backups_dir(),
            backup_on_save: settings.backup_tracking,
            backup_keep: settings.backup_keep.max(1),
            legacy_download_dir: settings.download_dir.clone(),
        }
    }
}

/// Owns the tracking file. Only this type writes it.
#[derive(Debug, Clone)]
pub struct PersistenceManager {
    tracking_file: PathBuf,
    options: PersistenceOptions,
}

impl PersistenceManager {
    pub fn new(tracking_file: impl Into<PathBuf>, options: PersistenceOptions) -> Self {
        Self {
            tracking_file: tracking_file.into(),
            options,
        }
    }

    pub fn from_settings(settings: &TrackerSettings) -> Self {
        Self::new(
            settings.tracking_file.clone(),
            PersistenceOptions::from_settings(settings),
        )
    }

    #[must_use]
    pub fn tracking_file(&self) -> &Path {
        &self.tracking_file
    }

    #[must_use]
    pub fn backups_dir(&self) -> &Path {
        &self.options.backups_dir
    }

    /// Load the store, recovering from a missing or corrupt file.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Io`] when the file exists but cannot be read,
    /// or when a corrupt file cannot be preserved. Returning an empty store
    /// in either case would let the next save destroy the data.
    pub fn load(&self) -> Result<TrackingStore, TrackingError> {
        let path = &self.tracking_file;
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(target: "doctrack.persistence", path = %path.display(), "No tracking file, starting empty");
                return Ok(TrackingStore::new());
            }
            Err(e) => return Err(TrackingError::io(path, &e)),
        };

        let parsed = serde_json::from_slice::<serde_json::Value>(&bytes)
            .map_err(|e| e.to_string())
            .and_then(|doc| {
                migration::migrate(doc, &self.options.legacy_download_dir, Utc::now())
                    .map_err(|e| e.to_string())
            });

        match parsed {
            Ok(loaded) => {
                tracing::debug!(
                    target: "doctrack.persistence",
                    path = %path.display(),
                    records = loaded.store.len(),
                    migrated = loaded.migrated,
                    "Tracking file loaded"
                );
                Ok(loaded.store)
            }
            Err(reason) => self.recover_corrupt(&reason),
        }
    }

    fn recover_corrupt(&self, reason: &str) -> Result<TrackingStore, TrackingError> {
        let path = &self.tracking_file;
        let backup = backups::backup_corrupt(path, &self.options.backups_dir, Utc::now())
            .map_err(|e| TrackingError::io(&self.options.backups_dir, &e))?;

        tracing::warn!(
            target: "doctrack.persistence",
            path = %path.display(),
            backup = %backup.display(),
            reason,
            "Tracking file is corrupt, starting empty"
        );
        Ok(TrackingStore::new())
    }

    /// Persist the store with backup rotation and atomic replace.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Serialization`] or
    /// [`TrackingError::Persistence`]; in both cases the tracking file on
    /// disk is unchanged.
    pub fn save(&self, store: &TrackingStore) -> Result<(), TrackingError> {
        let path = &self.tracking_file;

        if self.options.backup_on_save && path.is_file() {
            self.rotate_backups();
        }

        let payload = serde_json::to_vec_pretty(store)
            .map_err(|e| TrackingError::Serialization(e.to_string()))?;

        let dir = parent_dir(path);
        fs::create_dir_all(&dir).map_err(|e| {
            tracing::error!(target: "doctrack.persistence", dir = %dir.display(), error = %e, "Cannot create tracking directory");
            TrackingError::persistence(path, e)
        })?;

        write_atomic(&dir, path, &payload).map_err(|e| {
            tracing::error!(target: "doctrack.persistence", path = %path.display(), error = %e, "Failed to save tracking file");
            TrackingError::persistence(path, e)
        })?;

        tracing::debug!(target: "doctrack.persistence", path = %path.display(), records = store.len(), "Tracking file saved");
        Ok(())
    }

    fn rotate_backups(&self) {
        let dir = &self.options.backups_dir;
        match backups::backup_before_save(&self.tracking_file, dir, Utc::now()) {
            Ok(backup) => {
                tracing::debug!(target: "doctrack.persistence", backup = %backup.display(), "Backup created");
            }
            Err(e) => {
                tracing::warn!(target: "doctrack.persistence", dir = %dir.display(), error = %e, "Failed to back up tracking file");
                return;
            }
        }

        if let Err(e) = backups::prune_save_backups(dir, self.options.backup_keep) {
            tracing::warn!(target: "doctrack.persistence", dir = %dir.display(), error = %e, "Failed to prune backups");
        }
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Write `payload` to a temp file in `dir` and rename it over `target`.
///
/// The temp file is deleted on every failure path, including a failed
/// rename.
fn write_atomic(dir: &Path, target: &Path, payload: &[u8]) -> io::Result<()> {
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(payload)?;
    temp.as_file().sync_all()?;
    temp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use doctrack_core::{DownloadRecord, RecordId};

    fn manager(dir: &Path) -> PersistenceManager {
        PersistenceManager::new(
            dir.join("tracking.json"),
            PersistenceOptions {
                backups_dir: dir.join("backups"),
                backup_on_save: true,
                backup_keep: 3,
                legacy_download_dir: dir.join("downloads"),
            },
        )
    }

    fn store_with(ids: &[&str]) -> TrackingStore {
        let mut store = TrackingStore::new();
        for id in ids {
            store
                .add_record(DownloadRecord::new(
                    RecordId::parse(id).unwrap(),
                    "doc.pdf",
                    Utc::now() - Duration::days(1),
                    10,
                    format!("/dl/{id}.pdf"),
                    Some("abc".to_string()),
                ))
                .unwrap();
        }
        store
    }

    fn count_prefixed(dir: &Path, prefix: &str) -> usize {
        fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter(|e| e.file_name().to_string_lossy().starts_with(prefix))
                    .count()
            })
            .unwrap_or(0)
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = manager(dir.path()).load().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_save_then_load_round_trips_records() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        let store = store_with(&["20250301-1-2025-1", "20250302-2-2025-1"]);

        mgr.save(&store).unwrap();
        let loaded = mgr.load().unwrap();

        assert_eq!(
            loaded.records().collect::<Vec<_>>(),
            store.records().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_backups_rotate_to_keep_count() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        let store = store_with(&["20250301-1-2025-1"]);

        for _ in 0..6 {
            mgr.save(&store).unwrap();
        }

        assert_eq!(count_prefixed(mgr.backups_dir(), SAVE_BACKUP_PREFIX), 3);
    }

    #[test]
    fn test_no_backup_on_first_save() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        mgr.save(&TrackingStore::new()).unwrap();
        assert_eq!(count_prefixed(mgr.backups_dir(), SAVE_BACKUP_PREFIX), 0);
    }

    #[test]
    fn test_corrupt_file_is_preserved_once() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        fs::write(mgr.tracking_file(), "{ this is not json").unwrap();

        let store = mgr.load().unwrap();

        assert!(store.is_empty());
        assert_eq!(count_prefixed(mgr.backups_dir(), CORRUPT_BACKUP_PREFIX), 1);
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        mgr.save(&store_with(&["20250301-1-2025-1"])).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().all(|n| n == "tracking.json" || n == "backups"));
    }

    #[test]
    fn test_failed_replace_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = manager(dir.path());
        mgr.save(&store_with(&["20250301-1-2025-1"])).unwrap();
        let before = fs::read(mgr.tracking_file()).unwrap();

        // A directory where the file should be makes the rename fail.
        let blocked = PersistenceManager::new(dir.path().join("blocked"), mgr.options.clone());
        fs::create_dir(dir.path().join("blocked")).unwrap();
        fs::write(dir.path().join("blocked").join("keep"), "x").unwrap();
        let err = blocked.save(&store_with(&["20250302-2-2025-1"])).unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(fs::read(mgr.tracking_file()).unwrap(), before);
        let stray = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(".tmp"))
            .count();
        assert_eq!(stray, 0);
    }
}
