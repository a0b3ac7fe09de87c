//! Test fixtures for tracked artifacts.

#![allow(dead_code)]

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use doctrack_core::{Clock, DownloadRecord, FixedClock, RecordId, TrackingStore};
use doctrack_store::{PersistenceManager, PersistenceOptions};
use tempfile::TempDir;

pub const MB: u64 = 1024 * 1024;

/// The instant every fixture clock is frozen at.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

pub fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(fixed_now()))
}

/// A throwaway tracking layout: `tracking.json`, `backups/`, `downloads/`.
pub struct Layout {
    pub dir: TempDir,
}

impl Layout {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("downloads")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn tracking_file(&self) -> PathBuf {
        self.root().join("tracking.json")
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.root().join("backups")
    }

    pub fn downloads(&self) -> PathBuf {
        self.root().join("downloads")
    }

    pub fn manager(&self) -> PersistenceManager {
        PersistenceManager::new(
            self.tracking_file(),
            PersistenceOptions {
                backups_dir: self.backups_dir(),
                backup_on_save: true,
                backup_keep: 10,
                legacy_download_dir: self.downloads(),
            },
        )
    }

    /// Create a sparse file of `bytes` and track it as downloaded
    /// `age_days` before [`fixed_now`].
    pub fn track_sparse(
        &self,
        store: &mut TrackingStore,
        id: &str,
        age_days: i64,
        bytes: u64,
    ) -> PathBuf {
        let path = self.downloads().join(format!("{id}.pdf"));
        File::create(&path).unwrap().set_len(bytes).unwrap();
        self.track_existing(store, id, age_days, &path, None);
        path
    }

    /// Write `content` to a file and track it with its real checksum.
    pub fn track_content(
        &self,
        store: &mut TrackingStore,
        id: &str,
        age_days: i64,
        content: &[u8],
    ) -> PathBuf {
        let path = self.downloads().join(format!("{id}.pdf"));
        fs::write(&path, content).unwrap();
        let checksum = doctrack_store::sha256_file(&path).unwrap();
        self.track_existing(store, id, age_days, &path, Some(checksum));
        path
    }

    pub fn track_existing(
        &self,
        store: &mut TrackingStore,
        id: &str,
        age_days: i64,
        path: &Path,
        checksum: Option<String>,
    ) {
        let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        store
            .add_record(DownloadRecord::new(
                RecordId::parse(id).unwrap(),
                &format!("{id}.pdf"),
                fixed_now() - Duration::days(age_days),
                size,
                path,
                checksum,
            ))
            .unwrap();
    }
}
