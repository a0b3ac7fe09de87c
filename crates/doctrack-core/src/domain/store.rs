//! The tracking store aggregate.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::{DownloadRecord, RecordId};
use super::{bytes_to_mb, timestamp};
use crate::errors::TrackingError;

/// Schema version written by this crate.
pub const SCHEMA_VERSION: &str = "2.0";

fn current_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

/// Cached counters persisted alongside the records.
///
/// Advisory only: they are bumped alongside mutations and never reconciled
/// with the filesystem. Anything that makes a decision uses
/// [`TrackingStore::compute_live_stats`] instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Statistics {
    #[serde(alias = "total_downloads")]
    pub total_downloads: u64,

    #[serde(alias = "total_size_mb")]
    pub total_size_mb: f64,

    #[serde(alias = "last_cleanup", with = "timestamp::option")]
    pub last_cleanup_at: Option<DateTime<Utc>>,

    #[serde(alias = "last_compression", with = "timestamp::option")]
    pub last_compression_at: Option<DateTime<Utc>>,
}

/// Storage accounting recomputed from the files that exist right now.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LiveStats {
    pub total_files: usize,
    pub total_bytes: u64,
    pub compressed_files: usize,
    pub compressed_bytes: u64,
    #[serde(with = "timestamp::option")]
    pub oldest_download: Option<DateTime<Utc>>,
    #[serde(with = "timestamp::option")]
    pub newest_download: Option<DateTime<Utc>>,
}

impl LiveStats {
    #[must_use]
    pub fn total_size_mb(&self) -> f64 {
        bytes_to_mb(self.total_bytes)
    }

    #[must_use]
    pub fn compressed_size_mb(&self) -> f64 {
        bytes_to_mb(self.compressed_bytes)
    }
}

/// The persisted collection of records plus cached statistics.
///
/// Records are keyed by identifier in a sorted map so every pass over the
/// store visits them in a stable order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingStore {
    #[serde(alias = "version", default = "current_schema_version")]
    schema_version: String,

    #[serde(alias = "created", with = "timestamp", default = "Utc::now")]
    created_at: DateTime<Utc>,

    #[serde(alias = "last_updated", with = "timestamp", default = "Utc::now")]
    last_updated_at: DateTime<Utc>,

    #[serde(alias = "downloads", default)]
    records: BTreeMap<RecordId, DownloadRecord>,

    #[serde(default)]
    statistics: Statistics,
}

impl Default for TrackingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackingStore {
    /// Create an empty store stamped with the current schema version.
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            schema_version: current_schema_version(),
            created_at: now,
            last_updated_at: now,
            records: BTreeMap::new(),
            statistics: Statistics::default(),
        }
    }

    #[must_use]
    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn last_updated_at(&self) -> DateTime<Utc> {
        self.last_updated_at
    }

    #[must_use]
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in identifier order.
    pub fn records(&self) -> impl Iterator<Item = &DownloadRecord> {
        self.records.values()
    }

    fn touch(&mut self) {
        self.last_updated_at = Utc::now().max(self.created_at);
    }

    /// Track a new record.
    ///
    /// Fails with [`TrackingError::DuplicateRecord`] when the identifier is
    /// already present; the existing record is left untouched.
    pub fn add_record(&mut self, record: DownloadRecord) -> Result<(), TrackingError> {
        if self.records.contains_key(record.id()) {
            return Err(TrackingError::DuplicateRecord(record.id().to_string()));
        }

        self.statistics.total_downloads += 1;
        self.statistics.total_size_mb += bytes_to_mb(record.file_size());
        self.records.insert(record.id().clone(), record);
        self.touch();
        Ok(())
    }

    #[must_use]
    pub fn is_tracked(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    #[must_use]
    pub fn all_ids(&self) -> BTreeSet<String> {
        self.records.keys().map(ToString::to_string).collect()
    }

    pub fn get(&self, id: &str) -> Result<&DownloadRecord, TrackingError> {
        self.records
            .get(id)
            .ok_or_else(|| TrackingError::NotFound(id.to_string()))
    }

    /// Drop a record. The caller deletes the artifact first.
    pub fn remove(&mut self, id: &str) -> Result<DownloadRecord, TrackingError> {
        let removed = self
            .records
            .remove(id)
            .ok_or_else(|| TrackingError::NotFound(id.to_string()))?;
        self.touch();
        Ok(removed)
    }

    /// Point a record at its compressed artifact.
    pub fn mark_compressed(
        &mut self,
        id: &str,
        compressed_path: impl Into<std::path::PathBuf>,
        compressed_size: u64,
    ) -> Result<(), TrackingError> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| TrackingError::NotFound(id.to_string()))?;
        record.mark_compressed(compressed_path, compressed_size);
        self.touch();
        Ok(())
    }

    /// Fold the result of a retention pass into the cached counters.
    pub fn note_cleanup(&mut self, removed: usize, freed_mb: f64, at: DateTime<Utc>) {
        self.statistics.total_downloads = self
            .statistics
            .total_downloads
            .saturating_sub(removed as u64);
        self.statistics.total_size_mb = (self.statistics.total_size_mb - freed_mb).max(0.0);
        self.statistics.last_cleanup_at = Some(at);
        self.touch();
    }

    /// Record that a compression pass rewrote at least one artifact.
    pub fn note_compression(&mut self, at: DateTime<Utc>) {
        self.statistics.last_compression_at = Some(at);
        self.touch();
    }

    /// Stamp the store with [`SCHEMA_VERSION`] after a migration.
    pub fn stamp_current_schema(&mut self) {
        self.schema_version = current_schema_version();
        self.touch();
    }

    /// Lift `last_updated_at` to `created_at` when a loaded document has it
    /// earlier. Returns whether anything changed.
    pub fn normalize_timestamps(&mut self) -> bool {
        if self.last_updated_at >= self.created_at {
            return false;
        }
        self.last_updated_at = self.created_at;
        true
    }

    /// Re-key records whose map key disagrees with their own identifier.
    ///
    /// When two entries claim the same identifier the first one in key order
    /// wins. Returns how many entries were re-keyed or dropped.
    pub fn reconcile_keys(&mut self) -> usize {
        let mismatched = self
            .records
            .iter()
            .filter(|(key, record)| *key != record.id())
            .count();
        if mismatched == 0 {
            return 0;
        }

        let before = self.records.len();
        let mut rebuilt = BTreeMap::new();
        for record in std::mem::take(&mut self.records).into_values() {
            rebuilt.entry(record.id().clone()).or_insert(record);
        }
        let dropped = before - rebuilt.len();
        self.records = rebuilt;
        self.touch();
        mismatched.max(dropped)
    }

    /// Recompute storage accounting from the files that currently exist.
    ///
    /// Sizes come from the filesystem, not from the recorded `file_size`.
    #[must_use]
    pub fn compute_live_stats(&self) -> LiveStats {
        let mut stats = LiveStats::default();

        for record in self.records.values() {
            let Ok(metadata) = fs::metadata(record.file_path()) else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }

            let size = metadata.len();
            stats.total_files += 1;
            stats.total_bytes += size;
            if record.is_compressed() {
                stats.compressed_files += 1;
                stats.compressed_bytes += size;
            }

            let at = record.downloaded_at();
            stats.oldest_download = Some(stats.oldest_download.map_or(at, |o| o.min(at)));
            stats.newest_download = Some(stats.newest_download.map_or(at, |n| n.max(at)));
        }

        stats
    }
}
