use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use doctrack_core::{LiveStats, TrackingStore};
use serde::Serialize;

use crate::integrity::{IntegrityReport, IntegrityVerifier};

/// How many missing/corrupted ids the summary lists.
const SAMPLE_LIMIT: usize = 10;

/// Integrity counts plus a short sample of offending ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegritySummary {
    pub missing_count: usize,
    pub corrupted_count: usize,
    pub unverifiable_count: usize,
    pub missing: Vec<String>,
    pub corrupted: Vec<String>,
}

impl From<&IntegrityReport> for IntegritySummary {
    fn from(report: &IntegrityReport) -> Self {
        Self {
            missing_count: report.missing.len(),
            corrupted_count: report.corrupted.len(),
            unverifiable_count: report.unverifiable_compressed.len(),
            missing: report.missing.iter().take(SAMPLE_LIMIT).cloned().collect(),
            corrupted: report.corrupted.iter().take(SAMPLE_LIMIT).cloned().collect(),
        }
    }
}

/// Point-in-time overview of the tracker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    pub tracking_file: PathBuf,
    pub download_dir: PathBuf,
    pub tracked_records: usize,
    pub live: LiveStats,
    pub total_size_mb: f64,
    pub compressed_size_mb: f64,
    pub integrity: IntegritySummary,
    pub last_updated_at: DateTime<Utc>,
    pub last_cleanup_at: Option<DateTime<Utc>>,
    pub last_compression_at: Option<DateTime<Utc>>,
}

impl SummaryReport {
    /// Build the report. Runs a full verification pass.
    pub fn build(
        store: &TrackingStore,
        verifier: &IntegrityVerifier,
        tracking_file: &Path,
        download_dir: &Path,
    ) -> Self {
        let live = store.compute_live_stats();
        let integrity = verifier.verify(store);
        let stats = store.statistics();

        Self {
            tracking_file: tracking_file.to_path_buf(),
            download_dir: download_dir.to_path_buf(),
            tracked_records: store.len(),
            total_size_mb: live.total_size_mb(),
            compressed_size_mb: live.compressed_size_mb(),
            live,
            integrity: IntegritySummary::from(&integrity),
            last_updated_at: store.last_updated_at(),
            last_cleanup_at: stats.last_cleanup_at,
            last_compression_at: stats.last_compression_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doctrack_core::{DownloadRecord, RecordId};

    #[test]
    fn test_summary_caps_missing_sample() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TrackingStore::new();
        for n in 1..=12 {
            let id = format!("202503{n:02}-1-2025-1");
            store
                .add_record(DownloadRecord::new(
                    RecordId::parse(&id).unwrap(),
                    "x.pdf",
                    Utc::now(),
                    0,
                    dir.path().join(&id),
                    None,
                ))
                .unwrap();
        }

        let report = SummaryReport::build(
            &store,
            &IntegrityVerifier::new(),
            &dir.path().join("tracking.json"),
            dir.path(),
        );

        assert_eq!(report.tracked_records, 12);
        assert_eq!(report.integrity.missing_count, 12);
        assert_eq!(report.integrity.missing.len(), 10);
        assert_eq!(report.live.total_files, 0);
        assert!(report.last_cleanup_at.is_none());
    }
}
