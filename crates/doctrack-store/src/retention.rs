//! Age- and capacity-based eviction.
//!
//! Both policies delete the artifact first and drop the record second. A
//! record whose file cannot be deleted is left in the store and reported in
//! [`RetentionOutcome::failures`]. Neither policy saves the store.

use std::fs;
use std::io;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use doctrack_core::{BYTES_PER_MB, Clock, SystemClock, TrackingStore, bytes_to_mb};
use serde::Serialize;

use crate::failure::RecordFailure;

/// Result of one retention pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionOutcome {
    pub removed: usize,
    pub freed_mb: f64,
    pub failures: Vec<RecordFailure>,
}

impl RetentionOutcome {
    /// The `(removed, freed_mb)` pair.
    #[must_use]
    pub const fn counts(&self) -> (usize, f64) {
        (self.removed, self.freed_mb)
    }
}

/// Applies retention policies to a store.
#[derive(Clone)]
pub struct RetentionEngine {
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for RetentionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetentionEngine").finish_non_exhaustive()
    }
}

impl Default for RetentionEngine {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl RetentionEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Remove every record downloaded before `now - max_age_days`.
    pub fn cleanup_older_than(
        &self,
        store: &mut TrackingStore,
        max_age_days: u32,
    ) -> RetentionOutcome {
        let now = self.clock.now();
        let cutoff = age_cutoff(now, max_age_days);

        let expired: Vec<String> = store
            .records()
            .filter(|r| r.downloaded_at() < cutoff)
            .map(|r| r.id().to_string())
            .collect();

        let mut outcome = RetentionOutcome::default();
        let mut freed_bytes = 0u64;
        for id in expired {
            match evict(store, &id) {
                Ok(bytes) => {
                    freed_bytes += bytes;
                    outcome.removed += 1;
                    tracing::info!(target: "doctrack.retention", id = %id, freed_bytes = bytes, "Removed expired record");
                }
                Err(failure) => outcome.failures.push(failure),
            }
        }
        outcome.freed_mb = bytes_to_mb(freed_bytes);

        store.note_cleanup(outcome.removed, outcome.freed_mb, now);
        if outcome.removed > 0 {
            tracing::info!(
                target: "doctrack.retention",
                removed = outcome.removed,
                freed_mb = outcome.freed_mb,
                max_age_days,
                "Age cleanup completed"
            );
        } else {
            tracing::debug!(target: "doctrack.retention", max_age_days, "Nothing older than cutoff");
        }
        outcome
    }

    /// Evict oldest-first until live usage is at or below `max_total_mb`.
    ///
    /// Candidates are records whose file exists, ordered by download time
    /// and then identifier. Eviction is greedy and may overshoot.
    pub fn enforce_storage_limit(
        &self,
        store: &mut TrackingStore,
        max_total_mb: f64,
    ) -> RetentionOutcome {
        let now = self.clock.now();
        let live = store.compute_live_stats();
        let mut outcome = RetentionOutcome::default();

        if live.total_size_mb() <= max_total_mb {
            tracing::debug!(
                target: "doctrack.retention",
                total_mb = live.total_size_mb(),
                max_total_mb,
                "Storage under limit"
            );
            store.note_cleanup(0, 0.0, now);
            return outcome;
        }

        let mut candidates: Vec<(DateTime<Utc>, String)> = store
            .records()
            .filter(|r| r.file_path().is_file())
            .map(|r| (r.downloaded_at(), r.id().to_string()))
            .collect();
        candidates.sort();

        #[allow(clippy::cast_precision_loss)]
        let over_limit = |bytes: u64| bytes as f64 > max_total_mb * BYTES_PER_MB;

        let mut current = live.total_bytes;
        let mut freed_bytes = 0u64;
        for (_, id) in candidates {
            if !over_limit(current) {
                break;
            }
            match evict(store, &id) {
                Ok(bytes) => {
                    current = current.saturating_sub(bytes);
                    freed_bytes += bytes;
                    outcome.removed += 1;
                    tracing::info!(target: "doctrack.retention", id = %id, freed_bytes = bytes, "Removed record for storage limit");
                }
                Err(failure) => outcome.failures.push(failure),
            }
        }
        outcome.freed_mb = bytes_to_mb(freed_bytes);

        store.note_cleanup(outcome.removed, outcome.freed_mb, now);
        tracing::info!(
            target: "doctrack.retention",
            removed = outcome.removed,
            freed_mb = outcome.freed_mb,
            remaining_mb = bytes_to_mb(current),
            max_total_mb,
            "Storage cleanup completed"
        );
        outcome
    }
}

/// `now - days`, or the earliest representable instant when that falls
/// outside chrono's range.
pub(crate) fn age_cutoff(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    Duration::try_days(i64::from(days))
        .and_then(|span| now.checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Delete a record's artifact (if present) and then the record.
///
/// Returns the bytes freed on disk.
fn evict(store: &mut TrackingStore, id: &str) -> Result<u64, RecordFailure> {
    let record = store.get(id).map_err(|e| RecordFailure::new(id, e))?;
    let path = record.file_path().to_path_buf();

    let freed = match fs::metadata(&path) {
        Ok(meta) if meta.is_file() => {
            let size = meta.len();
            if let Err(e) = fs::remove_file(&path) {
                tracing::warn!(target: "doctrack.retention", id, path = %path.display(), error = %e, "Failed to delete file");
                return Err(RecordFailure::new(id, e));
            }
            size
        }
        Ok(_) => 0,
        Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
        Err(e) => {
            tracing::warn!(target: "doctrack.retention", id, path = %path.display(), error = %e, "Cannot inspect file");
            return Err(RecordFailure::new(id, e));
        }
    };

    store.remove(id).map_err(|e| RecordFailure::new(id, e))?;
    Ok(freed)
}
