//! Integrity verification of tracked artifacts.
//!
//! Each record gets exactly one [`VerificationStatus`]. Only `Missing` and
//! `Mismatch` count as problems; the remaining non-`Ok` states mean the
//! record could not be checked.

use std::fs;
use std::io;

use doctrack_core::{DownloadRecord, TrackingStore};
use serde::Serialize;

use crate::checksum::sha256_file;

/// Outcome of checking one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum VerificationStatus {
    /// File present and its hash matches the recorded checksum.
    Ok,
    /// File present but its content changed.
    Mismatch { expected: String, actual: String },
    /// File absent.
    Missing,
    /// Compressed artifact; the checksum describes the original content.
    UnverifiableCompressed,
    /// No checksum recorded.
    NoChecksum,
    /// File present but could not be read.
    Unreadable { reason: String },
}

impl VerificationStatus {
    /// Whether this status should be reported as a problem.
    #[must_use]
    pub const fn is_problem(&self) -> bool {
        matches!(self, Self::Missing | Self::Mismatch { .. })
    }
}

/// Per-classification identifier lists from one verification pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub checked: usize,
    pub verified: Vec<String>,
    pub missing: Vec<String>,
    pub corrupted: Vec<String>,
    pub unverifiable_compressed: Vec<String>,
    pub no_checksum: Vec<String>,
    pub unreadable: Vec<String>,
}

impl IntegrityReport {
    /// No record is missing or corrupted.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.corrupted.is_empty()
    }

    /// The `(missing, corrupted)` pair.
    #[must_use]
    pub fn into_pair(self) -> (Vec<String>, Vec<String>) {
        (self.missing, self.corrupted)
    }

    fn push(&mut self, id: String, status: &VerificationStatus) {
        self.checked += 1;
        let bucket = match status {
            VerificationStatus::Ok => &mut self.verified,
            VerificationStatus::Mismatch { .. } => &mut self.corrupted,
            VerificationStatus::Missing => &mut self.missing,
            VerificationStatus::UnverifiableCompressed => &mut self.unverifiable_compressed,
            VerificationStatus::NoChecksum => &mut self.no_checksum,
            VerificationStatus::Unreadable { .. } => &mut self.unreadable,
        };
        bucket.push(id);
    }
}

/// Checks records against the filesystem. Read-only.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegrityVerifier;

impl IntegrityVerifier {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Classify a single record.
    pub fn verify_record(&self, record: &DownloadRecord) -> VerificationStatus {
        let path = record.file_path();
        match fs::metadata(path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return VerificationStatus::Missing,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return VerificationStatus::Missing,
            Err(e) => {
                return VerificationStatus::Unreadable {
                    reason: e.to_string(),
                };
            }
        }

        let Some(expected) = record.checksum() else {
            return VerificationStatus::NoChecksum;
        };

        if record.is_compressed() {
            return VerificationStatus::UnverifiableCompressed;
        }

        match sha256_file(path) {
            Ok(actual) if actual.eq_ignore_ascii_case(expected) => VerificationStatus::Ok,
            Ok(actual) => VerificationStatus::Mismatch {
                expected: expected.to_string(),
                actual,
            },
            Err(e) => VerificationStatus::Unreadable {
                reason: e.to_string(),
            },
        }
    }

    /// Classify every record in the store.
    pub fn verify(&self, store: &TrackingStore) -> IntegrityReport {
        let mut report = IntegrityReport::default();

        for record in store.records() {
            let status = self.verify_record(record);
            match &status {
                VerificationStatus::Missing => {
                    tracing::warn!(target: "doctrack.integrity", id = %record.id(), path = %record.file_path().display(), "Tracked file is missing");
                }
                VerificationStatus::Mismatch { expected, actual } => {
                    tracing::warn!(target: "doctrack.integrity", id = %record.id(), expected = %expected, actual = %actual, "Checksum mismatch");
                }
                VerificationStatus::Unreadable { reason } => {
                    tracing::warn!(target: "doctrack.integrity", id = %record.id(), reason = %reason, "Tracked file is unreadable");
                }
                _ => {}
            }
            report.push(record.id().to_string(), &status);
        }

        tracing::info!(
            target: "doctrack.integrity",
            checked = report.checked,
            missing = report.missing.len(),
            corrupted = report.corrupted.len(),
            unverifiable = report.unverifiable_compressed.len(),
            "Verification complete"
        );
        report
    }
}
