use std::fs;
use std::path::Path;

use doctrack_core::{Clock, DownloadRecord, RecordId, TrackingError, TrackingStore};

use crate::checksum::sha256_file;

/// Record a completed download.
///
/// Validates `id`, sanitizes `filename`, and measures the file's size and
/// SHA-256 when it exists. A missing file is still tracked with size 0 and
/// no checksum. An unreadable file is tracked without a checksum.
///
/// Returns `Ok(false)` when `id` is already tracked; the existing record is
/// not touched.
///
/// # Errors
///
/// Returns [`TrackingError::InvalidId`] when `id` is malformed.
pub fn register_download(
    store: &mut TrackingStore,
    clock: &dyn Clock,
    id: &str,
    filename: &str,
    file_path: &Path,
) -> Result<bool, TrackingError> {
    let record_id = RecordId::parse(id).map_err(|source| TrackingError::InvalidId {
        id: id.to_string(),
        source,
    })?;

    if store.is_tracked(record_id.as_str()) {
        tracing::debug!(target: "doctrack.registration", id = %record_id, "Already tracked");
        return Ok(false);
    }

    let (file_size, checksum) = match fs::metadata(file_path) {
        Ok(meta) if meta.is_file() => {
            let checksum = match sha256_file(file_path) {
                Ok(digest) => Some(digest),
                Err(e) => {
                    tracing::warn!(target: "doctrack.registration", id = %record_id, path = %file_path.display(), error = %e, "Cannot hash file, tracking without checksum");
                    None
                }
            };
            (meta.len(), checksum)
        }
        _ => {
            tracing::warn!(target: "doctrack.registration", id = %record_id, path = %file_path.display(), "File not found, tracking with size 0");
            (0, None)
        }
    };

    let record = DownloadRecord::new(
        record_id,
        filename,
        clock.now(),
        file_size,
        file_path,
        checksum,
    );
    let id_display = record.id().to_string();

    match store.add_record(record) {
        Ok(()) => {
            tracing::info!(target: "doctrack.registration", id = %id_display, file_size, "Download tracked");
            Ok(true)
        }
        Err(TrackingError::DuplicateRecord(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use doctrack_core::FixedClock;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap())
    }

    #[test]
    fn test_registers_size_and_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        fs::write(&path, b"abc").unwrap();
        let mut store = TrackingStore::new();

        let added =
            register_download(&mut store, &clock(), "20250301-1-2025-1", "a/b.pdf", &path).unwrap();

        assert!(added);
        let record = store.get("20250301-1-2025-1").unwrap();
        assert_eq!(record.file_size(), 3);
        assert_eq!(record.filename(), "a_b.pdf");
        assert_eq!(record.downloaded_at(), clock().0);
        assert_eq!(
            record.checksum(),
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }

    #[test]
    fn test_duplicate_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        fs::write(&path, b"abc").unwrap();
        let mut store = TrackingStore::new();

        let id = "20250301-1-2025-1";
        assert!(register_download(&mut store, &clock(), id, "x.pdf", &path).unwrap());
        assert!(!register_download(&mut store, &clock(), id, "y.pdf", &path).unwrap());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("20250301-1-2025-1").unwrap().filename(), "x.pdf");
    }

    #[test]
    fn test_missing_file_tracked_with_zero_size() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TrackingStore::new();

        register_download(
            &mut store,
            &clock(),
            "20250301-1-2025-1",
            "x.pdf",
            &dir.path().join("absent.pdf"),
        )
        .unwrap();

        let record = store.get("20250301-1-2025-1").unwrap();
        assert_eq!(record.file_size(), 0);
        assert_eq!(record.checksum(), None);
    }

    #[test]
    fn test_invalid_id_is_rejected() {
        let mut store = TrackingStore::new();
        let err = register_download(&mut store, &clock(), "bogus", "x.pdf", Path::new("/x"))
            .unwrap_err();
        assert!(matches!(err, TrackingError::InvalidId { .. }));
        assert!(store.is_empty());
    }
}
