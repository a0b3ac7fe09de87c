//! Integration tests for loading and saving the tracking file.

mod common;

use std::fs;

use common::fixtures::{Layout, MB};
use doctrack_core::{SCHEMA_VERSION, TrackingStore};
use doctrack_store::persistence::{CORRUPT_BACKUP_PREFIX, SAVE_BACKUP_PREFIX};

fn backups_with_prefix(layout: &Layout, prefix: &str) -> usize {
    fs::read_dir(layout.backups_dir())
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|e| e.file_name().to_string_lossy().starts_with(prefix))
                .count()
        })
        .unwrap_or(0)
}

#[test]
fn save_then_load_reproduces_records() {
    let layout = Layout::new();
    let mut store = TrackingStore::new();
    layout.track_sparse(&mut store, "20250101-1-2025-1", 3, MB);
    layout.track_content(&mut store, "20250102-2-2025-1", 1, b"content");

    let manager = layout.manager();
    manager.save(&store).unwrap();
    let loaded = manager.load().unwrap();

    assert_eq!(
        loaded.records().collect::<Vec<_>>(),
        store.records().collect::<Vec<_>>()
    );
    assert_eq!(loaded.statistics(), store.statistics());
}

#[test]
fn written_file_uses_camel_case_schema() {
    let layout = Layout::new();
    let mut store = TrackingStore::new();
    layout.track_content(&mut store, "20250101-1-2025-1", 1, b"x");
    layout.manager().save(&store).unwrap();

    let doc: serde_json::Value =
        serde_json::from_slice(&fs::read(layout.tracking_file()).unwrap()).unwrap();

    assert_eq!(doc["schemaVersion"], SCHEMA_VERSION);
    let record = &doc["records"]["20250101-1-2025-1"];
    assert!(record["downloadedAt"].is_string());
    assert!(record["filePath"].is_string());
    assert_eq!(record["compressed"], false);
    assert!(doc["statistics"]["lastCleanupAt"].is_null());
}

#[test]
fn corrupt_file_recovers_with_exactly_one_backup() {
    let layout = Layout::new();
    fs::write(layout.tracking_file(), b"\x00\x01 not json at all").unwrap();

    let store = layout.manager().load().unwrap();

    assert!(store.is_empty());
    assert_eq!(store.schema_version(), SCHEMA_VERSION);
    assert_eq!(backups_with_prefix(&layout, CORRUPT_BACKUP_PREFIX), 1);
    assert_eq!(backups_with_prefix(&layout, SAVE_BACKUP_PREFIX), 0);
}

#[test]
fn saving_over_recovered_store_keeps_corrupt_copy() {
    let layout = Layout::new();
    fs::write(layout.tracking_file(), b"[oops").unwrap();
    let manager = layout.manager();

    let store = manager.load().unwrap();
    manager.save(&store).unwrap();
    manager.save(&store).unwrap();

    assert_eq!(backups_with_prefix(&layout, CORRUPT_BACKUP_PREFIX), 1);
    assert!(manager.load().unwrap().is_empty());
}

#[test]
fn legacy_snake_case_file_loads() {
    let layout = Layout::new();
    let legacy = serde_json::json!({
        "version": "1.0",
        "created": "2025-01-01T08:00:00.123456",
        "last_updated": "2025-05-01T08:00:00.123456",
        "downloads": {
            "20250301-10-2025-2": {
                "edicto_id": "20250301-10-2025-2",
                "filename": "edicto.pdf",
                "download_date": "2025-03-01T10:00:00.000001",
                "file_size": 2048,
                "file_path": "./downloads/edicto.pdf",
                "checksum": "",
                "compressed": false
            }
        },
        "statistics": {
            "total_downloads": 1,
            "total_size_mb": 0.002,
            "last_cleanup": "2025-04-01T00:00:00",
            "last_compression": null
        }
    });
    fs::write(layout.tracking_file(), legacy.to_string()).unwrap();

    let store = layout.manager().load().unwrap();

    assert_eq!(store.schema_version(), SCHEMA_VERSION);
    let record = store.get("20250301-10-2025-2").unwrap();
    assert_eq!(record.file_size(), 2048);
    assert_eq!(record.checksum(), None);
    assert!(store.statistics().last_cleanup_at.is_some());
    assert_eq!(store.statistics().total_downloads, 1);
}

#[test]
fn identifier_list_file_migrates_into_download_dir() {
    let layout = Layout::new();
    fs::write(
        layout.tracking_file(),
        r#"{"downloaded_edictos": ["20250301-10-2025-2", "20250302-11-2025-2"]}"#,
    )
    .unwrap();

    let store = layout.manager().load().unwrap();

    assert_eq!(store.len(), 2);
    let record = store.get("20250302-11-2025-2").unwrap();
    assert_eq!(
        record.file_path(),
        layout.downloads().join("20250302-11-2025-2.pdf")
    );
    assert_eq!(record.file_size(), 0);
}

#[test]
fn save_proceeds_when_backup_cannot_be_written() {
    let layout = Layout::new();
    let manager = layout.manager();
    let mut first = TrackingStore::new();
    layout.track_content(&mut first, "20250101-1-2025-1", 1, b"first");
    manager.save(&first).unwrap();

    // A regular file where the backups directory should be.
    fs::write(layout.backups_dir(), "not a directory").unwrap();

    let mut second = first.clone();
    layout.track_content(&mut second, "20250102-2-2025-1", 1, b"second");
    manager.save(&second).unwrap();

    let loaded = manager.load().unwrap();
    assert_eq!(loaded.len(), 2);
    assert!(loaded.is_tracked("20250102-2-2025-1"));
    assert!(layout.backups_dir().is_file());
}

#[test]
fn stale_last_updated_is_lifted_on_load() {
    let layout = Layout::new();
    fs::write(
        layout.tracking_file(),
        r#"{
            "schemaVersion": "2.0",
            "createdAt": "2025-05-01T00:00:00Z",
            "lastUpdatedAt": "2025-01-01T00:00:00Z",
            "records": {}
        }"#,
    )
    .unwrap();

    let store = layout.manager().load().unwrap();

    assert!(store.last_updated_at() >= store.created_at());
}
