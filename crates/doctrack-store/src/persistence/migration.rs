//! Upgrade of older tracking documents to the current schema.
//!
//! Field renames (snake_case keys, naive timestamps, empty checksums) are
//! absorbed by serde aliases on the domain types. This module handles the
//! shape changes that aliases cannot express:
//!
//! - the oldest format, a bare list of identifiers (`downloaded_edictos`, or
//!   `downloads` as an array), becomes full records
//! - records missing their own `id` take it from the map key
//! - negative counters and sizes are clamped to zero
//! - a `lastUpdatedAt` earlier than `createdAt` is lifted to `createdAt`

use std::path::Path;

use chrono::{DateTime, Utc};
use doctrack_core::{SCHEMA_VERSION, TrackingStore};
use serde_json::{Map, Value, json};

const LEGACY_ID_LIST_KEY: &str = "downloaded_edictos";

/// A loaded store and whether it had to be upgraded.
#[derive(Debug)]
pub struct Migrated {
    pub store: TrackingStore,
    pub migrated: bool,
}

/// The document parsed as JSON but cannot be turned into a store.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct MigrationError(String);

/// Turn a parsed tracking document into a current-schema store.
///
/// `download_dir` and `now` only matter for the identifier-list format,
/// whose entries carry neither a path nor a timestamp.
pub fn migrate(
    document: Value,
    download_dir: &Path,
    now: DateTime<Utc>,
) -> Result<Migrated, MigrationError> {
    let Value::Object(mut root) = document else {
        return Err(MigrationError(
            "tracking document is not a JSON object".to_string(),
        ));
    };

    let mut migrated = !has_current_version(&root);

    if let Some(records) = take_id_list(&mut root, download_dir, now) {
        root.insert("records".to_string(), Value::Object(records));
        migrated = true;
    }

    for key in ["records", "downloads"] {
        if let Some(Value::Object(records)) = root.get_mut(key) {
            for (id, record) in records.iter_mut() {
                normalize_record(id, record);
            }
        }
    }

    if let Some(Value::Object(stats)) = root.get_mut("statistics") {
        clamp_non_negative(stats, &["totalDownloads", "total_downloads"]);
        clamp_non_negative(stats, &["totalSizeMb", "total_size_mb"]);
    }

    let mut store: TrackingStore = serde_json::from_value(Value::Object(root))
        .map_err(|e| MigrationError(e.to_string()))?;

    let rekeyed = store.reconcile_keys();
    if rekeyed > 0 {
        tracing::warn!(target: "doctrack.persistence", rekeyed, "Re-keyed records whose key disagreed with their id");
        migrated = true;
    }

    if store.normalize_timestamps() {
        tracing::warn!(
            target: "doctrack.persistence",
            created_at = %store.created_at(),
            "lastUpdatedAt preceded createdAt, lifted to createdAt"
        );
    }

    if migrated {
        let from = store.schema_version().to_string();
        store.stamp_current_schema();
        tracing::info!(
            target: "doctrack.persistence",
            from = %from,
            to = SCHEMA_VERSION,
            records = store.len(),
            "Migrated tracking data"
        );
    }

    Ok(Migrated { store, migrated })
}

fn has_current_version(root: &Map<String, Value>) -> bool {
    let version = root.get("schemaVersion").or_else(|| root.get("version"));
    match version {
        Some(Value::String(v)) => v == SCHEMA_VERSION,
        Some(Value::Number(n)) => n.to_string() == SCHEMA_VERSION,
        _ => false,
    }
}

/// Pull an identifier list out of the document and expand it into records.
fn take_id_list(
    root: &mut Map<String, Value>,
    download_dir: &Path,
    now: DateTime<Utc>,
) -> Option<Map<String, Value>> {
    let list = match root.remove(LEGACY_ID_LIST_KEY) {
        Some(Value::Array(ids)) => {
            if matches!(root.get("downloads"), Some(Value::Array(_))) {
                root.remove("downloads");
            }
            ids
        }
        Some(other) => {
            tracing::warn!(target: "doctrack.persistence", kind = %kind_of(&other), "Ignoring malformed identifier list");
            return None;
        }
        None => match root.get("downloads") {
            Some(Value::Array(_)) => match root.remove("downloads") {
                Some(Value::Array(ids)) => ids,
                _ => return None,
            },
            _ => return None,
        },
    };

    let downloaded_at = now.to_rfc3339();
    let mut records = Map::new();
    for entry in list {
        let Value::String(id) = entry else {
            tracing::warn!(target: "doctrack.persistence", kind = %kind_of(&entry), "Skipping non-string identifier");
            continue;
        };
        let filename = format!("{id}.pdf");
        let file_path = download_dir.join(&filename).to_string_lossy().into_owned();
        records.insert(
            id.clone(),
            json!({
                "id": id,
                "filename": filename,
                "downloadedAt": downloaded_at,
                "fileSize": 0,
                "filePath": file_path,
                "checksum": null,
                "compressed": false,
            }),
        );
    }
    Some(records)
}

fn normalize_record(key: &str, record: &mut Value) {
    let Value::Object(fields) = record else {
        return;
    };
    if !fields.contains_key("id") && !fields.contains_key("edicto_id") {
        fields.insert("id".to_string(), Value::String(key.to_string()));
    }
    clamp_non_negative(fields, &["fileSize", "file_size"]);
}

fn clamp_non_negative(fields: &mut Map<String, Value>, keys: &[&str]) {
    for key in keys {
        if let Some(value) = fields.get_mut(*key) {
            if value.as_f64().is_some_and(|v| v < 0.0) {
                *value = json!(0);
            }
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_current_document_is_not_migrated() {
        let doc = json!({
            "schemaVersion": "2.0",
            "createdAt": "2025-01-01T00:00:00Z",
            "lastUpdatedAt": "2025-01-01T00:00:00Z",
            "records": {},
            "statistics": {"totalDownloads": 0, "totalSizeMb": 0.0}
        });
        let result = migrate(doc, Path::new("/dl"), now()).unwrap();
        assert!(!result.migrated);
        assert!(result.store.is_empty());
    }

    #[test]
    fn test_last_updated_before_created_is_lifted() {
        let doc = json!({
            "schemaVersion": "2.0",
            "createdAt": "2025-05-01T00:00:00Z",
            "lastUpdatedAt": "2025-01-01T00:00:00Z",
            "records": {}
        });
        let store = migrate(doc, Path::new("/dl"), now()).unwrap().store;
        assert_eq!(
            store.created_at(),
            Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap()
        );
        assert!(store.last_updated_at() >= store.created_at());
    }

    #[test]
    fn test_missing_created_at_keeps_ordering() {
        let doc = json!({
            "schemaVersion": "2.0",
            "lastUpdatedAt": "2020-01-01T00:00:00Z",
            "records": {}
        });
        let store = migrate(doc, Path::new("/dl"), now()).unwrap().store;
        assert!(store.last_updated_at() >= store.created_at());
    }

    #[test]
    fn test_identifier_list_becomes_records() {
        let doc = json!({
            "downloaded_edictos": ["20250301-1-2025-1", 7, "20250302-2-2025-1"],
            "last_updated": "2025-03-02T09:00:00"
        });
        let result = migrate(doc, Path::new("/dl"), now()).unwrap();

        assert!(result.migrated);
        assert_eq!(result.store.schema_version(), SCHEMA_VERSION);
        assert_eq!(result.store.len(), 2);
        let record = result.store.get("20250301-1-2025-1").unwrap();
        assert_eq!(record.file_path(), PathBuf::from("/dl/20250301-1-2025-1.pdf"));
        assert_eq!(record.file_size(), 0);
        assert_eq!(record.downloaded_at(), now());
        assert_eq!(record.checksum(), None);
    }

    #[test]
    fn test_downloads_array_is_an_identifier_list() {
        let doc = json!({ "version": "1.0", "downloads": ["20250301-1-2025-1"] });
        let result = migrate(doc, Path::new("/dl"), now()).unwrap();
        assert!(result.store.is_tracked("20250301-1-2025-1"));
    }

    #[test]
    fn test_snake_case_document_with_negative_counters() {
        let doc = json!({
            "version": "1.0",
            "created": "2025-01-01T00:00:00",
            "last_updated": "2025-02-01T00:00:00",
            "downloads": {
                "20250301-1-2025-1": {
                    "edicto_id": "20250301-1-2025-1",
                    "filename": "a.pdf",
                    "download_date": "2025-03-01T10:00:00",
                    "file_size": -5,
                    "file_path": "/dl/a.pdf",
                    "checksum": "",
                    "compressed": false
                },
                "20250302-1-2025-1": {
                    "filename": "b.pdf",
                    "download_date": "2025-03-02T10:00:00",
                    "file_size": 10,
                    "file_path": "/dl/b.pdf"
                }
            },
            "statistics": {"total_downloads": -3, "total_size_mb": -1.5, "last_cleanup": null}
        });
        let result = migrate(doc, Path::new("/dl"), now()).unwrap();

        assert!(result.migrated);
        assert_eq!(result.store.len(), 2);
        assert_eq!(result.store.get("20250301-1-2025-1").unwrap().file_size(), 0);
        assert_eq!(result.store.statistics().total_downloads, 0);
        assert!(result.store.get("20250302-1-2025-1").is_ok());
    }

    #[test]
    fn test_non_object_document_is_rejected() {
        assert!(migrate(json!([1, 2, 3]), Path::new("/dl"), now()).is_err());
    }
}
