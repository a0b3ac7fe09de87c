//! Backup copies of the tracking file.
//!
//! Two kinds live in the backups directory:
//!
//! - `tracking_backup_<ts>.json`, written before each save and pruned to the
//!   newest K by modification time
//! - `corrupted_tracking_<ts>.json`, written when a load finds an unparseable
//!   file; these are never pruned
//!
//! Neither kind is ever overwritten. A name collision gets a `_<n>` suffix.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};

pub const SAVE_BACKUP_PREFIX: &str = "tracking_backup_";
pub const CORRUPT_BACKUP_PREFIX: &str = "corrupted_tracking_";

const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%6f";

/// Copy the current tracking file aside before it is replaced.
pub fn backup_before_save(
    source: &Path,
    backups_dir: &Path,
    at: DateTime<Utc>,
) -> io::Result<PathBuf> {
    copy_to_unique(source, backups_dir, SAVE_BACKUP_PREFIX, at)
}

/// Preserve an unparseable tracking file.
pub fn backup_corrupt(
    source: &Path,
    backups_dir: &Path,
    at: DateTime<Utc>,
) -> io::Result<PathBuf> {
    copy_to_unique(source, backups_dir, CORRUPT_BACKUP_PREFIX, at)
}

/// Delete save backups beyond the newest `keep`. Returns how many were removed.
///
/// Corrupt-load backups are not considered.
pub fn prune_save_backups(backups_dir: &Path, keep: usize) -> io::Result<usize> {
    let mut backups: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in fs::read_dir(backups_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.starts_with(SAVE_BACKUP_PREFIX) || !name.ends_with(".json") {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        backups.push((modified, entry.path()));
    }

    // Newest first; names embed the timestamp so they break mtime ties.
    backups.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

    let mut removed = 0;
    for (_, path) in backups.into_iter().skip(keep) {
        match fs::remove_file(&path) {
            Ok(()) => {
                removed += 1;
                tracing::debug!(target: "doctrack.persistence", path = %path.display(), "Pruned backup");
            }
            Err(e) => {
                tracing::warn!(target: "doctrack.persistence", path = %path.display(), error = %e, "Failed to prune backup");
            }
        }
    }
    Ok(removed)
}

fn copy_to_unique(
    source: &Path,
    backups_dir: &Path,
    prefix: &str,
    at: DateTime<Utc>,
) -> io::Result<PathBuf> {
    fs::create_dir_all(backups_dir)?;
    let stamp = at.format(STAMP_FORMAT).to_string();

    let mut counter = 0u32;
    let (path, mut target) = loop {
        let name = if counter == 0 {
            format!("{prefix}{stamp}.json")
        } else {
            format!("{prefix}{stamp}_{counter}.json")
        };
        let path = backups_dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => break (path, file),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => counter += 1,
            Err(e) => return Err(e),
        }
    };

    let copied = File::open(source).and_then(|mut src| io::copy(&mut src, &mut target));
    if let Err(e) = copied {
        drop(target);
        let _ = fs::remove_file(&path);
        return Err(e);
    }
    target.sync_all()?;
    Ok(path)
}
