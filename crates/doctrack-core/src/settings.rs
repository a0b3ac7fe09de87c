//! Tracker settings and validation.
//!
//! Settings come from, lowest to highest precedence: built-in defaults, an
//! optional JSON file, `DOCTRACK_*` environment variables, and finally a
//! [`SettingsUpdate`] built by the caller (e.g. from command-line flags).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::paths::default_backups_dir;

/// Default number of tracking-file backups kept by rotation.
pub const DEFAULT_BACKUP_KEEP: usize = 10;
/// Default age after which records are removed, in days.
pub const DEFAULT_CLEANUP_DAYS: u32 = 30;
/// Default age after which artifacts are compressed, in days.
pub const DEFAULT_COMPRESSION_DAYS: u32 = 7;
/// Default storage ceiling for tracked artifacts, in MB.
pub const DEFAULT_MAX_STORAGE_MB: f64 = 1000.0;

const KNOWN_KEYS: &[&str] = &[
    "tracking_file",
    "download_dir",
    "backups_dir",
    "backup_tracking",
    "backup_keep",
    "cleanup_days",
    "max_storage_mb",
    "compress_old_files",
    "compression_days",
];

/// Tracker configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackerSettings {
    /// Path of the persisted tracking file.
    pub tracking_file: PathBuf,

    /// Directory downloads are written to; legacy migrations point records here.
    pub download_dir: PathBuf,

    /// Backups directory. `None` means `backups/` next to the tracking file.
    pub backups_dir: Option<PathBuf>,

    /// Copy the previous tracking file aside before each save.
    pub backup_tracking: bool,

    /// How many save backups rotation keeps.
    pub backup_keep: usize,

    /// Records older than this many days are removed by the age policy.
    pub cleanup_days: u32,

    /// Ceiling enforced by the capacity policy.
    pub max_storage_mb: f64,

    /// Whether routine maintenance includes the compression pass.
    pub compress_old_files: bool,

    /// Artifacts older than this many days are compressed.
    pub compression_days: u32,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            tracking_file: PathBuf::from("./tracking.json"),
            download_dir: PathBuf::from("./downloads"),
            backups_dir: None,
            backup_tracking: true,
            backup_keep: DEFAULT_BACKUP_KEEP,
            cleanup_days: DEFAULT_CLEANUP_DAYS,
            max_storage_mb: DEFAULT_MAX_STORAGE_MB,
            compress_old_files: false,
            compression_days: DEFAULT_COMPRESSION_DAYS,
        }
    }
}

impl TrackerSettings {
    /// Backups directory after applying the default.
    #[must_use]
    pub fn effective_backups_dir(&self) -> PathBuf {
        self.backups_dir
            .clone()
            .unwrap_or_else(|| default_backups_dir(&self.tracking_file))
    }

    /// Parse settings from a JSON document.
    ///
    /// Unknown keys are ignored with a warning; missing keys keep defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, SettingsError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| SettingsError::Parse(e.to_string()))?;

        if let Some(map) = value.as_object() {
            for key in map.keys().filter(|k| !KNOWN_KEYS.contains(&k.as_str())) {
                tracing::warn!(key = %key, "Unknown configuration key");
            }
        }

        serde_json::from_value(value).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// Load settings from a JSON file.
    ///
    /// A missing file is not an error: defaults are returned and a warning is
    /// logged. Unreadable or malformed files are errors.
    pub fn load_file(path: &Path) -> Result<Self, SettingsError> {
        match fs::read_to_string(path) {
            Ok(raw) => {
                let settings = Self::from_json_str(&raw)?;
                tracing::info!(path = %path.display(), "Configuration loaded");
                Ok(settings)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Configuration file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(SettingsError::Io {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }

    /// Overlay `DOCTRACK_*` variables from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Overlay `DOCTRACK_*` variables using the given lookup.
    ///
    /// Values that fail to parse are ignored with a warning.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DOCTRACK_TRACKING_FILE") {
            self.tracking_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("DOCTRACK_DOWNLOAD_DIR") {
            self.download_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("DOCTRACK_BACKUPS_DIR") {
            self.backups_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("DOCTRACK_BACKUP_TRACKING") {
            self.backup_tracking = parse_env_bool(&v);
        }
        if let Some(v) = lookup("DOCTRACK_COMPRESS_OLD_FILES") {
            self.compress_old_files = parse_env_bool(&v);
        }
        if let Some(v) = parse_env_number(&lookup, "DOCTRACK_BACKUP_KEEP") {
            self.backup_keep = v;
        }
        if let Some(v) = parse_env_number(&lookup, "DOCTRACK_CLEANUP_DAYS") {
            self.cleanup_days = v;
        }
        if let Some(v) = parse_env_number(&lookup, "DOCTRACK_MAX_STORAGE_MB") {
            self.max_storage_mb = v;
        }
        if let Some(v) = parse_env_number(&lookup, "DOCTRACK_COMPRESSION_DAYS") {
            self.compression_days = v;
        }
    }

    /// Merge an update into these settings, only touching fields that are `Some`.
    pub fn merge(&mut self, update: &SettingsUpdate) {
        if let Some(ref path) = update.tracking_file {
            self.tracking_file.clone_from(path);
        }
        if let Some(ref path) = update.download_dir {
            self.download_dir.clone_from(path);
        }
        if let Some(ref path) = update.backups_dir {
            self.backups_dir = Some(path.clone());
        }
        if let Some(keep) = update.backup_keep {
            self.backup_keep = keep;
        }
        if let Some(days) = update.cleanup_days {
            self.cleanup_days = days;
        }
        if let Some(mb) = update.max_storage_mb {
            self.max_storage_mb = mb;
        }
        if let Some(compress) = update.compress_old_files {
            self.compress_old_files = compress;
        }
        if let Some(days) = update.compression_days {
            self.compression_days = days;
        }
    }
}

fn parse_env_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn parse_env_number<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring invalid environment value");
            None
        }
    }
}

/// Partial settings update; `None` leaves the field alone.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub tracking_file: Option<PathBuf>,
    pub download_dir: Option<PathBuf>,
    pub backups_dir: Option<PathBuf>,
    pub backup_keep: Option<usize>,
    pub cleanup_days: Option<u32>,
    pub max_storage_mb: Option<f64>,
    pub compress_old_files: Option<bool>,
    pub compression_days: Option<u32>,
}

/// Settings loading or validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("max_storage_mb must be positive, got {0}")]
    InvalidMaxStorage(f64),

    #[error("cleanup_days must be positive, got {0}")]
    InvalidCleanupDays(u32),

    #[error("backup_keep must be at least 1, got {0}")]
    InvalidBackupKeep(usize),

    #[error("{0} cannot be empty")]
    EmptyPath(&'static str),

    #[error("Invalid configuration: {0}")]
    Parse(String),

    #[error("Failed to read configuration {path}: {reason}")]
    Io { path: PathBuf, reason: String },
}

/// Validate settings values.
pub fn validate_settings(settings: &TrackerSettings) -> Result<(), SettingsError> {
    if !(settings.max_storage_mb > 0.0 && settings.max_storage_mb.is_finite()) {
        return Err(SettingsError::InvalidMaxStorage(settings.max_storage_mb));
    }

    if settings.cleanup_days == 0 {
        return Err(SettingsError::InvalidCleanupDays(settings.cleanup_days));
    }

    if settings.backup_keep == 0 {
        return Err(SettingsError::InvalidBackupKeep(settings.backup_keep));
    }

    if settings.tracking_file.as_os_str().is_empty() {
        return Err(SettingsError::EmptyPath("tracking_file"));
    }

    if settings.download_dir.as_os_str().is_empty() {
        return Err(SettingsError::EmptyPath("download_dir"));
    }

    Ok(())
}
