//! Core domain types and port definitions for doctrack.
//!
//! This crate holds the pure pieces of the tracking subsystem: the
//! [`DownloadRecord`] and [`TrackingStore`] types with their invariants,
//! identifier validation, filename sanitizing, settings, and the ports
//! ([`Clock`], [`ArtifactCompressor`]) that the filesystem adapter in
//! `doctrack-store` is wired against.
//!
//! Nothing here touches the tracking file itself. The only filesystem access
//! is the existence/size probe behind [`TrackingStore::compute_live_stats`]
//! and the directory helpers in [`paths`].

#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod errors;
pub mod paths;
pub mod ports;
pub mod settings;

pub use domain::{
    BYTES_PER_MB, DownloadRecord, LiveStats, RecordId, RecordIdError, SCHEMA_VERSION, Statistics,
    TrackingStore, bytes_to_mb, sanitize_filename,
};
pub use errors::TrackingError;
pub use paths::{PathError, default_backups_dir, ensure_directory, verify_writable};
pub use ports::{ArtifactCompressor, Clock, FixedClock, SystemClock};
pub use settings::{SettingsError, SettingsUpdate, TrackerSettings, validate_settings};

#[cfg(any(test, feature = "test-utils"))]
pub use ports::MockArtifactCompressor;

#[cfg(test)]
use tempfile as _;
