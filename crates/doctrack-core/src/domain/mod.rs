//! Domain types for tracked downloads.
//!
//! Pure data types; the only I/O is the file probe used by live statistics.

mod record;
mod store;
pub mod timestamp;

pub use record::{DownloadRecord, RecordId, RecordIdError, sanitize_filename};
pub use store::{LiveStats, SCHEMA_VERSION, Statistics, TrackingStore};

/// Bytes per megabyte as used for every size reported in MB.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Convert a byte count to megabytes.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}
