//! Age-triggered compression of tracked artifacts.
//!
//! Per record the sequence is:
//!
//! 1. compress into `<path><suffix>.partial`
//! 2. rename to `<path><suffix>`
//! 3. verify the output exists and is non-empty
//! 4. remove the original
//! 5. point the record at the compressed file
//!
//! Any failure before step 4 leaves the original in place and cleans up the
//! output. If the original cannot be removed the output is deleted again so
//! the record still matches what is on disk.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use doctrack_core::{ArtifactCompressor, Clock, SystemClock, TrackingStore, bytes_to_mb};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;

use crate::failure::RecordFailure;
use crate::retention::age_cutoff;

const PARTIAL_SUFFIX: &str = ".partial";

/// Gzip implementation of [`ArtifactCompressor`].
#[derive(Debug, Clone, Copy)]
pub struct GzipCompressor {
    level: Compression,
}

impl Default for GzipCompressor {
    fn default() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl GzipCompressor {
    /// Compressor with an explicit level (0-9).
    #[must_use]
    pub fn with_level(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }
}

impl ArtifactCompressor for GzipCompressor {
    fn suffix(&self) -> &'static str {
        ".gz"
    }

    fn compress(&self, source: &Path, destination: &Path) -> io::Result<()> {
        let mut input = BufReader::new(File::open(source)?);
        let output = File::create(destination)?;
        let mut encoder = GzEncoder::new(BufWriter::new(output), self.level);
        io::copy(&mut input, &mut encoder)?;
        let mut writer = encoder.finish()?;
        writer.flush()?;
        writer
            .into_inner()
            .map_err(io::IntoInnerError::into_error)?
            .sync_all()
    }
}

/// Result of one compression pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionOutcome {
    pub compressed: usize,
    pub saved_mb: f64,
    pub failures: Vec<RecordFailure>,
}

impl CompressionOutcome {
    /// The `(compressed, saved_mb)` pair.
    #[must_use]
    pub const fn counts(&self) -> (usize, f64) {
        (self.compressed, self.saved_mb)
    }
}

/// Compresses aged, uncompressed artifacts.
#[derive(Clone)]
pub struct CompressionEngine {
    clock: Arc<dyn Clock>,
    compressor: Arc<dyn ArtifactCompressor>,
}

impl std::fmt::Debug for CompressionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompressionEngine")
            .field("suffix", &self.compressor.suffix())
            .finish_non_exhaustive()
    }
}

impl Default for CompressionEngine {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(GzipCompressor::default()))
    }
}

impl CompressionEngine {
    pub fn new(clock: Arc<dyn Clock>, compressor: Arc<dyn ArtifactCompressor>) -> Self {
        Self { clock, compressor }
    }

    /// Compress every uncompressed record with a present file older than
    /// `now - age_days`.
    pub fn compress_older_than(
        &self,
        store: &mut TrackingStore,
        age_days: u32,
    ) -> CompressionOutcome {
        let now = self.clock.now();
        let cutoff = age_cutoff(now, age_days);

        let eligible: Vec<(String, PathBuf)> = store
            .records()
            .filter(|r| !r.is_compressed() && r.downloaded_at() < cutoff)
            .filter(|r| r.file_path().is_file())
            .map(|r| (r.id().to_string(), r.file_path().to_path_buf()))
            .collect();

        let mut outcome = CompressionOutcome::default();
        for (id, original) in eligible {
            match self.compress_one(&original) {
                Ok((target, original_size, compressed_size)) => {
                    if let Err(e) = store.mark_compressed(&id, &target, compressed_size) {
                        outcome.failures.push(RecordFailure::new(&id, e));
                        continue;
                    }
                    let saved = bytes_to_mb(original_size) - bytes_to_mb(compressed_size);
                    outcome.compressed += 1;
                    outcome.saved_mb += saved;
                    tracing::info!(
                        target: "doctrack.compression",
                        id = %id,
                        original_bytes = original_size,
                        compressed_bytes = compressed_size,
                        "Compressed file"
                    );
                }
                Err(e) => {
                    tracing::warn!(target: "doctrack.compression", id = %id, path = %original.display(), error = %e, "Compression skipped");
                    outcome.failures.push(RecordFailure::new(&id, e));
                }
            }
        }

        if outcome.compressed > 0 {
            store.note_compression(now);
            tracing::info!(
                target: "doctrack.compression",
                compressed = outcome.compressed,
                saved_mb = outcome.saved_mb,
                "Compression completed"
            );
        } else {
            tracing::debug!(target: "doctrack.compression", age_days, "Nothing to compress");
        }
        outcome
    }

    /// Returns `(compressed path, original size, compressed size)`.
    fn compress_one(&self, original: &Path) -> io::Result<(PathBuf, u64, u64)> {
        let original_size = fs::metadata(original)?.len();
        let target = with_suffix(original, self.compressor.suffix());
        let partial = with_suffix(&target, PARTIAL_SUFFIX);

        if let Err(e) = self.compressor.compress(original, &partial) {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
        if let Err(e) = fs::rename(&partial, &target) {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }

        let compressed_size = match fs::metadata(&target) {
            Ok(meta) if meta.is_file() && meta.len() > 0 => meta.len(),
            _ => {
                let _ = fs::remove_file(&target);
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "compressed output missing or empty",
                ));
            }
        };

        if let Err(e) = fs::remove_file(original) {
            let _ = fs::remove_file(&target);
            return Err(e);
        }

        Ok((target, original_size, compressed_size))
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}
