//! Available subcommands.

use std::path::PathBuf;

use clap::Subcommand;
use doctrack_store::MaintenanceStep;

/// Operations on the tracking store.
#[derive(Subcommand)]
pub enum Commands {
    /// Register a completed download
    Add {
        /// Document identifier, e.g. 20250301-01234-2025-7
        id: String,
        /// Path of the downloaded file
        file: PathBuf,
        /// Display filename (defaults to the file's name)
        #[arg(long)]
        filename: Option<String>,
    },

    /// List tracked records
    List,

    /// Check tracked files exist and match their checksums
    Verify,

    /// Run retention and compression, then save
    Cleanup {
        /// Remove records older than this many days
        #[arg(long = "cleanup-days")]
        cleanup_days: Option<u32>,
        /// Evict oldest records until usage is at or below this many MB
        #[arg(long = "max-storage-mb")]
        max_storage_mb: Option<f64>,
        /// Compress files older than this many days (enables compression)
        #[arg(long = "compress-days")]
        compress_days: Option<u32>,
        /// Steps to run, in order (verify, age, capacity, compress)
        #[arg(long, value_delimiter = ',')]
        steps: Option<Vec<MaintenanceStep>>,
    },

    /// Print the summary report as JSON
    Report,
}
