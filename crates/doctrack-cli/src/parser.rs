//! Main CLI parser and top-level argument handling.
//!
//! This module defines the root CLI structure with global options.

use std::path::PathBuf;

use clap::Parser;
use doctrack_core::SettingsUpdate;

use crate::commands::Commands;

/// Command-line interface for the download tracker.
#[derive(Parser)]
#[command(name = "doctrack")]
#[command(about = "Track downloaded documents and keep their storage in check")]
#[command(version)]
pub struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, env = "DOCTRACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the tracking file for this invocation
    #[arg(long = "tracking-file", global = true)]
    pub tracking_file: Option<PathBuf>,

    /// Override the download directory for this invocation
    #[arg(long = "download-dir", global = true)]
    pub download_dir: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Settings overrides carried by the command line.
    pub fn settings_update(&self) -> SettingsUpdate {
        let mut update = SettingsUpdate {
            tracking_file: self.tracking_file.clone(),
            download_dir: self.download_dir.clone(),
            ..Default::default()
        };

        if let Some(Commands::Cleanup {
            cleanup_days,
            max_storage_mb,
            compress_days,
            ..
        }) = &self.command
        {
            update.cleanup_days = *cleanup_days;
            update.max_storage_mb = *max_storage_mb;
            update.compression_days = *compress_days;
            if compress_days.is_some() {
                update.compress_old_files = Some(true);
            }
        }

        update
    }
}
