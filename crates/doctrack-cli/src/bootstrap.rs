//! CLI bootstrap - the composition root.
//!
//! This module is the only place where concrete adapters are wired together
//! for the CLI: settings resolution, directory bootstrap, the persistence
//! manager, the clock and the gzip compressor.

use std::sync::Arc;

use doctrack_core::{
    ArtifactCompressor, Clock, SystemClock, TrackerSettings, TrackingStore, ensure_directory,
    validate_settings,
};
use doctrack_store::{
    GzipCompressor, IntegrityVerifier, MaintenancePolicy, MaintenanceRunner, PersistenceManager,
};

use crate::error::CliError;
use crate::parser::Cli;

/// Resolve settings: defaults, then `--config`, then environment, then flags.
pub fn load_settings(cli: &Cli) -> Result<TrackerSettings, CliError> {
    let mut settings = match &cli.config {
        Some(path) => TrackerSettings::load_file(path)?,
        None => TrackerSettings::default(),
    };
    settings.apply_env();
    settings.merge(&cli.settings_update());
    validate_settings(&settings)?;
    Ok(settings)
}

/// Fully composed context for CLI commands.
pub struct CliContext {
    pub settings: TrackerSettings,
    pub persistence: PersistenceManager,
    pub clock: Arc<dyn Clock>,
    pub compressor: Arc<dyn ArtifactCompressor>,
    pub verifier: IntegrityVerifier,
}

impl CliContext {
    /// Load the tracking store.
    pub fn load_store(&self) -> Result<TrackingStore, CliError> {
        Ok(self.persistence.load()?)
    }

    /// Save the tracking store.
    pub fn save_store(&self, store: &TrackingStore) -> Result<(), CliError> {
        Ok(self.persistence.save(store)?)
    }

    /// Maintenance runner configured from the current settings.
    pub fn maintenance_runner(&self) -> MaintenanceRunner {
        MaintenanceRunner::new(
            MaintenancePolicy::from_settings(&self.settings),
            Arc::clone(&self.clock),
            Arc::clone(&self.compressor),
        )
    }
}

/// Create the working directories and compose the context.
pub fn bootstrap(settings: TrackerSettings) -> Result<CliContext, CliError> {
    ensure_directory(&settings.download_dir)?;
    ensure_directory(&settings.effective_backups_dir())?;
    if let Some(parent) = settings
        .tracking_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
    {
        ensure_directory(parent)?;
    }

    tracing::debug!(
        tracking_file = %settings.tracking_file.display(),
        download_dir = %settings.download_dir.display(),
        "CLI context ready"
    );

    Ok(CliContext {
        persistence: PersistenceManager::from_settings(&settings),
        settings,
        clock: Arc::new(SystemClock),
        compressor: Arc::new(GzipCompressor::default()),
        verifier: IntegrityVerifier::new(),
    })
}
