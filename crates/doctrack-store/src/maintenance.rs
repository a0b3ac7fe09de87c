//! Ordered maintenance runs over a single store.
//!
//! A run is a list of [`MaintenanceStep`]s executed in the caller's order.
//! Steps are independent; the runner never saves the store.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use doctrack_core::{ArtifactCompressor, Clock, TrackerSettings, TrackingStore};
use serde::Serialize;

use crate::compression::{CompressionEngine, CompressionOutcome};
use crate::integrity::{IntegrityReport, IntegrityVerifier};
use crate::retention::{RetentionEngine, RetentionOutcome};

/// One maintenance operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceStep {
    Verify,
    Age,
    Capacity,
    Compress,
}

impl MaintenanceStep {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Verify => "verify",
            Self::Age => "age",
            Self::Capacity => "capacity",
            Self::Compress => "compress",
        }
    }
}

impl fmt::Display for MaintenanceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown maintenance step {0:?} (expected verify, age, capacity or compress)")]
pub struct StepParseError(String);

impl FromStr for MaintenanceStep {
    type Err = StepParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "verify" => Ok(Self::Verify),
            "age" => Ok(Self::Age),
            "capacity" => Ok(Self::Capacity),
            "compress" => Ok(Self::Compress),
            other => Err(StepParseError(other.to_string())),
        }
    }
}

/// Age eviction, then capacity eviction, then compression when enabled.
#[must_use]
pub fn default_plan(compress_enabled: bool) -> Vec<MaintenanceStep> {
    let mut plan = vec![MaintenanceStep::Age, MaintenanceStep::Capacity];
    if compress_enabled {
        plan.push(MaintenanceStep::Compress);
    }
    plan
}

/// Thresholds a run applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaintenancePolicy {
    pub cleanup_days: u32,
    pub max_storage_mb: f64,
    pub compression_days: u32,
}

impl MaintenancePolicy {
    pub fn from_settings(settings: &TrackerSettings) -> Self {
        Self {
            cleanup_days: settings.cleanup_days,
            max_storage_mb: settings.max_storage_mb,
            compression_days: settings.compression_days,
        }
    }
}

/// Result of one executed step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", content = "outcome", rename_all = "lowercase")]
pub enum StepReport {
    Verify(IntegrityReport),
    Age(RetentionOutcome),
    Capacity(RetentionOutcome),
    Compress(CompressionOutcome),
}

impl StepReport {
    #[must_use]
    pub const fn step(&self) -> MaintenanceStep {
        match self {
            Self::Verify(_) => MaintenanceStep::Verify,
            Self::Age(_) => MaintenanceStep::Age,
            Self::Capacity(_) => MaintenanceStep::Capacity,
            Self::Compress(_) => MaintenanceStep::Compress,
        }
    }
}

/// Wires the engines together for a run.
#[derive(Debug, Clone)]
pub struct MaintenanceRunner {
    policy: MaintenancePolicy,
    retention: RetentionEngine,
    compression: CompressionEngine,
    verifier: IntegrityVerifier,
}

impl MaintenanceRunner {
    pub fn new(
        policy: MaintenancePolicy,
        clock: Arc<dyn Clock>,
        compressor: Arc<dyn ArtifactCompressor>,
    ) -> Self {
        Self {
            policy,
            retention: RetentionEngine::new(Arc::clone(&clock)),
            compression: CompressionEngine::new(clock, compressor),
            verifier: IntegrityVerifier::new(),
        }
    }

    #[must_use]
    pub const fn policy(&self) -> &MaintenancePolicy {
        &self.policy
    }

    /// Execute `steps` in order against `store`.
    pub fn run(&self, store: &mut TrackingStore, steps: &[MaintenanceStep]) -> Vec<StepReport> {
        steps
            .iter()
            .map(|step| {
                tracing::debug!(target: "doctrack.maintenance", step = %step, "Running maintenance step");
                self.run_step(store, *step)
            })
            .collect()
    }

    fn run_step(&self, store: &mut TrackingStore, step: MaintenanceStep) -> StepReport {
        match step {
            MaintenanceStep::Verify => StepReport::Verify(self.verifier.verify(store)),
            MaintenanceStep::Age => StepReport::Age(
                self.retention
                    .cleanup_older_than(store, self.policy.cleanup_days),
            ),
            MaintenanceStep::Capacity => StepReport::Capacity(
                self.retention
                    .enforce_storage_limit(store, self.policy.max_storage_mb),
            ),
            MaintenanceStep::Compress => StepReport::Compress(
                self.compression
                    .compress_older_than(store, self.policy.compression_days),
            ),
        }
    }
}
