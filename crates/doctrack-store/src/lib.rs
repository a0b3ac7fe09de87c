//! Filesystem adapter for the doctrack tracking subsystem.
//!
//! This crate implements the operations that touch disk:
//!
//! - [`PersistenceManager`] - load/save of the tracking file with atomic
//!   replace, backup rotation, legacy migration and corruption recovery
//! - [`IntegrityVerifier`] - existence and checksum checks per record
//! - [`RetentionEngine`] - age and storage-capacity eviction
//! - [`CompressionEngine`] - gzip rewrite of aged artifacts
//! - [`register_download`] - turns a finished download into a record
//! - [`MaintenanceRunner`] and [`SummaryReport`] - ordered maintenance runs
//!   and the aggregate report
//!
//! Every operation is synchronous. A single process is expected to own the
//! tracking file for the duration of a run.

#![deny(unused_crate_dependencies)]

mod checksum;
pub mod compression;
mod failure;
pub mod integrity;
pub mod maintenance;
pub mod persistence;
mod registration;
mod report;
pub mod retention;

pub use checksum::sha256_file;
pub use compression::{CompressionEngine, CompressionOutcome, GzipCompressor};
pub use failure::RecordFailure;
pub use integrity::{IntegrityReport, IntegrityVerifier, VerificationStatus};
pub use maintenance::{
    MaintenancePolicy, MaintenanceRunner, MaintenanceStep, StepParseError, StepReport,
    default_plan,
};
pub use persistence::{PersistenceManager, PersistenceOptions};
pub use registration::register_download;
pub use report::{IntegritySummary, SummaryReport};
pub use retention::{RetentionEngine, RetentionOutcome};

#[cfg(test)]
use mockall as _;
