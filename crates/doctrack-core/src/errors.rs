//! Error taxonomy for the tracking subsystem.
//!
//! Only [`TrackingError::Persistence`] is meant to abort a run. The other
//! variants are recovered close to where they happen (duplicates are reported
//! as `false`, per-record I/O failures are counted in operation outcomes).

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::RecordIdError;

/// Errors raised by the record store and its adapters.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// The identifier is already tracked.
    #[error("Already tracked: {0}")]
    DuplicateRecord(String),

    /// No record with this identifier.
    #[error("Not tracked: {0}")]
    NotFound(String),

    /// The identifier failed validation.
    #[error("Invalid identifier {id:?}: {source}")]
    InvalidId {
        id: String,
        #[source]
        source: RecordIdError,
    },

    /// The tracking file could not be written or replaced.
    #[error("Failed to persist tracking file {path}: {reason}")]
    Persistence { path: PathBuf, reason: String },

    /// A filesystem operation on a tracked artifact or the tracking file failed.
    #[error("I/O error on {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    /// The store could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TrackingError {
    /// Build an [`TrackingError::Io`] from a `std::io::Error`.
    pub fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    /// Build a [`TrackingError::Persistence`] from anything displayable.
    pub fn persistence(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Persistence {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error should abort the overall run.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Persistence { .. } | Self::Serialization(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_persistence_failures_are_fatal() {
        assert!(TrackingError::persistence("/x", "disk full").is_fatal());
        assert!(!TrackingError::DuplicateRecord("a".into()).is_fatal());
        assert!(!TrackingError::NotFound("a".into()).is_fatal());
    }

    #[test]
    fn invalid_id_message_names_the_id() {
        let err = TrackingError::InvalidId {
            id: "nope".into(),
            source: RecordIdError::WrongSegmentCount(1),
        };
        assert!(err.to_string().contains("\"nope\""));
    }
}
