//! Port definitions (trait abstractions) for the engines' collaborators.
//!
//! Engines receive these as constructor arguments; nothing here holds
//! global state.
//!
//! # Design Rules
//!
//! - No compression-library types in any signature
//! - Ports are synchronous; every tracking operation is blocking

use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};

/// Source of the current time for age arithmetic.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Rewrites one artifact into a compressed sibling.
///
/// Implementations write `destination` in full and leave `source` alone;
/// the caller decides when the source may be removed.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
pub trait ArtifactCompressor: Send + Sync {
    /// Suffix appended to the original path, including the dot (e.g. `.gz`).
    fn suffix(&self) -> &'static str;

    /// Compress `source` into `destination`.
    fn compress(&self, source: &Path, destination: &Path) -> io::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_is_frozen() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let clock = FixedClock(at);
        assert_eq!(clock.now(), at);
        assert_eq!(clock.now(), at);
    }

    #[test]
    fn mock_compressor_reports_configured_suffix() {
        let mut compressor = MockArtifactCompressor::new();
        compressor.expect_suffix().return_const(".gz");
        assert_eq!(compressor.suffix(), ".gz");
    }
}
