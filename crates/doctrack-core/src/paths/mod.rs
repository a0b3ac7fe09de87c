//! Directory helpers for the tracking layout.
//!
//! The tracking file, its backups directory and the download directory are
//! plain paths handed in by the caller; this module only derives defaults and
//! makes sure directories exist before they are written to.

mod ensure;
mod error;

use std::path::{Path, PathBuf};

pub use ensure::{ensure_directory, verify_writable};
pub use error::PathError;

/// Name of the backups directory created next to the tracking file.
pub const BACKUPS_DIR_NAME: &str = "backups";

/// Default backups location: a `backups/` directory beside the tracking file.
pub fn default_backups_dir(tracking_file: &Path) -> PathBuf {
    tracking_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from(BACKUPS_DIR_NAME), |p| p.join(BACKUPS_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backups_dir_sits_beside_tracking_file() {
        assert_eq!(
            default_backups_dir(Path::new("/var/lib/doctrack/tracking.json")),
            PathBuf::from("/var/lib/doctrack/backups")
        );
    }

    #[test]
    fn bare_filename_uses_relative_backups_dir() {
        assert_eq!(
            default_backups_dir(Path::new("tracking.json")),
            PathBuf::from("backups")
        );
    }
}
