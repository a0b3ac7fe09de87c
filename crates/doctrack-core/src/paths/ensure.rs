//! Directory creation and verification utilities.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use super::error::PathError;

/// Create `path` (and its parents) if missing, then check it is writable.
pub fn ensure_directory(path: &Path) -> Result<(), PathError> {
    if path.exists() {
        if !path.is_dir() {
            return Err(PathError::NotADirectory(path.to_path_buf()));
        }
    } else {
        fs::create_dir_all(path).map_err(|e| PathError::CreateFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "Created directory");
    }

    verify_writable(path)
}

/// Verify a directory is writable by creating and removing a probe file.
pub fn verify_writable(path: &Path) -> Result<(), PathError> {
    let probe = path.join(".doctrack_write_test");
    let not_writable = |err: std::io::Error| PathError::NotWritable {
        path: path.to_path_buf(),
        reason: err.to_string(),
    };

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&probe)
        .map_err(not_writable)?;
    file.write_all(b"probe").map_err(not_writable)?;
    drop(file);
    let _ = fs::remove_file(&probe);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn creates_nested_directories() {
        let root = tempdir().unwrap();
        let nested = root.path().join("a/b/c");
        ensure_directory(&nested).unwrap();
        assert!(nested.is_dir());
        assert!(!nested.join(".doctrack_write_test").exists());
    }

    #[test]
    fn existing_directory_is_accepted() {
        let root = tempdir().unwrap();
        ensure_directory(root.path()).unwrap();
        assert!(root.path().is_dir());
    }

    #[test]
    fn file_in_place_of_directory_is_rejected() {
        let root = tempdir().unwrap();
        let file = root.path().join("file");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(
            ensure_directory(&file),
            Err(PathError::NotADirectory(_))
        ));
    }
}
