//! Add command handler.
//!
//! Registers a completed download and saves the store.

use std::path::Path;

use anyhow::Result;
use doctrack_store::register_download;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Execute the add command. Returns whether the record was newly tracked.
pub fn execute(ctx: &CliContext, id: &str, file: &Path, filename: Option<&str>) -> Result<bool> {
    let display_name = filename
        .map(str::to_string)
        .or_else(|| file.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| format!("{id}.pdf"));

    let mut store = ctx.load_store()?;
    let added = register_download(&mut store, ctx.clock.as_ref(), id, &display_name, file)
        .map_err(CliError::from)?;

    if added {
        ctx.save_store(&store)?;
        println!("Tracked {id} ({})", file.display());
    } else {
        println!("{id} is already tracked");
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::bootstrap;
    use doctrack_core::TrackerSettings;

    #[test]
    fn test_add_persists_and_detects_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.pdf");
        std::fs::write(&file, b"pdf").unwrap();
        let ctx = bootstrap(TrackerSettings {
            tracking_file: dir.path().join("tracking.json"),
            download_dir: dir.path().join("downloads"),
            ..Default::default()
        })
        .unwrap();

        assert!(execute(&ctx, "20250301-1-2025-1", &file, None).unwrap());
        assert!(!execute(&ctx, "20250301-1-2025-1", &file, None).unwrap());

        let store = ctx.load_store().unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("20250301-1-2025-1").unwrap().filename(), "doc.pdf");
    }
}
