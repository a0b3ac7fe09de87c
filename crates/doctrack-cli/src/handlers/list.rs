//! List command handler.
//!
//! Displays tracked records in a formatted table.

use anyhow::Result;
use doctrack_core::bytes_to_mb;

use crate::bootstrap::CliContext;
use crate::presentation::{format_timestamp, print_separator, truncate_string};

/// Execute the list command.
pub fn execute(ctx: &CliContext) -> Result<()> {
    let store = ctx.load_store()?;

    if store.is_empty() {
        println!("No tracked downloads.");
        println!("Use 'doctrack add <id> <file>' to track one.");
        return Ok(());
    }

    println!("Tracking {} download(s):\n", store.len());
    println!(
        "{:<24} {:<17} {:>10} {:<4} Filename",
        "ID", "Downloaded", "Size (MB)", "Gz"
    );
    print_separator(80);

    for record in store.records() {
        println!(
            "{:<24} {:<17} {:>10.2} {:<4} {}",
            truncate_string(record.id().as_str(), 24),
            format_timestamp(Some(record.downloaded_at()), "--"),
            bytes_to_mb(record.file_size()),
            if record.is_compressed() { "yes" } else { "no" },
            truncate_string(record.filename(), 40),
        );
    }
    Ok(())
}
