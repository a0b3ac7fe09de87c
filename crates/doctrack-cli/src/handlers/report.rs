//! Report command handler.

use anyhow::Result;
use doctrack_store::SummaryReport;

use crate::bootstrap::CliContext;

/// Execute the report command: print the summary as pretty JSON.
pub fn execute(ctx: &CliContext) -> Result<()> {
    let store = ctx.load_store()?;
    let report = SummaryReport::build(
        &store,
        &ctx.verifier,
        ctx.persistence.tracking_file(),
        &ctx.settings.download_dir,
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
