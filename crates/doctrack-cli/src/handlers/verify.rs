//! Verify command handler.

use anyhow::Result;
use doctrack_store::IntegrityReport;

use crate::bootstrap::CliContext;
use crate::presentation::print_id_list;

const LISTED_IDS: usize = 20;

/// Execute the verify command. Returns the report so `main` can pick the
/// exit status.
pub fn execute(ctx: &CliContext) -> Result<IntegrityReport> {
    let store = ctx.load_store()?;
    let report = ctx.verifier.verify(&store);

    println!("Checked {} record(s)", report.checked);
    println!("  verified:               {}", report.verified.len());
    println!("  missing:                {}", report.missing.len());
    println!("  corrupted:              {}", report.corrupted.len());
    println!("  compressed (unchecked): {}", report.unverifiable_compressed.len());
    println!("  no checksum:            {}", report.no_checksum.len());
    println!("  unreadable:             {}", report.unreadable.len());

    print_id_list("Missing", &report.missing, LISTED_IDS);
    print_id_list("Corrupted", &report.corrupted, LISTED_IDS);
    print_id_list("Unreadable", &report.unreadable, LISTED_IDS);

    Ok(report)
}
