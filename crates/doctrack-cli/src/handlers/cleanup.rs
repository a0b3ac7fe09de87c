//! Cleanup command handler.
//!
//! Runs the requested maintenance steps in order and saves once at the end.

use anyhow::Result;
use doctrack_store::{MaintenanceStep, StepReport, default_plan};

use crate::bootstrap::CliContext;

/// Execute the cleanup command.
///
/// Without explicit `steps` the default plan runs: age, capacity, and
/// compress when compression is enabled.
pub fn execute(ctx: &CliContext, steps: Option<&[MaintenanceStep]>) -> Result<Vec<StepReport>> {
    let plan = steps.map_or_else(
        || default_plan(ctx.settings.compress_old_files),
        <[MaintenanceStep]>::to_vec,
    );

    let mut store = ctx.load_store()?;
    let reports = ctx.maintenance_runner().run(&mut store, &plan);

    for report in &reports {
        print_step(report);
    }

    ctx.save_store(&store)?;
    Ok(reports)
}

fn print_step(report: &StepReport) {
    match report {
        StepReport::Verify(r) => println!(
            "verify:   {} checked, {} missing, {} corrupted",
            r.checked,
            r.missing.len(),
            r.corrupted.len()
        ),
        StepReport::Age(o) | StepReport::Capacity(o) => println!(
            "{:<9} removed {}, freed {:.2} MB{}",
            format!("{}:", report.step()),
            o.removed,
            o.freed_mb,
            failures_suffix(o.failures.len())
        ),
        StepReport::Compress(o) => println!(
            "compress: {} file(s), saved {:.2} MB{}",
            o.compressed,
            o.saved_mb,
            failures_suffix(o.failures.len())
        ),
    }
}

fn failures_suffix(failures: usize) -> String {
    if failures == 0 {
        String::new()
    } else {
        format!(" ({failures} failed)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::bootstrap;
    use doctrack_core::TrackerSettings;

    #[test]
    fn test_cleanup_saves_even_when_nothing_changes() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = bootstrap(TrackerSettings {
            tracking_file: dir.path().join("tracking.json"),
            download_dir: dir.path().join("downloads"),
            ..Default::default()
        })
        .unwrap();

        let reports = execute(&ctx, None).unwrap();

        assert_eq!(reports.len(), 2);
        assert!(dir.path().join("tracking.json").is_file());
        let store = ctx.load_store().unwrap();
        assert!(store.statistics().last_cleanup_at.is_some());
    }
}
