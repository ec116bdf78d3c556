//! Report command implementation.
//!
//! Shows the most recent persisted sync run.

use colored::Colorize;

use crate::config::sharesync_dir;
use crate::error::{Error, Result};
use crate::report::RunReport;

/// Execute the report command.
pub fn execute(json: bool) -> Result<()> {
    let dir = sharesync_dir()
        .ok_or_else(|| Error::Config("could not resolve home directory".to_string()))?;
    let report = RunReport::load_last(&dir.join("reports"))?;

    if json {
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    println!("{}", "Last Sync Run".bold().underline());
    println!();
    println!("  Run:      {}", report.id);
    println!("  Started:  {}", report.started_at.to_rfc3339());
    println!("  Finished: {}", report.finished_at.to_rfc3339());
    println!();

    super::sync::print_report(&report);

    if !report.all_batches_succeeded() {
        println!();
        println!(
            "{}",
            "One or more batches failed; re-running `ssync sync` is safe.".yellow()
        );
    }

    Ok(())
}
