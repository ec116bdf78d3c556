//! Sync command implementation.
//!
//! Runs one full reconciliation: fetch both backends, build the plan,
//! apply the four batches (unless `--dry-run`), persist the run report.

use colored::Colorize;

use crate::config::{sharesync_dir, Config};
use crate::error::Result;
use crate::report::{BatchOutcome, RunReport};

use super::backends;

/// Execute the sync command.
pub fn execute(config: &Config, dry_run: bool, json: bool) -> Result<()> {
    let (list, docs) = backends(config);
    let rt = super::runtime()?;

    let report = rt.block_on(crate::reconcile::run(config, &list, &docs, dry_run))?;

    if !dry_run {
        if let Some(dir) = sharesync_dir() {
            report.save(&dir.join("reports"))?;
        }
    }

    if json {
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

/// Print a run report in human-readable form.
pub fn print_report(report: &RunReport) {
    if report.dry_run {
        println!("{}", "Sync Plan (dry run)".bold().underline());
    } else {
        println!("{}", "Sync Complete".bold().underline());
    }
    println!();

    println!("{}", "Fetched:".blue().bold());
    println!("  List: {} records", report.fetched_list);
    println!("  Docs: {} records", report.fetched_docs);
    println!();

    println!("{}", "Reconciliation:".blue().bold());
    println!("  Matched:   {}", report.matched);
    println!("  Only list: {}", report.only_list);
    println!("  Only docs: {}", report.only_docs);
    if report.matched > 0 {
        println!(
            "  Dispositions: {} unchanged, {} newer on list, {} newer on docs, {} ties",
            report.unchanged, report.newer_on_list, report.newer_on_docs, report.ties
        );
    }
    println!();

    if report.planned() == 0 {
        println!("{}", "Both sides already agree; nothing to apply.".green());
    } else {
        let heading = if report.dry_run { "Planned:" } else { "Applied:" };
        println!("{}", heading.blue().bold());
        for batch in &report.batches {
            print_batch(batch, report.dry_run);
        }
    }

    if !report.anomalies.is_empty() {
        println!();
        println!("{}", "Anomalies:".yellow().bold());
        for anomaly in &report.anomalies {
            let location = match (&anomaly.side, &anomaly.key) {
                (Some(side), Some(key)) => format!(" [{side}: {key}]"),
                (Some(side), None) => format!(" [{side}]"),
                (None, Some(key)) => format!(" [{key}]"),
                (None, None) => String::new(),
            };
            println!("  {}{}: {}", anomaly.kind, location.dimmed(), anomaly.detail);
        }
        println!();
        println!("{}", "Anomalies never stop the run; review and re-sync.".dimmed());
    }
}

fn print_batch(batch: &BatchOutcome, dry_run: bool) {
    if batch.attempted == 0 {
        return;
    }
    let label = format!("{} on {}", batch.kind, batch.side);
    if dry_run {
        println!("  {label}: {} records", batch.attempted);
    } else if let Some(error) = &batch.error {
        println!(
            "  {label}: {} ({} records: {})",
            "FAILED".red().bold(),
            batch.attempted,
            error
        );
        if !batch.failed_keys.is_empty() {
            println!("    keys: {}", batch.failed_keys.join(", ").dimmed());
        }
    } else {
        println!("  {label}: {} of {} applied", batch.applied, batch.attempted);
    }
}
