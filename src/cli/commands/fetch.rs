//! Fetch command implementation.
//!
//! Fetches one backend, normalizes, and prints the canonical records in
//! the selected output format. Malformed records are listed after the
//! table rather than silently dropped.

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::error::Result;
use crate::model::{CanonicalRecord, Side};
use crate::report::Anomaly;

use super::fetch_side;

/// Execute the fetch command.
pub fn execute(config: &Config, side: Side, format: OutputFormat, json: bool) -> Result<()> {
    let (records, anomalies) = fetch_side(config, side)?;

    if json || format == OutputFormat::Json {
        let output = serde_json::json!({
            "side": side,
            "records": records,
            "anomalies": anomalies,
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    if format == OutputFormat::Csv {
        let mut stdout = std::io::stdout();
        crate::csv::write_records(&records, &mut stdout)?;
    } else {
        print_table(side, &records);
    }

    print_anomalies(&anomalies);
    Ok(())
}

fn print_table(side: Side, records: &[CanonicalRecord]) {
    println!("{} records on {side}:", records.len());
    for record in records {
        let modified = record
            .modified_at
            .map_or_else(|| "-".to_string(), |ts| ts.to_rfc3339());
        let id = record.source_id.as_deref().unwrap_or("-");
        println!("  {}  {}  {}", record.key, modified, id);
    }
}

fn print_anomalies(anomalies: &[Anomaly]) {
    if anomalies.is_empty() {
        return;
    }
    eprintln!();
    eprintln!("{} record(s) excluded:", anomalies.len());
    for anomaly in anomalies {
        eprintln!("  {}: {}", anomaly.kind, anomaly.detail);
    }
}
