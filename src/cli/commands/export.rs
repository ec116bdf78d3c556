//! Export command implementation.
//!
//! Fetches one backend and writes its canonical records to a CSV file.

use std::path::Path;

use crate::config::Config;
use crate::error::Result;
use crate::model::Side;

use super::fetch_side;

/// Execute the export command.
pub fn execute(config: &Config, side: Side, output: &Path, json: bool) -> Result<()> {
    let (records, anomalies) = fetch_side(config, side)?;

    let mut file = std::fs::File::create(output)?;
    crate::csv::write_records(&records, &mut file)?;

    if json {
        let payload = serde_json::json!({
            "success": true,
            "side": side,
            "exported": records.len(),
            "excluded": anomalies.len(),
            "output": output.display().to_string(),
        });
        println!("{}", serde_json::to_string(&payload)?);
    } else {
        println!(
            "Exported {} records from {side} to {}",
            records.len(),
            output.display()
        );
        if !anomalies.is_empty() {
            println!("Excluded {} malformed record(s).", anomalies.len());
        }
    }

    Ok(())
}
