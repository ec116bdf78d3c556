//! Import command implementation.
//!
//! Reads canonical records from a CSV file and applies them as a create
//! batch on one backend. Updating existing records goes through `sync`,
//! not import.

use std::io::BufReader;
use std::path::Path;

use crate::backend::Backend;
use crate::config::Config;
use crate::error::Result;
use crate::model::{ApplyKind, Side};
use crate::reconcile::denormalize;

use super::backends;

/// Execute the import command.
pub fn execute(config: &Config, side: Side, input: &Path, json: bool) -> Result<()> {
    let file = std::fs::File::open(input)?;
    let records = crate::csv::read_records(&mut BufReader::new(file))?;

    let mapping = match side {
        Side::List => &config.list.mapping,
        Side::Docs => &config.docs.mapping,
    };
    let payloads = records.iter().map(|r| denormalize(r, mapping)).collect();

    let (list, docs) = backends(config);
    let rt = super::runtime()?;
    let applied = match side {
        Side::List => rt.block_on(list.apply(ApplyKind::Create, payloads))?,
        Side::Docs => rt.block_on(docs.apply(ApplyKind::Create, payloads))?,
    };

    if json {
        let payload = serde_json::json!({
            "success": true,
            "side": side,
            "read": records.len(),
            "applied": applied,
        });
        println!("{}", serde_json::to_string(&payload)?);
    } else {
        println!(
            "Created {applied} of {} records on {side} from {}",
            records.len(),
            input.display()
        );
    }

    Ok(())
}
