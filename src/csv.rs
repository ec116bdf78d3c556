//! CSV import/export of canonical records.
//!
//! A thin collaborator around the core: export renders a sequence of
//! [`CanonicalRecord`] to CSV, import parses one back. Fixed leading
//! columns (`key`, `modified_at`, `source_id`) followed by the union of
//! payload field names, sorted. Multi-part keys join with `|`.
//!
//! Cell values that parse as JSON come back typed (numbers, booleans);
//! everything else imports as a string.

use std::collections::BTreeSet;
use std::io::{BufRead, Write};

use chrono::DateTime;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{CanonicalRecord, NaturalKey};

/// Escape a value for CSV output (wrap in quotes if it contains commas,
/// quotes, or newlines).
#[must_use]
pub fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Write records as CSV.
///
/// # Errors
///
/// Returns an error on write failure.
pub fn write_records(records: &[CanonicalRecord], out: &mut impl Write) -> Result<()> {
    let columns: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.fields.keys().map(String::as_str))
        .collect();

    let mut header = vec!["key", "modified_at", "source_id"];
    header.extend(&columns);
    writeln!(out, "{}", header.join(","))?;

    for record in records {
        let mut cells = vec![
            csv_escape(&record.key.to_string()),
            record
                .modified_at
                .map(|ts| ts.to_rfc3339())
                .unwrap_or_default(),
            csv_escape(record.source_id.as_deref().unwrap_or_default()),
        ];
        for column in &columns {
            let cell = record.fields.get(*column).map_or(String::new(), cell_text);
            cells.push(csv_escape(&cell));
        }
        writeln!(out, "{}", cells.join(","))?;
    }

    Ok(())
}

/// Read records from CSV produced by [`write_records`] (or compatible).
///
/// # Errors
///
/// Returns `Error::InvalidArgument` on a missing/invalid header or a row
/// with the wrong cell count.
pub fn read_records(input: &mut impl BufRead) -> Result<Vec<CanonicalRecord>> {
    let mut lines = input.lines();
    let header_line = lines
        .next()
        .transpose()?
        .ok_or_else(|| Error::InvalidArgument("CSV input is empty".to_string()))?;
    let header = split_line(&header_line);

    let key_col = column_index(&header, "key")?;
    let modified_col = column_index(&header, "modified_at")?;
    let id_col = column_index(&header, "source_id")?;

    let mut records = Vec::new();
    for (i, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let cells = split_line(&line);
        if cells.len() != header.len() {
            return Err(Error::InvalidArgument(format!(
                "CSV line {}: expected {} cells, got {}",
                i + 2,
                header.len(),
                cells.len()
            )));
        }

        let key_cell = &cells[key_col];
        if key_cell.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "CSV line {}: empty key",
                i + 2
            )));
        }
        let key = NaturalKey::new(key_cell.split('|').map(str::to_string).collect());

        let modified_at = if cells[modified_col].is_empty() {
            None
        } else {
            Some(
                DateTime::parse_from_rfc3339(&cells[modified_col])
                    .map_err(|e| {
                        Error::InvalidArgument(format!("CSV line {}: bad timestamp: {e}", i + 2))
                    })?
                    .to_utc(),
            )
        };

        let source_id = if cells[id_col].is_empty() {
            None
        } else {
            Some(cells[id_col].clone())
        };

        let mut fields = std::collections::BTreeMap::new();
        for (column, cell) in header.iter().zip(&cells) {
            if matches!(column.as_str(), "key" | "modified_at" | "source_id") || cell.is_empty() {
                continue;
            }
            fields.insert(column.clone(), cell_value(cell));
        }

        records.push(CanonicalRecord {
            key,
            modified_at,
            source_id,
            fields,
        });
    }

    Ok(records)
}

fn column_index(header: &[String], name: &str) -> Result<usize> {
    header
        .iter()
        .position(|c| c == name)
        .ok_or_else(|| Error::InvalidArgument(format!("CSV header missing '{name}' column")))
}

/// Render a payload value as cell text: strings raw, everything else as
/// JSON.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse a cell back into a payload value.
fn cell_value(cell: &str) -> Value {
    serde_json::from_str(cell).unwrap_or_else(|_| Value::String(cell.to_string()))
}

/// Split one CSV line, honoring double-quote escaping.
fn split_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => cells.push(std::mem::take(&mut current)),
                _ => current.push(c),
            }
        }
    }
    cells.push(current);
    cells
}
