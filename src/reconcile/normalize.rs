//! Record normalization.
//!
//! Each backend hands back records in its own native shape. The normalizer
//! lifts them into [`CanonicalRecord`] using the side's [`FieldMap`]:
//! which fields form the natural key, which carries the last-modified
//! timestamp, which is the backend's own id, and how payload names map.
//! The reverse direction (`denormalize*`) builds native payloads for
//! creates and updates headed back to a backend.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::config::FieldMap;
use crate::error::{Error, Result};
use crate::model::{CanonicalRecord, NaturalKey, RawRecord, Side, UpdateInstruction};
use crate::report::{Anomaly, AnomalyKind};

/// Normalize one raw record.
///
/// # Errors
///
/// Returns `Error::MalformedRecord` if any natural-key field is missing or
/// empty. A missing or unparseable timestamp is not an error; it degrades
/// to "oldest possible".
pub fn normalize(raw: &RawRecord, map: &FieldMap, side: Side) -> Result<CanonicalRecord> {
    let mut parts = Vec::with_capacity(map.key.len());
    for field in &map.key {
        let part = raw
            .get(field)
            .and_then(scalar_to_string)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::MalformedRecord {
                side,
                detail: format!("missing natural-key field '{field}'"),
            })?;
        parts.push(part);
    }

    let modified_at = raw.get(&map.modified).and_then(|v| {
        let parsed = parse_timestamp(v);
        if parsed.is_none() {
            debug!(side = %side, field = %map.modified, "unparseable timestamp, treating as oldest");
        }
        parsed
    });

    let source_id = raw.get(&map.id).and_then(scalar_to_string);

    let mut fields = BTreeMap::new();
    for (native, value) in raw {
        if map.is_bookkeeping(native) {
            continue;
        }
        fields.insert(map.canonical_name(native).to_string(), value.clone());
    }

    Ok(CanonicalRecord {
        key: NaturalKey::new(parts),
        modified_at,
        source_id,
        fields,
    })
}

/// Normalize a fetched collection, excluding malformed records.
///
/// Malformed records are reported as anomalies, never silently dropped.
#[must_use]
pub fn normalize_all(
    raws: &[RawRecord],
    map: &FieldMap,
    side: Side,
) -> (Vec<CanonicalRecord>, Vec<Anomaly>) {
    let mut records = Vec::with_capacity(raws.len());
    let mut anomalies = Vec::new();

    for raw in raws {
        match normalize(raw, map, side) {
            Ok(record) => records.push(record),
            Err(e) => anomalies.push(Anomaly {
                kind: AnomalyKind::MalformedRecord,
                side: Some(side),
                key: None,
                detail: e.to_string(),
            }),
        }
    }

    (records, anomalies)
}

/// Build a native create payload for the target side.
///
/// Key fields and the modified timestamp are written under the target's
/// native names. The record's `source_id` belongs to the *other* backend
/// and never crosses over.
#[must_use]
pub fn denormalize(record: &CanonicalRecord, map: &FieldMap) -> RawRecord {
    let mut raw = RawRecord::new();
    for (field, part) in map.key.iter().zip(&record.key.0) {
        raw.insert(field.clone(), Value::String(part.clone()));
    }
    if let Some(ts) = record.modified_at {
        raw.insert(map.modified.clone(), Value::String(ts.to_rfc3339()));
    }
    for (canonical, value) in &record.fields {
        raw.insert(map.native_name(canonical).to_string(), value.clone());
    }
    raw
}

/// Build a native update payload: the target backend's id plus the fields
/// to write.
#[must_use]
pub fn denormalize_update(instr: &UpdateInstruction, map: &FieldMap) -> RawRecord {
    let mut raw = RawRecord::new();
    raw.insert(map.id.clone(), Value::String(instr.source_id.clone()));
    if let Some(ts) = instr.modified_at {
        raw.insert(map.modified.clone(), Value::String(ts.to_rfc3339()));
    }
    for (canonical, value) in &instr.fields {
        raw.insert(map.native_name(canonical).to_string(), value.clone());
    }
    raw
}

/// Render a scalar JSON value as a string. Objects and arrays do not make
/// natural-key or id material.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Parse a timestamp value: RFC 3339 strings or Unix epoch numbers
/// (seconds, or milliseconds when the magnitude says so).
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => {
            let epoch = n.as_i64()?;
            if epoch.abs() >= 100_000_000_000 {
                DateTime::from_timestamp_millis(epoch)
            } else {
                DateTime::from_timestamp(epoch, 0)
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(pairs: &[(&str, Value)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn list_map() -> FieldMap {
        let mut map = FieldMap::list_default();
        map.rename.insert("notes".to_string(), "Notes".to_string());
        map
    }

    #[test]
    fn test_normalize_list_record() {
        let record = normalize(
            &raw(&[
                ("ID", json!("11")),
                ("Title", json!("Belest")),
                ("Modified", json!("2024-03-01T10:00:00Z")),
                ("Notes", json!("first pass")),
            ]),
            &list_map(),
            Side::List,
        )
        .unwrap();

        assert_eq!(record.key.to_string(), "Belest");
        assert_eq!(record.source_id.as_deref(), Some("11"));
        assert!(record.modified_at.is_some());
        // Payload is canonical: renamed, without key/bookkeeping fields.
        assert_eq!(record.fields.get("notes"), Some(&json!("first pass")));
        assert!(!record.fields.contains_key("Notes"));
        assert!(!record.fields.contains_key("Title"));
        assert!(!record.fields.contains_key("ID"));
    }

    #[test]
    fn test_normalize_numeric_id_and_epoch() {
        let record = normalize(
            &raw(&[
                ("ID", json!(12)),
                ("Title", json!("Update 4")),
                ("Modified", json!(1_709_287_200)),
            ]),
            &FieldMap::list_default(),
            Side::List,
        )
        .unwrap();

        assert_eq!(record.source_id.as_deref(), Some("12"));
        assert!(record.modified_at.is_some());
    }

    #[test]
    fn test_normalize_missing_key_is_malformed() {
        let err = normalize(
            &raw(&[("ID", json!("9")), ("Notes", json!("orphan"))]),
            &FieldMap::list_default(),
            Side::List,
        )
        .unwrap_err();

        assert!(matches!(err, Error::MalformedRecord { side: Side::List, .. }));
    }

    #[test]
    fn test_normalize_all_reports_and_continues() {
        let raws = vec![
            raw(&[("Title", json!("Bingo"))]),
            raw(&[("Notes", json!("no key"))]),
            raw(&[("Title", json!("Expertise"))]),
        ];

        let (records, anomalies) = normalize_all(&raws, &FieldMap::list_default(), Side::List);

        assert_eq!(records.len(), 2);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].kind, AnomalyKind::MalformedRecord);
    }

    #[test]
    fn test_unparseable_timestamp_degrades_to_none() {
        let record = normalize(
            &raw(&[("Title", json!("Bingo")), ("Modified", json!("yesterday"))]),
            &FieldMap::list_default(),
            Side::List,
        )
        .unwrap();
        assert!(record.modified_at.is_none());
    }

    #[test]
    fn test_denormalize_create_excludes_foreign_id() {
        let record = normalize(
            &raw(&[
                ("ID", json!("11")),
                ("Title", json!("Belest")),
                ("Modified", json!("2024-03-01T10:00:00Z")),
                ("Notes", json!("first pass")),
            ]),
            &list_map(),
            Side::List,
        )
        .unwrap();

        let docs_payload = denormalize(&record, &FieldMap::docs_default());

        assert_eq!(docs_payload.get("title"), Some(&json!("Belest")));
        assert_eq!(docs_payload.get("notes"), Some(&json!("first pass")));
        assert!(docs_payload.contains_key("updatedAt"));
        // The list-side ID must not leak into the docs store.
        assert!(!docs_payload.contains_key("_id"));
        assert!(!docs_payload.contains_key("ID"));
    }

    #[test]
    fn test_denormalize_update_targets_native_id() {
        let instr = UpdateInstruction {
            source_id: "6613a".to_string(),
            key: NaturalKey::new(vec!["Belest".to_string()]),
            fields: [("notes".to_string(), json!("second pass"))].into(),
            modified_at: None,
        };

        let payload = denormalize_update(&instr, &FieldMap::docs_default());

        assert_eq!(payload.get("_id"), Some(&json!("6613a")));
        assert_eq!(payload.get("notes"), Some(&json!("second pass")));
    }

    #[test]
    fn test_roundtrip_through_both_mappings() {
        // list native -> canonical -> docs native -> canonical again
        let canonical = normalize(
            &raw(&[
                ("Title", json!("Bingo")),
                ("Modified", json!("2024-03-01T10:00:00Z")),
                ("Notes", json!("n1")),
            ]),
            &list_map(),
            Side::List,
        )
        .unwrap();

        let docs_raw = denormalize(&canonical, &FieldMap::docs_default());
        let back = normalize(&docs_raw, &FieldMap::docs_default(), Side::Docs).unwrap();

        assert_eq!(back.key, canonical.key);
        assert_eq!(back.fields, canonical.fields);
        assert_eq!(back.modified_at, canonical.modified_at);
    }
}
