//! Conflict resolution for matched pairs.
//!
//! Pure comparison, no side effects. "Most recently modified wins": the
//! newer side's payload becomes an update instruction against the other
//! side's record id. Equal payloads are unchanged regardless of
//! timestamps, which is what makes a re-run of a successful sync converge
//! to an empty plan.

use crate::model::{MatchedPair, UpdateInstruction};

use super::hash::payload_hash;

/// The resolver's verdict for one matched pair.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// Payloads are field-for-field equal (ignoring bookkeeping); nothing
    /// to do.
    Unchanged,
    /// The list side is strictly newer; carries the update for the docs
    /// record.
    NewerOnList(UpdateInstruction),
    /// The docs side is strictly newer; carries the update for the list
    /// record.
    NewerOnDocs(UpdateInstruction),
    /// Equal timestamps, differing payloads. No mutation is planned and
    /// the pair is flagged for manual review; callers needing a
    /// different tie-break must override this policy explicitly.
    Tie,
}

impl Disposition {
    /// Whether this disposition contributes a plan entry.
    #[must_use]
    pub const fn is_actionable(&self) -> bool {
        matches!(self, Self::NewerOnList(_) | Self::NewerOnDocs(_))
    }
}

/// Resolve one matched pair.
///
/// A missing timestamp is "oldest possible" (`None < Some(_)`), so a side
/// without one can never win. Clock skew is not detected; timestamps are
/// trusted as given.
#[must_use]
pub fn resolve(pair: &MatchedPair) -> Disposition {
    if payload_hash(&pair.list.fields) == payload_hash(&pair.docs.fields) {
        return Disposition::Unchanged;
    }

    match pair.list.modified_at.cmp(&pair.docs.modified_at) {
        std::cmp::Ordering::Greater => {
            // Updates target a persisted record, so the loser has an id;
            // the matcher only pairs records fetched from the backends.
            let Some(source_id) = pair.docs.source_id.clone() else {
                return Disposition::Tie;
            };
            Disposition::NewerOnList(UpdateInstruction {
                source_id,
                key: pair.list.key.clone(),
                fields: pair.list.fields.clone(),
                modified_at: pair.list.modified_at,
            })
        }
        std::cmp::Ordering::Less => {
            let Some(source_id) = pair.list.source_id.clone() else {
                return Disposition::Tie;
            };
            Disposition::NewerOnDocs(UpdateInstruction {
                source_id,
                key: pair.docs.key.clone(),
                fields: pair.docs.fields.clone(),
                modified_at: pair.docs.modified_at,
            })
        }
        std::cmp::Ordering::Equal => Disposition::Tie,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CanonicalRecord, NaturalKey};
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn record(id: &str, ts: Option<i64>, notes: &str) -> CanonicalRecord {
        CanonicalRecord {
            key: NaturalKey::new(vec!["Belest".to_string()]),
            modified_at: ts.map(|t| Utc.timestamp_opt(t, 0).unwrap()),
            source_id: Some(id.to_string()),
            fields: [("notes".to_string(), json!(notes))].into(),
        }
    }

    fn pair(list: CanonicalRecord, docs: CanonicalRecord) -> MatchedPair {
        MatchedPair { list, docs }
    }

    #[test]
    fn test_newer_on_list_carries_docs_id_and_list_fields() {
        let p = pair(record("11", Some(10), "from list"), record("6613a", Some(5), "stale"));

        let Disposition::NewerOnList(instr) = resolve(&p) else {
            panic!("expected NewerOnList");
        };
        assert_eq!(instr.source_id, "6613a");
        assert_eq!(instr.fields.get("notes"), Some(&json!("from list")));
        assert_eq!(instr.key.to_string(), "Belest");
    }

    #[test]
    fn test_newer_on_docs_symmetric() {
        let p = pair(record("11", Some(5), "stale"), record("6613a", Some(10), "from docs"));

        let Disposition::NewerOnDocs(instr) = resolve(&p) else {
            panic!("expected NewerOnDocs");
        };
        assert_eq!(instr.source_id, "11");
        assert_eq!(instr.fields.get("notes"), Some(&json!("from docs")));
    }

    #[test]
    fn test_equal_payloads_unchanged_despite_timestamps() {
        // Backends stamp their own clocks on write; equal payloads must
        // not ping-pong updates forever.
        let p = pair(record("11", Some(10), "same"), record("6613a", Some(5), "same"));
        assert_eq!(resolve(&p), Disposition::Unchanged);
    }

    #[test]
    fn test_tie_is_conservative() {
        let p = pair(record("11", Some(7), "mine"), record("6613a", Some(7), "theirs"));
        let d = resolve(&p);
        assert_eq!(d, Disposition::Tie);
        assert!(!d.is_actionable());
    }

    #[test]
    fn test_missing_timestamp_loses() {
        let p = pair(record("11", None, "undated"), record("6613a", Some(1), "dated"));
        assert!(matches!(resolve(&p), Disposition::NewerOnDocs(_)));

        let p = pair(record("11", Some(1), "dated"), record("6613a", None, "undated"));
        assert!(matches!(resolve(&p), Disposition::NewerOnList(_)));
    }

    #[test]
    fn test_both_missing_timestamps_tie() {
        let p = pair(record("11", None, "a"), record("6613a", None, "b"));
        assert_eq!(resolve(&p), Disposition::Tie);
    }

    #[test]
    fn test_empty_vs_nonempty_payload_differs() {
        let mut empty = record("11", Some(10), "x");
        empty.fields = BTreeMap::new();
        let p = pair(empty, record("6613a", Some(5), "x"));
        assert!(matches!(resolve(&p), Disposition::NewerOnList(_)));
    }
}
