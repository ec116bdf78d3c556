//! Key matching across the two sides.
//!
//! Pairs records that represent the same logical entity by natural key.
//! O(n+m): each side is deduplicated once, the docs side is indexed by
//! key, and the list side is scanned against that index. Every input
//! record lands in exactly one of matched / only-list / only-docs.

use std::collections::HashMap;

use crate::model::{CanonicalRecord, MatchedPair, NaturalKey, Side};
use crate::report::{Anomaly, AnomalyKind};

/// Everything the matcher produces for one run.
#[derive(Debug, Default)]
pub struct MatchOutcome {
    pub matched: Vec<MatchedPair>,
    pub only_list: Vec<CanonicalRecord>,
    pub only_docs: Vec<CanonicalRecord>,
    /// Duplicate-key anomalies from either side.
    pub anomalies: Vec<Anomaly>,
}

/// Match the two fetched collections by natural key.
#[must_use]
pub fn match_records(
    list: Vec<CanonicalRecord>,
    docs: Vec<CanonicalRecord>,
) -> MatchOutcome {
    let mut anomalies = Vec::new();
    let list = dedup_last_wins(list, Side::List, &mut anomalies);
    let docs = dedup_last_wins(docs, Side::Docs, &mut anomalies);

    // Index the docs side by key, then scan the list side once.
    let mut docs_index: HashMap<NaturalKey, usize> = HashMap::with_capacity(docs.len());
    for (i, record) in docs.iter().enumerate() {
        docs_index.insert(record.key.clone(), i);
    }

    let mut matched = Vec::new();
    let mut only_list = Vec::new();
    let mut consumed = vec![false; docs.len()];

    for record in list {
        if let Some(&i) = docs_index.get(&record.key) {
            consumed[i] = true;
            matched.push(MatchedPair {
                list: record,
                docs: docs[i].clone(),
            });
        } else {
            only_list.push(record);
        }
    }

    let only_docs = docs
        .into_iter()
        .zip(&consumed)
        .filter_map(|(record, &used)| (!used).then_some(record))
        .collect();

    MatchOutcome {
        matched,
        only_list,
        only_docs,
        anomalies,
    }
}

/// Collapse duplicate keys within one side.
///
/// Duplicates violate the per-side uniqueness invariant; the last-seen
/// record wins its slot and each displaced earlier record is reported.
fn dedup_last_wins(
    records: Vec<CanonicalRecord>,
    side: Side,
    anomalies: &mut Vec<Anomaly>,
) -> Vec<CanonicalRecord> {
    let mut out: Vec<CanonicalRecord> = Vec::with_capacity(records.len());
    let mut index: HashMap<NaturalKey, usize> = HashMap::with_capacity(records.len());

    for record in records {
        match index.get(&record.key) {
            Some(&i) => {
                anomalies.push(Anomaly {
                    kind: AnomalyKind::DuplicateKey,
                    side: Some(side),
                    key: Some(record.key.to_string()),
                    detail: format!(
                        "duplicate natural key on {side}; keeping the last-seen record"
                    ),
                });
                out[i] = record;
            }
            None => {
                index.insert(record.key.clone(), out.len());
                out.push(record);
            }
        }
    }

    out
}
