//! Sync plan construction.
//!
//! Aggregates matcher and resolver output into the four disjoint batches.
//! Absence on one side means "new there", never "deleted here": the plan
//! only ever creates and updates; deletion is an explicit operation
//! outside sync.

use serde::Serialize;

use crate::model::{CanonicalRecord, UpdateInstruction};

use super::resolve::Disposition;

/// The four batches of one sync run. Owned by the run, discarded after
/// execution.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SyncPlan {
    /// Docs-only records to create on the list side.
    pub create_on_list: Vec<CanonicalRecord>,
    /// Updates for list records that lost a newer-wins comparison.
    pub update_on_list: Vec<UpdateInstruction>,
    /// List-only records to create on the docs side.
    pub create_on_docs: Vec<CanonicalRecord>,
    /// Updates for docs records that lost a newer-wins comparison.
    pub update_on_docs: Vec<UpdateInstruction>,
}

impl SyncPlan {
    /// Total instructions across all four batches.
    #[must_use]
    pub fn total(&self) -> usize {
        self.create_on_list.len()
            + self.update_on_list.len()
            + self.create_on_docs.len()
            + self.update_on_docs.len()
    }

    /// True when the run has nothing to apply.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Build the plan from one-sided records and resolved dispositions.
///
/// The batches are independent: creates and updates target disjoint
/// record sets within a run, so no ordering between them is required.
#[must_use]
pub fn build(
    only_list: Vec<CanonicalRecord>,
    only_docs: Vec<CanonicalRecord>,
    dispositions: Vec<Disposition>,
) -> SyncPlan {
    let mut plan = SyncPlan {
        create_on_list: only_docs,
        create_on_docs: only_list,
        ..SyncPlan::default()
    };

    for disposition in dispositions {
        match disposition {
            Disposition::NewerOnList(instr) => plan.update_on_docs.push(instr),
            Disposition::NewerOnDocs(instr) => plan.update_on_list.push(instr),
            Disposition::Unchanged | Disposition::Tie => {}
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NaturalKey;
    use serde_json::json;

    fn record(key: &str) -> CanonicalRecord {
        CanonicalRecord {
            key: NaturalKey::new(vec![key.to_string()]),
            modified_at: None,
            source_id: Some(format!("id-{key}")),
            fields: [("notes".to_string(), json!(key))].into(),
        }
    }

    fn instruction(id: &str) -> UpdateInstruction {
        UpdateInstruction {
            source_id: id.to_string(),
            key: NaturalKey::new(vec!["k".to_string()]),
            fields: [("notes".to_string(), json!("v"))].into(),
            modified_at: None,
        }
    }

    #[test]
    fn test_one_sided_records_propagate() {
        let plan = build(vec![record("X")], Vec::new(), Vec::new());

        assert_eq!(plan.create_on_docs.len(), 1);
        assert_eq!(plan.create_on_docs[0].key.to_string(), "X");
        assert!(plan.create_on_list.is_empty());
        assert!(plan.update_on_list.is_empty());
        assert!(plan.update_on_docs.is_empty());
    }

    #[test]
    fn test_dispositions_route_to_opposite_side() {
        let plan = build(
            Vec::new(),
            Vec::new(),
            vec![
                Disposition::NewerOnList(instruction("docs-1")),
                Disposition::NewerOnDocs(instruction("list-1")),
                Disposition::Unchanged,
                Disposition::Tie,
            ],
        );

        assert_eq!(plan.update_on_docs.len(), 1);
        assert_eq!(plan.update_on_docs[0].source_id, "docs-1");
        assert_eq!(plan.update_on_list.len(), 1);
        assert_eq!(plan.update_on_list[0].source_id, "list-1");
        assert_eq!(plan.total(), 2);
    }

    #[test]
    fn test_unchanged_and_tie_produce_empty_plan() {
        let plan = build(
            Vec::new(),
            Vec::new(),
            vec![Disposition::Unchanged, Disposition::Tie, Disposition::Unchanged],
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn test_never_infers_deletion() {
        // A record existing only on docs is created on list; nothing is
        // ever removed from either side.
        let plan = build(Vec::new(), vec![record("orphan")], Vec::new());
        assert_eq!(plan.create_on_list.len(), 1);
        assert_eq!(plan.total(), 1);
    }
}
