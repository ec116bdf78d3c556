//! Plan execution.
//!
//! Applies the four batches through the backend contract. The batches
//! touch disjoint (backend, kind) pairs, so all four run concurrently and
//! a failure in one never blocks the rest. No partial-batch rollback:
//! natural-key matching makes a re-run convergent, so the recovery path
//! for a failed batch is simply running sync again.

use tracing::{debug, warn};

use crate::backend::Backend;
use crate::config::FieldMap;
use crate::model::{ApplyKind, RawRecord, Side};
use crate::report::BatchOutcome;

use super::normalize::{denormalize, denormalize_update};
use super::plan::SyncPlan;

/// A batch shaped for the wire: native payloads plus the natural keys
/// they carry (for failure reporting).
struct PreparedBatch {
    kind: ApplyKind,
    records: Vec<RawRecord>,
    keys: Vec<String>,
}

/// Execute the plan, one outcome per batch, in plan order:
/// create-on-list, update-on-list, create-on-docs, update-on-docs.
pub async fn execute(
    plan: SyncPlan,
    list: &impl Backend,
    docs: &impl Backend,
    list_map: &FieldMap,
    docs_map: &FieldMap,
) -> Vec<BatchOutcome> {
    let create_on_list = PreparedBatch {
        kind: ApplyKind::Create,
        keys: plan.create_on_list.iter().map(|r| r.key.to_string()).collect(),
        records: plan.create_on_list.iter().map(|r| denormalize(r, list_map)).collect(),
    };
    let update_on_list = PreparedBatch {
        kind: ApplyKind::Update,
        keys: plan.update_on_list.iter().map(|i| i.key.to_string()).collect(),
        records: plan
            .update_on_list
            .iter()
            .map(|i| denormalize_update(i, list_map))
            .collect(),
    };
    let create_on_docs = PreparedBatch {
        kind: ApplyKind::Create,
        keys: plan.create_on_docs.iter().map(|r| r.key.to_string()).collect(),
        records: plan.create_on_docs.iter().map(|r| denormalize(r, docs_map)).collect(),
    };
    let update_on_docs = PreparedBatch {
        kind: ApplyKind::Update,
        keys: plan.update_on_docs.iter().map(|i| i.key.to_string()).collect(),
        records: plan
            .update_on_docs
            .iter()
            .map(|i| denormalize_update(i, docs_map))
            .collect(),
    };

    let (a, b, c, d) = tokio::join!(
        apply_batch(list, create_on_list),
        apply_batch(list, update_on_list),
        apply_batch(docs, create_on_docs),
        apply_batch(docs, update_on_docs),
    );

    vec![a, b, c, d]
}

/// Dry-run preview: the same four outcomes with nothing applied.
#[must_use]
pub fn preview(plan: &SyncPlan) -> Vec<BatchOutcome> {
    let sized = |side, kind, attempted| BatchOutcome {
        side,
        kind,
        attempted,
        applied: 0,
        error: None,
        failed_keys: Vec::new(),
    };
    vec![
        sized(Side::List, ApplyKind::Create, plan.create_on_list.len()),
        sized(Side::List, ApplyKind::Update, plan.update_on_list.len()),
        sized(Side::Docs, ApplyKind::Create, plan.create_on_docs.len()),
        sized(Side::Docs, ApplyKind::Update, plan.update_on_docs.len()),
    ]
}

async fn apply_batch(backend: &impl Backend, batch: PreparedBatch) -> BatchOutcome {
    let side = backend.side();
    if batch.records.is_empty() {
        return BatchOutcome::skipped(side, batch.kind);
    }

    let attempted = batch.records.len();
    debug!(side = %side, kind = %batch.kind, count = attempted, "applying batch");

    match backend.apply(batch.kind, batch.records).await {
        Ok(applied) => BatchOutcome {
            side,
            kind: batch.kind,
            attempted,
            applied,
            error: None,
            failed_keys: Vec::new(),
        },
        Err(e) => {
            warn!(side = %side, kind = %batch.kind, error = %e, "batch failed");
            BatchOutcome {
                side,
                kind: batch.kind,
                attempted,
                applied: 0,
                error: Some(e.to_string()),
                failed_keys: batch.keys,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldMap;
    use crate::model::{CanonicalRecord, NaturalKey, UpdateInstruction};
    use crate::reconcile::mock::MockBackend;
    use serde_json::json;

    fn canonical(key: &str) -> CanonicalRecord {
        CanonicalRecord {
            key: NaturalKey::new(vec![key.to_string()]),
            modified_at: None,
            source_id: None,
            fields: [("notes".to_string(), json!("n"))].into(),
        }
    }

    fn instruction(id: &str, key: &str) -> UpdateInstruction {
        UpdateInstruction {
            source_id: id.to_string(),
            key: NaturalKey::new(vec![key.to_string()]),
            fields: [("notes".to_string(), json!("updated"))].into(),
            modified_at: None,
        }
    }

    fn run_async<F: std::future::Future>(f: F) -> F::Output {
        tokio::runtime::Runtime::new().unwrap().block_on(f)
    }

    #[test]
    fn test_empty_plan_skips_network() {
        let list = MockBackend::new(Side::List, "ID");
        let docs = MockBackend::new(Side::Docs, "_id");

        let outcomes = run_async(execute(
            SyncPlan::default(),
            &list,
            &docs,
            &FieldMap::list_default(),
            &FieldMap::docs_default(),
        ));

        assert_eq!(outcomes.len(), 4);
        assert!(outcomes.iter().all(|o| o.attempted == 0 && o.succeeded()));
        assert_eq!(list.apply_calls(), 0);
        assert_eq!(docs.apply_calls(), 0);
    }

    #[test]
    fn test_batches_route_to_their_backends() {
        let list = MockBackend::new(Side::List, "ID");
        let docs = MockBackend::new(Side::Docs, "_id");

        let plan = SyncPlan {
            create_on_docs: vec![canonical("Bingo"), canonical("Expertise")],
            ..SyncPlan::default()
        };

        let outcomes = run_async(execute(
            plan,
            &list,
            &docs,
            &FieldMap::list_default(),
            &FieldMap::docs_default(),
        ));

        let create_docs = &outcomes[2];
        assert_eq!(create_docs.side, Side::Docs);
        assert_eq!(create_docs.kind, ApplyKind::Create);
        assert_eq!(create_docs.attempted, 2);
        assert_eq!(create_docs.applied, 2);

        // Created with the docs side's native field names.
        let stored = docs.records();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].get("title"), Some(&json!("Bingo")));
        assert_eq!(list.apply_calls(), 0);
    }

    #[test]
    fn test_batch_failure_does_not_block_others() {
        let list = MockBackend::new(Side::List, "ID");
        let docs = MockBackend::new(Side::Docs, "_id")
            .with_records(vec![[("_id".to_string(), json!("d1")), ("title".to_string(), json!("k"))]
                .into_iter()
                .collect()])
            .failing_on(ApplyKind::Update);

        let plan = SyncPlan {
            create_on_list: vec![canonical("OnlyDocs")],
            create_on_docs: vec![canonical("OnlyList")],
            update_on_docs: vec![instruction("d1", "k")],
            ..SyncPlan::default()
        };

        let outcomes = run_async(execute(
            plan,
            &list,
            &docs,
            &FieldMap::list_default(),
            &FieldMap::docs_default(),
        ));

        let update_docs = &outcomes[3];
        assert!(!update_docs.succeeded());
        assert_eq!(update_docs.failed_keys, vec!["k".to_string()]);

        // The other non-empty batches still ran and succeeded.
        assert_eq!(outcomes[0].applied, 1, "create_on_list should have run");
        assert_eq!(outcomes[2].applied, 1, "create_on_docs should have run");
    }

    #[test]
    fn test_preview_applies_nothing() {
        let plan = SyncPlan {
            create_on_docs: vec![canonical("X")],
            ..SyncPlan::default()
        };

        let outcomes = preview(&plan);
        assert_eq!(outcomes.len(), 4);
        assert_eq!(outcomes[2].attempted, 1);
        assert!(outcomes.iter().all(|o| o.applied == 0));
    }
}
