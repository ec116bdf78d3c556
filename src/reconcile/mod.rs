//! Two-way reconciliation core.
//!
//! Given the two independently-maintained collections, compute and apply
//! the minimal set of creates/updates that brings both sides into
//! agreement, with "most recently modified wins" as the conflict rule.
//!
//! # Architecture
//!
//! The pipeline is a chain of pure stages with side effects only at the
//! ends:
//!
//! 1. Fetch both backends concurrently (either failing aborts the run)
//! 2. [`normalize`] native records into canonical ones per `FieldMap`
//! 3. [`matcher`] pairs records by natural key
//! 4. [`resolve`] decides unchanged / newer-on-one-side / tie per pair
//! 5. [`plan`] aggregates into the four batches
//! 6. [`execute`] applies the batches concurrently, one outcome each
//!
//! Re-running a successful sync is convergent: the second run resolves
//! everything as unchanged and produces an empty plan.

use chrono::Utc;
use tracing::{debug, info};

use crate::backend::Backend;
use crate::config::Config;
use crate::error::Result;
use crate::model::Side;
use crate::report::{Anomaly, AnomalyKind, RunReport};

mod hash;
pub mod matcher;
#[cfg(test)]
pub(crate) mod mock;
pub mod normalize;
pub mod plan;
pub mod resolve;

mod execute;

pub use execute::{execute, preview};
pub use matcher::{match_records, MatchOutcome};
pub use normalize::{denormalize, denormalize_update, normalize, normalize_all};
pub use plan::{build, SyncPlan};
pub use resolve::{resolve, Disposition};

/// Run one full reconciliation.
///
/// With `dry_run` the plan is built and previewed but nothing is applied.
/// The returned report carries every count, batch outcome, and anomaly of
/// the run.
///
/// # Errors
///
/// Returns `Error::Fetch` if either backend's fetch fails; no plan is
/// built from one side's data only. Apply failures do not error the run;
/// they are scoped to their batch and land in the report.
pub async fn run(
    config: &Config,
    list: &impl Backend,
    docs: &impl Backend,
    dry_run: bool,
) -> Result<RunReport> {
    let mut report = RunReport::begin(dry_run);

    let (list_raw, docs_raw) = tokio::try_join!(list.fetch(), docs.fetch())?;
    report.fetched_list = list_raw.len();
    report.fetched_docs = docs_raw.len();
    info!(
        list = report.fetched_list,
        docs = report.fetched_docs,
        "fetched both sides"
    );

    let (list_records, list_anomalies) =
        normalize_all(&list_raw, &config.list.mapping, Side::List);
    let (docs_records, docs_anomalies) =
        normalize_all(&docs_raw, &config.docs.mapping, Side::Docs);
    report.anomalies.extend(list_anomalies);
    report.anomalies.extend(docs_anomalies);

    let outcome = match_records(list_records, docs_records);
    report.matched = outcome.matched.len();
    report.only_list = outcome.only_list.len();
    report.only_docs = outcome.only_docs.len();
    report.anomalies.extend(outcome.anomalies);

    let mut dispositions = Vec::with_capacity(outcome.matched.len());
    for pair in &outcome.matched {
        let disposition = resolve(pair);
        match &disposition {
            Disposition::Unchanged => report.unchanged += 1,
            Disposition::NewerOnList(_) => report.newer_on_list += 1,
            Disposition::NewerOnDocs(_) => report.newer_on_docs += 1,
            Disposition::Tie => {
                report.ties += 1;
                report.anomalies.push(Anomaly {
                    kind: AnomalyKind::TieConflict,
                    side: None,
                    key: Some(pair.list.key.to_string()),
                    detail: "equal timestamps with differing payloads; \
                             no mutation planned, review manually"
                        .to_string(),
                });
            }
        }
        dispositions.push(disposition);
    }

    let sync_plan = build(outcome.only_list, outcome.only_docs, dispositions);
    debug!(total = sync_plan.total(), "plan built");

    report.batches = if dry_run {
        preview(&sync_plan)
    } else {
        execute(
            sync_plan,
            list,
            docs,
            &config.list.mapping,
            &config.docs.mapping,
        )
        .await
    };

    report.finished_at = Utc::now();
    Ok(report)
}
