//! Command implementations.

pub mod completions;
pub mod export;
pub mod fetch;
pub mod import;
pub mod report;
pub mod sync;
pub mod version;

use crate::backend::{Backend, DocsBackend, ListBackend};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{CanonicalRecord, RawRecord, Side};
use crate::reconcile::normalize_all;
use crate::report::Anomaly;

/// Build both drivers from configuration.
fn backends(config: &Config) -> (ListBackend, DocsBackend) {
    (
        ListBackend::new(&config.list, config.timeout_secs),
        DocsBackend::new(&config.docs, config.timeout_secs),
    )
}

/// Create a runtime for the async backend calls.
fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))
}

/// Fetch and normalize one side. Used by fetch/export.
fn fetch_side(config: &Config, side: Side) -> Result<(Vec<CanonicalRecord>, Vec<Anomaly>)> {
    let (list, docs) = backends(config);
    let rt = runtime()?;

    let raws: Vec<RawRecord> = match side {
        Side::List => rt.block_on(list.fetch())?,
        Side::Docs => rt.block_on(docs.fetch())?,
    };

    let mapping = match side {
        Side::List => &config.list.mapping,
        Side::Docs => &config.docs.mapping,
    };

    Ok(normalize_all(&raws, mapping, side))
}
