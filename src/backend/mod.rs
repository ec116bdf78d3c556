//! Backend collaborator contract.
//!
//! The reconciliation core only ever asks a backend for two things: fetch
//! every record, and apply a batch of creates or updates. Everything else
//! about a backend (wire format, auth, pagination) stays behind this
//! trait in the side-specific drivers.

use std::future::Future;

use crate::error::Result;
use crate::model::{ApplyKind, RawRecord, Side};

pub mod docs;
pub mod list;

pub use docs::DocsBackend;
pub use list::ListBackend;

/// Fetch/apply contract implemented by the thin backend drivers.
///
/// Retries are the implementor's business; the core never retries. A
/// single per-request deadline comes from configuration.
pub trait Backend: Send + Sync {
    /// Which side this driver serves.
    fn side(&self) -> Side;

    /// Fetch all records in the backend's native shape.
    ///
    /// Fails with `Error::Fetch`, which aborts the run before any apply.
    fn fetch(&self) -> impl Future<Output = Result<Vec<RawRecord>>> + Send;

    /// Apply one batch of creates or updates, returning how many records
    /// the backend confirmed.
    ///
    /// Fails with `Error::Apply`, scoped to this batch only.
    fn apply(
        &self,
        kind: ApplyKind,
        records: Vec<RawRecord>,
    ) -> impl Future<Output = Result<usize>> + Send;
}
