//! In-memory backend for reconciliation tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::Value;

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::model::{ApplyKind, RawRecord, Side};

/// A backend whose store is a vector behind a mutex. Creates assign
/// sequential ids under the configured native id field; updates merge
/// fields into the record with the matching id.
pub struct MockBackend {
    side: Side,
    id_field: String,
    store: Mutex<Vec<RawRecord>>,
    next_id: AtomicUsize,
    applies: AtomicUsize,
    fail_fetch: bool,
    fail_apply: Option<ApplyKind>,
}

impl MockBackend {
    pub fn new(side: Side, id_field: &str) -> Self {
        Self {
            side,
            id_field: id_field.to_string(),
            store: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
            applies: AtomicUsize::new(0),
            fail_fetch: false,
            fail_apply: None,
        }
    }

    #[must_use]
    pub fn with_records(self, records: Vec<RawRecord>) -> Self {
        *self.store.lock().unwrap() = records;
        self
    }

    #[must_use]
    pub fn failing_on(mut self, kind: ApplyKind) -> Self {
        self.fail_apply = Some(kind);
        self
    }

    #[must_use]
    pub fn failing_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    /// Snapshot of the stored records.
    pub fn records(&self) -> Vec<RawRecord> {
        self.store.lock().unwrap().clone()
    }

    /// How many apply calls reached this backend.
    pub fn apply_calls(&self) -> usize {
        self.applies.load(Ordering::SeqCst)
    }
}

impl Backend for MockBackend {
    fn side(&self) -> Side {
        self.side
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>> {
        if self.fail_fetch {
            return Err(Error::Fetch {
                side: self.side,
                message: "mock fetch failure".to_string(),
            });
        }
        Ok(self.records())
    }

    async fn apply(&self, kind: ApplyKind, records: Vec<RawRecord>) -> Result<usize> {
        self.applies.fetch_add(1, Ordering::SeqCst);

        if self.fail_apply == Some(kind) {
            return Err(Error::Apply {
                side: self.side,
                kind,
                message: "mock apply failure".to_string(),
            });
        }

        let mut store = self.store.lock().unwrap();
        let count = records.len();
        match kind {
            ApplyKind::Create => {
                for mut record in records {
                    let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                    record.insert(
                        self.id_field.clone(),
                        Value::String(format!("{}-{id}", self.side)),
                    );
                    store.push(record);
                }
            }
            ApplyKind::Update => {
                for mut record in records {
                    let id = record.remove(&self.id_field).ok_or_else(|| Error::Apply {
                        side: self.side,
                        kind,
                        message: format!("update payload missing '{}'", self.id_field),
                    })?;
                    let existing = store
                        .iter_mut()
                        .find(|r| r.get(&self.id_field) == Some(&id))
                        .ok_or_else(|| Error::Apply {
                            side: self.side,
                            kind,
                            message: format!("no record with id {id}"),
                        })?;
                    for (field, value) in record {
                        existing.insert(field, value);
                    }
                }
            }
        }

        Ok(count)
    }
}
