//! Data models for ShareSync.
//!
//! This module contains the backend-agnostic domain types the
//! reconciliation core operates on:
//! - `CanonicalRecord` (and its `NaturalKey`)
//! - `MatchedPair`
//! - `UpdateInstruction`
//! - `Side` / `ApplyKind`

pub mod record;

pub use record::{
    ApplyKind, CanonicalRecord, MatchedPair, NaturalKey, RawRecord, Side, UpdateInstruction,
};
