//! Canonical record model.
//!
//! Both backends expose records in their own native shapes with their own
//! field names. The normalizer maps those into `CanonicalRecord`, which is
//! the only representation the matcher, resolver, and plan builder ever see.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A record as a backend driver produces and consumes it: a plain JSON
/// object keyed by the backend's native field names.
pub type RawRecord = serde_json::Map<String, Value>;

/// Which backend a record (or batch) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// The hosted list service.
    List,
    /// The document store.
    Docs,
}

impl Side {
    /// The opposite backend.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::List => Self::Docs,
            Self::Docs => Self::List,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Docs => write!(f, "docs"),
        }
    }
}

impl std::str::FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "list" => Ok(Self::List),
            "docs" => Ok(Self::Docs),
            _ => Err(format!("Unknown side: {s} (expected 'list' or 'docs')")),
        }
    }
}

/// Kind of mutation a batch applies to a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyKind {
    Create,
    Update,
}

impl std::fmt::Display for ApplyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
        }
    }
}

/// The ordered tuple of field values that identifies the same logical
/// entity on both backends.
///
/// Keys are compared as whole tuples; the individual parts have no meaning
/// to the core beyond equality. Must be non-empty (the normalizer rejects
/// records with any key part missing).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NaturalKey(pub Vec<String>);

impl NaturalKey {
    #[must_use]
    pub fn new(parts: Vec<String>) -> Self {
        Self(parts)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("|"))
    }
}

/// The backend-agnostic representation used throughout the reconciliation
/// core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Natural key identifying the entity across both backends.
    pub key: NaturalKey,

    /// Last-modified timestamp. `None` sorts before any real timestamp,
    /// so a record without one always loses a newer-wins comparison.
    pub modified_at: Option<DateTime<Utc>>,

    /// Backend-native identifier, understood only by the originating side.
    /// `None` for records that are not yet persisted on a side (e.g. a
    /// create instruction headed for the other backend).
    pub source_id: Option<String>,

    /// Payload fields under canonical names, excluding key and
    /// bookkeeping fields.
    pub fields: BTreeMap<String, Value>,
}

/// A (list record, docs record) pair with equal natural keys.
///
/// Created transiently by the matcher, consumed by the resolver.
#[derive(Debug, Clone)]
pub struct MatchedPair {
    pub list: CanonicalRecord,
    pub docs: CanonicalRecord,
}

/// An update headed for one backend: which record (by that backend's own
/// id) and the canonical fields to write.
///
/// The natural key rides along purely for reporting, so a failed batch can
/// name the entities it carried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateInstruction {
    pub source_id: String,
    pub key: NaturalKey,
    pub fields: BTreeMap<String, Value>,
    pub modified_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_display_roundtrip() {
        assert_eq!("list".parse::<Side>().unwrap(), Side::List);
        assert_eq!("docs".parse::<Side>().unwrap(), Side::Docs);
        assert_eq!(Side::List.to_string(), "list");
        assert!("sharepoint".parse::<Side>().is_err());
    }

    #[test]
    fn test_side_other() {
        assert_eq!(Side::List.other(), Side::Docs);
        assert_eq!(Side::Docs.other(), Side::List);
    }

    #[test]
    fn test_natural_key_display() {
        let key = NaturalKey::new(vec!["Bingo".into(), "Acme".into()]);
        assert_eq!(key.to_string(), "Bingo|Acme");
    }

    #[test]
    fn test_natural_key_equality() {
        let a = NaturalKey::new(vec!["Bingo".into()]);
        let b = NaturalKey::new(vec!["Bingo".into()]);
        let c = NaturalKey::new(vec!["Expertise".into()]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_missing_timestamp_orders_oldest() {
        let none: Option<DateTime<Utc>> = None;
        let some = Some(Utc::now());
        assert!(none < some);
    }
}
