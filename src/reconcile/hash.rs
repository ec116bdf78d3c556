//! Payload content hashing.
//!
//! SHA256 over the serialized canonical payload gives a deterministic
//! fingerprint, so the resolver can detect "field-for-field equal" without
//! walking every field pair. `BTreeMap` ordering makes the serialization
//! stable.

use std::collections::BTreeMap;

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Compute a SHA256 hash of a canonical payload.
///
/// # Panics
///
/// Panics if the map cannot be serialized to JSON, which cannot happen for
/// JSON values.
#[must_use]
pub fn payload_hash(fields: &BTreeMap<String, Value>) -> String {
    let json = serde_json::to_string(fields).expect("serialization should not fail");
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_payload_hash_deterministic() {
        let fields = payload(&[("notes", json!("a")), ("owner", json!("kim"))]);
        let h1 = payload_hash(&fields);
        let h2 = payload_hash(&fields);
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn test_payload_hash_changes_with_content() {
        let a = payload(&[("notes", json!("a"))]);
        let b = payload(&[("notes", json!("b"))]);
        assert_ne!(payload_hash(&a), payload_hash(&b));
    }

    #[test]
    fn test_payload_hash_insertion_order_irrelevant() {
        let mut a = BTreeMap::new();
        a.insert("x".to_string(), json!(1));
        a.insert("y".to_string(), json!(2));

        let mut b = BTreeMap::new();
        b.insert("y".to_string(), json!(2));
        b.insert("x".to_string(), json!(1));

        assert_eq!(payload_hash(&a), payload_hash(&b));
    }
}
