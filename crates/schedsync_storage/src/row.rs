//! Stored rows.

use schedsync_protocol::RowId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// First character of store-internal metadata keys (`$tableId`, `$revision`, ...).
pub const METADATA_PREFIX: char = '$';

/// Returns true if `key` names store-internal metadata.
pub fn is_metadata_key(key: &str) -> bool {
    key.starts_with(METADATA_PREFIX)
}

/// A persisted row: its identifier plus every stored value.
///
/// `fields` holds both attribute values and store metadata; metadata keys
/// start with [`METADATA_PREFIX`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Persistent identifier.
    #[serde(rename = "$id")]
    pub id: RowId,
    /// Attribute values and metadata.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Row {
    /// Creates a row.
    pub fn new(id: impl Into<RowId>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Iterates over attribute values, skipping metadata.
    pub fn attributes(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter().filter(|(key, _)| !is_metadata_key(key))
    }

    /// Returns the revision stamped by the store, if any.
    pub fn revision(&self) -> Option<u64> {
        self.fields.get("$revision").and_then(Value::as_u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn row_serializes_with_dollar_id() {
        let row: Row = serde_json::from_value(json!({
            "$id": "e1",
            "$revision": 4,
            "title": "Standup"
        }))
        .unwrap();
        assert_eq!(row.id, RowId::new("e1"));
        assert_eq!(row.revision(), Some(4));
        assert_eq!(row.attributes().count(), 1);
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!({ "$id": "e1", "$revision": 4, "title": "Standup" })
        );
    }

    #[test]
    fn metadata_keys() {
        assert!(is_metadata_key("$createdAt"));
        assert!(!is_metadata_key("title"));
    }
}
