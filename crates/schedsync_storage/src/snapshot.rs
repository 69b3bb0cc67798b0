//! Serializable image of a whole store.

use crate::error::{StorageError, StorageResult};
use crate::row::Row;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// One table: its declared schema and its rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    /// Declared attribute names.
    pub schema: BTreeSet<String>,
    /// Stored rows.
    #[serde(default)]
    pub rows: Vec<Row>,
}

/// Every table of a store, keyed by table identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Tables by identifier.
    pub tables: BTreeMap<String, TableSnapshot>,
}

impl StoreSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty table with the given schema.
    pub fn with_table<I, S>(mut self, table: impl Into<String>, schema: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tables.insert(
            table.into(),
            TableSnapshot {
                schema: schema.into_iter().map(Into::into).collect(),
                rows: Vec::new(),
            },
        );
        self
    }

    /// Decodes a snapshot from JSON and checks that row ids are unique per table.
    pub fn from_json(json: &str) -> StorageResult<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        for (name, table) in &snapshot.tables {
            let mut seen = HashSet::new();
            for row in &table.rows {
                if !seen.insert(&row.id) {
                    return Err(StorageError::Corrupted(format!(
                        "duplicate row {} in table {}",
                        row.id, name
                    )));
                }
            }
        }
        Ok(snapshot)
    }

    /// Encodes the snapshot as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> StorageResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns the highest revision stamped on any row.
    pub fn max_revision(&self) -> u64 {
        self.tables
            .values()
            .flat_map(|t| t.rows.iter())
            .filter_map(Row::revision)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_rows_are_corruption() {
        let json = r#"{ "tables": { "events": { "schema": ["title"], "rows": [
            { "$id": "e1", "title": "a" },
            { "$id": "e1", "title": "b" }
        ] } } }"#;
        assert!(matches!(
            StoreSnapshot::from_json(json),
            Err(StorageError::Corrupted(_))
        ));
    }

    #[test]
    fn json_roundtrip_and_revision() {
        let json = r#"{ "tables": { "events": { "schema": ["title"], "rows": [
            { "$id": "e1", "$revision": 7, "title": "a" }
        ] }, "resources": { "schema": ["name"] } } }"#;
        let snapshot = StoreSnapshot::from_json(json).unwrap();
        assert_eq!(snapshot.max_revision(), 7);
        assert!(snapshot.tables["resources"].rows.is_empty());

        let again = StoreSnapshot::from_json(&snapshot.to_json_pretty().unwrap()).unwrap();
        assert_eq!(again, snapshot);
    }
}
