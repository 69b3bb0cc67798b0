//! In-memory row store for testing.

use crate::backend::RowStore;
use crate::error::{StorageError, StorageResult};
use crate::row::Row;
use crate::snapshot::{StoreSnapshot, TableSnapshot};
use async_trait::async_trait;
use parking_lot::RwLock;
use schedsync_protocol::RowId;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
struct Table {
    schema: BTreeSet<String>,
    rows: BTreeMap<RowId, Row>,
}

impl Table {
    fn check_attributes(&self, table: &str, fields: &Map<String, Value>) -> StorageResult<()> {
        match fields.keys().find(|key| !self.schema.contains(*key)) {
            Some(attribute) => Err(StorageError::UnknownAttribute {
                table: table.to_owned(),
                attribute: attribute.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// An in-memory row store.
///
/// This store keeps every table in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral servers that don't need persistence
///
/// Every written row is stamped with `$tableId` and a store-wide `$revision`.
///
/// # Thread Safety
///
/// Tables are guarded by a single lock, so each row operation is atomic.
///
/// # Example
///
/// ```rust
/// use schedsync_storage::InMemoryRowStore;
///
/// let store = InMemoryRowStore::new().with_table("resources", ["name", "calendar"]);
/// assert_eq!(store.row_count("resources"), 0);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryRowStore {
    tables: RwLock<BTreeMap<String, Table>>,
    revision: AtomicU64,
}

impl InMemoryRowStore {
    /// Creates a store with no tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty table with the given schema.
    #[must_use]
    pub fn with_table<I, S>(self, table: impl Into<String>, schema: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_table(table, schema);
        self
    }

    /// Adds (or replaces) a table with the given schema.
    pub fn add_table<I, S>(&self, table: impl Into<String>, schema: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = Table {
            schema: schema.into_iter().map(Into::into).collect(),
            rows: BTreeMap::new(),
        };
        self.tables.write().insert(table.into(), entry);
    }

    /// Rebuilds a store from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let revision = snapshot.max_revision();
        let tables = snapshot
            .tables
            .into_iter()
            .map(|(name, t)| {
                let rows = t.rows.into_iter().map(|row| (row.id.clone(), row)).collect();
                (
                    name,
                    Table {
                        schema: t.schema,
                        rows,
                    },
                )
            })
            .collect();
        Self {
            tables: RwLock::new(tables),
            revision: AtomicU64::new(revision),
        }
    }

    /// Returns a copy of every table.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        let tables = self
            .tables
            .read()
            .iter()
            .map(|(name, t)| {
                (
                    name.clone(),
                    TableSnapshot {
                        schema: t.schema.clone(),
                        rows: t.rows.values().cloned().collect(),
                    },
                )
            })
            .collect();
        StoreSnapshot { tables }
    }

    /// Stores a row as-is, bypassing schema checks and metadata stamping.
    ///
    /// Useful for seeding tests with legacy or malformed data.
    pub fn insert_row(&self, table: &str, row: Row) -> StorageResult<()> {
        let mut tables = self.tables.write();
        let t = tables
            .get_mut(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_owned()))?;
        t.rows.insert(row.id.clone(), row);
        Ok(())
    }

    /// Returns a copy of a row.
    #[must_use]
    pub fn row(&self, table: &str, id: &RowId) -> Option<Row> {
        self.tables.read().get(table)?.rows.get(id).cloned()
    }

    /// Returns the number of rows in a table (zero if it doesn't exist).
    #[must_use]
    pub fn row_count(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, |t| t.rows.len())
    }

    fn next_revision(&self) -> Value {
        Value::from(self.revision.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub(crate) fn schema_of(&self, table: &str) -> StorageResult<BTreeSet<String>> {
        self.tables
            .read()
            .get(table)
            .map(|t| t.schema.clone())
            .ok_or_else(|| StorageError::TableNotFound(table.to_owned()))
    }

    pub(crate) fn rows_of(&self, table: &str) -> StorageResult<Vec<Row>> {
        self.tables
            .read()
            .get(table)
            .map(|t| t.rows.values().cloned().collect())
            .ok_or_else(|| StorageError::TableNotFound(table.to_owned()))
    }

    pub(crate) fn create(
        &self,
        table: &str,
        id: RowId,
        mut fields: Map<String, Value>,
    ) -> StorageResult<Row> {
        let mut tables = self.tables.write();
        let t = tables
            .get_mut(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_owned()))?;
        t.check_attributes(table, &fields)?;
        if t.rows.contains_key(&id) {
            return Err(StorageError::DuplicateRow {
                table: table.to_owned(),
                id,
            });
        }

        fields.insert("$tableId".into(), Value::from(table));
        fields.insert("$revision".into(), self.next_revision());
        let row = Row::new(id, fields);
        t.rows.insert(row.id.clone(), row.clone());
        Ok(row)
    }

    /// Merges `fields` into a row, returning the updated row and its prior state.
    pub(crate) fn update(
        &self,
        table: &str,
        id: &RowId,
        fields: Map<String, Value>,
    ) -> StorageResult<(Row, Row)> {
        let mut tables = self.tables.write();
        let t = tables
            .get_mut(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_owned()))?;
        t.check_attributes(table, &fields)?;
        let row = t.rows.get_mut(id).ok_or_else(|| StorageError::RowNotFound {
            table: table.to_owned(),
            id: id.clone(),
        })?;

        let previous = row.clone();
        row.fields.extend(fields);
        row.fields.insert("$revision".into(), self.next_revision());
        Ok((row.clone(), previous))
    }

    /// Removes a row, returning it.
    pub(crate) fn delete(&self, table: &str, id: &RowId) -> StorageResult<Row> {
        let mut tables = self.tables.write();
        let t = tables
            .get_mut(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_owned()))?;
        t.rows
            .remove(id)
            .ok_or_else(|| StorageError::RowNotFound {
                table: table.to_owned(),
                id: id.clone(),
            })
    }
}

#[async_trait]
impl RowStore for InMemoryRowStore {
    async fn list_schema(&self, table: &str) -> StorageResult<BTreeSet<String>> {
        self.schema_of(table)
    }

    async fn list_rows(&self, table: &str) -> StorageResult<Vec<Row>> {
        self.rows_of(table)
    }

    async fn create_row(
        &self,
        table: &str,
        id: RowId,
        fields: Map<String, Value>,
    ) -> StorageResult<Row> {
        self.create(table, id, fields)
    }

    async fn update_row(
        &self,
        table: &str,
        id: &RowId,
        fields: Map<String, Value>,
    ) -> StorageResult<Row> {
        self.update(table, id, fields).map(|(row, _)| row)
    }

    async fn delete_row(&self, table: &str, id: &RowId) -> StorageResult<()> {
        self.delete(table, id).map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn store() -> InMemoryRowStore {
        InMemoryRowStore::new().with_table("events", ["title", "duration"])
    }

    #[tokio::test]
    async fn create_stamps_metadata() {
        let store = store();
        let row = store
            .create_row("events", RowId::new("e1"), fields(json!({ "title": "Standup" })))
            .await
            .unwrap();

        assert_eq!(row.get("$tableId"), Some(&json!("events")));
        assert_eq!(row.revision(), Some(1));
        assert_eq!(store.row_count("events"), 1);
    }

    #[tokio::test]
    async fn create_rejects_unknown_attribute() {
        let result = store()
            .create_row("events", RowId::new("e1"), fields(json!({ "color": "red" })))
            .await;
        assert!(matches!(
            result,
            Err(StorageError::UnknownAttribute { attribute, .. }) if attribute == "color"
        ));
    }

    #[tokio::test]
    async fn create_rejects_duplicate_id() {
        let store = store();
        store
            .create_row("events", RowId::new("e1"), Map::new())
            .await
            .unwrap();
        let result = store.create_row("events", RowId::new("e1"), Map::new()).await;
        assert!(matches!(result, Err(StorageError::DuplicateRow { .. })));
    }

    #[tokio::test]
    async fn update_merges_fields() {
        let store = store();
        store
            .create_row(
                "events",
                RowId::new("e1"),
                fields(json!({ "title": "Standup", "duration": 1 })),
            )
            .await
            .unwrap();

        let row = store
            .update_row("events", &RowId::new("e1"), fields(json!({ "duration": 2 })))
            .await
            .unwrap();
        assert_eq!(row.get("title"), Some(&json!("Standup")));
        assert_eq!(row.get("duration"), Some(&json!(2)));
        assert_eq!(row.revision(), Some(2));
    }

    #[tokio::test]
    async fn missing_rows_and_tables() {
        let store = store();
        let missing = RowId::new("nope");
        assert!(matches!(
            store.update_row("events", &missing, Map::new()).await,
            Err(StorageError::RowNotFound { .. })
        ));
        assert!(matches!(
            store.delete_row("events", &missing).await,
            Err(StorageError::RowNotFound { .. })
        ));
        assert!(matches!(
            store.list_schema("calendars").await,
            Err(StorageError::TableNotFound(_))
        ));
    }

    #[tokio::test]
    async fn snapshot_roundtrip_keeps_revision() {
        let store = store();
        store
            .create_row("events", RowId::new("e1"), Map::new())
            .await
            .unwrap();

        let restored = InMemoryRowStore::from_snapshot(store.snapshot());
        assert_eq!(restored.row_count("events"), 1);
        let row = restored
            .create_row("events", RowId::new("e2"), Map::new())
            .await
            .unwrap();
        assert_eq!(row.revision(), Some(2));
    }

    #[test]
    fn insert_row_bypasses_schema() {
        let store = store();
        let row = Row::new("e1", fields(json!({ "legacy": true })));
        store.insert_row("events", row.clone()).unwrap();
        assert_eq!(store.row("events", &RowId::new("e1")), Some(row));
        assert!(store.insert_row("missing", Row::new("x", Map::new())).is_err());
    }
}
