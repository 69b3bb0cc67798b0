//! Concurrent row mutations for one collection.

use crate::error::{Operation, ServerError, ServerResult};
use crate::sanitize::sanitize;
use crate::schema::Schema;
use futures::future::join_all;
use schedsync_protocol::{Collection, CreatedRow, Record, RowId, RowRef, ID_FIELD};
use schedsync_storage::{RowStore, StorageError};
use std::future::Future;
use tracing::debug;

/// Applies sub-batches of one collection to its table.
///
/// Every record of a batch is sent to the store concurrently and the batch
/// completes when all of them have, even if one fails early. The first
/// failure in input order is returned; the other calls are not rolled back.
pub struct RowMutator<'a, S: ?Sized> {
    store: &'a S,
    collection: Collection,
    table: &'a str,
    schema: &'a Schema,
}

impl<'a, S: RowStore + ?Sized> RowMutator<'a, S> {
    /// Creates a mutator for `collection`, stored in `table`.
    pub fn new(store: &'a S, collection: Collection, table: &'a str, schema: &'a Schema) -> Self {
        Self {
            store,
            collection,
            table,
            schema,
        }
    }

    fn store_error(&self, operation: Operation) -> impl Fn(StorageError) -> ServerError + '_ {
        move |source| ServerError::Store {
            collection: self.collection,
            operation,
            source,
        }
    }

    /// Creates one row per record, returning phantom/persistent pairs in input order.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidRequest`] if a record has no phantom id,
    /// or [`ServerError::Store`] if the store rejects a row.
    pub async fn create_many(&self, records: Vec<Record>) -> ServerResult<Vec<CreatedRow>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        debug!(collection = %self.collection, count = records.len(), "creating rows");

        let calls = records.into_iter().map(|record| async move {
            let phantom_id = record.phantom_id().ok_or_else(|| {
                ServerError::InvalidRequest(format!(
                    "added record in {} has no phantom id",
                    self.collection
                ))
            })?;
            let fields = sanitize(self.schema, record).into_map();
            let row = self
                .store
                .create_row(self.table, RowId::unique(), fields)
                .await
                .map_err(self.store_error(Operation::Create))?;
            Ok::<_, ServerError>(CreatedRow::new(phantom_id, row.id))
        });

        settle(calls).await
    }

    /// Deletes the referenced rows.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Store`] if a row does not exist or the store fails.
    pub async fn delete_many(&self, refs: &[RowRef]) -> ServerResult<()> {
        if refs.is_empty() {
            return Ok(());
        }
        debug!(collection = %self.collection, count = refs.len(), "deleting rows");

        let calls = refs.iter().map(|r| async move {
            self.store
                .delete_row(self.table, &r.id)
                .await
                .map_err(self.store_error(Operation::Delete))
        });

        settle(calls).await?;
        Ok(())
    }

    /// Updates the rows named by each record's `id` with its sanitized fields.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::InvalidRequest`] if a record has no id, or
    /// [`ServerError::Store`] if a row does not exist or the store fails.
    pub async fn update_many(&self, records: Vec<Record>) -> ServerResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        debug!(collection = %self.collection, count = records.len(), "updating rows");

        let calls = records.into_iter().map(|record| async move {
            let id = record.row_id().ok_or_else(|| {
                ServerError::InvalidRequest(format!(
                    "updated record in {} has no id",
                    self.collection
                ))
            })?;
            let mut fields = sanitize(self.schema, record);
            fields.remove(ID_FIELD);
            self.store
                .update_row(self.table, &id, fields.into_map())
                .await
                .map_err(self.store_error(Operation::Update))?;
            Ok::<_, ServerError>(())
        });

        settle(calls).await?;
        Ok(())
    }
}

/// Drives every call to completion, then reports the first failure.
async fn settle<T, F>(calls: impl IntoIterator<Item = F>) -> ServerResult<Vec<T>>
where
    F: Future<Output = ServerResult<T>>,
{
    join_all(calls).await.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use schedsync_storage::{InMemoryRowStore, Row, StorageResult};
    use serde_json::{json, Map, Value};
    use std::collections::BTreeSet;

    /// Yields before every successful delete; `missing` fails immediately.
    struct SlowDeletes(InMemoryRowStore);

    #[async_trait]
    impl RowStore for SlowDeletes {
        async fn list_schema(&self, table: &str) -> StorageResult<BTreeSet<String>> {
            self.0.list_schema(table).await
        }

        async fn list_rows(&self, table: &str) -> StorageResult<Vec<Row>> {
            self.0.list_rows(table).await
        }

        async fn create_row(
            &self,
            table: &str,
            id: RowId,
            fields: Map<String, Value>,
        ) -> StorageResult<Row> {
            self.0.create_row(table, id, fields).await
        }

        async fn update_row(
            &self,
            table: &str,
            id: &RowId,
            fields: Map<String, Value>,
        ) -> StorageResult<Row> {
            self.0.update_row(table, id, fields).await
        }

        async fn delete_row(&self, table: &str, id: &RowId) -> StorageResult<()> {
            if id.as_str() != "missing" {
                tokio::task::yield_now().await;
            }
            self.0.delete_row(table, id).await
        }
    }

    fn record(value: Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    fn events_store() -> InMemoryRowStore {
        InMemoryRowStore::new().with_table("tbl_events", ["name", "startDate", "segments"])
    }

    fn schema() -> Schema {
        Schema::new(["name", "startDate", "segments"])
    }

    #[tokio::test]
    async fn create_many_returns_pairs_in_order() {
        let store = events_store();
        let schema = schema();
        let mutator = RowMutator::new(&store, Collection::Events, "tbl_events", &schema);

        let created = mutator
            .create_many(vec![
                record(json!({ "$PhantomId": "_g1", "name": "A", "cls": "ui" })),
                record(json!({ "$PhantomId": "_g2", "name": "B", "segments": [[0, 1]] })),
            ])
            .await
            .unwrap();

        assert_eq!(created.len(), 2);
        assert_eq!(created[0].phantom_id, "_g1");
        assert_eq!(created[1].phantom_id, "_g2");
        assert_ne!(created[0].id, created[1].id);

        let second = store.row("tbl_events", &created[1].id).unwrap();
        assert_eq!(second.get("segments"), Some(&json!("[[0,1]]")));
        assert_eq!(second.get("cls"), None);
    }

    #[tokio::test]
    async fn create_without_phantom_id_is_invalid() {
        let store = events_store();
        let schema = schema();
        let mutator = RowMutator::new(&store, Collection::Events, "tbl_events", &schema);

        let result = mutator.create_many(vec![record(json!({ "name": "A" }))]).await;
        assert!(matches!(result, Err(ServerError::InvalidRequest(_))));
        assert_eq!(store.row_count("tbl_events"), 0);
    }

    #[tokio::test]
    async fn update_merges_and_ignores_id_column() {
        let store = events_store();
        let fields = json!({ "name": "Old", "startDate": "2024-01-01" });
        store
            .insert_row("tbl_events", Row::new("e1", fields.as_object().cloned().unwrap()))
            .unwrap();
        let schema = schema();
        let mutator = RowMutator::new(&store, Collection::Events, "tbl_events", &schema);

        mutator
            .update_many(vec![record(json!({ "id": "e1", "name": "New", "expanded": true }))])
            .await
            .unwrap();

        let row = store.row("tbl_events", &RowId::new("e1")).unwrap();
        assert_eq!(row.get("name"), Some(&json!("New")));
        assert_eq!(row.get("startDate"), Some(&json!("2024-01-01")));
        assert_eq!(row.get("id"), None);
    }

    #[tokio::test]
    async fn delete_missing_row_names_collection() {
        let store = events_store();
        let schema = schema();
        let mutator = RowMutator::new(&store, Collection::Events, "tbl_events", &schema);

        let err = mutator
            .delete_many(&[RowRef::new("999")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServerError::Store {
                collection: Collection::Events,
                operation: Operation::Delete,
                ..
            }
        ));
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn failed_delete_still_completes_siblings() {
        let store = SlowDeletes(events_store());
        for id in ["e1", "e2"] {
            store.0.insert_row("tbl_events", Row::new(id, Map::new())).unwrap();
        }
        let schema = schema();
        let mutator = RowMutator::new(&store, Collection::Events, "tbl_events", &schema);

        let result = mutator
            .delete_many(&[RowRef::new("e1"), RowRef::new("missing"), RowRef::new("e2")])
            .await;

        assert!(matches!(result, Err(ServerError::Store { .. })));
        assert_eq!(store.0.row_count("tbl_events"), 0);
    }
}
