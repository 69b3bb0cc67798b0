//! Row store trait definition.

use crate::error::StorageResult;
use crate::row::Row;
use async_trait::async_trait;
use schedsync_protocol::RowId;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::sync::Arc;

/// A row-oriented store of scheduler tables.
///
/// Tables are addressed by identifier; rows by [`RowId`]. The store knows
/// nothing about phantom identifiers, structured fields or collections.
///
/// # Invariants
///
/// - `create_row` persists exactly the given id; ids are never reassigned
/// - `update_row` merges the given fields into the row; unlisted fields are untouched
/// - Each call is atomic on its own; calls are not coordinated with each other
/// - Stores must be `Send + Sync` so calls can run concurrently
///
/// # Implementors
///
/// - [`super::InMemoryRowStore`] - For testing
/// - [`super::FileRowStore`] - For a persistent JSON snapshot
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Returns the attribute names the table declares.
    ///
    /// # Errors
    ///
    /// Returns an error if the table does not exist or cannot be inspected.
    async fn list_schema(&self, table: &str) -> StorageResult<BTreeSet<String>>;

    /// Returns every row of the table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table does not exist or cannot be read.
    async fn list_rows(&self, table: &str) -> StorageResult<Vec<Row>>;

    /// Creates a row with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The table does not exist
    /// - A row with `id` already exists
    /// - `fields` carries an attribute the table does not declare
    async fn create_row(
        &self,
        table: &str,
        id: RowId,
        fields: Map<String, Value>,
    ) -> StorageResult<Row>;

    /// Merges `fields` into an existing row.
    ///
    /// # Errors
    ///
    /// Returns an error if the table or row does not exist, or `fields`
    /// carries an undeclared attribute.
    async fn update_row(
        &self,
        table: &str,
        id: &RowId,
        fields: Map<String, Value>,
    ) -> StorageResult<Row>;

    /// Deletes a row.
    ///
    /// # Errors
    ///
    /// Returns an error if the table or row does not exist.
    async fn delete_row(&self, table: &str, id: &RowId) -> StorageResult<()>;
}

#[async_trait]
impl<T: RowStore + ?Sized> RowStore for Arc<T> {
    async fn list_schema(&self, table: &str) -> StorageResult<BTreeSet<String>> {
        (**self).list_schema(table).await
    }

    async fn list_rows(&self, table: &str) -> StorageResult<Vec<Row>> {
        (**self).list_rows(table).await
    }

    async fn create_row(
        &self,
        table: &str,
        id: RowId,
        fields: Map<String, Value>,
    ) -> StorageResult<Row> {
        (**self).create_row(table, id, fields).await
    }

    async fn update_row(
        &self,
        table: &str,
        id: &RowId,
        fields: Map<String, Value>,
    ) -> StorageResult<Row> {
        (**self).update_row(table, id, fields).await
    }

    async fn delete_row(&self, table: &str, id: &RowId) -> StorageResult<()> {
        (**self).delete_row(table, id).await
    }
}
