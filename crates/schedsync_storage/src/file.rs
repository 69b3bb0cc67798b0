//! File-backed row store for persistent storage.

use crate::backend::RowStore;
use crate::error::StorageResult;
use crate::memory::InMemoryRowStore;
use crate::row::Row;
use crate::snapshot::StoreSnapshot;
use async_trait::async_trait;
use schedsync_protocol::RowId;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// A row store persisted as a single JSON snapshot file.
///
/// Rows are served from memory. After every mutation the whole store is
/// written to `<path>.tmp` and renamed over `<path>`, so the file always
/// holds a complete snapshot. If that write fails, the mutation is taken
/// back in memory too and the caller gets the I/O error.
///
/// # Example
///
/// ```no_run
/// use schedsync_storage::{FileRowStore, StoreSnapshot};
/// use std::path::Path;
///
/// let snapshot = StoreSnapshot::new().with_table("events", ["title"]);
/// let store = FileRowStore::create(Path::new("scheduler.json"), snapshot).unwrap();
/// ```
#[derive(Debug)]
pub struct FileRowStore {
    path: PathBuf,
    inner: InMemoryRowStore,
    persist_lock: Mutex<()>,
}

impl FileRowStore {
    /// Opens an existing snapshot file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid snapshot.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let snapshot = StoreSnapshot::from_json(&json)?;
        Ok(Self::with_snapshot(path, snapshot))
    }

    /// Writes `snapshot` to `path` (replacing any existing file) and opens it.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories or the file cannot be written.
    pub fn create(path: &Path, snapshot: StoreSnapshot) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, snapshot.to_json_pretty()?)?;
        Ok(Self::with_snapshot(path, snapshot))
    }

    fn with_snapshot(path: &Path, snapshot: StoreSnapshot) -> Self {
        Self {
            path: path.to_path_buf(),
            inner: InMemoryRowStore::from_snapshot(snapshot),
            persist_lock: Mutex::new(()),
        }
    }

    /// Returns the path of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        self.inner.snapshot()
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    async fn write_snapshot(&self) -> StorageResult<()> {
        let json = self.inner.snapshot().to_json_pretty()?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Applies a mutation in memory and persists it, reverting on write failure.
    ///
    /// The lock is held across both halves so a revert never discards a
    /// later mutation.
    async fn commit<T>(
        &self,
        apply: impl FnOnce() -> StorageResult<(T, Undo)>,
    ) -> StorageResult<T> {
        let _guard = self.persist_lock.lock().await;
        let (value, undo) = apply()?;
        if let Err(e) = self.write_snapshot().await {
            undo.revert(&self.inner);
            return Err(e);
        }
        Ok(value)
    }
}

/// How to take back an in-memory mutation.
enum Undo {
    Remove { table: String, id: RowId },
    Restore { table: String, row: Row },
}

impl Undo {
    fn revert(self, inner: &InMemoryRowStore) {
        // Tables are never dropped, so the revert cannot miss its table.
        let _ = match self {
            Undo::Remove { table, id } => inner.delete(&table, &id).map(drop),
            Undo::Restore { table, row } => inner.insert_row(&table, row),
        };
    }
}

#[async_trait]
impl RowStore for FileRowStore {
    async fn list_schema(&self, table: &str) -> StorageResult<BTreeSet<String>> {
        self.inner.schema_of(table)
    }

    async fn list_rows(&self, table: &str) -> StorageResult<Vec<Row>> {
        self.inner.rows_of(table)
    }

    async fn create_row(
        &self,
        table: &str,
        id: RowId,
        fields: Map<String, Value>,
    ) -> StorageResult<Row> {
        self.commit(|| {
            let row = self.inner.create(table, id, fields)?;
            let undo = Undo::Remove {
                table: table.to_owned(),
                id: row.id.clone(),
            };
            Ok((row, undo))
        })
        .await
    }

    async fn update_row(
        &self,
        table: &str,
        id: &RowId,
        fields: Map<String, Value>,
    ) -> StorageResult<Row> {
        self.commit(|| {
            let (row, previous) = self.inner.update(table, id, fields)?;
            let undo = Undo::Restore {
                table: table.to_owned(),
                row: previous,
            };
            Ok((row, undo))
        })
        .await
    }

    async fn delete_row(&self, table: &str, id: &RowId) -> StorageResult<()> {
        self.commit(|| {
            let row = self.inner.delete(table, id)?;
            let undo = Undo::Restore {
                table: table.to_owned(),
                row,
            };
            Ok(((), undo))
        })
        .await
    }
}
