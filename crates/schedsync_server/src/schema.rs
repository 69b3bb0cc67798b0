//! Collection schemas and the read-through schema cache.

use crate::config::SchemaCacheMode;
use parking_lot::RwLock;
use schedsync_storage::{RowStore, StorageResult};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// The field names a table accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: BTreeSet<String>,
}

impl Schema {
    /// Creates a schema from field names.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true if the schema declares `field`.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    /// Iterates over the declared fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    /// Returns the number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no field is declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<BTreeSet<String>> for Schema {
    fn from(fields: BTreeSet<String>) -> Self {
        Self { fields }
    }
}

/// Read-through cache of table schemas.
///
/// In [`SchemaCacheMode::PerRequest`] every lookup goes to the store. In
/// [`SchemaCacheMode::Process`] a schema is fetched once and kept until
/// [`SchemaCache::invalidate`] or [`SchemaCache::clear`] is called.
#[derive(Debug)]
pub struct SchemaCache {
    mode: SchemaCacheMode,
    entries: RwLock<HashMap<String, Arc<Schema>>>,
}

impl SchemaCache {
    /// Creates an empty cache.
    pub fn new(mode: SchemaCacheMode) -> Self {
        Self {
            mode,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cache mode.
    pub fn mode(&self) -> SchemaCacheMode {
        self.mode
    }

    /// Returns the schema of `table`, consulting the store when needed.
    pub async fn fetch<S: RowStore + ?Sized>(
        &self,
        store: &S,
        table: &str,
    ) -> StorageResult<Arc<Schema>> {
        let caching = self.mode == SchemaCacheMode::Process;
        if caching {
            let cached = self.entries.read().get(table).cloned();
            if let Some(schema) = cached {
                return Ok(schema);
            }
        }

        let schema = Arc::new(Schema::from(store.list_schema(table).await?));
        if caching {
            self.entries
                .write()
                .insert(table.to_owned(), Arc::clone(&schema));
        }
        Ok(schema)
    }

    /// Drops the cached schema of `table`.
    pub fn invalidate(&self, table: &str) {
        self.entries.write().remove(table);
    }

    /// Drops every cached schema.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Returns the number of cached schemas.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
