//! Server configuration.

use crate::dependency::DependencyGraph;
use schedsync_protocol::Collection;
use std::collections::BTreeMap;

/// How unknown record fields are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldPolicy {
    /// Drop fields the schema does not know.
    #[default]
    Permissive,
    /// Reject the request before any mutation.
    Strict,
}

/// How reference values that match no phantom identifier are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferencePolicy {
    /// Assume the value is already a persistent identifier.
    #[default]
    Permissive,
    /// Require the value to name an existing row of the target table.
    Strict,
}

/// Lifetime of looked-up schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaCacheMode {
    /// Look schemas up on every request.
    #[default]
    PerRequest,
    /// Keep schemas for the life of the process until invalidated.
    Process,
}

/// Store table identifier of each collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMap {
    tables: BTreeMap<Collection, String>,
}

impl TableMap {
    /// Maps every collection to a table of the same name.
    pub fn new() -> Self {
        let tables = Collection::ALL
            .into_iter()
            .map(|c| (c, c.as_str().to_owned()))
            .collect();
        Self { tables }
    }

    /// Overrides the table of `collection`.
    pub fn with_table(mut self, collection: Collection, table: impl Into<String>) -> Self {
        self.tables.insert(collection, table.into());
        self
    }

    /// Returns the table of `collection`.
    pub fn table(&self, collection: Collection) -> &str {
        self.tables
            .get(&collection)
            .map_or(collection.as_str(), String::as_str)
    }

    /// Returns the variable name that overrides the table of `collection`.
    pub fn env_key(collection: Collection) -> String {
        format!(
            "SCHEDSYNC_{}_TABLE_ID",
            collection.as_str().to_ascii_uppercase()
        )
    }

    /// Builds a map from a variable lookup; unset or empty variables keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Collection::ALL
            .into_iter()
            .fold(Self::new(), |map, collection| {
                match lookup(&Self::env_key(collection)).filter(|v| !v.trim().is_empty()) {
                    Some(table) => map.with_table(collection, table.trim()),
                    None => map,
                }
            })
    }

    /// Builds a map from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl Default for TableMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the sync server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Table identifier of each collection.
    pub tables: TableMap,
    /// Maximum records in one `added`, `updated` or `removed` list.
    pub max_batch_size: usize,
    /// Treatment of unknown fields.
    pub field_policy: FieldPolicy,
    /// Treatment of references that match no phantom identifier.
    pub reference_policy: ReferencePolicy,
    /// Schema cache lifetime.
    pub schema_cache: SchemaCacheMode,
    /// References between collections.
    pub dependencies: DependencyGraph,
}

impl ServerConfig {
    /// Creates the default scheduler configuration.
    pub fn new() -> Self {
        Self {
            tables: TableMap::new(),
            max_batch_size: 500,
            field_policy: FieldPolicy::Permissive,
            reference_policy: ReferencePolicy::Permissive,
            schema_cache: SchemaCacheMode::PerRequest,
            dependencies: DependencyGraph::scheduler(),
        }
    }

    /// Creates the default configuration with table identifiers from the environment.
    pub fn from_env() -> Self {
        Self::new().with_tables(TableMap::from_env())
    }

    /// Sets the table map.
    pub fn with_tables(mut self, tables: TableMap) -> Self {
        self.tables = tables;
        self
    }

    /// Overrides the table of one collection.
    pub fn with_table(mut self, collection: Collection, table: impl Into<String>) -> Self {
        self.tables = self.tables.with_table(collection, table);
        self
    }

    /// Sets the maximum sub-batch size.
    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size;
        self
    }

    /// Sets the field policy.
    pub fn with_field_policy(mut self, policy: FieldPolicy) -> Self {
        self.field_policy = policy;
        self
    }

    /// Sets the reference policy.
    pub fn with_reference_policy(mut self, policy: ReferencePolicy) -> Self {
        self.reference_policy = policy;
        self
    }

    /// Sets the schema cache mode.
    pub fn with_schema_cache(mut self, mode: SchemaCacheMode) -> Self {
        self.schema_cache = mode;
        self
    }

    /// Sets the dependency graph.
    pub fn with_dependencies(mut self, dependencies: DependencyGraph) -> Self {
        self.dependencies = dependencies;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}
