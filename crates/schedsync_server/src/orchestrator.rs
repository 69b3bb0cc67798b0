//! Change-set orchestration across collections.

use crate::config::{FieldPolicy, ReferencePolicy, ServerConfig};
use crate::error::{Operation, ServerError, ServerResult};
use crate::mutator::RowMutator;
use crate::resolve::{resolve_references, PhantomMap};
use crate::sanitize::{declean, unknown_fields};
use crate::schema::{Schema, SchemaCache};
use futures::future::try_join_all;
use schedsync_protocol::{
    value_as_id, Collection, CreatedRow, Delta, Record, RequestId, WriteRequest, WriteResponse,
};
use schedsync_storage::RowStore;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Rows created by one change set, per collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    created: BTreeMap<Collection, Vec<CreatedRow>>,
}

impl SyncResult {
    /// Returns the rows created in `collection`, in request order.
    pub fn created(&self, collection: Collection) -> &[CreatedRow] {
        self.created
            .get(&collection)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the total number of created rows.
    pub fn created_count(&self) -> usize {
        self.created.values().map(Vec::len).sum()
    }

    /// Returns true if nothing was created.
    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
    }

    /// Builds the success envelope; collections without creations are omitted.
    pub fn into_response(self, request_id: Option<RequestId>) -> WriteResponse {
        self.created
            .into_iter()
            .fold(WriteResponse::success(request_id), |response, (collection, rows)| {
                response.with_rows(collection, rows)
            })
    }
}

/// One present collection, ready to be applied.
struct Step {
    collection: Collection,
    delta: Delta,
    schema: Arc<Schema>,
}

/// Applies change sets to a row store.
///
/// Collections are applied one after another in dependency order, so that
/// references to rows created earlier in the same request can be rewritten
/// from phantom to persistent identifiers. Within a collection, creates run
/// first, then deletes, then updates; the records of each step are sent
/// concurrently.
///
/// There is no rollback: when a step fails, everything applied before it
/// stays applied and the remaining collections are skipped.
pub struct ChangeSetOrchestrator<S: ?Sized> {
    config: ServerConfig,
    order: Vec<Collection>,
    schemas: SchemaCache,
    store: Arc<S>,
}

impl<S: RowStore + ?Sized> ChangeSetOrchestrator<S> {
    /// Creates an orchestrator over `store`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::DependencyCycle`] if the configured references
    /// cannot be ordered.
    pub fn new(store: Arc<S>, config: ServerConfig) -> ServerResult<Self> {
        let order = config.dependencies.processing_order()?;
        let schemas = SchemaCache::new(config.schema_cache);
        Ok(Self {
            config,
            order,
            schemas,
            store,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the order collections are applied in.
    pub fn order(&self) -> &[Collection] {
        &self.order
    }

    /// Returns the schema cache.
    pub fn schemas(&self) -> &SchemaCache {
        &self.schemas
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn table(&self, collection: Collection) -> &str {
        self.config.tables.table(collection)
    }

    /// Applies a change set.
    ///
    /// Validation, schema lookups and policy checks all happen before the
    /// first mutation; a failure there leaves the store untouched.
    ///
    /// # Errors
    ///
    /// Returns the first validation, lookup, policy or store failure.
    pub async fn apply_change_set(&self, mut request: WriteRequest) -> ServerResult<SyncResult> {
        let request_id = request.request_id.take();
        let deltas: Vec<(Collection, Delta)> = self
            .order
            .iter()
            .filter_map(|c| request.take_delta(*c).map(|delta| (*c, delta)))
            .collect();

        self.validate(&deltas)?;
        let steps = self.load_schemas(deltas).await?;
        if self.config.field_policy == FieldPolicy::Strict {
            check_fields(&steps)?;
        }
        if self.config.reference_policy == ReferencePolicy::Strict {
            self.check_references(&steps).await?;
        }

        let mut phantoms: HashMap<Collection, PhantomMap> = HashMap::new();
        let mut result = SyncResult::default();

        for step in steps {
            let Step {
                collection,
                delta,
                schema,
            } = step;
            let Delta {
                mut added,
                updated,
                removed,
            } = delta;

            let empty = PhantomMap::new();
            for reference in self.config.dependencies.references_from(collection) {
                let mapping = phantoms.get(&reference.target).unwrap_or(&empty);
                let resolution = resolve_references(&mut added, mapping, &reference.field);
                debug!(
                    collection = %collection,
                    field = %reference.field,
                    resolved = resolution.resolved,
                    unresolved = resolution.unresolved.len(),
                    "resolved references"
                );
            }

            let mutator =
                RowMutator::new(self.store.as_ref(), collection, self.table(collection), &schema);
            let created = mutator.create_many(added).await?;
            mutator.delete_many(&removed).await?;
            mutator.update_many(updated).await?;

            if !created.is_empty() {
                phantoms.insert(collection, PhantomMap::from_created(&created));
                result.created.insert(collection, created);
            }
        }

        info!(
            request_id = ?request_id,
            created = result.created_count(),
            "change set applied"
        );
        Ok(result)
    }

    /// Applies a change set and wraps the outcome for the client.
    ///
    /// # Errors
    ///
    /// Same as [`apply_change_set`](Self::apply_change_set).
    pub async fn apply(&self, request: WriteRequest) -> ServerResult<WriteResponse> {
        let request_id = request.request_id.clone();
        let result = self.apply_change_set(request).await?;
        Ok(result.into_response(request_id))
    }

    fn validate(&self, deltas: &[(Collection, Delta)]) -> ServerResult<()> {
        let max = self.config.max_batch_size;
        for (collection, delta) in deltas {
            let sizes = [
                ("added", delta.added.len()),
                ("updated", delta.updated.len()),
                ("removed", delta.removed.len()),
            ];
            for (kind, size) in sizes {
                if size > max {
                    return Err(ServerError::BatchTooLarge {
                        collection: *collection,
                        kind,
                        size,
                        max,
                    });
                }
            }

            if let Some(index) = delta.added.iter().position(|r| r.phantom_id().is_none()) {
                return Err(ServerError::InvalidRequest(format!(
                    "added record {index} in {collection} has no phantom id"
                )));
            }
            if let Some(index) = delta.updated.iter().position(|r| r.row_id().is_none()) {
                return Err(ServerError::InvalidRequest(format!(
                    "updated record {index} in {collection} has no id"
                )));
            }
        }
        Ok(())
    }

    async fn load_schemas(&self, deltas: Vec<(Collection, Delta)>) -> ServerResult<Vec<Step>> {
        let lookups = deltas.iter().map(|(collection, _)| {
            let collection = *collection;
            async move {
                self.schemas
                    .fetch(self.store.as_ref(), self.table(collection))
                    .await
                    .map_err(|source| ServerError::SchemaLookup { collection, source })
            }
        });
        let schemas = try_join_all(lookups).await?;

        Ok(deltas
            .into_iter()
            .zip(schemas)
            .map(|((collection, delta), schema)| Step {
                collection,
                delta,
                schema,
            })
            .collect())
    }

    async fn check_references(&self, steps: &[Step]) -> ServerResult<()> {
        for step in steps {
            for reference in self.config.dependencies.references_from(step.collection) {
                let phantom_ids: HashSet<String> = steps
                    .iter()
                    .filter(|s| s.collection == reference.target)
                    .flat_map(|s| s.delta.added.iter().filter_map(Record::phantom_id))
                    .collect();

                let mut pending = Vec::new();
                for record in &step.delta.added {
                    if let Some(value) = record.get(&reference.field).and_then(value_as_id) {
                        if !phantom_ids.contains(&value) && !pending.contains(&value) {
                            pending.push(value);
                        }
                    }
                }
                if pending.is_empty() {
                    continue;
                }

                let existing: HashSet<String> = self
                    .store
                    .list_rows(self.table(reference.target))
                    .await
                    .map_err(|source| ServerError::Store {
                        collection: reference.target,
                        operation: Operation::List,
                        source,
                    })?
                    .into_iter()
                    .map(|row| row.id.into_string())
                    .collect();

                if let Some(value) = pending.into_iter().find(|v| !existing.contains(v)) {
                    return Err(ServerError::UnresolvedReference {
                        collection: step.collection,
                        field: reference.field.clone(),
                        value,
                    });
                }
            }
        }
        Ok(())
    }

    /// Lists every collection and returns the rows as the client sees them.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Store`] if any table cannot be listed.
    pub async fn read_all(&self) -> ServerResult<BTreeMap<Collection, Vec<Record>>> {
        let listings = Collection::ALL.into_iter().map(|collection| async move {
            let rows = self
                .store
                .list_rows(self.table(collection))
                .await
                .map_err(|source| ServerError::Store {
                    collection,
                    operation: Operation::List,
                    source,
                })?;
            let records: Vec<Record> = rows.iter().map(declean).collect();
            Ok::<_, ServerError>((collection, records))
        });

        let tables = try_join_all(listings).await?;
        let total: usize = tables.iter().map(|(_, rows)| rows.len()).sum();
        debug!(rows = total, "read all collections");
        Ok(tables.into_iter().collect())
    }
}

fn check_fields(steps: &[Step]) -> ServerResult<()> {
    for step in steps {
        let mut fields: Vec<String> = Vec::new();
        for record in step.delta.added.iter().chain(&step.delta.updated) {
            for field in unknown_fields(&step.schema, record) {
                if !fields.contains(&field) {
                    fields.push(field);
                }
            }
        }
        if !fields.is_empty() {
            return Err(ServerError::UnknownFields {
                collection: step.collection,
                fields,
            });
        }
    }
    Ok(())
}
