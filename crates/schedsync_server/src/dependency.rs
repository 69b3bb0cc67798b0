//! References between collections and the order they impose.

use crate::error::{ServerError, ServerResult};
use schedsync_protocol::Collection;

/// A foreign-key field of one collection pointing at rows of another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Collection holding the field.
    pub dependent: Collection,
    /// Field name.
    pub field: String,
    /// Collection the field points at.
    pub target: Collection,
}

/// Declared references between collections.
///
/// A collection is processed only after every collection it references, so
/// that phantom identifiers in its new records can be rewritten first. Adding
/// a reference is a data change; the traversal follows automatically.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    references: Vec<Reference>,
}

impl DependencyGraph {
    /// Creates a graph with no references.
    pub fn new() -> Self {
        Self::default()
    }

    /// The scheduler's references: assignments point at events and resources.
    pub fn scheduler() -> Self {
        Self::new()
            .with_reference(Collection::Assignments, "eventId", Collection::Events)
            .with_reference(Collection::Assignments, "resourceId", Collection::Resources)
    }

    /// Declares that `dependent.field` holds identifiers of `target` rows.
    pub fn with_reference(
        mut self,
        dependent: Collection,
        field: impl Into<String>,
        target: Collection,
    ) -> Self {
        self.references.push(Reference {
            dependent,
            field: field.into(),
            target,
        });
        self
    }

    /// Returns every declared reference.
    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    /// Returns the references held by `dependent`.
    pub fn references_from(&self, dependent: Collection) -> impl Iterator<Item = &Reference> {
        self.references
            .iter()
            .filter(move |r| r.dependent == dependent)
    }

    /// Orders all collections so every referenced collection precedes its dependents.
    ///
    /// Ties are broken by canonical collection order.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::DependencyCycle`] if the references form a cycle,
    /// including a collection referencing itself.
    pub fn processing_order(&self) -> ServerResult<Vec<Collection>> {
        let mut order = Vec::with_capacity(Collection::ALL.len());
        let mut remaining = Collection::ALL.to_vec();

        while !remaining.is_empty() {
            let ready = remaining.iter().position(|c| {
                self.references_from(*c)
                    .all(|r| order.contains(&r.target))
            });
            match ready {
                Some(index) => order.push(remaining.remove(index)),
                None => return Err(ServerError::DependencyCycle(remaining)),
            }
        }

        Ok(order)
    }
}
