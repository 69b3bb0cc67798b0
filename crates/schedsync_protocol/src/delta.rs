//! Per-collection change sets.

use crate::record::{Record, RowId};
use serde::{Deserialize, Serialize};

/// A reference to a row scheduled for removal.
///
/// The client may send the whole record; everything but `id` is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRef {
    /// Persistent identifier of the row.
    pub id: RowId,
}

impl RowRef {
    /// Creates a reference to `id`.
    pub fn new(id: impl Into<RowId>) -> Self {
        Self { id: id.into() }
    }
}

/// Pending changes for one collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    /// New records, each tagged with a phantom identifier.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub added: Vec<Record>,
    /// Changed fields of existing records, each carrying its `id`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub updated: Vec<Record>,
    /// Rows to delete.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<RowRef>,
}

impl Delta {
    /// Returns true if the delta carries no changes.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    /// Returns the number of individual changes.
    pub fn len(&self) -> usize {
        self.added.len() + self.updated.len() + self.removed.len()
    }
}
