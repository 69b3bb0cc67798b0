//! Error types for the sync server.

use schedsync_protocol::{Collection, ProtocolError};
use schedsync_storage::StorageError;
use std::fmt;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// The store call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Row creation.
    Create,
    /// Row update.
    Update,
    /// Row deletion.
    Delete,
    /// Row listing.
    List,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::List => "list",
        })
    }
}

/// Errors that can occur in the sync server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Invalid request format.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A sub-batch exceeds the configured limit.
    #[error("too many {kind} records in {collection}: {size} > {max}")]
    BatchTooLarge {
        /// Collection of the batch.
        collection: Collection,
        /// `added`, `updated` or `removed`.
        kind: &'static str,
        /// Records in the batch.
        size: usize,
        /// Configured limit.
        max: usize,
    },

    /// The store could not report a collection's fields.
    #[error("schema lookup failed for {collection}: {source}")]
    SchemaLookup {
        /// Collection whose schema was requested.
        collection: Collection,
        /// Store failure.
        #[source]
        source: StorageError,
    },

    /// The store rejected a row operation.
    #[error("{operation} failed in {collection}: {source}")]
    Store {
        /// Collection written to.
        collection: Collection,
        /// The failed call.
        operation: Operation,
        /// Store failure.
        #[source]
        source: StorageError,
    },

    /// Records carry fields the schema does not know (strict field policy).
    #[error("unknown fields in {collection}: {}", fields.join(", "))]
    UnknownFields {
        /// Collection of the records.
        collection: Collection,
        /// The unknown field names.
        fields: Vec<String>,
    },

    /// A reference matches neither a new nor an existing row (strict reference policy).
    #[error("unresolved reference {collection}.{field} = {value}")]
    UnresolvedReference {
        /// Collection of the referencing record.
        collection: Collection,
        /// Reference field.
        field: String,
        /// Value that matched nothing.
        value: String,
    },

    /// The declared references between collections form a cycle.
    #[error("dependency cycle between collections: {0:?}")]
    DependencyCycle(Vec<Collection>),

    /// A message could not be decoded or encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ServerError {
    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        match self {
            ServerError::InvalidRequest(_)
            | ServerError::BatchTooLarge { .. }
            | ServerError::UnknownFields { .. }
            | ServerError::UnresolvedReference { .. }
            | ServerError::Protocol(_) => true,
            ServerError::Store { source, .. } => source.is_rejection(),
            ServerError::SchemaLookup { .. } | ServerError::DependencyCycle(_) => false,
        }
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schedsync_protocol::RowId;

    #[test]
    fn error_classification() {
        assert!(ServerError::InvalidRequest("bad".into()).is_client_error());
        assert!(ServerError::DependencyCycle(vec![Collection::Events]).is_server_error());

        let missing = ServerError::Store {
            collection: Collection::Resources,
            operation: Operation::Delete,
            source: StorageError::RowNotFound {
                table: "resources".into(),
                id: RowId::new("res-9"),
            },
        };
        assert!(missing.is_client_error());

        let io = ServerError::Store {
            collection: Collection::Resources,
            operation: Operation::Create,
            source: StorageError::Io(std::io::Error::other("disk full")),
        };
        assert!(io.is_server_error());
    }

    #[test]
    fn error_display() {
        let err = ServerError::Store {
            collection: Collection::Resources,
            operation: Operation::Delete,
            source: StorageError::RowNotFound {
                table: "resources".into(),
                id: RowId::new("res-9"),
            },
        };
        assert_eq!(
            err.to_string(),
            "delete failed in resources: row res-9 not found in table resources"
        );

        let err = ServerError::UnknownFields {
            collection: Collection::Events,
            fields: vec!["cls".into(), "iconCls".into()],
        };
        assert_eq!(err.to_string(), "unknown fields in events: cls, iconCls");
    }
}
