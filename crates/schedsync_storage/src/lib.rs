//! # Schedsync Storage
//!
//! Row store trait and implementations for the scheduler sync endpoint.
//!
//! The sync engine never talks to a database directly. Everything it needs
//! from persistence goes through [`RowStore`]: a generic create/read/update/delete
//! row API keyed by table identifier and row identifier.
//!
//! ## Design Principles
//!
//! - Each row operation is atomic on its own; nothing is coordinated across rows
//! - A table declares its schema, and rows may only carry declared attributes
//! - Keys starting with `$` are store metadata and are never written by clients
//! - Stores must be `Send + Sync` so per-row calls can run concurrently
//!
//! ## Available Stores
//!
//! - [`InMemoryRowStore`] - For testing and ephemeral use
//! - [`FileRowStore`] - Persists a JSON [`StoreSnapshot`] after every mutation
//!
//! ## Example
//!
//! ```rust
//! use schedsync_protocol::RowId;
//! use schedsync_storage::{InMemoryRowStore, RowStore};
//! use serde_json::{json, Map};
//!
//! let store = InMemoryRowStore::new().with_table("events", ["title"]);
//! let mut fields = Map::new();
//! fields.insert("title".into(), json!("Standup"));
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let row = runtime
//!     .block_on(store.create_row("events", RowId::new("e1"), fields))
//!     .unwrap();
//! assert_eq!(row.get("title"), Some(&json!("Standup")));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;
mod row;
mod snapshot;

pub use backend::RowStore;
pub use error::{StorageError, StorageResult};
pub use file::FileRowStore;
pub use memory::InMemoryRowStore;
pub use row::{is_metadata_key, Row, METADATA_PREFIX};
pub use snapshot::{StoreSnapshot, TableSnapshot};
