//! # schedsync server
//!
//! Change-set reconciliation engine behind a scheduler widget's sync endpoint.
//!
//! This crate provides:
//! - Field sanitization against table schemas
//! - Concurrent row mutation per collection
//! - Phantom identifier resolution across collections
//! - Multi-collection change-set orchestration
//!
//! # Architecture
//!
//! The server holds no row data of its own. Every read and write goes through
//! a [`RowStore`](schedsync_storage::RowStore); the only state kept between
//! requests is the optional schema cache.
//!
//! # Protocol
//!
//! A write request carries, per collection, the records the client added,
//! updated and removed. New records are tagged with a client-generated
//! phantom id. The server:
//! 1. Validates the request and looks up the schemas it needs
//! 2. Applies collections in dependency order (resources and events before
//!    assignments), creates before deletes before updates
//! 3. Rewrites references to rows created earlier in the same request
//! 4. Answers with the `{ phantomId, id }` pairs of every created row
//!
//! ```rust,ignore
//! use schedsync_server::{ServerConfig, SyncServer};
//!
//! let server = SyncServer::new(ServerConfig::from_env(), store)?;
//! let response_json = server.handle_write_json(&body).await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod dependency;
mod error;
mod handler;
mod mutator;
mod orchestrator;
mod resolve;
mod sanitize;
mod schema;
mod server;

pub use config::{FieldPolicy, ReferencePolicy, SchemaCacheMode, ServerConfig, TableMap};
pub use dependency::{DependencyGraph, Reference};
pub use error::{Operation, ServerError, ServerResult};
pub use handler::{HandlerContext, RequestHandler, READ_FAILURE_MESSAGE};
pub use mutator::RowMutator;
pub use orchestrator::{ChangeSetOrchestrator, SyncResult};
pub use resolve::{resolve_references, PhantomMap, Resolution};
pub use sanitize::{declean, parse_structured, sanitize, serialize_structured, unknown_fields};
pub use schema::{Schema, SchemaCache};
pub use server::SyncServer;
