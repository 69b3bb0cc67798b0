//! # Schedsync Protocol
//!
//! Wire types and JSON codecs for the scheduler sync endpoint.
//!
//! This crate provides:
//! - [`Collection`] and [`StructuredField`], the fixed vocabulary of the scheduler
//! - [`Record`], a loosely keyed record with explicit slots for structured fields
//! - [`Delta`], the added/updated/removed triple pushed for one collection
//! - Request and response envelopes ([`WriteRequest`], [`WriteResponse`], [`ReadResponse`])
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod delta;
mod error;
mod messages;
mod record;

pub use collection::{Collection, StructuredField};
pub use delta::{Delta, RowRef};
pub use error::{ProtocolError, ProtocolResult};
pub use messages::{
    CreatedRow, ReadResponse, RequestId, RowsPayload, SyncMessage, WriteRequest, WriteResponse,
};
pub use record::{value_as_id, Record, RowId, ID_FIELD, PHANTOM_ID_FIELD};
