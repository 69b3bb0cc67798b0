//! # schedsync testkit
//!
//! Test utilities for schedsync.
//!
//! This crate provides:
//! - Seeded scheduler stores and record/row/delta constructors
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use schedsync_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn creates_an_event() {
//!     let store = scheduler_store();
//!     let delta = added(vec![record(json!({ "$PhantomId": "_g1", "name": "Kickoff" }))]);
//!     // ... apply through the server
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
