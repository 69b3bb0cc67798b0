//! Test fixtures and store helpers.
//!
//! Provides seeded scheduler stores and short constructors for records,
//! rows and deltas.

use schedsync_protocol::{Collection, Delta, Record, RowId, RowRef};
use schedsync_storage::{InMemoryRowStore, Row, StoreSnapshot};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Builds a snapshot with the five scheduler tables and their default columns.
///
/// `table` names the table of each collection.
pub fn scheduler_snapshot_with(table: impl Fn(Collection) -> String) -> StoreSnapshot {
    Collection::ALL
        .into_iter()
        .fold(StoreSnapshot::new(), |snapshot, collection| {
            snapshot.with_table(table(collection), collection.default_fields().iter().copied())
        })
}

/// Builds a snapshot whose tables are named after their collections.
pub fn scheduler_snapshot() -> StoreSnapshot {
    scheduler_snapshot_with(|c| c.as_str().to_owned())
}

/// Creates an empty in-memory scheduler store.
pub fn scheduler_store() -> Arc<InMemoryRowStore> {
    Arc::new(InMemoryRowStore::from_snapshot(scheduler_snapshot()))
}

/// Builds a record from a JSON object literal.
///
/// # Panics
///
/// Panics if `value` is not an object.
pub fn record(value: Value) -> Record {
    serde_json::from_value(value).expect("record must be a JSON object")
}

/// Builds a stored row from a JSON object literal.
///
/// # Panics
///
/// Panics if `fields` is not an object.
pub fn row(id: &str, fields: Value) -> Row {
    let fields: Map<String, Value> = match fields {
        Value::Object(map) => map,
        other => panic!("row fields must be a JSON object, got {other}"),
    };
    Row::new(RowId::new(id), fields)
}

/// Stores a row as-is in the table of `collection`.
///
/// # Panics
///
/// Panics if the table does not exist.
pub fn seed_row(store: &InMemoryRowStore, collection: Collection, id: &str, fields: Value) {
    store
        .insert_row(collection.as_str(), row(id, fields))
        .expect("table must exist");
}

/// A delta that only adds records.
pub fn added(records: Vec<Record>) -> Delta {
    Delta {
        added: records,
        ..Delta::default()
    }
}

/// A delta that only updates records.
pub fn updated(records: Vec<Record>) -> Delta {
    Delta {
        updated: records,
        ..Delta::default()
    }
}

/// A delta that only removes rows.
pub fn removed(ids: &[&str]) -> Delta {
    Delta {
        removed: ids.iter().map(|id| RowRef::new(*id)).collect(),
        ..Delta::default()
    }
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use serde_json::json;

    /// A store holding one resource, one event and an assignment between them.
    pub fn assigned_event() -> Arc<InMemoryRowStore> {
        let store = scheduler_store();
        seed_row(&store, Collection::Resources, "r1", json!({ "name": "Ada" }));
        seed_row(
            &store,
            Collection::Events,
            "e1",
            json!({ "name": "Kickoff", "startDate": "2024-03-04T09:00:00" }),
        );
        seed_row(
            &store,
            Collection::Assignments,
            "a1",
            json!({ "eventId": "e1", "resourceId": "r1" }),
        );
        store
    }

    /// A store holding a calendar whose intervals are stored as text.
    pub fn stored_calendar(intervals: &str) -> Arc<InMemoryRowStore> {
        let store = scheduler_store();
        seed_row(
            &store,
            Collection::Calendars,
            "c1",
            json!({
                "$tableId": "calendars",
                "$revision": 1,
                "name": "Day shift",
                "intervals": intervals,
            }),
        );
        store
    }
}
