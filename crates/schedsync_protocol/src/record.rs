//! Records and identifiers.

use crate::collection::StructuredField;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Key of the client-generated phantom identifier on added records.
pub const PHANTOM_ID_FIELD: &str = "$PhantomId";

/// Key of the persistent identifier on updated, removed and read records.
pub const ID_FIELD: &str = "id";

/// Returns the identifier text of a JSON value.
///
/// Identifiers travel as strings, but some clients send integer keys; both are
/// accepted and integers are compared by their decimal text.
pub fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

/// A persistent row identifier assigned by the server.
///
/// Once issued, a `RowId` is never reused or changed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    /// Wraps an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh identifier for a row about to be created.
    pub fn unique() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Returns the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the identifier, returning its text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RowId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for RowId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<RowId> for Value {
    fn from(id: RowId) -> Self {
        Value::String(id.0)
    }
}

impl<'de> Deserialize<'de> for RowId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        value_as_id(&value)
            .map(RowId)
            .ok_or_else(|| D::Error::custom("expected a string or integer identifier"))
    }
}

/// Keeps an explicit `null` distinguishable from an absent key.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// A scheduler record: field name to JSON value.
///
/// The structured fields (`intervals`, `exceptionDates`, `segments`) live in
/// dedicated slots, one per [`StructuredField`]; every other key lives in an
/// ordered map. A structured field name is never a key of that map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    intervals: Option<Value>,
    #[serde(
        rename = "exceptionDates",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    exception_dates: Option<Value>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    segments: Option<Value>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from a plain JSON object.
    pub fn from_map(map: Map<String, Value>) -> Self {
        let mut record = Self::new();
        for (key, value) in map {
            record.insert(key, value);
        }
        record
    }

    /// Flattens the record back into a plain JSON object.
    pub fn into_map(self) -> Map<String, Value> {
        let Record {
            intervals,
            exception_dates,
            segments,
            mut fields,
        } = self;
        let slots = [
            (StructuredField::Intervals, intervals),
            (StructuredField::ExceptionDates, exception_dates),
            (StructuredField::Segments, segments),
        ];
        for (field, value) in slots {
            if let Some(value) = value {
                fields.insert(field.name().to_owned(), value);
            }
        }
        fields
    }

    /// Returns the slot of a structured field.
    pub fn structured(&self, field: StructuredField) -> Option<&Value> {
        match field {
            StructuredField::Intervals => self.intervals.as_ref(),
            StructuredField::ExceptionDates => self.exception_dates.as_ref(),
            StructuredField::Segments => self.segments.as_ref(),
        }
    }

    /// Returns the mutable slot of a structured field.
    pub fn structured_mut(&mut self, field: StructuredField) -> &mut Option<Value> {
        match field {
            StructuredField::Intervals => &mut self.intervals,
            StructuredField::ExceptionDates => &mut self.exception_dates,
            StructuredField::Segments => &mut self.segments,
        }
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match StructuredField::from_name(key) {
            Some(field) => self.structured(field),
            None => self.fields.get(key),
        }
    }

    /// Stores `value` under `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match StructuredField::from_name(&key) {
            Some(field) => self.structured_mut(field).replace(value),
            None => self.fields.insert(key, value),
        }
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        match StructuredField::from_name(key) {
            Some(field) => self.structured_mut(field).take(),
            None => self.fields.remove(key),
        }
    }

    /// Returns true if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates over the keys present in the record.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        StructuredField::ALL
            .into_iter()
            .filter(|field| self.structured(*field).is_some())
            .map(|field| field.name())
            .chain(self.fields.keys().map(String::as_str))
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.keys().count()
    }

    /// Returns true if the record has no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keeps only the keys for which `keep` returns true.
    pub fn retain_keys(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.fields.retain(|key, _| keep(key));
        for field in StructuredField::ALL {
            if !keep(field.name()) {
                *self.structured_mut(field) = None;
            }
        }
    }

    /// Returns the phantom identifier the client tagged this record with.
    pub fn phantom_id(&self) -> Option<String> {
        self.fields.get(PHANTOM_ID_FIELD).and_then(value_as_id)
    }

    /// Returns the persistent identifier carried by this record.
    pub fn row_id(&self) -> Option<RowId> {
        self.fields.get(ID_FIELD).and_then(value_as_id).map(RowId)
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn structured_fields_land_in_slots() {
        let r = record(json!({
            "name": "Crane",
            "intervals": [[1, 2]],
            "exceptionDates": "[]",
        }));
        assert_eq!(r.structured(StructuredField::Intervals), Some(&json!([[1, 2]])));
        assert_eq!(
            r.structured(StructuredField::ExceptionDates),
            Some(&json!("[]"))
        );
        assert_eq!(r.structured(StructuredField::Segments), None);
        assert_eq!(r.get("name"), Some(&json!("Crane")));
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn explicit_null_is_kept() {
        let r = record(json!({ "segments": null }));
        assert_eq!(r.structured(StructuredField::Segments), Some(&Value::Null));
    }

    #[test]
    fn insert_routes_structured_names() {
        let mut r = Record::new();
        r.insert("segments", json!([{ "startDate": "2024-01-01" }]));
        r.insert("title", json!("Standup"));

        let map = r.clone().into_map();
        assert_eq!(map.len(), 2);
        assert!(map.contains_key("segments"));

        assert_eq!(Record::from_map(map), r);
        assert_eq!(r.remove("segments"), Some(json!([{ "startDate": "2024-01-01" }])));
        assert!(!r.contains_key("segments"));
    }

    #[test]
    fn serialize_flattens_slots() {
        let r = record(json!({ "id": "e1", "intervals": "[[1,2]]" }));
        let value = serde_json::to_value(&r).unwrap();
        assert_eq!(value, json!({ "id": "e1", "intervals": "[[1,2]]" }));
    }

    #[test]
    fn retain_keys_covers_slots() {
        let mut r = record(json!({ "a": 1, "b": 2, "intervals": [], "segments": [] }));
        r.retain_keys(|k| k == "a" || k == "segments");
        let keys: Vec<_> = r.keys().collect();
        assert_eq!(keys, vec!["segments", "a"]);
    }

    #[test]
    fn identifiers_accept_integers() {
        let r = record(json!({ "$PhantomId": "_generated1", "id": 42 }));
        assert_eq!(r.phantom_id().as_deref(), Some("_generated1"));
        assert_eq!(r.row_id(), Some(RowId::new("42")));

        let id: RowId = serde_json::from_value(json!(7)).unwrap();
        assert_eq!(id.as_str(), "7");
        assert!(serde_json::from_value::<RowId>(json!(1.5)).is_err());
    }

    #[test]
    fn unique_ids_differ() {
        let a = RowId::unique();
        let b = RowId::unique();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn key() -> impl Strategy<Value = String> {
            prop_oneof![
                prop::sample::select(vec![
                    "intervals",
                    "exceptionDates",
                    "segments",
                    "name",
                    PHANTOM_ID_FIELD,
                ])
                .prop_map(str::to_owned),
                "[a-z]{1,8}",
            ]
        }

        fn object() -> impl Strategy<Value = Map<String, Value>> {
            prop::collection::btree_map(key(), any::<i64>(), 0..8)
                .prop_map(|m| m.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
        }

        proptest! {
            #[test]
            fn structured_names_never_reach_the_map(map in object()) {
                let record = Record::from_map(map.clone());
                for field in StructuredField::ALL {
                    prop_assert!(!record.fields.contains_key(field.name()));
                }
                prop_assert_eq!(record.into_map(), map);
            }

            #[test]
            fn json_round_trip(map in object()) {
                let record = Record::from_map(map);
                let json = serde_json::to_value(&record).unwrap();
                prop_assert_eq!(serde_json::from_value::<Record>(json).unwrap(), record);
            }
        }
    }
}
