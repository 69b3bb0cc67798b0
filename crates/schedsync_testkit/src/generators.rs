//! Property-based test generators using proptest.
//!
//! Values never contain floats, so JSON text round-trips are exact.

use proptest::prelude::*;
use schedsync_protocol::{Record, StructuredField, PHANTOM_ID_FIELD};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Field names records and schemas draw from.
///
/// Includes the structured fields and the client bookkeeping keys, so
/// generated records and schemas overlap.
pub const FIELD_POOL: &[&str] = &[
    "name",
    "startDate",
    "endDate",
    "eventId",
    "resourceId",
    "cls",
    "expanded",
    "intervals",
    "exceptionDates",
    "segments",
    "id",
    PHANTOM_ID_FIELD,
];

/// Strategy for generating field names, mostly from [`FIELD_POOL`].
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => prop::sample::select(FIELD_POOL).prop_map(str::to_owned),
        1 => prop::string::string_regex("[a-z][a-zA-Z]{0,11}").expect("Invalid regex"),
    ]
}

/// Strategy for generating JSON scalars.
pub fn json_leaf_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[ -~]{0,16}".prop_map(Value::from),
    ]
}

/// Strategy for generating nested JSON values.
pub fn json_value_strategy() -> impl Strategy<Value = Value> {
    json_leaf_strategy().prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-zA-Z]{1,8}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Strategy for generating structured field contents: arrays or objects.
pub fn structured_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        prop::collection::vec(json_value_strategy(), 0..6).prop_map(Value::Array),
        prop::collection::btree_map("[a-zA-Z]{1,8}", json_value_strategy(), 0..6)
            .prop_map(|m| Value::Object(m.into_iter().collect())),
    ]
}

/// Strategy for generating client records.
///
/// Structured fields, when present, hold nested values rather than text.
pub fn record_strategy() -> impl Strategy<Value = Record> {
    (
        prop::collection::btree_map(field_name_strategy(), json_value_strategy(), 0..8),
        prop::collection::vec(
            (prop::sample::select(StructuredField::ALL.to_vec()), structured_value_strategy()),
            0..3,
        ),
    )
        .prop_map(|(fields, structured)| {
            let mut map: Map<String, Value> = fields.into_iter().collect();
            for (field, value) in structured {
                map.insert(field.name().to_owned(), value);
            }
            Record::from_map(map)
        })
}

/// Strategy for generating schemas as subsets of [`FIELD_POOL`].
pub fn schema_fields_strategy() -> impl Strategy<Value = BTreeSet<String>> {
    prop::sample::subsequence(FIELD_POOL, 0..=FIELD_POOL.len())
        .prop_map(|fields| fields.into_iter().map(str::to_owned).collect())
}

/// Strategy for generating distinct phantom identifiers.
pub fn phantom_ids_strategy(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(0u32..10_000, 0..max)
        .prop_map(|ids| ids.into_iter().map(|n| format!("_generated{n}")).collect())
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_float(value: &Value) -> bool {
        match value {
            Value::Number(n) => n.is_f64(),
            Value::Array(items) => items.iter().any(has_float),
            Value::Object(map) => map.values().any(has_float),
            _ => false,
        }
    }

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn json_values_have_no_floats(value in json_value_strategy()) {
            prop_assert!(!has_float(&value));
        }

        #[test]
        fn structured_values_are_containers(value in structured_value_strategy()) {
            prop_assert!(value.is_array() || value.is_object());
        }

        #[test]
        fn schema_fields_come_from_pool(fields in schema_fields_strategy()) {
            prop_assert!(fields.iter().all(|f| FIELD_POOL.contains(&f.as_str())));
        }

        #[test]
        fn phantom_ids_are_distinct(ids in phantom_ids_strategy(16)) {
            let unique: BTreeSet<_> = ids.iter().collect();
            prop_assert_eq!(unique.len(), ids.len());
        }
    }
}
