//! Property tests for sanitization and phantom resolution.

use proptest::prelude::*;
use schedsync_protocol::{CreatedRow, Record, RowId, StructuredField, ID_FIELD, PHANTOM_ID_FIELD};
use schedsync_server::{
    parse_structured, resolve_references, sanitize, serialize_structured, unknown_fields,
    PhantomMap, Schema,
};
use schedsync_testkit::prelude::*;
use serde_json::{json, Value};

proptest! {
    #![proptest_config(PropTestConfig::default().to_proptest_config())]

    #[test]
    fn sanitize_is_idempotent(record in record_strategy(), fields in schema_fields_strategy()) {
        let schema = Schema::from(fields);
        let once = sanitize(&schema, record);
        let twice = sanitize(&schema, once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn sanitized_keys_are_in_schema(record in record_strategy(), fields in schema_fields_strategy()) {
        let schema = Schema::from(fields);
        let clean = sanitize(&schema, record);
        prop_assert!(clean.keys().all(|key| schema.contains(key)));
        prop_assert!(unknown_fields(&schema, &clean).is_empty());
    }

    #[test]
    fn sanitize_keeps_known_plain_values(record in record_strategy(), fields in schema_fields_strategy()) {
        let schema = Schema::from(fields);
        let clean = sanitize(&schema, record.clone());
        for key in record.keys().filter(|k| schema.contains(k)) {
            if StructuredField::from_name(key).is_none() {
                prop_assert_eq!(clean.get(key), record.get(key));
            }
        }
    }

    #[test]
    fn structured_fields_are_text_after_sanitize(record in record_strategy()) {
        let schema = Schema::new(StructuredField::ALL.map(|f| f.name()));
        let clean = sanitize(&schema, record.clone());
        for field in StructuredField::ALL {
            match (record.structured(field), clean.structured(field)) {
                (Some(Value::Null), after) => prop_assert_eq!(after, Some(&Value::Null)),
                (Some(Value::String(before)), Some(after)) => prop_assert_eq!(after, &json!(before)),
                (Some(before), Some(Value::String(text))) => {
                    prop_assert_eq!(&parse_structured(text).unwrap(), before);
                }
                (None, None) => {}
                other => prop_assert!(false, "unexpected slot pair {:?}", other),
            }
        }
    }

    #[test]
    fn structured_text_round_trips(value in structured_value_strategy()) {
        let text = serialize_structured(&value);
        prop_assert_eq!(parse_structured(&text).unwrap(), value);
    }

    #[test]
    fn resolution_rewrites_exactly_the_phantoms(
        phantoms in phantom_ids_strategy(12),
        persistent in prop::collection::vec("[a-f0-9]{8}", 0..6),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..16),
    ) {
        let mapping = PhantomMap::from_created(
            &phantoms
                .iter()
                .enumerate()
                .map(|(n, p)| CreatedRow::new(p.as_str(), RowId::new(format!("row{n}"))))
                .collect::<Vec<_>>(),
        );

        // Each pick chooses a phantom or a persistent id for one record.
        let choices: Vec<String> = phantoms.iter().chain(&persistent).cloned().collect();
        prop_assume!(!choices.is_empty());
        let values: Vec<String> = picks.iter().map(|i| i.get(&choices).clone()).collect();

        let mut records: Vec<Record> = values
            .iter()
            .map(|v| record(json!({ PHANTOM_ID_FIELD: "_x", "eventId": v })))
            .collect();
        let resolution = resolve_references(&mut records, &mapping, "eventId");

        let mut expected_resolved = 0;
        for (record, value) in records.iter().zip(&values) {
            let now = record.get("eventId").and_then(Value::as_str).unwrap();
            match mapping.get(value) {
                Some(id) => {
                    expected_resolved += 1;
                    prop_assert_eq!(now, id.as_str());
                }
                None => {
                    prop_assert_eq!(now, value.as_str());
                    prop_assert!(resolution.unresolved.contains(value));
                }
            }
        }
        prop_assert_eq!(resolution.resolved, expected_resolved);
    }
}

#[test]
fn bookkeeping_keys_never_reach_the_store() {
    let schema = Schema::new(["name"]);
    let clean = sanitize(
        &schema,
        record(json!({ PHANTOM_ID_FIELD: "_g1", ID_FIELD: "e1", "name": "A" })),
    );
    assert_eq!(clean, record(json!({ "name": "A" })));
}
