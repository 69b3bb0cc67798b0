//! Field sanitization for writes and row cleaning for reads.

use crate::schema::Schema;
use schedsync_protocol::{Record, StructuredField, ID_FIELD, PHANTOM_ID_FIELD};
use schedsync_storage::Row;
use serde_json::Value;

/// Encodes a structured value as the compact JSON text the store keeps.
pub fn serialize_structured(value: &Value) -> String {
    value.to_string()
}

/// Decodes structured text read from the store.
pub fn parse_structured(text: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(text)
}

/// Reduces `record` to the fields `schema` declares.
///
/// Unknown keys (phantom id, UI-only fields, dropped columns) are removed
/// without error. Retained structured fields that are not already text are
/// replaced by their JSON text; text and `null` are left as they are, so
/// sanitizing twice gives the same record.
pub fn sanitize(schema: &Schema, mut record: Record) -> Record {
    record.retain_keys(|key| schema.contains(key));
    for field in StructuredField::ALL {
        if let Some(value) = record.structured_mut(field) {
            if !(value.is_string() || value.is_null()) {
                *value = Value::String(serialize_structured(value));
            }
        }
    }
    record
}

/// Returns the keys [`sanitize`] would drop, ignoring the client bookkeeping keys.
pub fn unknown_fields(schema: &Schema, record: &Record) -> Vec<String> {
    record
        .keys()
        .filter(|key| *key != PHANTOM_ID_FIELD && *key != ID_FIELD && !schema.contains(key))
        .map(str::to_owned)
        .collect()
}

/// Turns a stored row into the record the client sees.
///
/// Metadata keys and `null` values are dropped, `id` is set to the row's
/// persistent identifier, and structured text is parsed back. Text that does
/// not parse is returned unchanged.
pub fn declean(row: &Row) -> Record {
    let mut record: Record = row
        .attributes()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    record.insert(ID_FIELD, Value::from(row.id.clone()));

    for field in StructuredField::ALL {
        let parsed = match record.structured(field) {
            Some(Value::String(text)) => parse_structured(text).ok(),
            _ => None,
        };
        if let Some(parsed) = parsed {
            *record.structured_mut(field) = Some(parsed);
        }
    }
    record
}
