//! Phantom identifier resolution.

use schedsync_protocol::{value_as_id, CreatedRow, Record, RowId};
use serde_json::Value;
use std::collections::HashMap;

/// Phantom identifier to persistent identifier, for one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhantomMap {
    ids: HashMap<String, RowId>,
}

impl PhantomMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the map from the rows a create batch produced.
    pub fn from_created(rows: &[CreatedRow]) -> Self {
        let ids = rows
            .iter()
            .map(|row| (row.phantom_id.clone(), row.id.clone()))
            .collect();
        Self { ids }
    }

    /// Records one pair.
    pub fn insert(&mut self, phantom_id: impl Into<String>, id: RowId) {
        self.ids.insert(phantom_id.into(), id);
    }

    /// Returns the persistent identifier of `phantom_id`.
    pub fn get(&self, phantom_id: &str) -> Option<&RowId> {
        self.ids.get(phantom_id)
    }

    /// Returns the number of pairs.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// What [`resolve_references`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Records whose reference was rewritten.
    pub resolved: usize,
    /// Distinct reference values left as they were, in first-seen order.
    pub unresolved: Vec<String>,
}

/// Rewrites `field` of each record from a phantom to a persistent identifier.
///
/// Values that are not keys of `mapping` are left untouched: they are taken to
/// be persistent identifiers already. Records without the field are skipped.
pub fn resolve_references(records: &mut [Record], mapping: &PhantomMap, field: &str) -> Resolution {
    let mut resolution = Resolution::default();

    for record in records.iter_mut() {
        let Some(value) = record.get(field).and_then(value_as_id) else {
            continue;
        };
        match mapping.get(&value) {
            Some(id) => {
                record.insert(field, Value::from(id.clone()));
                resolution.resolved += 1;
            }
            None => {
                if !resolution.unresolved.contains(&value) {
                    resolution.unresolved.push(value);
                }
            }
        }
    }

    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assignment(value: Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    fn mapping() -> PhantomMap {
        PhantomMap::from_created(&[
            CreatedRow::new("p1", RowId::new("a1")),
            CreatedRow::new("p2", RowId::new("a2")),
        ])
    }

    #[test]
    fn rewrites_matching_values_only() {
        let mut records = vec![
            assignment(json!({ "$PhantomId": "x1", "eventId": "p1" })),
            assignment(json!({ "$PhantomId": "x2", "eventId": "e-77" })),
            assignment(json!({ "$PhantomId": "x3", "eventId": "p2" })),
            assignment(json!({ "$PhantomId": "x4" })),
        ];

        let resolution = resolve_references(&mut records, &mapping(), "eventId");

        assert_eq!(resolution.resolved, 2);
        assert_eq!(resolution.unresolved, vec!["e-77".to_owned()]);
        assert_eq!(records[0].get("eventId"), Some(&json!("a1")));
        assert_eq!(records[1].get("eventId"), Some(&json!("e-77")));
        assert_eq!(records[2].get("eventId"), Some(&json!("a2")));
        assert_eq!(records[3].get("eventId"), None);
    }

    #[test]
    fn integer_references_compare_as_text() {
        let mut map = PhantomMap::new();
        map.insert("7", RowId::new("e7"));
        let mut records = vec![assignment(json!({ "eventId": 7 }))];

        let resolution = resolve_references(&mut records, &map, "eventId");
        assert_eq!(resolution.resolved, 1);
        assert_eq!(records[0].get("eventId"), Some(&json!("e7")));
    }

    #[test]
    fn empty_mapping_leaves_everything() {
        let mut records = vec![
            assignment(json!({ "eventId": "e1" })),
            assignment(json!({ "eventId": "e1" })),
        ];
        let before = records.clone();
        let resolution = resolve_references(&mut records, &PhantomMap::new(), "eventId");
        assert_eq!(records, before);
        assert_eq!(resolution.unresolved, vec!["e1".to_owned()]);
    }
}
