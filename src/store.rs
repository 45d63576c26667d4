//! Record store: owns every candidate place for the run.
//!
//! All later phases hold only `PlaceId`s into this store.

use std::collections::BTreeMap;

use tracing::warn;

use crate::models::{PlaceId, PlaceRecord};

/// Keyed by id so iteration is always in ascending id order, whatever
/// order the extract arrives in.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: BTreeMap<PlaceId, PlaceRecord>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record. The first record seen for an id wins.
    pub fn insert(&mut self, record: PlaceRecord) -> bool {
        if self.records.contains_key(&record.id) {
            warn!("Duplicate place id {} ({}), keeping first", record.id, record.name);
            return false;
        }

        self.records.insert(record.id, record);
        true
    }

    pub fn get(&self, id: PlaceId) -> Option<&PlaceRecord> {
        self.records.get(&id)
    }

    /// Ids in ascending order; the processing order for every phase.
    pub fn ids(&self) -> impl Iterator<Item = PlaceId> + '_ {
        self.records.keys().copied()
    }

    /// Records in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &PlaceRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<PlaceRecord> for RecordStore {
    fn from_iter<T: IntoIterator<Item = PlaceRecord>>(iter: T) -> Self {
        let mut store = RecordStore::new();
        for record in iter {
            store.insert(record);
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdminUnit, GeoPoint};

    fn place(id: PlaceId, name: &str) -> PlaceRecord {
        PlaceRecord::new(id, name, AdminUnit::new("PA", "Lancaster"), GeoPoint::new(40.0, -76.3))
    }

    #[test]
    fn test_ids_sorted_regardless_of_insert_order() {
        let store: RecordStore = vec![place(30, "C"), place(10, "A"), place(20, "B")]
            .into_iter()
            .collect();

        assert_eq!(store.ids().collect::<Vec<_>>(), vec![10, 20, 30]);
        let names: Vec<&str> = store.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_reverse_sorted_input() {
        let store: RecordStore = (0..50_000).rev().map(|id| place(id, "P")).collect();

        assert_eq!(store.len(), 50_000);
        assert_eq!(store.ids().next(), Some(0));
        assert_eq!(store.ids().last(), Some(49_999));
        assert!(store.ids().zip(store.ids().skip(1)).all(|(a, b)| a < b));
    }

    #[test]
    fn test_duplicate_id_keeps_first() {
        let mut store = RecordStore::new();
        assert!(store.insert(place(1, "First")));
        assert!(!store.insert(place(1, "Second")));

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(1).map(|r| r.name.as_str()), Some("First"));
    }

    #[test]
    fn test_empty_store() {
        let store = RecordStore::new();
        assert!(store.is_empty());
        assert!(store.get(1).is_none());
        assert_eq!(store.iter().count(), 0);
    }
}
