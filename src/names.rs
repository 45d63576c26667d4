//! Name index: groups places by canonical name and exposes the ambiguity set.

use hashbrown::{HashMap, HashSet};
use tracing::info;

use crate::models::PlaceId;
use crate::store::RecordStore;

/// Fold a display name into its grouping key.
///
/// Lowercases, drops anything that is neither alphanumeric nor whitespace,
/// and collapses whitespace runs.
pub fn canonical_key(name: &str) -> String {
    let folded: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Default)]
pub struct NameIndex {
    buckets: HashMap<String, Vec<PlaceId>>,
    ambiguous: HashSet<PlaceId>,
}

impl NameIndex {
    /// Build over every record in the store.
    ///
    /// Membership of the ambiguity set is fixed here and never changes,
    /// even when a member is later excluded.
    pub fn build(store: &RecordStore) -> Self {
        let mut buckets: HashMap<String, Vec<PlaceId>> = HashMap::new();

        for record in store.iter() {
            buckets
                .entry(canonical_key(&record.name))
                .or_default()
                .push(record.id);
        }

        let ambiguous: HashSet<PlaceId> = buckets
            .values()
            .filter(|ids| ids.len() > 1)
            .flat_map(|ids| ids.iter().copied())
            .collect();

        info!(
            "Name index built: {} distinct names, {} ambiguous places",
            buckets.len(),
            ambiguous.len()
        );

        Self { buckets, ambiguous }
    }

    /// All ids sharing a canonical key, in ascending id order
    pub fn lookup(&self, key: &str) -> &[PlaceId] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Same as `lookup`, keyed by a display name
    pub fn lookup_name(&self, name: &str) -> &[PlaceId] {
        self.lookup(&canonical_key(name))
    }

    pub fn is_ambiguous(&self, id: PlaceId) -> bool {
        self.ambiguous.contains(&id)
    }

    /// Ambiguous ids in ascending order
    pub fn ambiguous_ids(&self) -> Vec<PlaceId> {
        let mut ids: Vec<PlaceId> = self.ambiguous.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn ambiguous_count(&self) -> usize {
        self.ambiguous.len()
    }

    pub fn key_count(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AdminUnit, GeoPoint, PlaceRecord};

    fn store(names: &[(PlaceId, &str)]) -> RecordStore {
        names
            .iter()
            .map(|(id, name)| {
                PlaceRecord::new(*id, *name, AdminUnit::new("OH", "Franklin"), GeoPoint::new(40.0, -83.0))
            })
            .collect()
    }

    #[test]
    fn test_canonical_key_folds_case_and_punctuation() {
        assert_eq!(canonical_key("St. Mary's"), "st marys");
        assert_eq!(canonical_key("ST MARYS"), "st marys");
        assert_eq!(canonical_key("  Coeur  d'Alene "), "coeur dalene");
        assert_eq!(canonical_key("Wilkes-Barre"), "wilkesbarre");
    }

    #[test]
    fn test_ambiguity_set() {
        let index = NameIndex::build(&store(&[
            (1, "Franklin"),
            (2, "FRANKLIN"),
            (3, "Franklintown"),
            (4, "Dublin"),
        ]));

        assert!(index.is_ambiguous(1));
        assert!(index.is_ambiguous(2));
        assert!(!index.is_ambiguous(3));
        assert!(!index.is_ambiguous(4));
        assert_eq!(index.ambiguous_ids(), vec![1, 2]);
        assert_eq!(index.key_count(), 3);
    }

    #[test]
    fn test_lookup_preserves_id_order() {
        let index = NameIndex::build(&store(&[(9, "Salem"), (2, "Salem"), (5, "Salem.")]));

        assert_eq!(index.lookup("salem"), &[2, 5, 9]);
        assert_eq!(index.lookup_name("SALEM"), &[2, 5, 9]);
        assert!(index.lookup("marion").is_empty());
    }
}
