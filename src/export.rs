//! Export of surviving places to the persistence sink.

use serde::Deserialize;
use tracing::{debug, info};

use crate::disambiguate::Disambiguation;
use crate::models::{ExportedPlace, FeatureEntry, NameEntry, PlaceRecord};
use crate::sink::{PlaceSink, SinkError};
use crate::states::StateTable;
use crate::store::RecordStore;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Added to every source id to form the feature id
    pub feature_id_offset: i64,

    pub country_code: String,

    /// Name-type code written on every name entry
    pub name_type: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            feature_id_offset: 1_000_000_000,
            country_code: "US".to_string(),
            name_type: "P".to_string(),
        }
    }
}

pub struct Exporter<'a> {
    store: &'a RecordStore,
    result: &'a Disambiguation,
    states: &'a StateTable,
    config: &'a ExportConfig,
}

impl<'a> Exporter<'a> {
    pub fn new(
        store: &'a RecordStore,
        result: &'a Disambiguation,
        states: &'a StateTable,
        config: &'a ExportConfig,
    ) -> Self {
        Self {
            store,
            result,
            states,
            config,
        }
    }

    fn state_name(&self, abbr: &str) -> String {
        match self.states.full_name(abbr) {
            Some(name) => name.to_string(),
            None => {
                debug!("No state name for {:?}, using code", abbr);
                abbr.to_string()
            }
        }
    }

    fn export(&self, record: &PlaceRecord) -> ExportedPlace {
        let feature_id = record.id + self.config.feature_id_offset;
        let state = self.state_name(&record.unit.state);

        let in_qualifier = if record.unit.county.is_empty() {
            state.clone()
        } else {
            format!("{} County", record.unit.county)
        };

        let near_qualifier = self.result.qualifier(record.id).map(|q| q.phrase.clone());

        ExportedPlace {
            feature: FeatureEntry {
                feature_id,
                country_code: self.config.country_code.clone(),
                state,
                county: record.unit.county.clone(),
                lat: record.location.lat,
                lon: record.location.lon,
                in_qualifier,
                near_qualifier,
            },
            name: NameEntry {
                feature_id,
                name_id: feature_id,
                primary: true,
                name: record.name.clone(),
                name_type: self.config.name_type.clone(),
            },
        }
    }

    /// Kept places in ascending id order
    pub fn entries(&self) -> impl Iterator<Item = ExportedPlace> + '_ {
        self.store
            .iter()
            .filter(|record| !self.result.is_excluded(record.id))
            .map(|record| self.export(record))
    }

    /// Write every kept place, then commit once.
    pub fn write_to(&self, mut sink: Box<dyn PlaceSink>) -> Result<usize, SinkError> {
        for entry in self.entries() {
            sink.write(&entry)?;
        }

        let committed = sink.commit()?;
        info!("Committed {} places", committed);
        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disambiguate::{disambiguate, DisambiguationConfig};
    use crate::models::{AdminUnit, GeoPoint};

    /// Sink that keeps everything in memory
    struct MemorySink {
        written: Vec<ExportedPlace>,
        committed: std::rc::Rc<std::cell::RefCell<Vec<ExportedPlace>>>,
    }

    impl PlaceSink for MemorySink {
        fn write(&mut self, place: &ExportedPlace) -> Result<(), SinkError> {
            self.written.push(place.clone());
            Ok(())
        }

        fn commit(self: Box<Self>) -> Result<usize, SinkError> {
            let MemorySink { written, committed } = *self;
            let count = written.len();
            committed.borrow_mut().extend(written);
            Ok(count)
        }
    }

    fn franklin_store() -> RecordStore {
        vec![
            PlaceRecord::new(1, "Franklin", AdminUnit::new("PA", "Venango"), GeoPoint::new(41.397, -79.831)),
            PlaceRecord::new(2, "Franklin", AdminUnit::new("PA", "Venango"), GeoPoint::new(41.424, -79.831)),
            PlaceRecord::new(3, "Utica", AdminUnit::new("PA", "Venango"), GeoPoint::new(41.388, -79.831)),
            PlaceRecord::new(4, "Somewhere", AdminUnit::new("ZZ", ""), GeoPoint::new(10.0, 10.0)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_entries_skip_excluded_and_carry_qualifiers() {
        let store = franklin_store();
        let result = disambiguate(&store, &DisambiguationConfig::default());
        let states = StateTable::builtin().unwrap();
        let config = ExportConfig::default();
        let exporter = Exporter::new(&store, &result, &states, &config);

        let entries: Vec<ExportedPlace> = exporter.entries().collect();
        let ids: Vec<i64> = entries.iter().map(|e| e.feature.feature_id).collect();
        assert_eq!(ids, vec![1_000_000_001, 1_000_000_003, 1_000_000_004]);

        let first = &entries[0];
        assert_eq!(first.feature.state, "Pennsylvania");
        assert_eq!(first.feature.country_code, "US");
        assert_eq!(first.feature.in_qualifier, "Venango County");
        assert_eq!(first.feature.near_qualifier.as_deref(), Some("near Utica"));
        assert_eq!(first.name.name, "Franklin");
        assert_eq!(first.name.name_id, first.feature.feature_id);
        assert!(first.name.primary);

        let utica = &entries[1];
        assert!(utica.feature.near_qualifier.is_none());

        // Unknown state falls back to the code; no county falls back to the state
        let other = &entries[2];
        assert_eq!(other.feature.state, "ZZ");
        assert_eq!(other.feature.in_qualifier, "ZZ");
    }

    #[test]
    fn test_write_to_commits_once() {
        let store = franklin_store();
        let result = disambiguate(&store, &DisambiguationConfig::default());
        let states = StateTable::builtin().unwrap();
        let config = ExportConfig::default();
        let committed = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = MemorySink {
            written: Vec::new(),
            committed: committed.clone(),
        };

        let count = Exporter::new(&store, &result, &states, &config)
            .write_to(Box::new(sink))
            .unwrap();

        assert_eq!(count, 3);
        assert_eq!(committed.borrow().len(), 3);
    }
}
