//! Name disambiguation.
//!
//! Every place whose canonical name is shared with another place in the
//! same administrative unit either gets a "near ..." qualifier built from
//! up to a few nearby, unambiguous, clearly different names, or is dropped.
//!
//! Qualifier candidates lie strictly inside half the distance to the nearest
//! same-name competitor, capped at `max_radius_km`.

use std::fmt;

use hashbrown::{HashMap, HashSet};
use indicatif::ProgressBar;
use serde::Deserialize;
use tracing::{debug, info};

use crate::models::{PlaceId, PlaceRecord};
use crate::names::{canonical_key, NameIndex};
use crate::spatial::{haversine_km, Neighbor, SpatialIndex};
use crate::store::RecordStore;

/// Tunables for the disambiguation pass.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisambiguationConfig {
    /// Upper bound on the qualifier search radius
    pub max_radius_km: f64,

    /// A candidate is a near-duplicate when its edit distance to the place
    /// name is <= name length / this divisor
    pub similarity_divisor: f64,

    /// Maximum number of names in a qualifier
    pub max_qualifiers: usize,

    /// Word placed before the qualifier names
    pub qualifier_prefix: String,
}

impl Default for DisambiguationConfig {
    fn default() -> Self {
        Self {
            max_radius_km: 20.0,
            similarity_divisor: 4.0,
            max_qualifiers: 3,
            qualifier_prefix: "near".to_string(),
        }
    }
}

/// Places permanently dropped from the output. Insert-only.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    ids: HashSet<PlaceId>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the id was already excluded
    pub fn insert(&mut self, id: PlaceId) -> bool {
        self.ids.insert(id)
    }

    pub fn contains(&self, id: PlaceId) -> bool {
        self.ids.contains(&id)
    }

    /// Excluded ids in ascending order
    pub fn sorted(&self) -> Vec<PlaceId> {
        let mut ids: Vec<PlaceId> = self.ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// A resolved collision.
#[derive(Debug, Clone, PartialEq)]
pub struct Qualifier {
    /// Nearest first
    pub neighbors: Vec<Neighbor>,

    /// Distance to the closest same-name place in the same unit
    pub nearest_collision_km: f64,

    /// Radius the neighbors were drawn from
    pub search_radius_km: f64,

    /// Rendered phrase, e.g. "near Lititz, Rothsville"
    pub phrase: String,
}

/// Qualifiers by place id. Write-once per id.
#[derive(Debug, Clone, Default)]
pub struct QualifierMap {
    map: HashMap<PlaceId, Qualifier>,
}

impl QualifierMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a qualifier. An existing entry is never overwritten.
    pub fn insert(&mut self, id: PlaceId, qualifier: Qualifier) -> bool {
        if self.map.contains_key(&id) {
            return false;
        }
        self.map.insert(id, qualifier);
        true
    }

    pub fn get(&self, id: PlaceId) -> Option<&Qualifier> {
        self.map.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlaceId, &Qualifier)> {
        self.map.iter().map(|(id, q)| (*id, q))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Outcome for a single ambiguous place.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// No live same-name place in the same unit; kept as is
    NoCollision,
    Qualified(Qualifier),
    /// No usable qualifier inside the search radius
    Excluded {
        nearest_collision_km: f64,
        search_radius_km: f64,
    },
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub ambiguous: usize,
    pub no_collision: usize,
    pub qualified: usize,
    pub excluded: usize,
}

impl Summary {
    pub fn kept(&self) -> usize {
        self.total - self.excluded
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} places, {} ambiguous ({} without same-unit collision, {} qualified), {} excluded, {} kept",
            self.total,
            self.ambiguous,
            self.no_collision,
            self.qualified,
            self.excluded,
            self.kept()
        )
    }
}

/// Result of the disambiguation pass.
#[derive(Debug, Clone, Default)]
pub struct Disambiguation {
    pub exclusions: ExclusionSet,
    pub qualifiers: QualifierMap,
    pub summary: Summary,
}

impl Disambiguation {
    pub fn is_excluded(&self, id: PlaceId) -> bool {
        self.exclusions.contains(id)
    }

    pub fn qualifier(&self, id: PlaceId) -> Option<&Qualifier> {
        self.qualifiers.get(id)
    }
}

/// True when `candidate` reads as a misspelling of `name`.
pub fn is_near_duplicate(name: &str, candidate: &str, divisor: f64) -> bool {
    let distance = strsim::levenshtein(name, candidate) as f64;
    distance <= name.chars().count() as f64 / divisor
}

pub struct Disambiguator<'a> {
    store: &'a RecordStore,
    names: &'a NameIndex,
    spatial: &'a SpatialIndex,
    config: &'a DisambiguationConfig,
    exclusions: ExclusionSet,
    qualifiers: QualifierMap,
    progress: Option<ProgressBar>,
}

impl<'a> Disambiguator<'a> {
    pub fn new(
        store: &'a RecordStore,
        names: &'a NameIndex,
        spatial: &'a SpatialIndex,
        config: &'a DisambiguationConfig,
    ) -> Self {
        Self {
            store,
            names,
            spatial,
            config,
            exclusions: ExclusionSet::new(),
            qualifiers: QualifierMap::new(),
            progress: None,
        }
    }

    /// Tick `progress` once per ambiguous place
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Distance to the nearest live place with the same canonical name in
    /// the same unit, if any.
    fn nearest_collision_km(&self, record: &PlaceRecord) -> Option<f64> {
        self.names
            .lookup(&canonical_key(&record.name))
            .iter()
            .filter(|&&other| other != record.id && !self.exclusions.contains(other))
            .filter_map(|&other| self.store.get(other))
            .filter(|other| other.unit == record.unit)
            .map(|other| haversine_km(record.location, other.location))
            .min_by(f64::total_cmp)
    }

    /// Decide the fate of one place against the current exclusion set.
    pub fn decide(&self, id: PlaceId) -> Decision {
        let Some(record) = self.store.get(id) else {
            return Decision::NoCollision;
        };

        let Some(nearest_collision_km) = self.nearest_collision_km(record) else {
            return Decision::NoCollision;
        };

        let search_radius_km = (nearest_collision_km / 2.0).min(self.config.max_radius_km);

        let mut neighbors: Vec<Neighbor> = self
            .spatial
            .within(self.store, record.location, search_radius_km, &self.exclusions)
            .into_iter()
            .filter(|n| n.id != id && !self.names.is_ambiguous(n.id))
            .filter(|n| match self.store.get(n.id) {
                Some(candidate) => !is_near_duplicate(
                    &record.name,
                    &candidate.name,
                    self.config.similarity_divisor,
                ),
                None => false,
            })
            .collect();

        if neighbors.is_empty() {
            return Decision::Excluded {
                nearest_collision_km,
                search_radius_km,
            };
        }

        neighbors.sort_by(|a, b| {
            a.distance_km
                .total_cmp(&b.distance_km)
                .then(a.id.cmp(&b.id))
        });
        neighbors.truncate(self.config.max_qualifiers.max(1));

        let phrase = self.render(&neighbors);

        Decision::Qualified(Qualifier {
            neighbors,
            nearest_collision_km,
            search_radius_km,
            phrase,
        })
    }

    fn render(&self, neighbors: &[Neighbor]) -> String {
        let names: Vec<&str> = neighbors
            .iter()
            .filter_map(|n| self.store.get(n.id))
            .map(|r| r.name.as_str())
            .collect();

        let list = names.join(", ");
        if self.config.qualifier_prefix.is_empty() {
            list
        } else {
            format!("{} {}", self.config.qualifier_prefix, list)
        }
    }

    /// Process every ambiguous place in ascending id order.
    pub fn run(mut self) -> Disambiguation {
        let ambiguous = self.names.ambiguous_ids();
        let mut summary = Summary {
            total: self.store.len(),
            ambiguous: ambiguous.len(),
            ..Summary::default()
        };

        info!("Disambiguating {} ambiguous places...", ambiguous.len());

        for id in ambiguous {
            if let Some(pb) = &self.progress {
                pb.inc(1);
            }

            if self.exclusions.contains(id) {
                continue;
            }

            match self.decide(id) {
                Decision::NoCollision => summary.no_collision += 1,
                Decision::Qualified(qualifier) => {
                    debug!("{}: {}", id, qualifier.phrase);
                    if self.qualifiers.insert(id, qualifier) {
                        summary.qualified += 1;
                    }
                }
                Decision::Excluded {
                    nearest_collision_km,
                    search_radius_km,
                } => {
                    debug!(
                        "{}: excluded (nearest collision {:.2} km, radius {:.2} km)",
                        id, nearest_collision_km, search_radius_km
                    );
                    if self.exclusions.insert(id) {
                        summary.excluded += 1;
                    }
                }
            }
        }

        if let Some(pb) = &self.progress {
            pb.finish_with_message("Disambiguation complete");
        }

        info!("Disambiguation: {}", summary);

        Disambiguation {
            exclusions: self.exclusions,
            qualifiers: self.qualifiers,
            summary,
        }
    }
}

/// Build both indexes over `store` and run the full pass.
pub fn disambiguate(store: &RecordStore, config: &DisambiguationConfig) -> Disambiguation {
    let names = NameIndex::build(store);
    let spatial = SpatialIndex::build(store);
    Disambiguator::new(store, &names, &spatial, config).run()
}
