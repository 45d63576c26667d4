//! Latitude-sorted index for radius queries.

use std::ops::Range;

use tracing::info;

use super::distance::{haversine_km, latitude_span_deg};
use crate::disambiguate::ExclusionSet;
use crate::models::{GeoPoint, PlaceId};
use crate::store::RecordStore;

/// A place found by a radius query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: PlaceId,
    pub distance_km: f64,
}

#[derive(Debug, Clone, Copy)]
struct IndexedPlace {
    lat: f64,
    id: PlaceId,
}

/// Static index over every place in the store, sorted by latitude.
///
/// Built once; excluded places stay in the array and are filtered at
/// query time so the sort order is never disturbed.
pub struct SpatialIndex {
    entries: Vec<IndexedPlace>,
}

impl SpatialIndex {
    /// Build the index from the store
    pub fn build(store: &RecordStore) -> Self {
        info!("Building spatial index for {} places...", store.len());

        let mut entries: Vec<IndexedPlace> = store
            .iter()
            .map(|record| IndexedPlace {
                lat: record.location.lat,
                id: record.id,
            })
            .collect();

        // Ties broken by id so identical inputs give identical arrays
        entries.sort_by(|a, b| a.lat.total_cmp(&b.lat).then(a.id.cmp(&b.id)));

        info!("Spatial index built with {} entries", entries.len());

        Self { entries }
    }

    /// First position whose latitude is >= `min_lat`
    pub fn lower_bound(&self, min_lat: f64) -> usize {
        let (mut lo, mut hi) = (0, self.entries.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.entries[mid].lat < min_lat {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// One past the last position whose latitude is <= `max_lat`
    pub fn upper_bound(&self, max_lat: f64) -> usize {
        let (mut lo, mut hi) = (0, self.entries.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.entries[mid].lat <= max_lat {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Positions whose latitude falls in `[min_lat, max_lat]`
    pub fn bracket(&self, min_lat: f64, max_lat: f64) -> Range<usize> {
        let start = self.lower_bound(min_lat);
        let end = self.upper_bound(max_lat);
        // An inverted band gives end < start; clamp to an empty range
        start..end.max(start)
    }

    /// All non-excluded places strictly closer than `radius_km` to `center`.
    ///
    /// The result is unordered; callers sort by distance when they care.
    pub fn within(
        &self,
        store: &RecordStore,
        center: GeoPoint,
        radius_km: f64,
        excluded: &ExclusionSet,
    ) -> Vec<Neighbor> {
        if !(radius_km > 0.0) {
            return Vec::new();
        }

        let span = latitude_span_deg(radius_km);
        let range = self.bracket(center.lat - span, center.lat + span);

        // The bracket only bounds latitude; the haversine check is what
        // enforces the radius.
        self.entries[range]
            .iter()
            .filter(|entry| !excluded.contains(entry.id))
            .filter_map(|entry| {
                let record = store.get(entry.id)?;
                let distance_km = haversine_km(center, record.location);
                (distance_km < radius_km).then_some(Neighbor {
                    id: entry.id,
                    distance_km,
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
