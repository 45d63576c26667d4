//! Place records as handed over by the extract reader.

use serde::{Deserialize, Serialize};

/// Stable identifier assigned upstream (the source feature id).
pub type PlaceId = i64;

/// Geographic point (lat/lon, decimal degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Administrative unit a place belongs to.
///
/// Two places only collide when they share a canonical name *and* the
/// exact same unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AdminUnit {
    /// State abbreviation (e.g., "PA")
    pub state: String,
    /// County or sub-unit name without the "County" suffix
    pub county: String,
}

impl AdminUnit {
    pub fn new(state: impl Into<String>, county: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            county: county.into(),
        }
    }
}

impl std::fmt::Display for AdminUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.state, self.county)
    }
}

/// A populated place. Immutable once it enters the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub id: PlaceId,

    /// Display name, punctuation and case preserved
    pub name: String,

    pub unit: AdminUnit,

    pub location: GeoPoint,
}

impl PlaceRecord {
    pub fn new(id: PlaceId, name: impl Into<String>, unit: AdminUnit, location: GeoPoint) -> Self {
        Self {
            id,
            name: name.into(),
            unit,
            location,
        }
    }
}
