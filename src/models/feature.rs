//! Finalized entries handed to the persistence sink.

use serde::{Deserialize, Serialize};

/// One kept place, ready for the name database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEntry {
    /// Source id shifted by the configured offset so it cannot collide
    /// with ids from other data sources
    pub feature_id: i64,

    pub country_code: String,

    /// Full state name
    pub state: String,

    pub county: String,

    pub lat: f64,

    pub lon: f64,

    /// e.g. "Lancaster County"
    pub in_qualifier: String,

    /// e.g. "near Lititz, Rothsville"; only set for resolved collisions
    pub near_qualifier: Option<String>,
}

/// Companion name row for a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameEntry {
    pub feature_id: i64,
    pub name_id: i64,
    pub primary: bool,
    pub name: String,
    pub name_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportedPlace {
    pub feature: FeatureEntry,
    pub name: NameEntry,
}
