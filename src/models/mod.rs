//! Core data models for the disambiguation pipeline.

pub mod feature;
pub mod place;

pub use feature::{ExportedPlace, FeatureEntry, NameEntry};
pub use place::{AdminUnit, GeoPoint, PlaceId, PlaceRecord};
