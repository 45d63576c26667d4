//! Gazetteer - place-name disambiguation for populated-place extracts
//!
//! This library provides the record store, name and spatial indexes,
//! disambiguation pass, exporter and sinks used by the ingest binary.

pub mod config;
pub mod disambiguate;
pub mod export;
pub mod models;
pub mod names;
pub mod sink;
pub mod spatial;
pub mod states;
pub mod store;

pub use disambiguate::{disambiguate, Disambiguation, DisambiguationConfig, Disambiguator};
pub use models::{AdminUnit, GeoPoint, PlaceId, PlaceRecord};
pub use store::RecordStore;
