//! Spatial lookups over the place set.
//!
//! A latitude-sorted array answers radius queries in roughly O(log n + k):
//! two binary searches bracket the latitude band, then an exact haversine
//! check trims the bracket down to the true radius.

mod distance;
mod index;

pub use distance::{haversine_km, EARTH_RADIUS_KM};
#[cfg(test)]
pub(crate) use distance::latitude_span_deg;
pub use index::{Neighbor, SpatialIndex};
