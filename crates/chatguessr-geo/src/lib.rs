//! Spherical-earth geometry for the Chatguessr map tool.
//!
//! This crate has no runtime dependencies beyond `serde`. It is the leaf
//! of the workspace: the sync engine, the relay, and the terminal client
//! all describe locations with [`Point`] and render uncertainty circles
//! with [`boundary`].
//!
//! # Modules
//!
//! - [`point`] -- Latitude/longitude pairs, longitude normalization, and
//!   great-circle distance.
//! - [`circle`] -- Geodesic circle boundaries, including circles larger
//!   than a quarter of the planet that wrap past the antimeridian.

pub mod circle;
pub mod point;

pub use circle::{
    BEARING_STEP_DEG, Bounds, EARTH_RADIUS_KM, LARGE_CIRCLE_THRESHOLD_KM, SAMPLE_COUNT, boundary,
    destination,
};
pub use point::{Point, clamp_point, great_circle_distance_km, normalize_longitude};
