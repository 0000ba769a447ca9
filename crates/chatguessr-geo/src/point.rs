//! Geographic points and coordinate normalization.
//!
//! A [`Point`] is stored exactly as it was produced: boundary computation
//! deliberately works in an unwrapped longitude space, so longitudes may
//! fall outside `(-180, 180]`. Anything human-facing goes through
//! [`clamp_point`] first.

use serde::{Deserialize, Serialize};

use crate::circle::EARTH_RADIUS_KM;

/// A latitude/longitude pair in degrees.
///
/// Serializes as `{"lat": .., "lng": ..}`, which is also the wire shape of
/// the `Location` field exchanged over the sync channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Latitude in degrees, within `[-90, 90]`.
    pub lat: f64,
    /// Longitude in degrees, not necessarily normalized.
    pub lng: f64,
}

impl Point {
    /// Create a point from latitude and longitude in degrees.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both coordinates are finite and the latitude is within
    /// `[-90, 90]`.
    pub fn is_valid(self) -> bool {
        self.lat.is_finite() && self.lng.is_finite() && (-90.0..=90.0).contains(&self.lat)
    }
}

impl core::fmt::Display for Point {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}, {}", self.lat, self.lng)
    }
}

/// Normalize a longitude into `(-180, 180]`.
///
/// Runs in constant time for any finite input. Non-finite input is
/// returned unchanged.
pub fn normalize_longitude(lng: f64) -> f64 {
    if !lng.is_finite() {
        return lng;
    }
    let normalized = 180.0 - (180.0 - lng).rem_euclid(360.0);
    // rem_euclid may round up to exactly 360 for tiny negative operands.
    if normalized <= -180.0 { 180.0 } else { normalized }
}

/// Clamp latitude into `[-90, 90]` and normalize longitude.
///
/// Used for every coordinate that leaves the process as text (export
/// commands, terminal output).
pub fn clamp_point(point: Point) -> Point {
    Point::new(point.lat.clamp(-90.0, 90.0), normalize_longitude(point.lng))
}

/// Great-circle distance between two points in kilometres (haversine).
pub fn great_circle_distance_km(a: Point, b: Point) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let half_dlat = (lat2 - lat1) / 2.0;
    let half_dlng = (b.lng - a.lng).to_radians() / 2.0;

    let h = (lat1.cos() * lat2.cos()).mul_add(half_dlng.sin().powi(2), half_dlat.sin().powi(2));
    2.0 * EARTH_RADIUS_KM * h.sqrt().clamp(0.0, 1.0).asin()
}
