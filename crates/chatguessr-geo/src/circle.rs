//! Geodesic circle boundaries on a spherical earth.
//!
//! [`boundary`] samples the locus of points at a fixed great-circle
//! distance from a center, one sample every [`BEARING_STEP_DEG`] degrees of
//! bearing. The result is an ordered, closed ring suitable for polygon
//! renderers.
//!
//! # Large circles
//!
//! Once the radius exceeds [`LARGE_CIRCLE_THRESHOLD_KM`] (slightly over a
//! quarter of the meridional circumference) the ring passes over the
//! poles and its raw longitudes jump by 360 degrees where the bearing
//! sweep crosses south. The sweep is then split into bearings `[0, 180]`
//! and `(180, 360)` and each half is shifted by a whole turn so the ring
//! is continuous in unwrapped longitude:
//!
//! | Center longitude | First half | Second half |
//! |------------------|------------|-------------|
//! | `<= 0`           | `+0`       | `+360`      |
//! | `> 0`            | `-360`     | `+0`        |
//!
//! The shifted ring is continuous whenever the circle passes over both
//! poles, i.e. its angular radius exceeds `90 + |center latitude|`
//! degrees. Circles between the threshold and that bound enclose a pole
//! and cannot be drawn as a continuous ring in unwrapped longitude.

use crate::point::Point;

/// Mean earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.008;

/// Bearing increment between consecutive boundary samples, in degrees.
pub const BEARING_STEP_DEG: f64 = 0.5;

/// Number of samples in every boundary (`360 / BEARING_STEP_DEG`).
pub const SAMPLE_COUNT: u32 = 720;

/// Radius in kilometres above which [`boundary`] uses the split sweep.
pub const LARGE_CIRCLE_THRESHOLD_KM: f64 = 10_007.0;

/// Index of the 180 degree bearing; it belongs to the first half.
const HALF_SWEEP_INDEX: u32 = 360;

/// Destination reached by travelling `distance_km` along a great circle
/// from `center` with initial bearing `bearing_deg` (clockwise from north).
///
/// The returned longitude is `center.lng` plus an offset in
/// `[-180, 180]`; it is not normalized.
pub fn destination(center: Point, bearing_deg: f64, distance_km: f64) -> Point {
    let lat1 = center.lat.to_radians();
    let lng1 = center.lng.to_radians();
    let bearing = bearing_deg.to_radians();
    let angular = distance_km / EARTH_RADIUS_KM;

    let (sin_lat1, cos_lat1) = lat1.sin_cos();
    let (sin_d, cos_d) = angular.sin_cos();

    // Floating-point overshoot near the poles would make asin return NaN.
    let sin_lat2 = sin_lat1
        .mul_add(cos_d, cos_lat1 * sin_d * bearing.cos())
        .clamp(-1.0, 1.0);
    let lat2 = sin_lat2.asin();

    let y = bearing.sin() * sin_d * cos_lat1;
    let x = (-sin_lat1).mul_add(sin_lat2, cos_d);
    let lng2 = lng1 + y.atan2(x);

    Point::new(lat2.to_degrees(), lng2.to_degrees())
}

/// Closed polygon approximating the circle of `radius_meters` around
/// `center`.
///
/// Always returns [`SAMPLE_COUNT`] points in increasing bearing order,
/// starting due north. A zero radius yields a degenerate ring of points at
/// the center. Negative or non-finite radii are treated as zero.
pub fn boundary(center: Point, radius_meters: f64) -> Vec<Point> {
    let distance_km = if radius_meters.is_finite() && radius_meters > 0.0 {
        radius_meters / 1000.0
    } else {
        0.0
    };

    if distance_km <= LARGE_CIRCLE_THRESHOLD_KM {
        return (0..SAMPLE_COUNT)
            .map(|i| destination(center, bearing_at(i), distance_km))
            .collect();
    }

    let (first_shift, second_shift) = if center.lng > 0.0 {
        (-360.0, 0.0)
    } else {
        (0.0, 360.0)
    };

    (0..SAMPLE_COUNT)
        .map(|i| {
            let shift = if i <= HALF_SWEEP_INDEX {
                first_shift
            } else {
                second_shift
            };
            let p = destination(center, bearing_at(i), distance_km);
            Point::new(p.lat, p.lng + shift)
        })
        .collect()
}

fn bearing_at(index: u32) -> f64 {
    f64::from(index) * BEARING_STEP_DEG
}

/// Axis-aligned extent of a set of points in (unwrapped) degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Southernmost latitude.
    pub min_lat: f64,
    /// Northernmost latitude.
    pub max_lat: f64,
    /// Smallest longitude.
    pub min_lng: f64,
    /// Largest longitude.
    pub max_lng: f64,
}

impl Bounds {
    /// Compute the extent of `points`, or `None` when empty.
    pub fn of(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let init = Self {
            min_lat: first.lat,
            max_lat: first.lat,
            min_lng: first.lng,
            max_lng: first.lng,
        };
        Some(points.iter().fold(init, |b, p| Self {
            min_lat: b.min_lat.min(p.lat),
            max_lat: b.max_lat.max(p.lat),
            min_lng: b.min_lng.min(p.lng),
            max_lng: b.max_lng.max(p.lng),
        }))
    }

    /// Longitudinal span in degrees.
    pub const fn lng_span(&self) -> f64 {
        self.max_lng - self.min_lng
    }
}
