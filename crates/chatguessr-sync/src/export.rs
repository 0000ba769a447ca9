//! Chat export string and distance entry parsing.

use chatguessr_geo::{Point, clamp_point};

/// Chat command that submits `point` as a guess on `channel`.
///
/// The point is clamped to a valid latitude and a normalized longitude
/// before formatting.
pub fn export_command(channel: &str, point: Point) -> String {
    let p = clamp_point(point);
    format!("/w {channel} !g {}, {}", p.lat, p.lng)
}

/// Parse a distance typed in kilometres and return it in meters.
///
/// Returns `None` for text that is not a finite number; the caller keeps
/// the previous radius in that case.
pub fn parse_distance_km(text: &str) -> Option<f64> {
    let km: f64 = text.trim().parse().ok()?;
    km.is_finite().then(|| km * 1000.0)
}
