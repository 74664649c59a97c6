//! # Geometry
//!
//! Coordinates and the small amount of spherical math the simulator needs:
//! great-circle distance, a planar heading between two points, polyline
//! decoding ([`polyline`]) and route densification ([`route`]).
//!
//! Everything in here is synchronous and allocation-light so it can be called
//! from inside the driver's playback loop for every reported position.

pub mod polyline;
pub mod route;

pub use polyline::*;
pub use route::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// A latitude/longitude pair in degrees.
///
/// Equality is an exact floating-point comparison on both fields; two
/// coordinates a few nanodegrees apart are different points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle (haversine) distance in meters.
    ///
    /// An absent point is defined to be zero meters away, so callers holding an
    /// optional previous position can call this without branching.
    pub fn distance_to(&self, other: impl Into<Option<LatLng>>) -> f64 {
        let Some(other) = other.into() else {
            return 0.0;
        };

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lng = (other.lng - self.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().min(1.0).asin();

        EARTH_RADIUS_METERS * c
    }

    /// Heading toward `other` in degrees, in `(-180, 180]`.
    ///
    /// This is `atan2` over the raw coordinate deltas (latitude as x, longitude
    /// as y), not a geodesic bearing. Simulated vehicle headings are computed
    /// this way on purpose; the hops are short.
    pub fn bearing_to(&self, other: &LatLng) -> f64 {
        (other.lng - self.lng).atan2(other.lat - self.lat).to_degrees()
    }

    /// Linear interpolation between `self` and `other`; `fraction` 0 is `self`, 1 is `other`.
    pub fn lerp(&self, other: &LatLng, fraction: f64) -> LatLng {
        LatLng {
            lat: self.lat + (other.lat - self.lat) * fraction,
            lng: self.lng + (other.lng - self.lng) * fraction,
        }
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lat, self.lng)
    }
}

/// Free-function form of [`LatLng::distance_to`].
pub fn distance(a: &LatLng, b: Option<&LatLng>) -> f64 {
    a.distance_to(b.copied())
}

/// Free-function form of [`LatLng::bearing_to`].
pub fn bearing_degrees(a: &LatLng, b: &LatLng) -> f64 {
    a.bearing_to(b)
}

/// Total length in meters of the straight-segment path through `points`.
pub fn path_length(points: &[LatLng]) -> f64 {
    points.windows(2).map(|w| w[0].distance_to(w[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to_self_is_zero() {
        let a = LatLng::new(52.52, 13.405);
        assert_eq!(a.distance_to(a), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let pairs = [
            (LatLng::new(52.52, 13.405), LatLng::new(48.8566, 2.3522)),
            (LatLng::new(-6.2088, 106.8456), LatLng::new(-6.9175, 107.6191)),
            (LatLng::new(0.0, 0.0), LatLng::new(0.0, 1.0)),
        ];
        for (a, b) in pairs {
            assert!((a.distance_to(b) - b.distance_to(a)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_distance_to_absent_point_is_zero() {
        let a = LatLng::new(59.91, 10.75);
        assert_eq!(a.distance_to(None), 0.0);
        assert_eq!(distance(&a, None), 0.0);
    }

    #[test]
    fn test_one_degree_of_longitude_at_equator() {
        let d = LatLng::new(0.0, 0.0).distance_to(LatLng::new(0.0, 1.0));
        // ~111.2 km
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    }

    #[test]
    fn test_bearing_is_planar() {
        let origin = LatLng::new(0.0, 0.0);
        assert_eq!(origin.bearing_to(&LatLng::new(1.0, 0.0)), 0.0);
        assert_eq!(origin.bearing_to(&LatLng::new(0.0, 1.0)), 90.0);
        assert_eq!(origin.bearing_to(&LatLng::new(-1.0, 0.0)), 180.0);
        assert_eq!(origin.bearing_to(&LatLng::new(0.0, -1.0)), -90.0);
        assert_eq!(bearing_degrees(&origin, &LatLng::new(1.0, 1.0)), 45.0);
    }

    #[test]
    fn test_path_length_sums_segments() {
        let points = [
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 0.5),
            LatLng::new(0.0, 1.0),
        ];
        let direct = points[0].distance_to(points[2]);
        assert!((path_length(&points) - direct).abs() < 1e-3);
        assert_eq!(path_length(&points[..1]), 0.0);
    }
}
