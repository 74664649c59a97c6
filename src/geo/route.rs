//! # Route Interpolation
//!
//! Turns a sparse directions document into one [`RouteStep`] per maneuver,
//! each carrying an evenly spaced coordinate path the driver can play back
//! in real time.
//!
//! For every route the shared polyline is decoded once. Each step then takes
//! the inclusive `way_points` slice of that polyline, drops consecutive
//! duplicates, and is resampled every 100 m (every 10 m when the whole step
//! is shorter than 100 m). Steps left with fewer than two coordinates are not
//! resampled.

use super::{decode_coordinates, path_length, LatLng};
use crate::model::Directions;

/// Sampling interval for steps at least this long, in meters.
pub const LONG_STEP_INTERVAL_METERS: f64 = 100.0;
/// Sampling interval for steps shorter than [`LONG_STEP_INTERVAL_METERS`].
pub const SHORT_STEP_INTERVAL_METERS: f64 = 10.0;

/// One maneuver of a route, ready for playback.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStep {
    /// Heading after the maneuver, degrees.
    pub bearing: f64,
    /// Nominal step length, meters.
    pub distance: f64,
    /// Nominal step duration, seconds.
    pub duration: f64,
    pub locations: Vec<LatLng>,
}

impl RouteStep {
    /// Seconds the vehicle needs for `meters` at this step's nominal pace.
    ///
    /// Zero for a degenerate step with no length.
    pub fn travel_seconds(&self, meters: f64) -> f64 {
        if self.distance > 0.0 {
            self.duration * (meters / self.distance)
        } else {
            0.0
        }
    }
}

/// Builds the playback steps for every route of `directions`, in order.
pub fn interpolate_route(directions: &Directions) -> Vec<RouteStep> {
    let mut steps = Vec::new();

    for route in &directions.routes {
        let geometry = decode_coordinates(&route.geometry);

        for step in route.segments.iter().flat_map(|s| s.steps.iter()) {
            let slice = step
                .way_point_range()
                .and_then(|(start, end)| geometry.get(start..=end))
                .unwrap_or_default();

            let mut locations: Vec<LatLng> = Vec::with_capacity(slice.len());
            for point in slice {
                if locations.last() != Some(point) {
                    locations.push(*point);
                }
            }

            steps.push(RouteStep {
                bearing: step.maneuver.bearing_after,
                distance: step.distance,
                duration: step.duration,
                locations: densify(&locations),
            });
        }
    }

    steps
}

/// Resamples a path at a fixed interval.
///
/// Returns the start point, a sample at every whole multiple of the interval
/// that lies strictly inside the path, and the end point. Paths with fewer
/// than two points come back unchanged.
pub fn densify(locations: &[LatLng]) -> Vec<LatLng> {
    let (Some(first), Some(last)) = (locations.first(), locations.last()) else {
        return locations.to_vec();
    };
    if locations.len() < 2 {
        return locations.to_vec();
    }

    let length = path_length(locations);
    let interval = if length < LONG_STEP_INTERVAL_METERS {
        SHORT_STEP_INTERVAL_METERS
    } else {
        LONG_STEP_INTERVAL_METERS
    };

    let mut points = vec![*first];
    let mut walker = PathWalker::new(locations);
    let mut target = interval;
    while target < length {
        points.push(walker.advance_to(target));
        target += interval;
    }
    if length > 0.0 {
        points.push(*last);
    }

    points
}

/// Walks a polyline forward, returning points at increasing distances from its start.
struct PathWalker<'a> {
    path: &'a [LatLng],
    segment: usize,
    /// Distance from the path start to `path[segment]`.
    covered: f64,
}

impl<'a> PathWalker<'a> {
    fn new(path: &'a [LatLng]) -> Self {
        Self {
            path,
            segment: 0,
            covered: 0.0,
        }
    }

    /// Point `meters` along the path. Calls must use non-decreasing distances.
    fn advance_to(&mut self, meters: f64) -> LatLng {
        while self.segment + 1 < self.path.len() {
            let from = self.path[self.segment];
            let to = self.path[self.segment + 1];
            let length = from.distance_to(to);

            if self.covered + length >= meters && length > 0.0 {
                return from.lerp(&to, (meters - self.covered) / length);
            }
            self.covered += length;
            self.segment += 1;
        }
        self.path[self.path.len() - 1]
    }
}
