//! Random journey selection over a city's named points.

use crate::model::NamedPoint;
use rand::seq::SliceRandom;
use rand::Rng;

/// Minimum straight-line distance between consecutive points of a journey.
pub const MIN_SEPARATION_METERS: f64 = 1000.0;
/// Draws tried for each point before giving up on it.
pub const ATTEMPTS_PER_POINT: usize = 10;

/// Picks up to `count` points from `pool`, each at least
/// [`MIN_SEPARATION_METERS`] from the one before it.
///
/// When `start` is given it becomes the first point, so a new journey can
/// continue from where the last one ended. A point that cannot be placed
/// within [`ATTEMPTS_PER_POINT`] draws is skipped, so callers must check the
/// length of the result.
pub fn select_random_points<R: Rng + ?Sized>(
    pool: &[NamedPoint],
    start: Option<&NamedPoint>,
    count: usize,
    rng: &mut R,
) -> Vec<NamedPoint> {
    if count == 0 || pool.is_empty() {
        return Vec::new();
    }

    let first = match start {
        Some(point) => point.clone(),
        None => match pool.choose(rng) {
            Some(point) => point.clone(),
            None => return Vec::new(),
        },
    };

    let mut points = Vec::with_capacity(count);
    points.push(first);

    for _ in 1..count {
        let Some(last) = points.last().map(|p| p.location) else {
            break;
        };
        let next = (0..ATTEMPTS_PER_POINT)
            .filter_map(|_| pool.choose(rng))
            .find(|candidate| last.distance_to(candidate.location) >= MIN_SEPARATION_METERS);
        if let Some(next) = next {
            points.push(next.clone());
        }
    }

    points
}
