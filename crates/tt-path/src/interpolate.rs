//! Continuous position sampling along a time-stamped path.

use tt_core::GameTime;
use tt_map::{Point, Vector};

use crate::astar::Path;

/// A sampled instant along a path.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PathSample {
    pub position: Point,
    pub facing:   Vector,
    /// Instantaneous speed in tiles per second; zero at and past the end.
    pub velocity: f32,
}

/// Sample `path` at time `now`.
///
/// Before the first waypoint the walker stands at the start facing its first
/// leg; past the last waypoint it stands at the end with zero velocity.
/// Returns `None` only for an empty path (a malformed state the caller
/// treats by stopping the walker).
pub fn path_position(path: &Path, now: GameTime) -> Option<PathSample> {
    let steps = path.steps();
    let first = steps.first()?;
    let last = steps.last()?;

    if now <= first.t {
        return Some(PathSample {
            position: first.position,
            facing:   initial_facing(path),
            velocity: 0.0,
        });
    }
    if now >= last.t {
        let facing = steps
            .windows(2)
            .rev()
            .find(|w| w[0].position != w[1].position)
            .map(|w| Vector::towards(w[0].position, w[1].position))
            .unwrap_or_default();
        return Some(PathSample { position: last.position, facing, velocity: 0.0 });
    }

    // Invariant: first.t < now < last.t, so a bracketing segment exists.
    for w in steps.windows(2) {
        let (a, b) = (&w[0], &w[1]);
        if now < a.t || now >= b.t {
            continue;
        }
        let dt_ms = (b.t - a.t).as_millis();
        if dt_ms == 0 {
            continue;
        }
        let frac = now.since(a.t).as_millis() as f32 / dt_ms as f32;
        let position = Point::new(
            a.position.x + (b.position.x - a.position.x) * frac,
            a.position.y + (b.position.y - a.position.y) * frac,
        );
        let leg = a.position.distance(b.position);
        return Some(PathSample {
            position,
            facing:   Vector::towards(a.position, b.position),
            velocity: leg / (dt_ms as f32 / 1_000.0),
        });
    }

    // Times are monotone, so falling through means duplicate timestamps at
    // `now`; stand at the last waypoint not after `now`.
    let standing = steps.iter().rev().find(|s| s.t <= now).unwrap_or(first);
    Some(PathSample {
        position: standing.position,
        facing:   Vector::default(),
        velocity: 0.0,
    })
}

fn initial_facing(path: &Path) -> Vector {
    let steps = path.steps();
    steps
        .windows(2)
        .find(|w| w[0].position != w[1].position)
        .map(|w| Vector::towards(w[0].position, w[1].position))
        .unwrap_or_default()
}
