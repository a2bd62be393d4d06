//! A* search over the 4-connected tile grid.
//!
//! # Cost model
//!
//! Costs are simulated milliseconds: traversing one tile takes
//! `1000 / speed` ms.  The heuristic is Euclidean distance times the same
//! per-tile cost, which never overestimates on a 4-connected grid.  Ties on
//! total estimate break toward heading continuity (fewer turns), so routes
//! across open ground come out as long straight runs instead of staircases.
//!
//! # Occupancy
//!
//! The occupancy predicate marks tiles currently held by other walkers.  An
//! occupied or statically blocked destination is not an error: the search
//! retargets the nearest passable tile (breadth-first ring scan) and reports
//! it as `new_destination` so the caller can update its records.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;

use tt_core::GameTime;
use tt_map::{Point, Tile, WorldMap};

use crate::error::{PathError, PathResult};

// ── Path ──────────────────────────────────────────────────────────────────────

/// One waypoint of a computed path: where, and when the walker gets there.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathStep {
    pub position: Point,
    pub t:        GameTime,
}

/// A time-stamped route.
///
/// Invariants, upheld by construction and checked by `debug_assert`s:
/// arrival times are monotone non-decreasing, and consecutive positions are
/// grid neighbors or identical.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Path(Vec<PathStep>);

impl Path {
    pub fn new(steps: Vec<PathStep>) -> Path {
        debug_assert!(steps.windows(2).all(|w| w[0].t <= w[1].t));
        Path(steps)
    }

    #[inline]
    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Final waypoint, if the path is non-empty.
    pub fn last(&self) -> Option<&PathStep> {
        self.0.last()
    }

    /// Arrival time at the final waypoint.
    pub fn arrival(&self) -> Option<GameTime> {
        self.0.last().map(|s| s.t)
    }
}

/// Successful search result.
#[derive(Clone, Debug)]
pub struct RouteFound {
    pub path: Path,
    /// Set when the requested destination was impassable and the route ends
    /// at the nearest passable tile instead.
    pub new_destination: Option<Tile>,
}

// ── Search internals ──────────────────────────────────────────────────────────

/// Heap key: (estimated total ms, turns so far, insertion counter).
///
/// The counter makes ordering total and deterministic; turns implement the
/// heading-continuity tie-break.
type HeapKey = (u64, u32, u64);

#[derive(Copy, Clone)]
struct NodeRecord {
    cost_ms:  u64,
    turns:    u32,
    came_dir: (i32, i32),
    parent:   Option<Tile>,
}

/// Compute a route from `from` (a continuous position) to the tile `to`.
///
/// `occupied` reports tiles transiently held by other walkers; `now` stamps
/// the departure.  Returns [`RouteFound`] whose path always begins at `from`
/// itself so interpolation is seamless from the walker's true position.
pub fn find_route(
    map:      &WorldMap,
    from:     Point,
    to:       Tile,
    occupied: &dyn Fn(Tile) -> bool,
    now:      GameTime,
    speed:    f32,
) -> PathResult<RouteFound> {
    if speed <= 0.0 {
        return Err(PathError::BadSpeed(speed));
    }
    if !map.in_bounds(to) {
        return Err(PathError::DestinationOutOfBounds(to));
    }

    let passable = |t: Tile| !map.blocked(t) && !occupied(t);

    let start = from.tile();
    let (goal, new_destination) = if passable(to) {
        (to, None)
    } else {
        let nearest = nearest_passable(map, to, &passable)
            .ok_or(PathError::Unreachable { from: start, to })?;
        (nearest, Some(nearest))
    };

    let ms_per_tile = (1_000.0 / speed).ceil() as u64;

    if start == goal {
        let path = Path::new(vec![
            PathStep { position: from, t: now },
            PathStep { position: goal.point(), t: now + tt_core::GameDuration(ms_per_tile) },
        ]);
        return Ok(RouteFound { path, new_destination });
    }

    // ── A* proper ─────────────────────────────────────────────────────────
    let mut open: BinaryHeap<Reverse<(HeapKey, Tile)>> = BinaryHeap::new();
    let mut records: FxHashMap<Tile, NodeRecord> = FxHashMap::default();
    let mut counter: u64 = 0;

    records.insert(start, NodeRecord {
        cost_ms:  0,
        turns:    0,
        came_dir: (0, 0),
        parent:   None,
    });
    open.push(Reverse(((heuristic(start, goal, ms_per_tile), 0, counter), start)));

    let mut reached = false;
    while let Some(Reverse((_, current))) = open.pop() {
        if current == goal {
            reached = true;
            break;
        }
        let record = records[&current];

        for next in map.neighbors(current) {
            if !passable(next) {
                continue;
            }
            let dir = (next.x - current.x, next.y - current.y);
            let turned = record.came_dir != (0, 0) && record.came_dir != dir;
            let cost_ms = record.cost_ms + ms_per_tile;
            let turns = record.turns + u32::from(turned);

            let better = match records.get(&next) {
                None    => true,
                Some(r) => (cost_ms, turns) < (r.cost_ms, r.turns),
            };
            if better {
                records.insert(next, NodeRecord {
                    cost_ms,
                    turns,
                    came_dir: dir,
                    parent: Some(current),
                });
                counter += 1;
                let estimate = cost_ms + heuristic(next, goal, ms_per_tile);
                open.push(Reverse(((estimate, turns, counter), next)));
            }
        }
    }

    if !reached {
        return Err(PathError::Unreachable { from: start, to });
    }

    // ── Reconstruct, then stamp arrival times forward ─────────────────────
    let mut tiles = vec![goal];
    let mut cursor = goal;
    while let Some(parent) = records[&cursor].parent {
        tiles.push(parent);
        cursor = parent;
    }
    tiles.reverse();

    let mut steps = Vec::with_capacity(tiles.len() + 1);
    steps.push(PathStep { position: from, t: now });
    let mut t = now;
    for tile in tiles {
        t += tt_core::GameDuration(ms_per_tile);
        steps.push(PathStep { position: tile.point(), t });
    }

    Ok(RouteFound { path: Path::new(steps), new_destination })
}

#[inline]
fn heuristic(from: Tile, goal: Tile, ms_per_tile: u64) -> u64 {
    let d = from.point().distance(goal.point());
    (d * ms_per_tile as f32) as u64
}

/// Breadth-first ring scan for the passable tile nearest to `blocked_goal`.
fn nearest_passable(
    map:          &WorldMap,
    blocked_goal: Tile,
    passable:     &dyn Fn(Tile) -> bool,
) -> Option<Tile> {
    use std::collections::VecDeque;

    let mut queue = VecDeque::from([blocked_goal]);
    let mut seen: FxHashMap<Tile, ()> = FxHashMap::default();
    seen.insert(blocked_goal, ());

    while let Some(tile) = queue.pop_front() {
        for next in map.neighbors(tile) {
            if seen.insert(next, ()).is_some() {
                continue;
            }
            if passable(next) {
                return Some(next);
            }
            queue.push_back(next);
        }
    }
    None
}
