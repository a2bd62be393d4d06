//! The `WorldMap` tile grid.
//!
//! # Data layout
//!
//! Blockage is a dense `Vec<bool>` indexed `y * width + x`; every query is a
//! bounds check plus one array read.  Out-of-bounds cells report as blocked
//! so callers never need a separate bounds branch on movement paths.

use thiserror::Error;

use tt_core::WorldRng;

use crate::point::{Point, Tile};
use crate::zone::{Zone, ZoneRect};

#[derive(Debug, Error)]
pub enum MapError {
    #[error("map dimensions {0}x{1} must be positive")]
    EmptyMap(i32, i32),

    #[error("zone rect {0:?} lies outside the {1}x{2} map")]
    ZoneOutOfBounds(ZoneRect, i32, i32),
}

pub type MapResult<T> = Result<T, MapError>;

// ── WorldMap ──────────────────────────────────────────────────────────────────

/// Static tile grid: dimensions, blocked mask, zone partition.
///
/// Construct once per world with [`WorldMap::new`] and treat as immutable for
/// the lifetime of the world — the kernel snapshots it alongside dynamic
/// state so a replayed world sees identical geometry.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldMap {
    width:   i32,
    height:  i32,
    blocked: Vec<bool>,
    zones:   Vec<ZoneRect>,
}

impl WorldMap {
    /// An open map with no blocked cells and no zones.
    pub fn new(width: i32, height: i32) -> MapResult<WorldMap> {
        if width <= 0 || height <= 0 {
            return Err(MapError::EmptyMap(width, height));
        }
        Ok(WorldMap {
            width,
            height,
            blocked: vec![false; (width * height) as usize],
            zones: Vec::new(),
        })
    }

    /// Mark a cell blocked.  Out-of-bounds tiles are ignored (already
    /// implicitly blocked).
    pub fn set_blocked(&mut self, tile: Tile) {
        if self.in_bounds(tile) {
            let idx = (tile.y * self.width + tile.x) as usize;
            self.blocked[idx] = true;
        }
    }

    /// Add a zone rectangle.  Earlier rectangles win where they overlap.
    pub fn add_zone(&mut self, rect: ZoneRect) -> MapResult<()> {
        let in_map = rect.x0 >= 0 && rect.y0 >= 0 && rect.x1 < self.width && rect.y1 < self.height
            && rect.x0 <= rect.x1
            && rect.y0 <= rect.y1;
        if !in_map {
            return Err(MapError::ZoneOutOfBounds(rect, self.width, self.height));
        }
        self.zones.push(rect);
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────────────────

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, tile: Tile) -> bool {
        tile.x >= 0 && tile.y >= 0 && tile.x < self.width && tile.y < self.height
    }

    /// `true` for statically blocked cells and everything out of bounds.
    #[inline]
    pub fn blocked(&self, tile: Tile) -> bool {
        if !self.in_bounds(tile) {
            return true;
        }
        self.blocked[(tile.y * self.width + tile.x) as usize]
    }

    /// In-bounds 4-connected neighbors of `tile` (blocked ones included —
    /// pathfinding applies its own passability and occupancy filters).
    pub fn neighbors(&self, tile: Tile) -> impl Iterator<Item = Tile> + '_ {
        tile.adjacent().into_iter().filter(|t| self.in_bounds(*t))
    }

    /// Euclidean distance in tiles.
    #[inline]
    pub fn distance(&self, a: Point, b: Point) -> f32 {
        a.distance(b)
    }

    /// The zone containing `p`.  First matching rectangle wins; uncovered
    /// ground is [`Zone::Commons`].
    pub fn zone_of(&self, p: Point) -> Zone {
        self.zones
            .iter()
            .find(|r| r.contains(p))
            .map(|r| r.zone)
            .unwrap_or(Zone::Commons)
    }

    /// A uniformly random unblocked tile, optionally constrained to a zone.
    ///
    /// Rejection-samples up to a fixed attempt budget; returns `None` for
    /// maps/zones so congested that nothing free was found (callers treat
    /// that as "no destination this tick", never as an error).
    pub fn random_passable_tile(&self, rng: &mut WorldRng, zone: Option<Zone>) -> Option<Tile> {
        const ATTEMPTS: u32 = 64;

        let (x_range, y_range) = match zone.and_then(|z| self.zone_rect(z)) {
            Some(r) => (r.x0..=r.x1, r.y0..=r.y1),
            None    => (0..=self.width - 1, 0..=self.height - 1),
        };

        for _ in 0..ATTEMPTS {
            let tile = Tile::new(
                rng.gen_range(x_range.clone()),
                rng.gen_range(y_range.clone()),
            );
            let zone_ok = zone.is_none_or(|z| self.zone_of(tile.point()) == z);
            if zone_ok && !self.blocked(tile) {
                return Some(tile);
            }
        }
        None
    }

    /// The first rectangle registered for `zone`, if any.
    pub fn zone_rect(&self, zone: Zone) -> Option<&ZoneRect> {
        self.zones.iter().find(|r| r.zone == zone)
    }
}
