//! Tile and continuous-position geometry.
//!
//! Positions are measured in *tiles*: a [`Tile`] is an integer grid cell and
//! a [`Point`] is a continuous position in the same coordinate space (so a
//! player halfway between `(2,3)` and `(3,3)` sits at `(2.5, 3.0)`).  `f32`
//! is plenty at map scales of a few hundred tiles.

use std::fmt;

// ── Tile ──────────────────────────────────────────────────────────────────────

/// An integer grid cell.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tile {
    pub x: i32,
    pub y: i32,
}

impl Tile {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Tile {
        Tile { x, y }
    }

    /// The continuous position at this tile's center of mass.
    #[inline]
    pub fn point(self) -> Point {
        Point { x: self.x as f32, y: self.y as f32 }
    }

    /// The four 4-connected neighbor cells, unfiltered for bounds.
    #[inline]
    pub fn adjacent(self) -> [Tile; 4] {
        [
            Tile::new(self.x, self.y - 1),
            Tile::new(self.x - 1, self.y),
            Tile::new(self.x + 1, self.y),
            Tile::new(self.x, self.y + 1),
        ]
    }

    /// Manhattan distance in whole tiles.
    #[inline]
    pub fn manhattan(self, other: Tile) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ── Point ─────────────────────────────────────────────────────────────────────

/// A continuous position in tile coordinates.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Point {
        Point { x, y }
    }

    /// Euclidean distance in tiles.
    #[inline]
    pub fn distance(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// The grid cell this position rounds to.
    #[inline]
    pub fn tile(self) -> Tile {
        Tile::new(self.x.round() as i32, self.y.round() as i32)
    }

    /// Midpoint between two positions.
    #[inline]
    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

// ── Vector ────────────────────────────────────────────────────────────────────

/// A direction/velocity in tile coordinates, used for facing.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector {
    pub dx: f32,
    pub dy: f32,
}

impl Vector {
    #[inline]
    pub const fn new(dx: f32, dy: f32) -> Vector {
        Vector { dx, dy }
    }

    /// Direction from `a` toward `b`, normalized; zero vector if coincident.
    pub fn towards(a: Point, b: Point) -> Vector {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len = (dx * dx + dy * dy).sqrt();
        if len <= f32::EPSILON {
            Vector::default()
        } else {
            Vector::new(dx / len, dy / len)
        }
    }
}
