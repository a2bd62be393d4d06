//! Rectangular zone partition.
//!
//! Zones condition behavior, not movement: which activities an agent may pick
//! there, whether robbery/combat branches are live, the robbery odds
//! modifier, and the loot-roll weight.  Cells not covered by any rectangle
//! fall into [`Zone::Commons`].

use std::fmt;

use crate::point::Point;

// ── Zone ──────────────────────────────────────────────────────────────────────

/// The named districts of a town map.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Zone {
    /// Uncovered ground — streets and squares between districts.
    #[default]
    Commons,
    DarkAlley,
    Underground,
    Casino,
    Suburb,
    Market,
    Park,
}

impl Zone {
    /// Additive modifier to the robbery success probability.
    pub fn robbery_modifier(self) -> f64 {
        match self {
            Zone::DarkAlley => 0.15,
            Zone::Casino    => 0.05,
            Zone::Suburb    => -0.10,
            _               => 0.0,
        }
    }

    /// Per-roll probability of a loot drop (rolled at most once per second
    /// of movement).
    pub fn loot_weight(self) -> f64 {
        match self {
            Zone::Casino      => 0.040,
            Zone::DarkAlley   => 0.030,
            Zone::Underground => 0.030,
            Zone::Market      => 0.020,
            Zone::Park        => 0.015,
            Zone::Suburb      => 0.010,
            Zone::Commons     => 0.010,
        }
    }

    /// Stable lower-snake name, used in log rows and archives.
    pub fn name(self) -> &'static str {
        match self {
            Zone::Commons     => "commons",
            Zone::DarkAlley   => "dark_alley",
            Zone::Underground => "underground",
            Zone::Casino      => "casino",
            Zone::Suburb      => "suburb",
            Zone::Market      => "market",
            Zone::Park        => "park",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── ZoneRect ──────────────────────────────────────────────────────────────────

/// One rectangle of the partition, in inclusive tile bounds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZoneRect {
    pub zone: Zone,
    pub x0:   i32,
    pub y0:   i32,
    pub x1:   i32,
    pub y1:   i32,
}

impl ZoneRect {
    pub const fn new(zone: Zone, x0: i32, y0: i32, x1: i32, y1: i32) -> ZoneRect {
        ZoneRect { zone, x0, y0, x1, y1 }
    }

    /// `true` if `p` rounds into this rectangle.
    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        let t = p.tile();
        t.x >= self.x0 && t.x <= self.x1 && t.y >= self.y0 && t.y <= self.y1
    }
}
