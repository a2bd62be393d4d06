//! Simulation time model.
//!
//! # Design
//!
//! Simulated time is a monotonically increasing millisecond counter
//! ([`GameTime`]), advanced in fixed-size ticks by the engine and never by
//! anything else.  Wall-clock time ([`WallTime`]) appears only at the edges:
//! input arrival stamps, vacuum ages, step deadlines, and liveness checks.
//! The two are deliberately distinct types so a wall timestamp can never leak
//! into schedule arithmetic — wall-clock skew must not affect ordering.
//!
//! Using integer milliseconds as the canonical unit keeps all cooldown and
//! timeout arithmetic exact (no floating-point drift) while still being fine
//! enough to interpolate positions between 16 ms ticks.

use std::fmt;
use std::ops::{Add, AddAssign, Sub};

// ── GameTime ──────────────────────────────────────────────────────────────────

/// Absolute simulated time, in milliseconds since the world was created.
///
/// Stored as `u64`: at 16 ms ticks a u64 lasts ~9 billion years of simulated
/// time, so overflow is not a practical concern.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameTime(pub u64);

impl GameTime {
    pub const ZERO: GameTime = GameTime(0);

    /// Milliseconds elapsed from `earlier` to `self`, saturating at zero so
    /// "how long since X" never underflows when X is in the future.
    #[inline]
    pub fn since(self, earlier: GameTime) -> GameDuration {
        GameDuration(self.0.saturating_sub(earlier.0))
    }
}

impl Add<GameDuration> for GameTime {
    type Output = GameTime;
    #[inline]
    fn add(self, rhs: GameDuration) -> GameTime {
        GameTime(self.0 + rhs.0)
    }
}

impl AddAssign<GameDuration> for GameTime {
    #[inline]
    fn add_assign(&mut self, rhs: GameDuration) {
        self.0 += rhs.0;
    }
}

impl Sub for GameTime {
    type Output = GameDuration;
    #[inline]
    fn sub(self, rhs: GameTime) -> GameDuration {
        GameDuration(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for GameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t+{}ms", self.0)
    }
}

// ── GameDuration ──────────────────────────────────────────────────────────────

/// A span of simulated time, in milliseconds.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameDuration(pub u64);

impl GameDuration {
    pub const ZERO: GameDuration = GameDuration(0);

    #[inline]
    pub const fn from_millis(ms: u64) -> GameDuration {
        GameDuration(ms)
    }

    #[inline]
    pub const fn from_secs(secs: u64) -> GameDuration {
        GameDuration(secs * 1_000)
    }

    #[inline]
    pub const fn from_minutes(minutes: u64) -> GameDuration {
        GameDuration(minutes * 60_000)
    }

    #[inline]
    pub fn as_millis(self) -> u64 {
        self.0
    }

    /// Fractional seconds, for speed/distance arithmetic.
    #[inline]
    pub fn as_secs_f32(self) -> f32 {
        self.0 as f32 / 1_000.0
    }
}

impl Add for GameDuration {
    type Output = GameDuration;
    #[inline]
    fn add(self, rhs: GameDuration) -> GameDuration {
        GameDuration(self.0 + rhs.0)
    }
}

impl fmt::Display for GameDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 1_000 == 0 {
            write!(f, "{}s", self.0 / 1_000)
        } else {
            write!(f, "{}ms", self.0)
        }
    }
}

// ── WallTime ──────────────────────────────────────────────────────────────────

/// Wall-clock time as Unix milliseconds.
///
/// The kernel never reads the system clock itself: drivers pass `WallTime`
/// into every API that needs one (input stamps, step deadlines, vacuum,
/// liveness sweeps).  Tests pass fabricated values; binaries pass
/// [`WallTime::now`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WallTime(pub u64);

impl WallTime {
    /// The current system time.  Call sites live in binaries and the
    /// supervisor driver — never inside a tick.
    pub fn now() -> WallTime {
        let ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        WallTime(ms)
    }

    /// Milliseconds elapsed from `earlier` to `self`, saturating at zero.
    #[inline]
    pub fn since(self, earlier: WallTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// The wall instant `ms` milliseconds after `self`.
    #[inline]
    pub fn plus_millis(self, ms: u64) -> WallTime {
        WallTime(self.0 + ms)
    }
}

impl fmt::Display for WallTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wall:{}", self.0)
    }
}
