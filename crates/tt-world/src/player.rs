//! Per-player kinematic and activity state.

use serde::{Deserialize, Serialize};

use tt_core::{GameTime, PlayerId};
use tt_map::{Point, Tile, Vector, Zone};
use tt_path::Path;

// ── Equipment ─────────────────────────────────────────────────────────────────

/// Visible equipment bonuses, set by external services via
/// `Input::UpdatePlayerEquipment`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub power_bonus:   i32,
    pub defense_bonus: i32,
    /// Defense contribution of the player's house, if any.  There is no
    /// houses table in the kernel; external services set this alongside the
    /// other bonuses.
    pub house_defense_level: i32,
}

// ── Activity ──────────────────────────────────────────────────────────────────

/// A zone-scoped activity the player is performing until `until`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub description: String,
    pub emoji:       Option<String>,
    pub until:       GameTime,
}

// ── Pathfinding ───────────────────────────────────────────────────────────────

/// Where a pathfinding attempt currently stands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PathfindingState {
    /// Wants a route but hasn't been granted a search slot yet.
    NeedsPath,
    /// Backed off after a collision; re-enters `NeedsPath` at `until`.
    Waiting { until: GameTime },
    /// Following a computed, time-stamped path.
    Moving { path: Path },
}

/// An active movement goal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pathfinding {
    pub destination: Tile,
    /// When the goal was set; bounds the attempt's lifetime.
    pub started: GameTime,
    pub state:   PathfindingState,
}

impl Pathfinding {
    pub fn new(destination: Tile, now: GameTime) -> Pathfinding {
        Pathfinding { destination, started: now, state: PathfindingState::NeedsPath }
    }
}

// ── Player ────────────────────────────────────────────────────────────────────

/// One entity on the map — human-controlled if `human_token` is set,
/// otherwise the body of an [`Agent`](crate::Agent).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,

    /// Identity token of the controlling human, if any.
    pub human_token: Option<String>,

    // ── Kinematics ────────────────────────────────────────────────────────
    pub position: Point,
    pub facing:   Vector,
    /// Walking speed in tiles per second.
    pub speed: f32,

    pub pathfinding: Option<Pathfinding>,
    pub activity:    Option<Activity>,
    pub current_zone: Zone,
    pub equipment:   Equipment,

    // ── Bookkeeping counters ──────────────────────────────────────────────
    /// Sim time of the last input that named this player (idle detection).
    pub last_input: GameTime,
    /// Bot stamina; drains while time passes and is refilled only by
    /// external effects.  Humans carry the field but never drain it.
    pub energy: u32,
    pub last_energy_drain: GameTime,
    /// Movement-step counter feeding the XP grants.
    pub steps_taken: u32,
    /// Consecutive step grants without an idle gap.
    pub streak: u32,
    pub last_step_grant: GameTime,
    /// Anchor for the half-tile step distance rule.
    pub last_step_position: Point,
    pub last_loot_roll: GameTime,
}

impl Player {
    pub fn new(
        id:          PlayerId,
        human_token: Option<String>,
        position:    Point,
        zone:        Zone,
        speed:       f32,
        energy:      u32,
        now:         GameTime,
    ) -> Player {
        Player {
            id,
            human_token,
            position,
            facing: Vector::default(),
            speed,
            pathfinding: None,
            activity: None,
            current_zone: zone,
            equipment: Equipment::default(),
            last_input: now,
            energy,
            last_energy_drain: now,
            steps_taken: 0,
            streak: 0,
            last_step_grant: now,
            last_step_position: position,
            last_loot_roll: now,
        }
    }

    #[inline]
    pub fn is_human(&self) -> bool {
        self.human_token.is_some()
    }

    /// `true` while the player has an active movement goal.
    #[inline]
    pub fn is_moving(&self) -> bool {
        self.pathfinding.is_some()
    }

    /// Drop any movement goal and come to rest.
    pub fn stop_pathfinding(&mut self) {
        self.pathfinding = None;
    }

    /// Point the player at a (possibly new) destination.  Re-targeting an
    /// existing goal restarts the attempt clock.
    pub fn set_destination(&mut self, destination: Tile, now: GameTime) {
        match &self.pathfinding {
            Some(p) if p.destination == destination => {}
            _ => self.pathfinding = Some(Pathfinding::new(destination, now)),
        }
    }
}
