//! `WorldConfig` — every tunable of the kernel in one struct.
//!
//! Applications construct one per world (typically `WorldConfig::default()`
//! with a seed) and pass it by value; the kernel never reads configuration
//! from the environment.  Simulated-time windows are [`GameDuration`]s; the
//! handful of wall-clock windows (step deadline, vacuum age, liveness) are
//! plain `u64` milliseconds so they cannot be confused with sim time.

use crate::time::GameDuration;

/// Per-world configuration.  `Default` is the canonical constant set.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldConfig {
    /// Master seed for the world RNG.  Same seed + same inputs = same world.
    pub seed: u64,

    // ── Tick / step cadence ───────────────────────────────────────────────
    /// Length of one simulated tick.
    pub tick: GameDuration,
    /// Simulated time advanced per step: a step runs `step_interval / tick`
    /// ticks unless the wall deadline fires first.
    pub step_interval: GameDuration,
    /// Wall-clock budget for a single step; on expiry the step commits what
    /// it has and reschedules.
    pub max_step_wall_ms: u64,

    // ── Movement ──────────────────────────────────────────────────────────
    /// Default walking speed, in tiles per second.
    pub player_speed: f32,
    /// A pathfinding older than this is forcibly stopped.
    pub pathfinding_timeout: GameDuration,
    /// Upper bound of the uniform random wait after a collision.
    pub pathfinding_backoff: GameDuration,
    /// Another player within this many tiles of a candidate step counts as a
    /// collision.
    pub collision_threshold: f32,
    /// Fresh route computations allowed per step; excess players stay in
    /// `NeedsPath` and retry next step.
    pub max_pathfinds_per_step: usize,

    // ── Conversations ─────────────────────────────────────────────────────
    /// Two participants closer than this (tiles) may talk.
    pub conversation_distance: f32,
    /// While walking over, head for the midpoint until closer than this.
    pub midpoint_threshold: f32,
    /// Probability an agent accepts an invite from another agent.
    pub invite_accept_probability: f64,
    /// An invitee that has not entered `Participating` by then gives up.
    pub invite_timeout: GameDuration,
    /// A non-creator may break the silence after this long.
    pub awkward_conversation_timeout: GameDuration,
    /// Conversations end (with a leave message) after this long.
    pub max_conversation_duration: GameDuration,
    /// Conversations end after this many messages.
    pub max_conversation_messages: u32,
    /// Minimum gap between messages from different speakers.
    pub message_cooldown: GameDuration,
    /// Agent-level cooldown after a conversation or an invite attempt.
    pub conversation_cooldown: GameDuration,
    /// Pair-level cooldown before the same two players re-engage.
    pub player_conversation_cooldown: GameDuration,

    // ── Agent autonomy ────────────────────────────────────────────────────
    /// Cooldown after a zone activity completes.
    pub activity_cooldown: GameDuration,
    /// Cooldown between robbery attempts.
    pub robbery_cooldown: GameDuration,
    /// Cooldown between combat engagements.
    pub combat_cooldown: GameDuration,
    /// Knockout duration after losing combat.
    pub hospital_recovery: GameDuration,
    /// Probability the criminal branch actually starts a scored robbery.
    pub robbery_start_probability: f64,
    /// Probability the underground branch actually starts combat.
    pub combat_start_probability: f64,
    /// An `in_progress_operation` older than this is abandoned.
    pub action_timeout: GameDuration,

    // ── Players ───────────────────────────────────────────────────────────
    /// Cap on simultaneously joined human players.
    pub max_human_players: usize,
    /// Humans idle longer than this are auto-left with cascade cleanup.
    pub human_idle_too_long: GameDuration,
    /// Starting energy for bot players; drains 1 unit per 5 sim-minutes of
    /// movement eligibility and is refilled only by external effects.
    pub initial_energy: u32,

    // ── Journal / lifecycle (wall clock) ──────────────────────────────────
    /// Unprocessed-input cap per engine; appends beyond it are rejected.
    pub max_inputs_per_engine: usize,
    /// Inputs older than this are removed by the vacuum sweep.
    pub vacuum_max_age_ms: u64,
    /// Row cap per vacuum / cascade batch.
    pub delete_batch_size: usize,
    /// A world unviewed for this long with no pending work goes inactive.
    pub idle_world_timeout_ms: u64,
    /// A running engine whose last step is older than this is considered
    /// stalled and gets kicked by the liveness sweep.
    pub stalled_engine_ms: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 0,

            tick:             GameDuration::from_millis(16),
            step_interval:    GameDuration::from_secs(1),
            max_step_wall_ms: 10 * 60 * 1_000,

            player_speed:           1.0,
            pathfinding_timeout:    GameDuration::from_secs(60),
            pathfinding_backoff:    GameDuration::from_secs(1),
            collision_threshold:    0.75,
            max_pathfinds_per_step: 16,

            conversation_distance:        1.3,
            midpoint_threshold:           4.0,
            invite_accept_probability:    0.8,
            invite_timeout:               GameDuration::from_secs(60),
            awkward_conversation_timeout: GameDuration::from_secs(20),
            max_conversation_duration:    GameDuration::from_secs(120),
            max_conversation_messages:    8,
            message_cooldown:             GameDuration::from_secs(2),
            conversation_cooldown:        GameDuration::from_secs(15),
            player_conversation_cooldown: GameDuration::from_secs(60),

            activity_cooldown:         GameDuration::from_secs(10),
            robbery_cooldown:          GameDuration::from_secs(120),
            combat_cooldown:           GameDuration::from_secs(120),
            hospital_recovery:         GameDuration::from_secs(180),
            robbery_start_probability: 0.3,
            combat_start_probability:  0.4,
            action_timeout:            GameDuration::from_secs(60),

            max_human_players:   8,
            human_idle_too_long: GameDuration::from_minutes(5),
            initial_energy:      100,

            max_inputs_per_engine: 1_000,
            vacuum_max_age_ms:     2 * 60 * 60 * 1_000,
            delete_batch_size:     64,
            idle_world_timeout_ms: 5 * 60 * 1_000,
            stalled_engine_ms:     2 * 60 * 1_000,
        }
    }
}

impl WorldConfig {
    /// A default config with the given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed, ..Self::default() }
    }

    /// Ticks executed per step (`step_interval / tick`, at least 1).
    #[inline]
    pub fn ticks_per_step(&self) -> u64 {
        (self.step_interval.as_millis() / self.tick.as_millis()).max(1)
    }
}
