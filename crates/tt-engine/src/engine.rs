//! The engine record: per-world scheduling state.

use tt_core::{EngineId, GameTime, GenerationNumber, InputNumber, WallTime};

/// Scheduling state for one world.
///
/// The generation number is the fencing token for step schedulers: every
/// (re)start bumps it, and a step observing a stale generation must exit
/// without touching the world.
#[derive(Clone, Debug)]
pub struct Engine {
    pub id: EngineId,
    pub running: bool,
    pub generation: GenerationNumber,

    /// Simulated time, advanced only by ticks.  Strictly monotone while
    /// running.
    pub current_time: GameTime,

    /// Every input with a number at or below this has been applied (or
    /// failed by the emergency flush).
    pub processed_input: InputNumber,

    /// Wall time of the last completed step; the liveness sweep treats a
    /// running engine with a stale value as stalled.
    pub last_step_wall: WallTime,
}

impl Engine {
    pub fn new(id: EngineId, now: WallTime) -> Engine {
        Engine {
            id,
            running: false,
            generation: GenerationNumber::default(),
            current_time: GameTime::ZERO,
            processed_input: InputNumber::ZERO,
            last_step_wall: now,
        }
    }

    /// Mark the engine started, fencing off any stale step schedulers.
    pub fn start(&mut self, now: WallTime) {
        self.running = true;
        self.generation = self.generation.bump();
        self.last_step_wall = now;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }
}
