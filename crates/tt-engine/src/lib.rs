//! `tt-engine` — drives worlds forward.
//!
//! # The step loop
//!
//! A **step** is one scheduler activation: up to `step_interval / tick`
//! ticks of simulated time, bounded by a wall-clock deadline.  Each tick
//! drains the next contiguous prefix of journal inputs (up to the
//! start-of-step watermark), runs the entity phases, and appends whatever
//! inputs the tick emitted — those land above the watermark and are applied
//! next step.  After the ticks, the step dispatches the collected operations
//! through the runtime and commits a world snapshot.
//!
//! # The supervisor
//!
//! One process-wide [`Supervisor`] owns `worldId → slot` (world + engine +
//! journal + runtime + store).  It starts, stops, and kicks engines; its
//! periodic [`heartbeat`](Supervisor::heartbeat) stops idle worlds, kicks
//! stalled engines, and restarts dead ones; its cleanup sweeps vacuum the
//! journal, cascade-delete departed bots, and remove ghost agents.

pub mod cleanup;
pub mod engine;
pub mod error;
pub mod observer;
pub mod step;
pub mod supervisor;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use observer::{EngineObserver, NoopObserver};
pub use step::{run_step, StepReport};
pub use supervisor::{Supervisor, WorldSlot, WorldStatus};
