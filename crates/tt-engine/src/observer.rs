//! Step observer trait for progress reporting and diagnostics.

use tt_core::{GenerationNumber, InputNumber, WorldId};
use tt_world::{InputResult, ScheduledOp};

use crate::step::StepReport;

/// Callbacks invoked by [`run_step`](crate::run_step) at key points.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
pub trait EngineObserver {
    /// Called once at the start of each step.
    fn on_step_start(&mut self, _world: WorldId, _generation: GenerationNumber) {}

    /// Called after each input handler runs, with the recorded result.
    fn on_input_applied(&mut self, _number: InputNumber, _result: &InputResult) {}

    /// Called as each operation is handed to the runtime.
    fn on_operation(&mut self, _op: &ScheduledOp) {}

    /// Called once after the step commits.
    fn on_step_end(&mut self, _world: WorldId, _report: &StepReport) {}
}

/// An [`EngineObserver`] that does nothing.
pub struct NoopObserver;

impl EngineObserver for NoopObserver {}
