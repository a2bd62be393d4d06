//! One step: bounded ticks inside one logical transaction.

use tt_core::WallTime;
use tt_journal::Journal;
use tt_ops::{AgentMind, OperationRuntime};
use tt_path::StepBudget;
use tt_store::TownStore;
use tt_world::{apply_input, ScheduledOp, World};

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::observer::EngineObserver;

/// What one step did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    pub ticks_run:         u64,
    pub inputs_applied:    usize,
    /// Inputs the step itself appended (tick decisions + operation
    /// completions); all land after the step's watermark.
    pub inputs_appended:   usize,
    pub ops_dispatched:    usize,
    /// The wall deadline fired before the full tick budget ran; unprocessed
    /// inputs stay pending for the next step.
    pub hit_wall_deadline: bool,
}

/// Run one step of `world` at wall time `now`.
///
/// `wall` is consulted only for the `max_step_wall_ms` deadline, so tests
/// can freeze it; `now` stamps everything the step appends.
#[allow(clippy::too_many_arguments)]
pub fn run_step<S: TownStore, M: AgentMind>(
    world:    &mut World,
    engine:   &mut Engine,
    journal:  &mut Journal,
    runtime:  &mut OperationRuntime<M>,
    store:    &mut S,
    now:      WallTime,
    wall:     &dyn Fn() -> WallTime,
    observer: &mut dyn EngineObserver,
) -> EngineResult<StepReport> {
    if !engine.running {
        return Err(EngineError::NotRunning(world.id));
    }
    observer.on_step_start(world.id, engine.generation);

    // Inputs appended after this point (by this very step, or by callers
    // racing it) are next step's work.
    let watermark = journal.last_appended();
    let deadline = now.plus_millis(world.config.max_step_wall_ms);
    let ticks = world.config.ticks_per_step();

    let mut report = StepReport::default();
    let mut scheduled: Vec<ScheduledOp> = Vec::new();

    for _ in 0..ticks {
        // ── Phase 1: drain the next contiguous prefix of inputs ───────────
        let pending = journal.pending_in_range(engine.processed_input, watermark);
        for (number, input) in pending {
            let result = apply_input(world, engine.current_time, &input);
            observer.on_input_applied(number, &result);
            journal.record_return(number, result)?;
            engine.processed_input = number;
            report.inputs_applied += 1;
        }

        // ── Phases 2–4: agents, players, conversations ────────────────────
        let mut budget = StepBudget::new(world.config.max_pathfinds_per_step);
        let out = world.tick_entities(store, engine.current_time, &mut budget);

        for input in out.emitted_inputs {
            journal.append_internal(input, now);
            report.inputs_appended += 1;
        }
        for row in out.archived_conversations {
            store.archive_conversation(row);
        }
        for row in out.archived_entities {
            store.archive_entity(row);
        }
        scheduled.extend(out.ops);

        // ── Phase 5: advance simulated time ───────────────────────────────
        engine.current_time += world.config.tick;
        report.ticks_run += 1;

        if wall() >= deadline {
            report.hit_wall_deadline = true;
            break;
        }
    }

    // ── Operation dispatch, off the ticks ─────────────────────────────────
    for op in &scheduled {
        observer.on_operation(op);
        if let Some(follow_up) = runtime.run(world, op, store, engine.current_time) {
            journal.append_internal(follow_up, now);
            report.inputs_appended += 1;
        }
        report.ops_dispatched += 1;
    }

    engine.last_step_wall = now;
    observer.on_step_end(world.id, &report);
    Ok(report)
}
