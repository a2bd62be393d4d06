//! The process-wide supervisor: `worldId → engine` plus lifecycle hooks.

use std::collections::BTreeMap;

use tracing::{error, info, warn};

use tt_core::{EngineId, WallTime, WorldConfig, WorldId};
use tt_journal::Journal;
use tt_map::{WorldMap, Zone};
use tt_ops::{AgentMind, OperationRuntime};
use tt_store::{MemStore, TownStore};
use tt_world::{Input, Personality, World};

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::observer::NoopObserver;
use crate::step::{run_step, StepReport};

// ── WorldStatus ───────────────────────────────────────────────────────────────

/// Deployment status of one world.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WorldStatus {
    /// Live; the engine steps it on schedule.
    Running,
    /// Nobody watching and nothing to do; the engine is parked and restarts
    /// on demand.
    Inactive,
    /// Explicitly stopped; only an explicit start revives it.
    StoppedByDeveloper,
}

// ── WorldSlot ─────────────────────────────────────────────────────────────────

/// Everything the supervisor holds for one world.
pub struct WorldSlot {
    pub world:   World,
    pub engine:  Engine,
    pub journal: Journal,
    pub runtime: OperationRuntime<Box<dyn AgentMind>>,
    pub store:   MemStore,

    pub status:      WorldStatus,
    pub last_viewed: WallTime,
    pub is_default:  bool,
    /// Snapshot committed by the most recent step.
    pub last_snapshot: Vec<u8>,
}

// ── Supervisor ────────────────────────────────────────────────────────────────

/// Owns every world in the process and the background sweeps that keep them
/// healthy.  Single writer per world: all mutation funnels through here.
#[derive(Default)]
pub struct Supervisor {
    slots:       BTreeMap<WorldId, WorldSlot>,
    next_world:  u32,
    next_engine: u32,
}

impl Supervisor {
    pub fn new() -> Supervisor {
        Supervisor::default()
    }

    // ── World creation ────────────────────────────────────────────────────

    /// Create a world (not yet running).
    pub fn create_world(
        &mut self,
        config: WorldConfig,
        map:    WorldMap,
        mind:   Box<dyn AgentMind>,
        now:    WallTime,
    ) -> WorldId {
        let world_id = WorldId(self.next_world);
        self.next_world += 1;
        let engine_id = EngineId(self.next_engine);
        self.next_engine += 1;

        let max_pending = config.max_inputs_per_engine;
        let world = World::new(world_id, config, map);
        self.slots.insert(world_id, WorldSlot {
            world,
            engine:  Engine::new(engine_id, now),
            journal: Journal::new(max_pending),
            runtime: OperationRuntime::new(mind),
            store:   MemStore::new(),
            status:  WorldStatus::Running,
            last_viewed: now,
            is_default:  false,
            last_snapshot: Vec::new(),
        });
        info!(world = world_id.0, engine = engine_id.0, "world created");
        world_id
    }

    /// The deployment's single default world, created on first demand.
    pub fn get_or_create_default(
        &mut self,
        config: WorldConfig,
        map:    WorldMap,
        mind:   Box<dyn AgentMind>,
        now:    WallTime,
    ) -> WorldId {
        if let Some((id, _)) = self.slots.iter().find(|(_, s)| s.is_default) {
            return *id;
        }
        let id = self.create_world(config, map, mind, now);
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.is_default = true;
        }
        id
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn slot(&self, id: WorldId) -> EngineResult<&WorldSlot> {
        self.slots.get(&id).ok_or(EngineError::UnknownWorld(id))
    }

    pub fn slot_mut(&mut self, id: WorldId) -> EngineResult<&mut WorldSlot> {
        self.slots.get_mut(&id).ok_or(EngineError::UnknownWorld(id))
    }

    pub fn world_ids(&self) -> Vec<WorldId> {
        self.slots.keys().copied().collect()
    }

    /// A viewer touched this world; feeds the idle-stop heartbeat.
    pub fn record_view(&mut self, id: WorldId, now: WallTime) -> EngineResult<()> {
        self.slot_mut(id)?.last_viewed = now;
        Ok(())
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    pub fn start(&mut self, id: WorldId, now: WallTime) -> EngineResult<()> {
        let slot = self.slot_mut(id)?;
        slot.engine.start(now);
        slot.status = WorldStatus::Running;
        info!(world = id.0, generation = slot.engine.generation.0, "engine started");
        Ok(())
    }

    pub fn stop(&mut self, id: WorldId) -> EngineResult<()> {
        let slot = self.slot_mut(id)?;
        slot.engine.stop();
        slot.status = WorldStatus::StoppedByDeveloper;
        info!(world = id.0, "engine stopped by developer");
        Ok(())
    }

    /// Force a step right now.
    pub fn kick(&mut self, id: WorldId, now: WallTime) -> EngineResult<StepReport> {
        let slot = self.slot_mut(id)?;
        step_slot(slot, now)
    }

    /// Step every running world whose step interval has elapsed.
    pub fn step_due(&mut self, now: WallTime) {
        #[cfg(not(feature = "parallel"))]
        {
            for slot in self.slots.values_mut() {
                step_if_due(slot, now);
            }
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            // Worlds are independent single-writer units; stepping them on
            // the pool is safe because each slot is touched by one worker.
            self.slots
                .values_mut()
                .par_bridge()
                .for_each(|slot| step_if_due(slot, now));
        }
    }

    // ── Heartbeat ─────────────────────────────────────────────────────────

    /// Periodic liveness pass: restart worlds with pending registrations,
    /// park idle worlds, kick stalled engines, revive dead ones.
    pub fn heartbeat(&mut self, now: WallTime) {
        for (id, slot) in self.slots.iter_mut() {
            match slot.status {
                WorldStatus::StoppedByDeveloper => {}

                WorldStatus::Inactive => {
                    if slot.store.has_pending_registrations() {
                        slot.engine.start(now);
                        slot.status = WorldStatus::Running;
                        spawn_registrations(slot, now);
                        info!(world = id.0, "inactive world revived for registrations");
                    }
                }

                WorldStatus::Running => {
                    if slot.store.has_pending_registrations() {
                        spawn_registrations(slot, now);
                    }

                    if !slot.engine.running {
                        // Died on an engine-level error; give it a fresh
                        // generation and let it run again.
                        slot.engine.start(now);
                        warn!(world = id.0, "dead engine restarted");
                        continue;
                    }

                    let idle = now.since(slot.last_viewed)
                        > slot.world.config.idle_world_timeout_ms;
                    let no_work = slot.journal.pending_count() == 0
                        && !slot.store.has_pending_registrations();
                    if idle && no_work {
                        slot.engine.stop();
                        slot.status = WorldStatus::Inactive;
                        info!(world = id.0, "idle world parked");
                        continue;
                    }

                    // Stalled: running, but no step landed for too long.
                    // Kick in place — same generation, not a restart.
                    if now.since(slot.engine.last_step_wall)
                        > slot.world.config.stalled_engine_ms
                    {
                        warn!(world = id.0, "stalled engine kicked");
                        if let Err(e) = step_slot(slot, now) {
                            error!(world = id.0, error = %e, "kick failed");
                        }
                    }
                }
            }
        }
    }
}

// ── Slot helpers ──────────────────────────────────────────────────────────────

fn step_if_due(slot: &mut WorldSlot, now: WallTime) {
    if !slot.engine.running {
        return;
    }
    let due = now.since(slot.engine.last_step_wall)
        >= slot.world.config.step_interval.as_millis();
    if !due {
        return;
    }
    if let Err(e) = step_slot(slot, now) {
        // Engine-level failure: stop and let the heartbeat restart it.
        error!(world = slot.world.id.0, error = %e, "step failed; engine stopped");
        slot.engine.stop();
    }
}

/// One step plus the snapshot commit.
pub(crate) fn step_slot(slot: &mut WorldSlot, now: WallTime) -> EngineResult<StepReport> {
    let WorldSlot { world, engine, journal, runtime, store, last_snapshot, .. } = slot;
    let report = run_step(
        world,
        engine,
        journal,
        runtime,
        store,
        now,
        &|| now,
        &mut NoopObserver,
    )?;
    *last_snapshot = world.snapshot()?;
    Ok(report)
}

/// Turn pending bot registrations into `CreateAgent` inputs.
fn spawn_registrations(slot: &mut WorldSlot, now: WallTime) {
    for registration in slot.store.drain_registrations() {
        let personality = personality_for(&registration.ai_arena_bot_id);
        let initial_zone = registration.initial_zone.as_deref().and_then(zone_by_name);
        let input = Input::CreateAgent {
            name:            registration.name,
            character:       registration.character,
            identity:        registration.identity,
            plan:            registration.plan,
            personality,
            ai_arena_bot_id: registration.ai_arena_bot_id,
            initial_zone,
        };
        slot.journal.append_internal(input, now);
    }
}

/// Deterministic personality assignment for externally registered bots.
fn personality_for(bot_id: &str) -> Personality {
    match bot_id.bytes().map(u64::from).sum::<u64>() % 3 {
        0 => Personality::Criminal,
        1 => Personality::Gambler,
        _ => Personality::Worker,
    }
}

fn zone_by_name(name: &str) -> Option<Zone> {
    [
        Zone::Commons,
        Zone::DarkAlley,
        Zone::Underground,
        Zone::Casino,
        Zone::Suburb,
        Zone::Market,
        Zone::Park,
    ]
    .into_iter()
    .find(|z| z.name() == name)
}
