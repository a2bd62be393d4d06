//! Background cleanup sweeps: vacuum, cascade deletion, ghost agents.

use tracing::{debug, info};

use tt_core::{WallTime, WorldId};
use tt_ops::cascade_store_purge;
use tt_store::TownStore;
use tt_world::{apply_input, Input};

use crate::error::EngineResult;
use crate::supervisor::Supervisor;

/// Per-run cap on journal rows removed by one cascade pass.
const CASCADE_INPUT_CAP: usize = 1_000;

impl Supervisor {
    // ── Vacuum ────────────────────────────────────────────────────────────

    /// Remove old processed journal rows everywhere, in capped batches.
    /// Returns the total rows removed.
    pub fn vacuum_sweep(&mut self, now: WallTime) -> usize {
        let mut total = 0;
        for id in self.world_ids() {
            let Ok(slot) = self.slot_mut(id) else { continue };
            let (max_age, batch) = (
                slot.world.config.vacuum_max_age_ms,
                slot.world.config.delete_batch_size,
            );
            loop {
                let removed = slot.journal.vacuum(now, max_age, batch);
                total += removed;
                if removed < batch {
                    break;
                }
            }
        }
        if total > 0 {
            debug!(rows = total, "vacuum sweep");
        }
        total
    }

    /// Fail unprocessed inputs older than `max_age_ms` in one world without
    /// executing them.  The recovery hammer for a backed-up journal.
    pub fn emergency_flush(
        &mut self,
        id:         WorldId,
        max_age_ms: u64,
        now:        WallTime,
    ) -> EngineResult<usize> {
        let slot = self.slot_mut(id)?;
        let flushed = slot.journal.emergency_flush(now, max_age_ms);
        if flushed > 0 {
            info!(world = id.0, rows = flushed, "emergency flush");
        }
        Ok(flushed)
    }

    // ── Cascade delete ────────────────────────────────────────────────────

    /// Remove a bot (addressed by its external id) and every derived record:
    /// live entities, descriptions, messages, logs, relationships both ways,
    /// inventory, lootboxes, experience, participation edges, archived
    /// conversations, and journal rows referencing it.  Batched and
    /// idempotent: returns total rows touched, 0 when nothing remained.
    pub fn cascade_delete_bot(
        &mut self,
        id:     WorldId,
        bot_id: &str,
        now:    WallTime,
    ) -> EngineResult<usize> {
        let slot = self.slot_mut(id)?;
        let mut total = 0;

        // Live world first: route through the ordinary leave path so
        // conversations stop and the archive rows are written.
        let mut targets = Vec::new();
        if let Some((agent_id, player_id)) = slot.world.find_by_bot_id(bot_id) {
            let result = apply_input(
                &mut slot.world,
                slot.engine.current_time,
                &Input::Leave { player_id },
            );
            if result.is_ok() {
                total += 1;
                targets.push((player_id, Some(agent_id)));
            }
        }

        // Players removed by an earlier pass leave an archive row behind;
        // their derived data is still fair game.  (The agent id is gone with
        // them — agent-referencing journal rows were purged when they left.)
        targets.extend(
            slot.store
                .archived_entities()
                .iter()
                .filter(|row| row.ai_arena_bot_id.as_deref() == Some(bot_id))
                .map(|row| (row.player_id, None)),
        );
        targets.sort_unstable();
        targets.dedup();

        // Derived data, in capped batches until a full pass removes nothing.
        for (player_id, agent_id) in targets {
            loop {
                let removed = cascade_store_purge(&mut slot.store, player_id)
                    + slot.journal.purge_referencing(player_id, agent_id, CASCADE_INPUT_CAP);
                total += removed;
                if removed == 0 {
                    break;
                }
            }
        }

        total += slot.store.purge_registration(bot_id);
        if total > 0 {
            info!(world = id.0, bot = bot_id, rows = total, "cascade delete");
        }
        Ok(total)
    }

    // ── Ghost agents ──────────────────────────────────────────────────────

    /// Remove agents whose player no longer exists (and their descriptions).
    /// Intended to run daily; cheap enough to run any time.
    pub fn ghost_sweep(&mut self) -> usize {
        let mut removed = 0;
        for id in self.world_ids() {
            let Ok(slot) = self.slot_mut(id) else { continue };
            let ghosts: Vec<_> = slot
                .world
                .agents
                .values()
                .filter(|a| !slot.world.players.contains_key(&a.player_id))
                .map(|a| a.id)
                .collect();
            for agent_id in ghosts {
                slot.world.agents.remove(&agent_id);
                slot.world.agent_descriptions.remove(&agent_id);
                removed += 1;
            }
        }
        if removed > 0 {
            info!(agents = removed, "ghost agents swept");
        }
        removed
    }
}
