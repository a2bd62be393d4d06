//! Operation execution.

use std::collections::BTreeSet;

use tracing::warn;

use tt_core::{GameTime, OperationId, PlayerId};
use tt_store::{
    ActivityLogRow, InventoryItem, LogKind, LootboxRow, MessageRow, RelationshipDelta, TownStore,
};
use tt_world::combat;
use tt_world::{Decision, Input, OperationKind, ScheduledOp, World};

use crate::mind::{AgentMind, MessageContext};

/// Per-run caps for the cleanup cascade.
const CLEANUP_MESSAGE_CAP: usize = 1_000;
const CLEANUP_LOG_CAP: usize = 2_000;

/// Executes scheduled operations, at most once each.
///
/// The runtime holds no world state: it reads the world, writes the side
/// tables, and speaks back to the kernel only through follow-up inputs.
pub struct OperationRuntime<M: AgentMind> {
    mind:      M,
    completed: BTreeSet<OperationId>,
}

impl<M: AgentMind> OperationRuntime<M> {
    pub fn new(mind: M) -> Self {
        Self { mind, completed: BTreeSet::new() }
    }

    /// How many operations have ever completed (diagnostics).
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Execute one operation.  Returns the follow-up input for
    /// decision-class operations, `None` for fire-and-forget writes and for
    /// operations that already ran (idempotency by operation id).
    pub fn run<S: TownStore>(
        &mut self,
        world: &World,
        op:    &ScheduledOp,
        store: &mut S,
        now:   GameTime,
    ) -> Option<Input> {
        if !self.completed.insert(op.id) {
            return None; // duplicate dispatch; its follow-up already exists
        }
        // Independent stream per operation: outcomes cannot depend on the
        // order concurrent operations happen to run in.
        let mut rng = world.rng.derive(op.id.0);

        match &op.kind {
            OperationKind::GenerateMessage { conversation_id, other, kind, message_uuid } => {
                let speaker_name = player_name(world, op.player_id);
                let other_name = player_name(world, *other);
                let personality = op
                    .agent_id
                    .and_then(|id| world.agents.get(&id))
                    .map(|a| a.personality)
                    .unwrap_or(tt_world::Personality::Worker);
                let num_messages = world
                    .conversations
                    .get(conversation_id)
                    .map(|c| c.num_messages)
                    .unwrap_or(0);

                let text = self.mind.compose_message(
                    &MessageContext {
                        speaker_name: &speaker_name,
                        other_name:   &other_name,
                        kind:         *kind,
                        num_messages,
                        personality,
                    },
                    &mut rng,
                );
                store.append_message(MessageRow {
                    conversation_id: *conversation_id,
                    author:          op.player_id,
                    uuid:            *message_uuid,
                    kind:            *kind,
                    text,
                    at: now,
                });
                Some(Input::FinishSendingMessage {
                    operation_id:    Some(op.id),
                    player_id:       op.player_id,
                    conversation_id: *conversation_id,
                    message_uuid:    *message_uuid,
                    kind:            *kind,
                })
            }

            OperationKind::RememberConversation { conversation_id } => {
                let agent_id = op.agent_id?;
                match store.archived_conversation(*conversation_id) {
                    Some(archived) => {
                        for (i, a) in archived.participants.iter().enumerate() {
                            for b in archived.participants.iter().skip(i + 1) {
                                store.record_participated(*a, *b, *conversation_id);
                            }
                        }
                        for other in archived.participants.iter().filter(|p| **p != op.player_id) {
                            store.adjust_relationship(op.player_id, *other, RelationshipDelta {
                                trust: 1,
                                ..Default::default()
                            });
                        }
                        let summary = self
                            .mind
                            .summarize_conversation(&player_name(world, op.player_id), archived.num_messages);
                        store.log_activity(ActivityLogRow {
                            player_id: op.player_id,
                            kind:      LogKind::Conversation,
                            detail: serde_json::json!({
                                "conversation_id": conversation_id.0,
                                "summary": summary,
                            }),
                            at: now,
                        });
                    }
                    None => {
                        warn!(conversation = conversation_id.0, "remember: archive row missing");
                    }
                }
                Some(Input::FinishRememberConversation { operation_id: op.id, agent_id })
            }

            OperationKind::SelectActivity { zone, personality } => {
                let agent_id = op.agent_id?;
                let choice = self.mind.choose_activity(*zone, *personality, &mut rng);
                Some(Input::FinishDoSomething {
                    operation_id: op.id,
                    agent_id,
                    decision: Decision::Activity {
                        description: choice.description,
                        emoji:       choice.emoji,
                        duration:    choice.duration,
                        destination: None,
                    },
                })
            }

            OperationKind::ResolveRobbery { target, attack_power, defense, zone } => {
                let agent_id = op.agent_id?;
                let p = combat::robbery_success_probability(*attack_power, *defense, *zone);
                let success = rng.gen_bool(p);

                let mut loot_value = 0;
                if success {
                    let ceiling = combat::max_loot(store.inventory_value(*target));
                    let roll = if ceiling > 0 { rng.gen_range(0..ceiling) } else { 0 };
                    let intended = roll + 10;
                    loot_value = store.deduct_inventory(*target, intended);
                    if loot_value > 0 {
                        store.add_item(InventoryItem {
                            player_id: op.player_id,
                            name:      "stolen goods".to_string(),
                            value:     loot_value,
                        });
                    }
                    store.adjust_relationship(*target, op.player_id, RelationshipDelta {
                        trust:   -10,
                        revenge: 15,
                        fear:    10,
                        ..Default::default()
                    });
                } else {
                    store.adjust_relationship(*target, op.player_id, RelationshipDelta {
                        revenge: 5,
                        ..Default::default()
                    });
                }

                store.log_activity(ActivityLogRow {
                    player_id: op.player_id,
                    kind:      LogKind::Robbery,
                    detail: serde_json::json!({
                        "target": target.0,
                        "success": success,
                        "loot_value": loot_value,
                    }),
                    at: now,
                });

                Some(Input::FinishRobbery {
                    operation_id: op.id,
                    agent_id,
                    target: *target,
                    success,
                    loot_value,
                })
            }

            OperationKind::ResolveCombat { opponent, attacker_power, opponent_power } => {
                let agent_id = op.agent_id?;
                let p = combat::attacker_win_probability(*attacker_power, *opponent_power);
                let attacker_won = rng.gen_bool(p);

                let (winner, loser) = if attacker_won {
                    (op.player_id, *opponent)
                } else {
                    (*opponent, op.player_id)
                };
                store.adjust_relationship(loser, winner, RelationshipDelta {
                    revenge: 20,
                    fear:    10,
                    ..Default::default()
                });
                store.log_activity(ActivityLogRow {
                    player_id: op.player_id,
                    kind:      LogKind::Combat,
                    detail: serde_json::json!({
                        "opponent": opponent.0,
                        "attacker_won": attacker_won,
                    }),
                    at: now,
                });

                Some(Input::FinishCombat {
                    operation_id: op.id,
                    agent_id,
                    opponent: *opponent,
                    attacker_won,
                })
            }

            OperationKind::LogZoneChange { from, to } => {
                store.log_activity(ActivityLogRow {
                    player_id: op.player_id,
                    kind:      LogKind::ZoneChange,
                    detail:    serde_json::json!({ "from": from.name(), "to": to.name() }),
                    at:        now,
                });
                None
            }

            OperationKind::LogActivityEnd { description } => {
                store.log_activity(ActivityLogRow {
                    player_id: op.player_id,
                    kind:      LogKind::ActivityEnd,
                    detail:    serde_json::json!({ "description": description }),
                    at:        now,
                });
                None
            }

            OperationKind::LogHospitalRecovery => {
                store.log_activity(ActivityLogRow {
                    player_id: op.player_id,
                    kind:      LogKind::HospitalRecovery,
                    detail:    serde_json::json!({}),
                    at:        now,
                });
                None
            }

            OperationKind::GrantMovementXp { steps } => {
                store.add_xp(op.player_id, 10);
                store.log_activity(ActivityLogRow {
                    player_id: op.player_id,
                    kind:      LogKind::MovementXp,
                    detail:    serde_json::json!({ "steps": steps }),
                    at:        now,
                });
                None
            }

            OperationKind::GenerateLootDrop { zone } => {
                let tier = rng.gen_range(1..=3u8);
                store.push_lootbox(LootboxRow {
                    player_id: op.player_id,
                    zone:      zone.name().to_string(),
                    tier,
                    at: now,
                });
                store.log_activity(ActivityLogRow {
                    player_id: op.player_id,
                    kind:      LogKind::LootDrop,
                    detail:    serde_json::json!({ "zone": zone.name(), "tier": tier }),
                    at:        now,
                });
                None
            }

            OperationKind::CleanupPlayerData => {
                cascade_store_purge(store, op.player_id);
                None
            }
        }
    }
}

/// One capped cascade run over the side tables.  Returns rows removed;
/// callers repeat until it reports 0.
pub fn cascade_store_purge<S: TownStore>(store: &mut S, player: PlayerId) -> usize {
    let mut removed = 0;
    removed += store.purge_messages(player, CLEANUP_MESSAGE_CAP);
    removed += store.purge_activity_logs(player, CLEANUP_LOG_CAP);
    removed += store.purge_relationships(player);
    removed += store.purge_inventory(player);
    removed += store.purge_lootboxes(player);
    removed += store.purge_experience(player);
    removed += store.purge_participated(player, CLEANUP_LOG_CAP);
    removed += store.purge_archived_conversations(player, CLEANUP_MESSAGE_CAP);
    removed
}

fn player_name(world: &World, player: PlayerId) -> String {
    world
        .player_descriptions
        .get(&player)
        .map(|d| d.name.clone())
        .unwrap_or_else(|| format!("player {}", player.0))
}
