//! Input application.
//!
//! One function, one match: every [`Input`] variant has a handler arm that
//! validates *before* it mutates, so an error return leaves the world
//! untouched (the transactional contract — the journal records the error and
//! the tick moves on).
//!
//! Stale operation completions are not errors: when the world has moved on
//! (agent gone, handle mismatched, conversation archived) a `Finish…` input
//! degrades to an `ok(null)` no-op, because the operation's effects on the
//! side tables have already happened and the caller only needs closure.

use tt_core::{GameTime, PlayerId};
use tt_map::Zone;
use tt_store::MessageKind;

use crate::agent::Agent;
use crate::combat;
use crate::conversation::{Conversation, LastMessage, ParticipantStatus};
use crate::descriptions::{valid_character, AgentDescription, PlayerDescription};
use crate::input::{Decision, Input, InputError, InputResult, ReturnValue};
use crate::operation::OperationKind;
use crate::player::Player;
use crate::world::World;

/// Apply one journaled input to the world at simulated time `now`.
pub fn apply_input(world: &mut World, now: GameTime, input: &Input) -> InputResult {
    match input {
        Input::Join { name, character, identity, token_identifier } => {
            join(world, now, name, character, identity, token_identifier.clone())
        }
        Input::Leave { player_id } => leave(world, now, *player_id),
        Input::MoveTo { player_id, destination } => {
            move_to(world, now, *player_id, *destination)
        }
        Input::CreateAgent {
            name,
            character,
            identity,
            plan,
            personality,
            ai_arena_bot_id,
            initial_zone,
        } => create_agent(
            world,
            now,
            name,
            character,
            identity,
            plan,
            *personality,
            ai_arena_bot_id,
            *initial_zone,
        ),
        Input::UpdatePlayerEquipment { player_id, power_bonus, defense_bonus } => {
            let player = world.player_mut(*player_id)?;
            player.equipment.power_bonus = *power_bonus;
            player.equipment.defense_bonus = *defense_bonus;
            Ok(ReturnValue::Null)
        }
        Input::RefillEnergy { player_id, amount } => {
            let cap = world.config.initial_energy;
            let player = world.player_mut(*player_id)?;
            player.energy = (player.energy + amount).min(cap);
            Ok(ReturnValue::Null)
        }
        Input::AcceptInvite { player_id, conversation_id } => {
            let conversation = world.conversation_mut(*conversation_id)?;
            let member = conversation
                .member_mut(*player_id)
                .ok_or_else(|| InputError::NotFound(format!("player {player_id} in conversation")))?;
            if member.status != ParticipantStatus::Invited {
                return Err(InputError::Conflict("invite already answered".into()));
            }
            member.status = ParticipantStatus::WalkingOver;
            member.accepted_at = Some(now);
            Ok(ReturnValue::Null)
        }
        Input::RejectInvite { player_id, conversation_id } => {
            let conversation = world.conversation_mut(*conversation_id)?;
            let member = conversation
                .member(*player_id)
                .ok_or_else(|| InputError::NotFound(format!("player {player_id} in conversation")))?;
            if member.status != ParticipantStatus::Invited {
                return Err(InputError::Conflict("invite already answered".into()));
            }
            world.stop_conversation(*conversation_id, now);
            Ok(ReturnValue::Null)
        }
        Input::LeaveConversation { player_id, conversation_id } => {
            let conversation = world.conversation_mut(*conversation_id)?;
            let member = conversation
                .member_mut(*player_id)
                .ok_or_else(|| InputError::NotFound(format!("player {player_id} in conversation")))?;
            if member.status == ParticipantStatus::Left {
                return Ok(ReturnValue::Null);
            }
            member.status = ParticipantStatus::Left;
            if conversation.active_count() < 2 {
                world.stop_conversation(*conversation_id, now);
            }
            Ok(ReturnValue::Null)
        }
        Input::StartTyping { player_id, conversation_id, message_uuid } => {
            let conversation = world.conversation_mut(*conversation_id)?;
            let member = conversation
                .member(*player_id)
                .ok_or_else(|| InputError::NotFound(format!("player {player_id} in conversation")))?;
            if member.status != ParticipantStatus::Participating {
                return Err(InputError::Conflict("not participating yet".into()));
            }
            if !conversation.try_start_typing(*player_id, *message_uuid, now) {
                return Err(InputError::Conflict("someone else is typing".into()));
            }
            Ok(ReturnValue::Null)
        }
        Input::StartRobbery { agent_id, target } => {
            let result = start_robbery(world, now, *agent_id, *target);
            if result.is_err() {
                release_start_handle(world, *agent_id, "startRobbery");
            }
            result
        }
        Input::StartCombat { agent_id, opponent } => {
            let result = start_combat(world, now, *agent_id, *opponent);
            if result.is_err() {
                release_start_handle(world, *agent_id, "startCombat");
            }
            result
        }
        Input::FinishDoSomething { operation_id, agent_id, decision } => {
            let Some(agent) = world.agents.get_mut(agent_id) else {
                return Ok(ReturnValue::Null); // agent left; stale completion
            };
            if !clear_matching_handle(agent, *operation_id) {
                return Ok(ReturnValue::Null);
            }
            finish_do_something(world, now, *agent_id, decision)
        }
        Input::FinishSendingMessage {
            operation_id,
            player_id,
            conversation_id,
            message_uuid,
            kind,
        } => {
            if let Some(op_id) = operation_id {
                if let Some(agent_id) = world.agent_by_player(*player_id) {
                    if let Some(agent) = world.agents.get_mut(&agent_id) {
                        if !clear_matching_handle(agent, *op_id) {
                            return Ok(ReturnValue::Null);
                        }
                    }
                }
            }
            let Some(conversation) = world.conversations.get_mut(conversation_id) else {
                return Ok(ReturnValue::Null); // archived under the speaker
            };
            if !conversation.release_typing(*player_id, *message_uuid) {
                return Ok(ReturnValue::Null); // lock timed out and was reclaimed
            }
            conversation.num_messages += 1;
            conversation.last_message = Some(LastMessage { author: *player_id, at: now });
            if *kind == MessageKind::Leave {
                if let Some(member) = conversation.member_mut(*player_id) {
                    member.status = ParticipantStatus::Left;
                }
                if conversation.active_count() < 2 {
                    world.stop_conversation(*conversation_id, now);
                }
            }
            Ok(ReturnValue::Null)
        }
        Input::FinishRememberConversation { operation_id, agent_id } => {
            if let Some(agent) = world.agents.get_mut(agent_id) {
                clear_matching_handle(agent, *operation_id);
            }
            Ok(ReturnValue::Null)
        }
        Input::FinishRobbery { operation_id, agent_id, .. } => {
            // Loot and logs were applied by the operation; the world's share
            // is releasing the agent to act again.
            if let Some(agent) = world.agents.get_mut(agent_id) {
                clear_matching_handle(agent, *operation_id);
            }
            Ok(ReturnValue::Null)
        }
        Input::FinishCombat { operation_id, agent_id, opponent, attacker_won } => {
            finish_combat(world, now, *operation_id, *agent_id, *opponent, *attacker_won)
        }
    }
}

/// A rejected `Start…` input must release the guard handle the agent tick
/// installed when it emitted the input, or the agent idles until the action
/// timeout.
fn release_start_handle(world: &mut World, agent_id: tt_core::AgentId, name: &str) {
    if let Some(agent) = world.agents.get_mut(&agent_id) {
        if agent
            .in_progress_operation
            .as_ref()
            .is_some_and(|h| h.name == name)
        {
            agent.in_progress_operation = None;
        }
    }
}

/// Clear the agent's in-progress handle if it matches `op_id`.  Returns
/// `false` when the completion is stale (no handle, or a newer one).
fn clear_matching_handle(agent: &mut Agent, op_id: tt_core::OperationId) -> bool {
    match &agent.in_progress_operation {
        Some(handle) if handle.op_id == op_id => {
            agent.in_progress_operation = None;
            true
        }
        _ => false,
    }
}

// ── Join / leave / spawn ──────────────────────────────────────────────────────

fn join(
    world:    &mut World,
    now:      GameTime,
    name:     &str,
    character: &str,
    identity: &str,
    token:    Option<String>,
) -> InputResult {
    if name.is_empty() {
        return Err(InputError::InvalidInput("empty player name".into()));
    }
    if !valid_character(character) {
        return Err(InputError::InvalidInput(format!("unknown character {character:?}")));
    }
    if world.human_count() >= world.config.max_human_players {
        return Err(InputError::Conflict("human player cap reached".into()));
    }
    if let Some(token) = &token {
        let already = world
            .players
            .values()
            .any(|p| p.human_token.as_deref() == Some(token));
        if already {
            return Err(InputError::Conflict("token already joined".into()));
        }
    }

    let tile = spawn_tile(world, None)?;
    let id = PlayerId(world.alloc_entity_id());
    let zone = world.map.zone_of(tile.point());
    let speed = world.config.player_speed;
    let energy = world.config.initial_energy;

    world
        .players
        .insert(id, Player::new(id, token, tile.point(), zone, speed, energy, now));
    world.player_descriptions.insert(id, PlayerDescription {
        player_id: id,
        name:      name.to_string(),
        character: character.to_string(),
        identity:  identity.to_string(),
    });

    Ok(ReturnValue::PlayerJoined { player_id: id })
}

fn leave(world: &mut World, now: GameTime, player_id: PlayerId) -> InputResult {
    world.player(player_id)?; // validate before any mutation

    let involved: Vec<_> = world
        .conversations
        .values()
        .filter(|c| c.member(player_id).is_some())
        .map(|c| c.id)
        .collect();
    for conversation_id in involved {
        world.stop_conversation(conversation_id, now);
    }

    world.remove_player(player_id, now);
    world.schedule_op(None, player_id, OperationKind::CleanupPlayerData, now);
    Ok(ReturnValue::Null)
}

fn move_to(
    world:       &mut World,
    now:         GameTime,
    player_id:   PlayerId,
    destination: Option<tt_map::Tile>,
) -> InputResult {
    if let Some(conversation_id) = world.conversation_of(player_id) {
        let conversation = &world.conversations[&conversation_id];
        if conversation
            .member(player_id)
            .is_some_and(|m| m.status == ParticipantStatus::Participating)
        {
            return Err(InputError::Conflict("cannot walk away mid-conversation".into()));
        }
    }

    match destination {
        Some(tile) if !world.map.in_bounds(tile) => {
            Err(InputError::InvalidInput(format!("destination {tile} out of bounds")))
        }
        Some(tile) => {
            let player = world.player_mut(player_id)?;
            player.set_destination(tile, now);
            player.last_input = now;
            Ok(ReturnValue::Null)
        }
        None => {
            let player = world.player_mut(player_id)?;
            player.stop_pathfinding();
            player.last_input = now;
            Ok(ReturnValue::Null)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn create_agent(
    world:          &mut World,
    now:            GameTime,
    name:           &str,
    character:      &str,
    identity:       &str,
    plan:           &str,
    personality:    crate::agent::Personality,
    ai_arena_bot_id: &str,
    initial_zone:   Option<Zone>,
) -> InputResult {
    if !valid_character(character) {
        return Err(InputError::InvalidInput(format!("unknown character {character:?}")));
    }
    if world.find_by_bot_id(ai_arena_bot_id).is_some() {
        return Err(InputError::Conflict(format!("bot {ai_arena_bot_id:?} already registered")));
    }

    let tile = spawn_tile(world, initial_zone)?;
    let player_id = PlayerId(world.alloc_entity_id());
    let agent_id = tt_core::AgentId(world.alloc_entity_id());
    let zone = world.map.zone_of(tile.point());
    let speed = world.config.player_speed;
    let energy = world.config.initial_energy;

    world
        .players
        .insert(player_id, Player::new(player_id, None, tile.point(), zone, speed, energy, now));
    world
        .agents
        .insert(agent_id, Agent::new(agent_id, player_id, personality));
    world.player_descriptions.insert(player_id, PlayerDescription {
        player_id,
        name:      name.to_string(),
        character: character.to_string(),
        identity:  identity.to_string(),
    });
    world.agent_descriptions.insert(agent_id, AgentDescription {
        agent_id,
        plan: plan.to_string(),
        ai_arena_bot_id: Some(ai_arena_bot_id.to_string()),
    });

    Ok(ReturnValue::AgentCreated { agent_id, player_id })
}

/// Pick an unoccupied, unblocked spawn tile, optionally inside a zone.
fn spawn_tile(world: &mut World, zone: Option<Zone>) -> Result<tt_map::Tile, InputError> {
    const ATTEMPTS: u32 = 16;
    for _ in 0..ATTEMPTS {
        let Some(tile) = world.map.random_passable_tile(&mut world.rng, zone) else {
            break;
        };
        if !world.tile_occupied(tile, PlayerId::INVALID) {
            return Ok(tile);
        }
    }
    Err(InputError::Internal("no free spawn tile".into()))
}

// ── Robbery / combat initiation ───────────────────────────────────────────────

fn start_robbery(
    world:    &mut World,
    now:      GameTime,
    agent_id: tt_core::AgentId,
    target:   PlayerId,
) -> InputResult {
    let agent = world.agent(agent_id)?;
    let attacker_player = agent.player_id;
    let personality = agent.personality;
    if target == attacker_player {
        return Err(InputError::InvalidInput("cannot rob yourself".into()));
    }
    if !world.agent(agent_id)?.robbery_ready(&world.config, now) {
        return Err(InputError::Conflict("robbery cooldown".into()));
    }
    let attacker = world.player(attacker_player)?;
    let zone = attacker.current_zone;
    if zone != Zone::DarkAlley {
        return Err(InputError::Conflict("robbery only starts in the dark alley".into()));
    }
    let target_player = world.player(target)?;
    if world.conversation_of(target).is_some() {
        return Err(InputError::Conflict("target is busy talking".into()));
    }

    let attack = combat::attack_power(attacker.equipment.power_bonus, personality);
    let defense = combat::robbery_defense(&target_player.equipment);

    world.agent_mut(agent_id)?.last_robbery_attempt = Some(now);
    world.schedule_op(
        Some(agent_id),
        attacker_player,
        OperationKind::ResolveRobbery { target, attack_power: attack, defense, zone },
        now,
    );
    Ok(ReturnValue::Null)
}

fn start_combat(
    world:    &mut World,
    now:      GameTime,
    agent_id: tt_core::AgentId,
    opponent: PlayerId,
) -> InputResult {
    let agent = world.agent(agent_id)?;
    let attacker_player = agent.player_id;
    let personality = agent.personality;
    if opponent == attacker_player {
        return Err(InputError::InvalidInput("cannot fight yourself".into()));
    }
    if !agent.combat_ready(&world.config, now) {
        return Err(InputError::Conflict("combat cooldown".into()));
    }
    let attacker = world.player(attacker_player)?;
    if attacker.current_zone != Zone::Underground {
        return Err(InputError::Conflict("combat only starts underground".into()));
    }
    let opponent_agent_id = world
        .agent_by_player(opponent)
        .ok_or_else(|| InputError::Conflict("opponent is not a fighter".into()))?;
    let opponent_personality = world.agent(opponent_agent_id)?.personality;
    let opponent_player = world.player(opponent)?;
    if world.conversation_of(opponent).is_some() {
        return Err(InputError::Conflict("opponent is busy talking".into()));
    }

    let attacker_power =
        combat::combat_power(attacker.equipment.power_bonus, personality, true);
    let opponent_power =
        combat::combat_power(opponent_player.equipment.power_bonus, opponent_personality, false);

    world.agent_mut(agent_id)?.last_combat = Some(now);
    world.schedule_op(
        Some(agent_id),
        attacker_player,
        OperationKind::ResolveCombat { opponent, attacker_power, opponent_power },
        now,
    );
    Ok(ReturnValue::Null)
}

// ── Operation completions ─────────────────────────────────────────────────────

fn finish_do_something(
    world:    &mut World,
    now:      GameTime,
    agent_id: tt_core::AgentId,
    decision: &Decision,
) -> InputResult {
    let player_id = world.agent(agent_id)?.player_id;
    match decision {
        Decision::Wander { destination } => {
            if !world.map.in_bounds(*destination) {
                return Err(InputError::InvalidInput(format!(
                    "wander destination {destination} out of bounds"
                )));
            }
            world.player_mut(player_id)?.set_destination(*destination, now);
            Ok(ReturnValue::Null)
        }
        Decision::Invite { invitee } => {
            // The world may have moved on since the decision was made; a
            // busy or cooled-down invitee makes this a quiet no-op.
            if world.players.get(invitee).is_none()
                || world.conversation_of(*invitee).is_some()
                || world.conversation_of(player_id).is_some()
                || world.pair_on_cooldown(player_id, *invitee, now)
            {
                return Ok(ReturnValue::Null);
            }
            let id = tt_core::ConversationId(world.alloc_entity_id());
            world
                .conversations
                .insert(id, Conversation::invite(id, player_id, *invitee, now));
            Ok(ReturnValue::ConversationStarted { conversation_id: id })
        }
        Decision::Activity { description, emoji, duration, destination } => {
            if let Some(tile) = destination {
                if !world.map.in_bounds(*tile) {
                    return Err(InputError::InvalidInput(format!(
                        "activity destination {tile} out of bounds"
                    )));
                }
            }
            let player = world.player_mut(player_id)?;
            player.activity = Some(crate::player::Activity {
                description: description.clone(),
                emoji:       emoji.clone(),
                until:       now + *duration,
            });
            if let Some(tile) = destination {
                player.set_destination(*tile, now);
            }
            Ok(ReturnValue::Null)
        }
        Decision::DoNothing => Ok(ReturnValue::Null),
    }
}

fn finish_combat(
    world:        &mut World,
    now:          GameTime,
    operation_id: tt_core::OperationId,
    agent_id:     tt_core::AgentId,
    opponent:     PlayerId,
    attacker_won: bool,
) -> InputResult {
    let Some(agent) = world.agents.get_mut(&agent_id) else {
        return Ok(ReturnValue::Null);
    };
    if !clear_matching_handle(agent, operation_id) {
        return Ok(ReturnValue::Null);
    }
    agent.last_combat = Some(now);
    let attacker_player = agent.player_id;

    let loser_player = if attacker_won { opponent } else { attacker_player };
    let recovery = world.config.hospital_recovery;
    if let Some(loser_agent_id) = world.agent_by_player(loser_player) {
        if let Some(loser) = world.agents.get_mut(&loser_agent_id) {
            loser.knocked_out_until = Some(now + recovery);
            loser.last_combat = Some(now);
        }
    }
    if let Some(player) = world.players.get_mut(&loser_player) {
        player.stop_pathfinding();
        player.activity = None;
    }
    Ok(ReturnValue::Null)
}
