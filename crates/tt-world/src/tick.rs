//! The entity tick: agents decide, players move, conversations reconcile.
//!
//! # Phase order (within one tick, after input application)
//!
//! 1. **Agents** — ascending `AgentId`.  Each agent commits to at most one
//!    thing: a scheduled operation or one emitted input.
//! 2. **Players** — ascending `PlayerId`: housekeeping (idle, energy,
//!    activity expiry), then pathfinding, then position.
//! 3. **Conversations** — ascending `ConversationId`: ghost removal, invite
//!    timeouts, proximity entry, stale typing locks, archival.
//!
//! Ordered maps make every sweep deterministic; all randomness comes from
//! the world RNG, so a replayed journal reproduces the same decisions.
//!
//! Failure semantics: a malformed per-entity state (empty path, vanished
//! reference) stops that entity and never aborts the tick.

use tt_core::{AgentId, ConversationId, GameDuration, GameTime, PlayerId};
use tt_map::{Tile, Zone};
use tt_path::{find_route, path_position, PathError, StepBudget};
use tt_store::{ArchivedConversationRow, ArchivedEntityRow, MessageKind, TownStore};
use uuid::Uuid;

use crate::agent::{OperationHandle, Personality};
use crate::combat;
use crate::conversation::ParticipantStatus;
use crate::input::{Decision, Input};
use crate::operation::{OperationKind, ScheduledOp};
use crate::player::{Activity, PathfindingState};
use crate::world::World;

/// How far an agent looks for robbery targets and conversation partners.
const NEARBY_RADIUS: f32 = 10.0;

/// Energy drains one unit per this much elapsed simulation time (bots only).
const ENERGY_DRAIN_INTERVAL: GameDuration = GameDuration::from_minutes(5);

/// Movement distance that counts as one "step" toward XP grants.
const STEP_DISTANCE: f32 = 0.5;

/// Minimum gap between step grants.
const STEP_GRANT_GAP: GameDuration = GameDuration::from_secs(5);

/// Steps per movement-XP grant.
const STEPS_PER_XP_GRANT: u32 = 10;

/// Minimum gap between loot rolls.
const LOOT_ROLL_GAP: GameDuration = GameDuration::from_secs(1);

// ── TickOutput ────────────────────────────────────────────────────────────────

/// Everything one tick hands back to the engine.
#[derive(Debug, Default)]
pub struct TickOutput {
    /// Operations to dispatch off the step.
    pub ops: Vec<ScheduledOp>,
    /// Inputs the tick itself produced (agent decisions); the engine appends
    /// them to the journal, where they land *after* the step's watermark and
    /// are applied next step.
    pub emitted_inputs: Vec<Input>,
    /// Conversations archived this tick, for the side tables.
    pub archived_conversations: Vec<ArchivedConversationRow>,
    /// Players (and their agents) removed this tick.
    pub archived_entities: Vec<ArchivedEntityRow>,
    /// Humans auto-left for idleness this tick.
    pub departed: Vec<PlayerId>,
}

impl World {
    /// Run the entity phases of one tick at simulated time `now`.
    pub fn tick_entities<S: TownStore>(
        &mut self,
        store:  &S,
        now:    GameTime,
        budget: &mut StepBudget,
    ) -> TickOutput {
        let mut out = TickOutput::default();

        let agent_ids: Vec<AgentId> = self.agents.keys().copied().collect();
        for agent_id in agent_ids {
            self.tick_agent(store, agent_id, now, &mut out);
        }

        let player_ids: Vec<PlayerId> = self.players.keys().copied().collect();
        let mut idle_humans = Vec::new();
        for player_id in player_ids {
            self.tick_player_housekeeping(player_id, now, &mut idle_humans);
            self.tick_player_pathfinding(player_id, now, budget);
            self.tick_player_position(player_id, now);
        }
        for player_id in idle_humans {
            self.auto_leave(player_id, now, &mut out);
        }

        let conversation_ids: Vec<ConversationId> = self.conversations.keys().copied().collect();
        for conversation_id in conversation_ids {
            self.tick_conversation(conversation_id, now);
        }

        self.prune_pair_cooldowns(now);

        out.ops.append(&mut self.pending_ops);
        out.archived_conversations.append(&mut self.pending_conv_archives);
        out.archived_entities.append(&mut self.pending_entity_archives);
        out
    }

    // ── Agent phase ───────────────────────────────────────────────────────

    fn tick_agent<S: TownStore>(
        &mut self,
        store:    &S,
        agent_id: AgentId,
        now:      GameTime,
        out:      &mut TickOutput,
    ) {
        // Stale-operation sweep: an abandoned operation must not wedge the
        // agent forever.
        let Some(agent) = self.agents.get(&agent_id) else { return };
        let player_id = agent.player_id;
        if let Some(handle) = &agent.in_progress_operation {
            if now.since(handle.started) <= self.config.action_timeout {
                return; // operation in flight; nothing to decide
            }
            if let Some(agent) = self.agents.get_mut(&agent_id) {
                agent.in_progress_operation = None;
            }
        }

        // Knockout: recover, or stay down.
        let knocked_out_until = self.agents.get(&agent_id).and_then(|a| a.knocked_out_until);
        if let Some(until) = knocked_out_until {
            if until > now {
                if let Some(player) = self.players.get_mut(&player_id) {
                    if player.activity.is_none() {
                        player.activity = Some(Activity {
                            description: "recovering".to_string(),
                            emoji:       Some("🏥".to_string()),
                            until,
                        });
                    }
                }
                return;
            }
            if let Some(agent) = self.agents.get_mut(&agent_id) {
                agent.knocked_out_until = None;
            }
            self.schedule_op(None, player_id, OperationKind::LogHospitalRecovery, now);
        }

        // Unwritten memory first.
        let to_remember = self.agents.get(&agent_id).and_then(|a| a.to_remember);
        if let Some(conversation_id) = to_remember {
            if let Some(agent) = self.agents.get_mut(&agent_id) {
                agent.to_remember = None;
            }
            self.schedule_op(
                Some(agent_id),
                player_id,
                OperationKind::RememberConversation { conversation_id },
                now,
            );
            return;
        }

        // Mid-conversation agents run the conversation machine and nothing else.
        if let Some(conversation_id) = self.conversation_of(player_id) {
            self.tick_agent_conversation(agent_id, player_id, conversation_id, now);
            return;
        }

        let Some(player) = self.players.get(&player_id) else { return };
        let personality = match self.agents.get(&agent_id) {
            Some(a) => a.personality,
            None => return,
        };
        let zone = player.current_zone;
        let moving = player.is_moving();
        let busy = player.activity.as_ref().is_some_and(|a| a.until > now);
        if busy {
            return;
        }

        // Zone-conditioned aggression.
        if personality == Personality::Criminal
            && zone == Zone::DarkAlley
            && !moving
            && self.agents.get(&agent_id).is_some_and(|a| a.robbery_ready(&self.config, now))
        {
            if let Some(target) = self.pick_robbery_target(store, player_id) {
                if self.rng.gen_bool(self.config.robbery_start_probability) {
                    let op_id = self.alloc_op_id();
                    if let Some(agent) = self.agents.get_mut(&agent_id) {
                        agent.in_progress_operation = Some(OperationHandle {
                            op_id,
                            name: "startRobbery".to_string(),
                            started: now,
                        });
                    }
                    out.emitted_inputs.push(Input::StartRobbery { agent_id, target });
                }
                return;
            }
        }

        if matches!(personality, Personality::Criminal | Personality::Gambler)
            && zone == Zone::Underground
            && !moving
            && self.agents.get(&agent_id).is_some_and(|a| a.combat_ready(&self.config, now))
        {
            if let Some(opponent) = self.pick_combat_opponent(player_id) {
                if self.rng.gen_bool(self.config.combat_start_probability) {
                    let op_id = self.alloc_op_id();
                    if let Some(agent) = self.agents.get_mut(&agent_id) {
                        agent.in_progress_operation = Some(OperationHandle {
                            op_id,
                            name: "startCombat".to_string(),
                            started: now,
                        });
                    }
                    out.emitted_inputs.push(Input::StartCombat { agent_id, opponent });
                }
                return;
            }
        }

        if !moving {
            // Fresh out of a conversation or an activity: wander first, plan
            // later.  Otherwise ask the reasoning layer for a zone activity.
            let wander = self
                .agents
                .get(&agent_id)
                .is_some_and(|a| a.in_wander_window(&self.config, now));
            if wander {
                if let Some(destination) = self.map.random_passable_tile(&mut self.rng, None) {
                    self.emit_decision(agent_id, now, out, Decision::Wander { destination });
                }
                return;
            }
            self.schedule_op(
                Some(agent_id),
                player_id,
                OperationKind::SelectActivity { zone, personality },
                now,
            );
            return;
        }

        // On the move: keep an eye out for someone worth talking to.
        if self.agents.get(&agent_id).is_some_and(|a| a.conversation_ready(&self.config, now)) {
            if let Some(invitee) = self.pick_invite_candidate(store, player_id, now) {
                if let Some(agent) = self.agents.get_mut(&agent_id) {
                    agent.last_invite_attempt = Some(now);
                }
                self.emit_decision(agent_id, now, out, Decision::Invite { invitee });
            }
        }
    }

    /// Install a decision handle and emit the matching `FinishDoSomething`.
    fn emit_decision(
        &mut self,
        agent_id: AgentId,
        now:      GameTime,
        out:      &mut TickOutput,
        decision: Decision,
    ) {
        let op_id = self.alloc_op_id();
        if let Some(agent) = self.agents.get_mut(&agent_id) {
            agent.in_progress_operation = Some(OperationHandle {
                op_id,
                name: "doSomething".to_string(),
                started: now,
            });
        }
        out.emitted_inputs.push(Input::FinishDoSomething {
            operation_id: op_id,
            agent_id,
            decision,
        });
    }

    // ── Target / candidate selection ──────────────────────────────────────

    fn pick_robbery_target<S: TownStore>(
        &mut self,
        store:    &S,
        attacker: PlayerId,
    ) -> Option<PlayerId> {
        let attacker_pos = self.players.get(&attacker)?.position;

        let mut scored: Vec<(PlayerId, f64)> = self
            .players
            .values()
            .filter(|p| {
                p.id != attacker
                    && p.position.distance(attacker_pos) <= NEARBY_RADIUS
                    && self.conversation_of(p.id).is_none()
                    && !self.player_knocked_out(p.id)
            })
            .map(|p| {
                (p.id, combat::robbery_target_score(&p.equipment, store.inventory_value(p.id)))
            })
            .filter(|(_, score)| *score > 0.0)
            .collect();
        if scored.is_empty() {
            return None;
        }

        // Highest score first; ties resolve by id so replays agree.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));
        scored.truncate(3);
        let ids: Vec<PlayerId> = scored.into_iter().map(|(id, _)| id).collect();
        self.rng.choose(&ids).copied()
    }

    fn pick_combat_opponent(&mut self, attacker: PlayerId) -> Option<PlayerId> {
        let attacker_pos = self.players.get(&attacker)?.position;
        let candidates: Vec<PlayerId> = self
            .players
            .values()
            .filter(|p| {
                p.id != attacker
                    && p.current_zone == Zone::Underground
                    && p.position.distance(attacker_pos) <= NEARBY_RADIUS
                    && self.conversation_of(p.id).is_none()
                    && !self.player_knocked_out(p.id)
                    && self.agent_by_player(p.id).is_some()
            })
            .map(|p| p.id)
            .collect();
        self.rng.choose(&candidates).copied()
    }

    fn pick_invite_candidate<S: TownStore>(
        &mut self,
        store: &S,
        me:    PlayerId,
        now:   GameTime,
    ) -> Option<PlayerId> {
        let my_pos = self.players.get(&me)?.position;

        let mut best: Option<(PlayerId, f32)> = None;
        for candidate in self.players.values() {
            if candidate.id == me
                || self.conversation_of(candidate.id).is_some()
                || self.pair_on_cooldown(me, candidate.id, now)
                || self.player_knocked_out(candidate.id)
            {
                continue;
            }
            let distance = candidate.position.distance(my_pos);
            if distance > NEARBY_RADIUS {
                continue;
            }
            let relationship = store.relationship(me, candidate.id);
            if relationship.revenge > 70 {
                continue;
            }
            let score = relationship.invite_score() * (10.0 / (distance + 10.0));
            if score <= 0.0 {
                continue;
            }
            let better = best.is_none_or(|(_, b)| score > b);
            if better {
                best = Some((candidate.id, score));
            }
        }
        best.map(|(id, _)| id)
    }

    fn player_knocked_out(&self, player: PlayerId) -> bool {
        self.agent_by_player(player)
            .and_then(|a| self.agents.get(&a))
            .and_then(|a| a.knocked_out_until)
            .is_some()
    }

    // ── Agent conversation machine ────────────────────────────────────────

    fn tick_agent_conversation(
        &mut self,
        agent_id:        AgentId,
        player_id:       PlayerId,
        conversation_id: ConversationId,
        now:             GameTime,
    ) {
        let Some(conversation) = self.conversations.get(&conversation_id) else { return };
        let Some(member) = conversation.member(player_id) else { return };

        match member.status {
            ParticipantStatus::Invited => {
                let inviter_is_human = self
                    .players
                    .get(&conversation.creator)
                    .is_some_and(|p| p.is_human());
                let accept =
                    inviter_is_human || self.rng.gen_bool(self.config.invite_accept_probability);
                if accept {
                    if let Some(conversation) = self.conversations.get_mut(&conversation_id) {
                        if let Some(member) = conversation.member_mut(player_id) {
                            member.status = ParticipantStatus::WalkingOver;
                            member.accepted_at = Some(now);
                        }
                    }
                } else {
                    self.stop_conversation(conversation_id, now);
                }
            }

            ParticipantStatus::WalkingOver => {
                if member.invited_at + self.config.invite_timeout < now {
                    self.stop_conversation(conversation_id, now);
                    return;
                }
                let Some(other) = conversation.other_active(player_id) else {
                    self.stop_conversation(conversation_id, now);
                    return;
                };
                let (Some(me), Some(them)) =
                    (self.players.get(&player_id), self.players.get(&other))
                else {
                    return;
                };
                let distance = me.position.distance(them.position);
                let goal: Tile = if distance > self.config.midpoint_threshold {
                    me.position.midpoint(them.position).tile()
                } else {
                    them.position.tile()
                };
                if let Some(player) = self.players.get_mut(&player_id) {
                    player.set_destination(goal, now);
                }
            }

            ParticipantStatus::Participating => {
                self.tick_agent_speaking(agent_id, player_id, conversation_id, now);
            }

            ParticipantStatus::Left => {}
        }
    }

    fn tick_agent_speaking(
        &mut self,
        agent_id:        AgentId,
        player_id:       PlayerId,
        conversation_id: ConversationId,
        now:             GameTime,
    ) {
        let Some(conversation) = self.conversations.get(&conversation_id) else { return };
        let Some(other) = conversation.other_active(player_id) else { return };

        let typing_free = conversation.is_typing.is_none();
        let started = conversation.started;
        let last_message = conversation.last_message;
        let over_duration = started
            .is_some_and(|t| t + self.config.max_conversation_duration < now);
        let over_messages = conversation.num_messages >= self.config.max_conversation_messages;

        if !typing_free {
            return;
        }

        // Time to go: leaving is itself a message, lock first.
        if over_duration || over_messages {
            self.start_message(agent_id, player_id, conversation_id, other, MessageKind::Leave, now);
            return;
        }

        let (eligible, kind) = match last_message {
            None => {
                let creator = conversation.creator == player_id;
                if creator {
                    (true, MessageKind::Start)
                } else {
                    // Someone has to break the silence eventually.
                    let awkward = started
                        .is_some_and(|t| t + self.config.awkward_conversation_timeout < now);
                    (awkward, MessageKind::Continue)
                }
            }
            Some(lm) => {
                let cooled = now.since(lm.at) >= self.config.message_cooldown;
                (cooled && lm.author != player_id, MessageKind::Continue)
            }
        };
        if eligible {
            self.start_message(agent_id, player_id, conversation_id, other, kind, now);
        }
    }

    /// Take the typing lock and schedule the message-generation operation.
    fn start_message(
        &mut self,
        agent_id:        AgentId,
        player_id:       PlayerId,
        conversation_id: ConversationId,
        other:           PlayerId,
        kind:            MessageKind,
        now:             GameTime,
    ) {
        let message_uuid = Uuid::from_u128(self.rng.random_u128());
        let Some(conversation) = self.conversations.get_mut(&conversation_id) else { return };
        if !conversation.try_start_typing(player_id, message_uuid, now) {
            return;
        }
        self.schedule_op(
            Some(agent_id),
            player_id,
            OperationKind::GenerateMessage { conversation_id, other, kind, message_uuid },
            now,
        );
    }

    // ── Player phase ──────────────────────────────────────────────────────

    fn tick_player_housekeeping(
        &mut self,
        player_id:   PlayerId,
        now:         GameTime,
        idle_humans: &mut Vec<PlayerId>,
    ) {
        let mut expired_activity: Option<String> = None;
        {
            let Some(player) = self.players.get_mut(&player_id) else { return };

            if player.is_human()
                && now.since(player.last_input) > self.config.human_idle_too_long
            {
                idle_humans.push(player_id);
                return;
            }

            if !player.is_human() {
                while now.since(player.last_energy_drain) >= ENERGY_DRAIN_INTERVAL {
                    player.last_energy_drain = player.last_energy_drain + ENERGY_DRAIN_INTERVAL;
                    if player.energy > 0 {
                        player.energy -= 1;
                        if player.energy == 0 {
                            player.stop_pathfinding();
                        }
                    }
                }
            }

            if let Some(activity) = &player.activity {
                if activity.until <= now {
                    expired_activity = Some(activity.description.clone());
                    player.activity = None;
                }
            }
        }

        if let Some(description) = expired_activity {
            if let Some(agent_id) = self.agent_by_player(player_id) {
                if let Some(agent) = self.agents.get_mut(&agent_id) {
                    agent.last_activity = Some(now);
                }
            }
            self.schedule_op(None, player_id, OperationKind::LogActivityEnd { description }, now);
        }
    }

    fn tick_player_pathfinding(
        &mut self,
        player_id: PlayerId,
        now:       GameTime,
        budget:    &mut StepBudget,
    ) {
        let Some(player) = self.players.get(&player_id) else { return };
        let Some(pathfinding) = &player.pathfinding else { return };

        if now.since(pathfinding.started) > self.config.pathfinding_timeout {
            if let Some(player) = self.players.get_mut(&player_id) {
                player.stop_pathfinding();
            }
            return;
        }

        match &pathfinding.state {
            PathfindingState::Waiting { until } => {
                if *until <= now {
                    if let Some(player) = self.players.get_mut(&player_id) {
                        if let Some(pf) = &mut player.pathfinding {
                            pf.state = PathfindingState::NeedsPath;
                        }
                    }
                }
            }
            PathfindingState::NeedsPath => {
                if !budget.try_take() {
                    return; // over the per-step search budget; retry next step
                }
                let from = player.position;
                let speed = player.speed;
                let destination = pathfinding.destination;
                let occupied: Vec<Tile> = self
                    .players
                    .values()
                    .filter(|p| p.id != player_id)
                    .map(|p| p.position.tile())
                    .collect();

                let result = find_route(
                    &self.map,
                    from,
                    destination,
                    &|tile| occupied.contains(&tile),
                    now,
                    speed,
                );
                match result {
                    Ok(found) => {
                        if let Some(player) = self.players.get_mut(&player_id) {
                            if let Some(pf) = &mut player.pathfinding {
                                if let Some(new_destination) = found.new_destination {
                                    pf.destination = new_destination;
                                }
                                pf.state = PathfindingState::Moving { path: found.path };
                            }
                        }
                    }
                    Err(PathError::Unreachable { .. })
                    | Err(PathError::DestinationOutOfBounds(_))
                    | Err(PathError::BadSpeed(_)) => {
                        if let Some(player) = self.players.get_mut(&player_id) {
                            player.stop_pathfinding();
                        }
                    }
                }
            }
            PathfindingState::Moving { .. } => {}
        }
    }

    fn tick_player_position(&mut self, player_id: PlayerId, now: GameTime) {
        let Some(player) = self.players.get(&player_id) else { return };
        let Some(pathfinding) = &player.pathfinding else { return };
        let PathfindingState::Moving { path } = &pathfinding.state else { return };

        let destination = pathfinding.destination;
        let arrival = path.arrival();
        let Some(sample) = path_position(path, now) else {
            // Malformed path: stop the player, never the tick.
            if let Some(player) = self.players.get_mut(&player_id) {
                player.stop_pathfinding();
            }
            return;
        };

        // Collision: someone stands where this step lands.
        let collided = self.players.values().any(|other| {
            other.id != player_id
                && other.position.distance(sample.position) < self.config.collision_threshold
        });
        if collided {
            let backoff_ms = self
                .rng
                .gen_range(0..=self.config.pathfinding_backoff.as_millis());
            if let Some(player) = self.players.get_mut(&player_id) {
                if let Some(pf) = &mut player.pathfinding {
                    pf.state = PathfindingState::Waiting {
                        until: now + GameDuration(backoff_ms),
                    };
                }
            }
            return;
        }

        let arrived = arrival.is_some_and(|t| now >= t);
        let old_zone = player.current_zone;
        let new_position = if arrived { destination.point() } else { sample.position };
        let new_zone = self.map.zone_of(new_position);

        {
            let Some(player) = self.players.get_mut(&player_id) else { return };
            player.position = new_position;
            if sample.velocity > 0.0 {
                player.facing = sample.facing;
            }
            player.current_zone = new_zone;
            if arrived {
                player.stop_pathfinding();
            }
        }

        if new_zone != old_zone {
            self.schedule_op(
                None,
                player_id,
                OperationKind::LogZoneChange { from: old_zone, to: new_zone },
                now,
            );
        }

        self.account_movement(player_id, now, new_zone);
    }

    /// Step counting, XP grants, and loot rolls for a player that moved.
    fn account_movement(&mut self, player_id: PlayerId, now: GameTime, zone: Zone) {
        let mut xp_grant: Option<u32> = None;
        let mut roll_loot = false;
        {
            let Some(player) = self.players.get_mut(&player_id) else { return };

            let stepped = player.position.distance(player.last_step_position) >= STEP_DISTANCE;
            if stepped && now.since(player.last_step_grant) >= STEP_GRANT_GAP {
                player.steps_taken += 1;
                player.streak += 1;
                player.last_step_grant = now;
                player.last_step_position = player.position;
                if player.steps_taken % STEPS_PER_XP_GRANT == 0 {
                    xp_grant = Some(player.steps_taken);
                }
            }

            if now.since(player.last_loot_roll) >= LOOT_ROLL_GAP {
                player.last_loot_roll = now;
                roll_loot = true;
            }
        }

        if let Some(steps) = xp_grant {
            self.schedule_op(None, player_id, OperationKind::GrantMovementXp { steps }, now);
        }
        if roll_loot && self.rng.gen_bool(zone.loot_weight()) {
            self.schedule_op(None, player_id, OperationKind::GenerateLootDrop { zone }, now);
        }
    }

    // ── Idle auto-leave ───────────────────────────────────────────────────

    fn auto_leave(&mut self, player_id: PlayerId, now: GameTime, out: &mut TickOutput) {
        let involved: Vec<ConversationId> = self
            .conversations
            .values()
            .filter(|c| c.member(player_id).is_some())
            .map(|c| c.id)
            .collect();
        for conversation_id in involved {
            self.stop_conversation(conversation_id, now);
        }
        self.remove_player(player_id, now);
        self.schedule_op(None, player_id, OperationKind::CleanupPlayerData, now);
        out.departed.push(player_id);
    }

    // ── Conversation phase ────────────────────────────────────────────────

    fn tick_conversation(&mut self, conversation_id: ConversationId, now: GameTime) {
        let Some(conversation) = self.conversations.get(&conversation_id) else { return };

        // Ghost members: their player left by some path that skipped the
        // conversation (should not happen, but never wedge the room).
        let ghosts: Vec<PlayerId> = conversation
            .participants
            .keys()
            .filter(|p| !self.players.contains_key(*p))
            .copied()
            .collect();
        if !ghosts.is_empty() {
            if let Some(conversation) = self.conversations.get_mut(&conversation_id) {
                for ghost in ghosts {
                    conversation.participants.remove(&ghost);
                }
            }
        }

        let Some(conversation) = self.conversations.get(&conversation_id) else { return };

        if conversation.active_count() < 2 {
            self.stop_conversation(conversation_id, now);
            return;
        }

        // Participants who never made it in time.
        let timed_out = conversation.active().any(|(_, p)| {
            p.status != ParticipantStatus::Participating
                && p.invited_at + self.config.invite_timeout < now
        });
        if timed_out {
            self.stop_conversation(conversation_id, now);
            return;
        }

        // Proximity entry: accepted walkers close enough start participating.
        let members: Vec<PlayerId> = conversation.active().map(|(id, _)| id).collect();
        if let [a, b] = members[..] {
            let close = match (self.players.get(&a), self.players.get(&b)) {
                (Some(pa), Some(pb)) => {
                    pa.position.distance(pb.position) <= self.config.conversation_distance
                }
                _ => false,
            };
            if close {
                let mut entered = false;
                if let Some(conversation) = self.conversations.get_mut(&conversation_id) {
                    for id in [a, b] {
                        if let Some(member) = conversation.member_mut(id) {
                            if member.status == ParticipantStatus::WalkingOver {
                                member.status = ParticipantStatus::Participating;
                                entered = true;
                            }
                        }
                    }
                    if conversation.everyone_present() && conversation.started.is_none() {
                        conversation.started = Some(now);
                        entered = true;
                    }
                }
                if entered {
                    for id in [a, b] {
                        if let Some(player) = self.players.get_mut(&id) {
                            player.stop_pathfinding();
                        }
                    }
                }
            }
        }

        // A typing lock whose operation died must not gag the room forever.
        if let Some(conversation) = self.conversations.get_mut(&conversation_id) {
            if let Some(typing) = conversation.is_typing {
                if now.since(typing.since) > self.config.action_timeout {
                    conversation.is_typing = None;
                }
            }
        }
    }
}
