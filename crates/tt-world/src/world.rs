//! The world container.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tt_core::{
    AgentId, ConversationId, GameTime, OperationId, PlayerId, WorldConfig, WorldId, WorldRng,
};
use tt_map::{Tile, WorldMap};
use tt_store::{ArchivedConversationRow, ArchivedEntityRow};

use crate::agent::Agent;
use crate::conversation::Conversation;
use crate::descriptions::{AgentDescription, PlayerDescription};
use crate::input::InputError;
use crate::operation::{OperationKind, ScheduledOp};
use crate::player::Player;

/// One unordered-pair conversation cooldown row.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PairCooldown {
    pub a:     PlayerId,
    pub b:     PlayerId,
    pub until: GameTime,
}

/// One town: the unit of isolation and of single-writer mutation.
///
/// Entities are kept in ordered maps so every sweep — and therefore every
/// replay — visits them in the same order.  Cross-references are ids only;
/// the inverse lookups (`conversation_of`, `agent_by_player`) are derived
/// scans, never stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct World {
    pub id:     WorldId,
    pub config: WorldConfig,
    pub map:    WorldMap,

    next_entity_id: u32,
    next_op_id:     u64,

    pub players:       BTreeMap<PlayerId, Player>,
    pub agents:        BTreeMap<AgentId, Agent>,
    pub conversations: BTreeMap<ConversationId, Conversation>,

    pub player_descriptions: BTreeMap<PlayerId, PlayerDescription>,
    pub agent_descriptions:  BTreeMap<AgentId, AgentDescription>,

    /// Unordered-pair conversation cooldowns.  A plain vector: the set is
    /// tiny (one row per recently-finished conversation) and JSON-friendly.
    pub pair_cooldowns: Vec<PairCooldown>,

    pub rng: WorldRng,

    // ── Tick-local buffers, drained into TickOutput every tick ────────────
    pub(crate) pending_ops:             Vec<ScheduledOp>,
    pub(crate) pending_conv_archives:   Vec<ArchivedConversationRow>,
    pub(crate) pending_entity_archives: Vec<ArchivedEntityRow>,
}

impl World {
    pub fn new(id: WorldId, config: WorldConfig, map: WorldMap) -> World {
        let rng = WorldRng::new(config.seed ^ u64::from(id.0));
        World {
            id,
            config,
            map,
            next_entity_id: 0,
            next_op_id: 0,
            players: BTreeMap::new(),
            agents: BTreeMap::new(),
            conversations: BTreeMap::new(),
            player_descriptions: BTreeMap::new(),
            agent_descriptions: BTreeMap::new(),
            pair_cooldowns: Vec::new(),
            rng,
            pending_ops: Vec::new(),
            pending_conv_archives: Vec::new(),
            pending_entity_archives: Vec::new(),
        }
    }

    // ── ID allocation ─────────────────────────────────────────────────────

    pub(crate) fn alloc_entity_id(&mut self) -> u32 {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }

    pub(crate) fn alloc_op_id(&mut self) -> OperationId {
        let id = self.next_op_id;
        self.next_op_id += 1;
        OperationId(id)
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    pub fn player(&self, id: PlayerId) -> Result<&Player, InputError> {
        self.players
            .get(&id)
            .ok_or_else(|| InputError::NotFound(format!("player {id}")))
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player, InputError> {
        self.players
            .get_mut(&id)
            .ok_or_else(|| InputError::NotFound(format!("player {id}")))
    }

    pub fn agent(&self, id: AgentId) -> Result<&Agent, InputError> {
        self.agents
            .get(&id)
            .ok_or_else(|| InputError::NotFound(format!("agent {id}")))
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Result<&mut Agent, InputError> {
        self.agents
            .get_mut(&id)
            .ok_or_else(|| InputError::NotFound(format!("agent {id}")))
    }

    pub fn conversation_mut(&mut self, id: ConversationId) -> Result<&mut Conversation, InputError> {
        self.conversations
            .get_mut(&id)
            .ok_or_else(|| InputError::NotFound(format!("conversation {id}")))
    }

    /// The agent controlling `player`, if the player is a bot.
    pub fn agent_by_player(&self, player: PlayerId) -> Option<AgentId> {
        self.agents
            .values()
            .find(|a| a.player_id == player)
            .map(|a| a.id)
    }

    /// The conversation `player` currently appears in (derived; a player is
    /// in at most one).
    pub fn conversation_of(&self, player: PlayerId) -> Option<ConversationId> {
        self.conversations
            .values()
            .find(|c| c.member(player).is_some_and(|p| p.is_active()))
            .map(|c| c.id)
    }

    /// Resolve an external bot id to its live agent/player pair.
    pub fn find_by_bot_id(&self, ai_arena_bot_id: &str) -> Option<(AgentId, PlayerId)> {
        self.agent_descriptions
            .values()
            .find(|d| d.ai_arena_bot_id.as_deref() == Some(ai_arena_bot_id))
            .and_then(|d| self.agents.get(&d.agent_id))
            .map(|a| (a.id, a.player_id))
    }

    pub fn human_count(&self) -> usize {
        self.players.values().filter(|p| p.is_human()).count()
    }

    /// `true` if another player currently stands on `tile`.
    pub fn tile_occupied(&self, tile: Tile, except: PlayerId) -> bool {
        self.players
            .values()
            .any(|p| p.id != except && p.position.tile() == tile)
    }

    /// `true` if the unordered pair is still inside its conversation cooldown.
    pub fn pair_on_cooldown(&self, a: PlayerId, b: PlayerId, now: GameTime) -> bool {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        self.pair_cooldowns
            .iter()
            .any(|c| c.a == lo && c.b == hi && c.until > now)
    }

    pub(crate) fn set_pair_cooldown(&mut self, a: PlayerId, b: PlayerId, until: GameTime) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        self.pair_cooldowns.retain(|c| (c.a, c.b) != (lo, hi));
        self.pair_cooldowns.push(PairCooldown { a: lo, b: hi, until });
    }

    /// Drop cooldown rows that have expired (called by the tick).
    pub(crate) fn prune_pair_cooldowns(&mut self, now: GameTime) {
        self.pair_cooldowns.retain(|c| c.until > now);
    }

    // ── Operation scheduling ──────────────────────────────────────────────

    /// Schedule an operation and, when it belongs to an agent, install the
    /// agent's in-progress handle.
    pub(crate) fn schedule_op(
        &mut self,
        agent_id:  Option<AgentId>,
        player_id: PlayerId,
        kind:      OperationKind,
        now:       GameTime,
    ) -> OperationId {
        let op_id = self.alloc_op_id();
        if let Some(agent_id) = agent_id {
            if let Some(agent) = self.agents.get_mut(&agent_id) {
                agent.in_progress_operation = Some(crate::agent::OperationHandle {
                    op_id,
                    name: kind.name().to_string(),
                    started: now,
                });
            }
        }
        self.pending_ops.push(ScheduledOp { id: op_id, agent_id, player_id, started: now, kind });
        op_id
    }

    // ── Conversation teardown ─────────────────────────────────────────────

    /// Stop a conversation: archive the record, mark `to_remember` and the
    /// conversation cooldown on every involved agent, and start the pair
    /// cooldown.  Idempotent for already-removed conversations.
    pub(crate) fn stop_conversation(&mut self, id: ConversationId, now: GameTime) {
        let Some(conversation) = self.conversations.remove(&id) else {
            return;
        };

        let members: Vec<PlayerId> = conversation.participants.keys().copied().collect();
        let had_content = conversation.started.is_some() && conversation.num_messages > 0;

        for player_id in &members {
            if let Some(agent_id) = self.agent_by_player(*player_id) {
                if let Some(agent) = self.agents.get_mut(&agent_id) {
                    agent.last_conversation = Some(now);
                    if had_content {
                        agent.to_remember = Some(id);
                    }
                }
            }
        }

        if let [a, b] = members[..] {
            self.set_pair_cooldown(a, b, now + self.config.player_conversation_cooldown);
        }

        self.pending_conv_archives.push(ArchivedConversationRow {
            id,
            creator:      conversation.creator,
            participants: members,
            num_messages: conversation.num_messages,
            started:      conversation.started,
            ended:        now,
        });
    }

    // ── Entity removal ────────────────────────────────────────────────────

    /// Remove a player (and its agent, and both descriptions) from the live
    /// world, recording an archive row.  Conversations must already be
    /// stopped by the caller.
    pub(crate) fn remove_player(&mut self, player_id: PlayerId, now: GameTime) {
        self.players.remove(&player_id);
        let description = self.player_descriptions.remove(&player_id);

        let mut bot_id = None;
        if let Some(agent_id) = self.agent_by_player(player_id) {
            self.agents.remove(&agent_id);
            bot_id = self
                .agent_descriptions
                .remove(&agent_id)
                .and_then(|d| d.ai_arena_bot_id);
        }

        self.pending_entity_archives.push(ArchivedEntityRow {
            player_id,
            name: description.map(|d| d.name).unwrap_or_default(),
            ai_arena_bot_id: bot_id,
            at: now,
        });
    }

    // ── Snapshots ─────────────────────────────────────────────────────────

    /// Serialize the full world state.  Byte-identical snapshots are the
    /// replay-determinism contract, so everything that influences a tick —
    /// entities, RNG position, id counters — is included.
    pub fn snapshot(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Restore a world from [`World::snapshot`] bytes.
    pub fn restore(bytes: &[u8]) -> serde_json::Result<World> {
        serde_json::from_slice(bytes)
    }
}
