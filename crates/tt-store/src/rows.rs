//! Row shapes for every side table.
//!
//! Rows are plain serde data: the kernel never holds references into them,
//! and each carries the ids needed to find it again during cascade deletion.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tt_core::{ConversationId, GameTime, PlayerId};

// ── Messages ──────────────────────────────────────────────────────────────────

/// The role of a message within its conversation's lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    /// First message of a conversation (sent by the creator).
    Start,
    /// Any mid-conversation message.
    Continue,
    /// The goodbye message a participant sends when leaving.
    Leave,
}

/// One chat message, written by the message-generation operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageRow {
    pub conversation_id: ConversationId,
    pub author:          PlayerId,
    pub uuid:            Uuid,
    pub kind:            MessageKind,
    pub text:            String,
    pub at:              GameTime,
}

// ── Activity logs ─────────────────────────────────────────────────────────────

/// Closed taxonomy of activity-log rows.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogKind {
    ZoneChange,
    ActivityEnd,
    Robbery,
    Combat,
    HospitalRecovery,
    Conversation,
    LootDrop,
    MovementXp,
}

impl LogKind {
    /// Stable lower-snake name used by archives and exports.
    pub fn name(self) -> &'static str {
        match self {
            LogKind::ZoneChange       => "zone_change",
            LogKind::ActivityEnd      => "activity_end",
            LogKind::Robbery          => "robbery",
            LogKind::Combat           => "combat",
            LogKind::HospitalRecovery => "hospital_recovery",
            LogKind::Conversation     => "conversation",
            LogKind::LootDrop         => "loot_drop",
            LogKind::MovementXp       => "movement_xp",
        }
    }
}

/// One activity-log row with a free-form JSON detail payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogRow {
    pub player_id: PlayerId,
    pub kind:      LogKind,
    pub detail:    serde_json::Value,
    pub at:        GameTime,
}

// ── Inventory and loot ────────────────────────────────────────────────────────

/// One item in a player's inventory.  Value is in coins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub player_id: PlayerId,
    pub name:      String,
    pub value:     i64,
}

/// A pending lootbox, queued by the loot-drop operation and opened by an
/// external service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LootboxRow {
    pub player_id: PlayerId,
    pub zone:      String,
    pub tier:      u8,
    pub at:        GameTime,
}

// ── Relationships ─────────────────────────────────────────────────────────────

/// Additive adjustment applied to a directed relationship row.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDelta {
    pub trust:   i32,
    pub revenge: i32,
    pub loyalty: i32,
    pub fear:    i32,
}

// ── Archives ──────────────────────────────────────────────────────────────────

/// A finished conversation, moved out of the live world on stop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArchivedConversationRow {
    pub id:           ConversationId,
    pub creator:      PlayerId,
    pub participants: Vec<PlayerId>,
    pub num_messages: u32,
    pub started:      Option<GameTime>,
    pub ended:        GameTime,
}

/// A player or agent removed from the live world, kept for audit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArchivedEntityRow {
    pub player_id:      PlayerId,
    pub name:           String,
    pub ai_arena_bot_id: Option<String>,
    pub at:             GameTime,
}

// ── Bot registrations ─────────────────────────────────────────────────────────

/// A bot waiting to be spawned into a world.  The liveness sweep restarts
/// worlds that have pending registrations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BotRegistration {
    pub ai_arena_bot_id: String,
    pub name:            String,
    pub character:       String,
    pub identity:        String,
    pub plan:            String,
    pub initial_zone:    Option<String>,
}
