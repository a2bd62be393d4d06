//! Player and agent description rows.
//!
//! Exactly one row per entity.  Description text is written once at creation
//! and read by the reasoning operations; the kernel itself only validates
//! the character sprite at join time.

use serde::{Deserialize, Serialize};

use tt_core::{AgentId, PlayerId};

/// Sprite sheet names accepted by `join` / `createAgent`.
pub const CHARACTER_ROSTER: &[&str] = &[
    "f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8",
    "m1", "m2", "m3", "m4", "m5", "m6", "m7", "m8",
];

/// `true` if `character` names a sprite in the static roster.
pub fn valid_character(character: &str) -> bool {
    CHARACTER_ROSTER.contains(&character)
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerDescription {
    pub player_id: PlayerId,
    pub name:      String,
    /// Sprite sheet, validated against [`CHARACTER_ROSTER`].
    pub character: String,
    /// Who this player is, in prose.
    pub identity:  String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentDescription {
    pub agent_id: AgentId,
    /// Long-term goals, in prose; consumed by the reasoning operations.
    pub plan: String,
    /// External bot registry key; the cascade delete is addressed by it.
    pub ai_arena_bot_id: Option<String>,
}
