//! The closed input union and its return-value / error shapes.
//!
//! Every way the outside world (HTTP handlers, completed operations, the
//! agent tick itself) can touch a world is one variant here.  Inputs are
//! applied strictly in journal order by [`apply_input`](crate::apply_input);
//! the result — `ok(value)` or `error(kind, message)` — is recorded on the
//! journal row and is the *only* way callers observe completion.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use tt_core::{AgentId, ConversationId, GameDuration, OperationId, PlayerId};
use tt_map::{Tile, Zone};
use tt_store::MessageKind;

use crate::agent::Personality;

// ── Input ─────────────────────────────────────────────────────────────────────

/// One journaled command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Input {
    // ── External surface ──────────────────────────────────────────────────
    /// A human joins the town.
    Join {
        name:             String,
        character:        String,
        identity:         String,
        token_identifier: Option<String>,
    },
    /// A player leaves; stops their conversations and schedules cascade
    /// cleanup of derived data.
    Leave { player_id: PlayerId },
    /// Set (or clear, with `None`) a movement destination.
    MoveTo {
        player_id:   PlayerId,
        destination: Option<Tile>,
    },
    /// Spawn a bot player + agent pair from an external registration.
    CreateAgent {
        name:            String,
        character:       String,
        identity:        String,
        plan:            String,
        personality:     Personality,
        ai_arena_bot_id: String,
        initial_zone:    Option<Zone>,
    },
    UpdatePlayerEquipment {
        player_id:     PlayerId,
        power_bonus:   i32,
        defense_bonus: i32,
    },
    /// External energy refill (lootboxes, activity-end hooks).
    RefillEnergy { player_id: PlayerId, amount: u32 },

    // ── Human conversation controls ───────────────────────────────────────
    AcceptInvite { player_id: PlayerId, conversation_id: ConversationId },
    RejectInvite { player_id: PlayerId, conversation_id: ConversationId },
    LeaveConversation { player_id: PlayerId, conversation_id: ConversationId },
    /// Take the typing lock before composing (humans; agents take it in
    /// their tick).
    StartTyping {
        player_id:       PlayerId,
        conversation_id: ConversationId,
        message_uuid:    Uuid,
    },

    // ── Action initiations from the agent tick ────────────────────────────
    StartRobbery { agent_id: AgentId, target: PlayerId },
    StartCombat { agent_id: AgentId, opponent: PlayerId },

    // ── Operation completions ─────────────────────────────────────────────
    FinishDoSomething {
        operation_id: OperationId,
        agent_id:     AgentId,
        decision:     Decision,
    },
    FinishSendingMessage {
        /// `None` for human-authored messages, which bypass the runtime.
        operation_id:    Option<OperationId>,
        player_id:       PlayerId,
        conversation_id: ConversationId,
        message_uuid:    Uuid,
        kind:            MessageKind,
    },
    FinishRememberConversation {
        operation_id: OperationId,
        agent_id:     AgentId,
    },
    FinishRobbery {
        operation_id: OperationId,
        agent_id:     AgentId,
        target:       PlayerId,
        success:      bool,
        loot_value:   i64,
    },
    FinishCombat {
        operation_id: OperationId,
        agent_id:     AgentId,
        opponent:     PlayerId,
        attacker_won: bool,
    },
}

/// What an agent decided to do with its idle time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Decision {
    /// Head somewhere, for no particular reason.
    Wander { destination: Tile },
    /// Invite another player to talk.
    Invite { invitee: PlayerId },
    /// Perform a zone activity, optionally walking somewhere first.
    Activity {
        description: String,
        emoji:       Option<String>,
        duration:    GameDuration,
        destination: Option<Tile>,
    },
    /// Nothing viable came back.
    DoNothing,
}

impl Input {
    /// Stable name for journaling and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Input::Join { .. }                       => "join",
            Input::Leave { .. }                      => "leave",
            Input::MoveTo { .. }                     => "moveTo",
            Input::CreateAgent { .. }                => "createAgent",
            Input::UpdatePlayerEquipment { .. }      => "updatePlayerEquipment",
            Input::RefillEnergy { .. }               => "refillEnergy",
            Input::AcceptInvite { .. }               => "acceptInvite",
            Input::RejectInvite { .. }               => "rejectInvite",
            Input::LeaveConversation { .. }          => "leaveConversation",
            Input::StartTyping { .. }                => "startTyping",
            Input::StartRobbery { .. }               => "startRobbery",
            Input::StartCombat { .. }                => "startCombat",
            Input::FinishDoSomething { .. }          => "finishDoSomething",
            Input::FinishSendingMessage { .. }       => "finishSendingMessage",
            Input::FinishRememberConversation { .. } => "finishRememberConversation",
            Input::FinishRobbery { .. }              => "finishRobbery",
            Input::FinishCombat { .. }               => "finishCombat",
        }
    }

    /// `true` if this input's arguments name `player` — the cascade delete
    /// uses this to purge journal rows about a departed player.
    pub fn references_player(&self, player: PlayerId) -> bool {
        match self {
            Input::Join { .. } | Input::CreateAgent { .. } => false,
            Input::Leave { player_id }
            | Input::MoveTo { player_id, .. }
            | Input::UpdatePlayerEquipment { player_id, .. }
            | Input::RefillEnergy { player_id, .. }
            | Input::AcceptInvite { player_id, .. }
            | Input::RejectInvite { player_id, .. }
            | Input::LeaveConversation { player_id, .. }
            | Input::StartTyping { player_id, .. }
            | Input::FinishSendingMessage { player_id, .. } => *player_id == player,
            Input::StartRobbery { target, .. } => *target == player,
            Input::StartCombat { opponent, .. } => *opponent == player,
            Input::FinishDoSomething { decision, .. } => {
                matches!(decision, Decision::Invite { invitee } if *invitee == player)
            }
            Input::FinishRememberConversation { .. } => false,
            Input::FinishRobbery { target, .. } => *target == player,
            Input::FinishCombat { opponent, .. } => *opponent == player,
        }
    }

    /// `true` if this input's arguments name `agent`.
    pub fn references_agent(&self, agent: AgentId) -> bool {
        match self {
            Input::StartRobbery { agent_id, .. }
            | Input::StartCombat { agent_id, .. }
            | Input::FinishDoSomething { agent_id, .. }
            | Input::FinishRememberConversation { agent_id, .. }
            | Input::FinishRobbery { agent_id, .. }
            | Input::FinishCombat { agent_id, .. } => *agent_id == agent,
            _ => false,
        }
    }
}

// ── ReturnValue ───────────────────────────────────────────────────────────────

/// The `ok` arm of an input's recorded result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ReturnValue {
    Null,
    PlayerJoined { player_id: PlayerId },
    AgentCreated { agent_id: AgentId, player_id: PlayerId },
    ConversationStarted { conversation_id: ConversationId },
}

// ── InputError ────────────────────────────────────────────────────────────────

/// The `error` arm: the six error kinds the surface exposes.
#[derive(Clone, Debug, PartialEq, Error, Serialize, Deserialize)]
pub enum InputError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("rate limited")]
    RateLimited,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("timed out")]
    TimedOut,

    #[error("internal: {0}")]
    Internal(String),
}

impl InputError {
    /// The wire-stable kind tag.
    pub fn kind(&self) -> &'static str {
        match self {
            InputError::InvalidInput(_) => "invalidInput",
            InputError::RateLimited     => "rateLimited",
            InputError::NotFound(_)     => "notFound",
            InputError::Conflict(_)     => "conflict",
            InputError::TimedOut        => "timedOut",
            InputError::Internal(_)     => "internal",
        }
    }
}

pub type InputResult = Result<ReturnValue, InputError>;
