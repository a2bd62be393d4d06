//! The closed operation union.
//!
//! An operation is work the tick must not do inline: reasoning calls, dice
//! rolls with side-table writes, log appends, cascade cleanup.  The tick (or
//! an input handler) emits a [`ScheduledOp`]; the runtime executes it off
//! the step and, for decision-class operations, re-enters the world with
//! exactly one `Finish…` input keyed by the same [`OperationId`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tt_core::{AgentId, ConversationId, GameTime, OperationId, PlayerId};
use tt_map::Zone;
use tt_store::MessageKind;

use crate::agent::Personality;

// ── OperationKind ─────────────────────────────────────────────────────────────

/// Every operation the runtime knows how to execute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum OperationKind {
    // ── Agent decisions (complete via a Finish… input) ────────────────────
    /// Compose and store one chat message, then release the typing lock via
    /// `FinishSendingMessage`.
    GenerateMessage {
        conversation_id: ConversationId,
        other:           PlayerId,
        kind:            MessageKind,
        message_uuid:    Uuid,
    },
    /// Summarize a finished conversation into memory, then
    /// `FinishRememberConversation`.
    RememberConversation { conversation_id: ConversationId },
    /// Pick a zone- and personality-appropriate activity, then
    /// `FinishDoSomething { decision: Activity }`.
    SelectActivity { zone: Zone, personality: Personality },
    /// Roll the robbery dice and apply loot transfer, then `FinishRobbery`.
    ResolveRobbery {
        target:       PlayerId,
        attack_power: f64,
        defense:      f64,
        zone:         Zone,
    },
    /// Roll the combat dice, then `FinishCombat`.
    ResolveCombat {
        opponent:       PlayerId,
        attacker_power: f64,
        opponent_power: f64,
    },

    // ── Fire-and-forget log/effect writes (no follow-up input) ────────────
    LogZoneChange { from: Zone, to: Zone },
    LogActivityEnd { description: String },
    LogHospitalRecovery,
    GrantMovementXp { steps: u32 },
    GenerateLootDrop { zone: Zone },
    /// Cascade-delete a departed player's derived data.
    CleanupPlayerData,
}

impl OperationKind {
    /// Stable operation name, used for handles and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::GenerateMessage { .. }      => "agentGenerateMessage",
            OperationKind::RememberConversation { .. } => "agentRememberConversation",
            OperationKind::SelectActivity { .. }       => "agentSelectZoneActivity",
            OperationKind::ResolveRobbery { .. }       => "resolveRobbery",
            OperationKind::ResolveCombat { .. }        => "resolveCombat",
            OperationKind::LogZoneChange { .. }        => "logZoneChange",
            OperationKind::LogActivityEnd { .. }       => "logActivityEnd",
            OperationKind::LogHospitalRecovery         => "logHospitalRecovery",
            OperationKind::GrantMovementXp { .. }      => "grantMovementXP",
            OperationKind::GenerateLootDrop { .. }     => "generateLootDrop",
            OperationKind::CleanupPlayerData           => "cleanupPlayerData",
        }
    }

    /// Decision-class operations conclude with a follow-up input; the
    /// fire-and-forget writes do not.
    pub fn has_follow_up(&self) -> bool {
        matches!(
            self,
            OperationKind::GenerateMessage { .. }
                | OperationKind::RememberConversation { .. }
                | OperationKind::SelectActivity { .. }
                | OperationKind::ResolveRobbery { .. }
                | OperationKind::ResolveCombat { .. }
        )
    }
}

// ── ScheduledOp ───────────────────────────────────────────────────────────────

/// One scheduled operation, keyed by a world-dense [`OperationId`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduledOp {
    pub id: OperationId,
    /// The agent whose `in_progress_operation` this is, if any.  Player-
    /// scoped log writes have none.
    pub agent_id:  Option<AgentId>,
    pub player_id: PlayerId,
    pub started:   GameTime,
    pub kind:      OperationKind,
}
