//! The autonomy layer bound to a player.

use serde::{Deserialize, Serialize};

use tt_core::{AgentId, ConversationId, GameTime, OperationId, PlayerId, WorldConfig};

// ── Personality ───────────────────────────────────────────────────────────────

/// Behavioral archetype.  Conditions which zone branches are live and biases
/// the robbery/combat math.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Personality {
    Criminal,
    Gambler,
    Worker,
}

impl Personality {
    /// Multiplicative bonus on robbery attack power.
    pub fn robbery_bonus(self) -> f64 {
        match self {
            Personality::Criminal => 0.20,
            Personality::Gambler  => 0.10,
            Personality::Worker   => 0.0,
        }
    }

    /// Additive power bias when initiating combat.
    pub fn combat_attack_bias(self) -> f64 {
        match self {
            Personality::Criminal => 30.0,
            _                     => 0.0,
        }
    }

    /// Additive power bias when defending in combat.
    pub fn combat_defense_bias(self) -> f64 {
        match self {
            Personality::Criminal => 10.0,
            _                     => 0.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Personality::Criminal => "criminal",
            Personality::Gambler  => "gambler",
            Personality::Worker   => "worker",
        }
    }
}

// ── OperationHandle ───────────────────────────────────────────────────────────

/// The one operation an agent may have in flight.
///
/// Set when the agent's tick commits to a decision; cleared by the matching
/// `Finish…` input or, if that never arrives, by the `action_timeout` sweep
/// at the start of the agent's tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OperationHandle {
    pub op_id:   OperationId,
    /// Operation name, for diagnostics and stale-completion checks.
    pub name:    String,
    pub started: GameTime,
}

// ── Agent ─────────────────────────────────────────────────────────────────────

/// Autonomous controller for one player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id:          AgentId,
    pub player_id:   PlayerId,
    pub personality: Personality,

    // ── Cooldowns ─────────────────────────────────────────────────────────
    pub last_conversation:    Option<GameTime>,
    pub last_invite_attempt:  Option<GameTime>,
    pub last_robbery_attempt: Option<GameTime>,
    pub last_combat:          Option<GameTime>,
    /// When the last zone activity ended (feeds the wander window).
    pub last_activity:        Option<GameTime>,
    /// Set while recovering from a combat loss.
    pub knocked_out_until:    Option<GameTime>,

    /// A conversation whose memory still needs to be written.
    pub to_remember: Option<ConversationId>,

    pub in_progress_operation: Option<OperationHandle>,
}

impl Agent {
    pub fn new(id: AgentId, player_id: PlayerId, personality: Personality) -> Agent {
        Agent {
            id,
            player_id,
            personality,
            last_conversation: None,
            last_invite_attempt: None,
            last_robbery_attempt: None,
            last_combat: None,
            last_activity: None,
            knocked_out_until: None,
            to_remember: None,
            in_progress_operation: None,
        }
    }

    /// `true` when a cooldown anchored at `since` has fully elapsed.
    fn cooled(since: Option<GameTime>, window: tt_core::GameDuration, now: GameTime) -> bool {
        since.is_none_or(|t| t + window <= now)
    }

    /// Ready to invite or converse again?
    pub fn conversation_ready(&self, config: &WorldConfig, now: GameTime) -> bool {
        Self::cooled(self.last_conversation, config.conversation_cooldown, now)
            && Self::cooled(self.last_invite_attempt, config.conversation_cooldown, now)
    }

    pub fn robbery_ready(&self, config: &WorldConfig, now: GameTime) -> bool {
        Self::cooled(self.last_robbery_attempt, config.robbery_cooldown, now)
    }

    pub fn combat_ready(&self, config: &WorldConfig, now: GameTime) -> bool {
        Self::cooled(self.last_combat, config.combat_cooldown, now)
    }

    /// Inside the post-conversation / post-activity wander window?
    ///
    /// The just-left-conversation check deliberately comes first: when both
    /// windows are open the agent is treated as having just left a
    /// conversation (one branch, one outcome).
    pub fn in_wander_window(&self, config: &WorldConfig, now: GameTime) -> bool {
        if let Some(t) = self.last_conversation {
            if now.since(t) < config.conversation_cooldown {
                return true;
            }
        }
        if let Some(t) = self.last_activity {
            if now.since(t) < config.activity_cooldown {
                return true;
            }
        }
        false
    }
}
