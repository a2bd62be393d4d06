//! The `AgentMind` trait — the seam to the external reasoning service.

use tt_core::{GameDuration, WorldRng};
use tt_map::Zone;
use tt_store::MessageKind;
use tt_world::Personality;

/// Inputs available when composing one chat message.
pub struct MessageContext<'a> {
    pub speaker_name: &'a str,
    pub other_name:   &'a str,
    pub kind:         MessageKind,
    pub num_messages: u32,
    pub personality:  Personality,
}

/// A zone activity picked for an agent.
#[derive(Clone, Debug, PartialEq)]
pub struct ActivityChoice {
    pub description: String,
    pub emoji:       Option<String>,
    pub duration:    GameDuration,
}

/// Pluggable reasoning.
///
/// Implementations may perform arbitrary I/O (LLM calls, memory lookups) —
/// they run inside operations, never inside a tick.  Determinism is only
/// required of the bundled default; external minds trade it away knowingly.
pub trait AgentMind: Send + Sync {
    /// Compose the text of one message.
    fn compose_message(&self, ctx: &MessageContext<'_>, rng: &mut WorldRng) -> String;

    /// Summarize a finished conversation for the agent's memory.
    fn summarize_conversation(&self, speaker_name: &str, num_messages: u32) -> String;

    /// Pick an activity fitting the zone and personality.
    fn choose_activity(
        &self,
        zone:        Zone,
        personality: Personality,
        rng:         &mut WorldRng,
    ) -> ActivityChoice;
}

impl<T: AgentMind + ?Sized> AgentMind for Box<T> {
    fn compose_message(&self, ctx: &MessageContext<'_>, rng: &mut WorldRng) -> String {
        (**self).compose_message(ctx, rng)
    }

    fn summarize_conversation(&self, speaker_name: &str, num_messages: u32) -> String {
        (**self).summarize_conversation(speaker_name, num_messages)
    }

    fn choose_activity(
        &self,
        zone:        Zone,
        personality: Personality,
        rng:         &mut WorldRng,
    ) -> ActivityChoice {
        (**self).choose_activity(zone, personality, rng)
    }
}

// ── ScriptedMind ──────────────────────────────────────────────────────────────

/// Deterministic template-based mind.  Good enough to exercise every kernel
/// path; replaced by an LLM-backed implementation in real deployments.
#[derive(Default)]
pub struct ScriptedMind;

impl AgentMind for ScriptedMind {
    fn compose_message(&self, ctx: &MessageContext<'_>, rng: &mut WorldRng) -> String {
        match ctx.kind {
            MessageKind::Start => {
                let openers = [
                    format!("Hey {}, got a minute?", ctx.other_name),
                    format!("{}! Fancy seeing you here.", ctx.other_name),
                    format!("Evening, {}.", ctx.other_name),
                ];
                rng.choose(&openers).cloned().unwrap_or_default()
            }
            MessageKind::Continue => {
                let lines = [
                    "Heard anything interesting lately?".to_string(),
                    "Business has been slow around here.".to_string(),
                    "You should see the crowd at the casino tonight.".to_string(),
                    "Keep an eye on the alley after dark.".to_string(),
                ];
                rng.choose(&lines).cloned().unwrap_or_default()
            }
            MessageKind::Leave => {
                format!("I should get going, {}. See you around.", ctx.other_name)
            }
        }
    }

    fn summarize_conversation(&self, speaker_name: &str, num_messages: u32) -> String {
        format!("{speaker_name} exchanged {num_messages} messages")
    }

    fn choose_activity(
        &self,
        zone:        Zone,
        personality: Personality,
        rng:         &mut WorldRng,
    ) -> ActivityChoice {
        let (description, emoji) = match (zone, personality) {
            (Zone::Casino, Personality::Gambler)      => ("playing blackjack", "🎰"),
            (Zone::Casino, Personality::Criminal)     => ("casing the cashier cage", "🕶️"),
            (Zone::Casino, Personality::Worker)       => ("dealing cards", "🃏"),
            (Zone::Market, Personality::Worker)       => ("stocking the stalls", "📦"),
            (Zone::Market, _)                         => ("haggling over trinkets", "🪙"),
            (Zone::Park, _)                           => ("feeding the pigeons", "🕊️"),
            (Zone::Suburb, _)                         => ("tending the garden", "🌱"),
            (Zone::DarkAlley, Personality::Criminal)  => ("lurking in the shadows", "🌑"),
            (Zone::DarkAlley, _)                      => ("hurrying through the alley", "👣"),
            (Zone::Underground, Personality::Gambler) => ("watching the pit fights", "🥊"),
            (Zone::Underground, _)                    => ("skulking by the ring", "🥊"),
            (Zone::Commons, Personality::Worker)      => ("sweeping the square", "🧹"),
            (Zone::Commons, _)                        => ("people-watching", "👀"),
        };
        let duration = GameDuration::from_secs(rng.gen_range(20..=60));
        ActivityChoice {
            description: description.to_string(),
            emoji:       Some(emoji.to_string()),
            duration,
        }
    }
}
