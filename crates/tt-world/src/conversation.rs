//! The multi-party conversation state machine.
//!
//! A conversation is created by an invite and moves each participant through
//! `Invited → WalkingOver → Participating`, with `Left` as the terminal
//! state.  The conversation itself carries the only kernel-owned mutex: the
//! advisory typing lock, taken before a message-generation operation starts
//! and released by its completion input.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tt_core::{ConversationId, GameTime, PlayerId};

// ── Participant ───────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantStatus {
    /// Received an invite, hasn't answered.
    Invited,
    /// Accepted; converging on the other participant.
    WalkingOver,
    /// Close enough; exchanging messages.
    Participating,
    /// Gone.  Kept in the map until the conversation archives so the stop
    /// path still knows who was involved.
    Left,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub status:      ParticipantStatus,
    pub invited_at:  GameTime,
    pub accepted_at: Option<GameTime>,
}

impl Participant {
    pub fn invited(at: GameTime) -> Participant {
        Participant { status: ParticipantStatus::Invited, invited_at: at, accepted_at: None }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status != ParticipantStatus::Left
    }
}

// ── Typing lock ───────────────────────────────────────────────────────────────

/// Advisory mutex: whoever holds it is composing the next message.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Typing {
    pub player_id:    PlayerId,
    pub message_uuid: Uuid,
    pub since:        GameTime,
}

/// Who spoke last, and when — drives the message cooldown.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LastMessage {
    pub author: PlayerId,
    pub at:     GameTime,
}

// ── Conversation ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id:      ConversationId,
    pub creator: PlayerId,

    pub participants: BTreeMap<PlayerId, Participant>,

    pub last_message: Option<LastMessage>,
    pub num_messages: u32,
    pub is_typing:    Option<Typing>,

    /// Set the moment every active participant reached `Participating`.
    pub started: Option<GameTime>,
}

impl Conversation {
    /// A fresh two-party conversation: the creator is already walking over,
    /// the invitee has to answer first.
    pub fn invite(id: ConversationId, creator: PlayerId, invitee: PlayerId, now: GameTime) -> Conversation {
        let mut participants = BTreeMap::new();
        participants.insert(creator, Participant {
            status:      ParticipantStatus::WalkingOver,
            invited_at:  now,
            accepted_at: Some(now),
        });
        participants.insert(invitee, Participant::invited(now));
        Conversation {
            id,
            creator,
            participants,
            last_message: None,
            num_messages: 0,
            is_typing: None,
            started: None,
        }
    }

    pub fn member(&self, player: PlayerId) -> Option<&Participant> {
        self.participants.get(&player)
    }

    pub fn member_mut(&mut self, player: PlayerId) -> Option<&mut Participant> {
        self.participants.get_mut(&player)
    }

    /// Participants that haven't left.
    pub fn active(&self) -> impl Iterator<Item = (PlayerId, &Participant)> {
        self.participants
            .iter()
            .filter(|(_, p)| p.is_active())
            .map(|(id, p)| (*id, p))
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// The other active participant of a two-party conversation.
    pub fn other_active(&self, me: PlayerId) -> Option<PlayerId> {
        self.active().map(|(id, _)| id).find(|id| *id != me)
    }

    /// `true` once every active participant is `Participating`.
    pub fn everyone_present(&self) -> bool {
        self.active_count() >= 2
            && self
                .active()
                .all(|(_, p)| p.status == ParticipantStatus::Participating)
    }

    /// Take the typing lock.  Fails (returns `false`) if someone else holds it.
    pub fn try_start_typing(&mut self, player: PlayerId, uuid: Uuid, now: GameTime) -> bool {
        if self.is_typing.is_some() {
            return false;
        }
        self.is_typing = Some(Typing { player_id: player, message_uuid: uuid, since: now });
        true
    }

    /// Release the lock if `player` holds it with `uuid`.
    pub fn release_typing(&mut self, player: PlayerId, uuid: Uuid) -> bool {
        match self.is_typing {
            Some(t) if t.player_id == player && t.message_uuid == uuid => {
                self.is_typing = None;
                true
            }
            _ => false,
        }
    }
}
