//! The `TownStore` trait and its in-memory implementation.
//!
//! # Write discipline
//!
//! The tick loop receives `&impl TownStore` and is limited by convention to
//! the read queries; every mutating method is called only from operation
//! runners and cleanup sweeps.  Keeping both halves on one trait (rather
//! than split read/write traits) mirrors how the durable schema is one
//! surface — the discipline is about *when* writes happen, not who can name
//! the methods.

use std::collections::{BTreeMap, BTreeSet};

use tt_core::{ConversationId, PlayerId, Relationship};

use crate::rows::{
    ActivityLogRow, ArchivedConversationRow, ArchivedEntityRow, BotRegistration, InventoryItem,
    LootboxRow, MessageRow, RelationshipDelta,
};

/// Experience-to-level curve shared with external services.
#[inline]
pub fn level_for_xp(xp: u64) -> u32 {
    ((xp / 100) as f64).sqrt() as u32
}

// ── TownStore ─────────────────────────────────────────────────────────────────

/// The side-table surface around one world.
pub trait TownStore {
    // ── Read queries (safe inside a tick) ─────────────────────────────────

    /// Total coin value of a player's inventory.
    fn inventory_value(&self, player: PlayerId) -> i64;

    /// Directed relationship scores `from → to`; default row if none.
    fn relationship(&self, from: PlayerId, to: PlayerId) -> Relationship;

    /// Accumulated experience points.
    fn experience(&self, player: PlayerId) -> u64;

    /// `true` if bots are waiting to be spawned into the world.
    fn has_pending_registrations(&self) -> bool;

    /// Look up a finished conversation by id (the remember operation reads
    /// the roster from here after the live row is gone).
    fn archived_conversation(&self, id: ConversationId) -> Option<ArchivedConversationRow>;

    // ── Writes (operations and cleanup only) ──────────────────────────────

    fn append_message(&mut self, row: MessageRow);
    fn log_activity(&mut self, row: ActivityLogRow);
    fn adjust_relationship(&mut self, from: PlayerId, to: PlayerId, delta: RelationshipDelta);
    fn add_item(&mut self, item: InventoryItem);

    /// Remove up to `amount` of coin value from a player's inventory,
    /// consuming items oldest-first (the last item may be split).  Returns
    /// the value actually removed.
    fn deduct_inventory(&mut self, player: PlayerId, amount: i64) -> i64;

    fn push_lootbox(&mut self, row: LootboxRow);
    fn add_xp(&mut self, player: PlayerId, amount: u64);
    fn archive_conversation(&mut self, row: ArchivedConversationRow);
    fn record_participated(&mut self, a: PlayerId, b: PlayerId, conversation: ConversationId);
    fn archive_entity(&mut self, row: ArchivedEntityRow);
    fn push_registration(&mut self, registration: BotRegistration);
    fn drain_registrations(&mut self) -> Vec<BotRegistration>;

    // ── Cascade deletion (capped batches; repeat until they return 0) ─────

    fn purge_messages(&mut self, player: PlayerId, cap: usize) -> usize;
    fn purge_activity_logs(&mut self, player: PlayerId, cap: usize) -> usize;
    fn purge_relationships(&mut self, player: PlayerId) -> usize;
    fn purge_inventory(&mut self, player: PlayerId) -> usize;
    fn purge_lootboxes(&mut self, player: PlayerId) -> usize;
    fn purge_experience(&mut self, player: PlayerId) -> usize;
    fn purge_participated(&mut self, player: PlayerId, cap: usize) -> usize;
    fn purge_archived_conversations(&mut self, player: PlayerId, cap: usize) -> usize;
    fn purge_registration(&mut self, ai_arena_bot_id: &str) -> usize;
}

// ── MemStore ──────────────────────────────────────────────────────────────────

/// Deterministic in-memory store: ordered maps and append-order vectors, so
/// identical operation sequences leave identical contents.
#[derive(Default, Debug)]
pub struct MemStore {
    messages:               Vec<MessageRow>,
    logs:                   Vec<ActivityLogRow>,
    relationships:          BTreeMap<(PlayerId, PlayerId), Relationship>,
    items:                  Vec<InventoryItem>,
    lootboxes:              Vec<LootboxRow>,
    xp:                     BTreeMap<PlayerId, u64>,
    archived_conversations: Vec<ArchivedConversationRow>,
    participated:           BTreeSet<(PlayerId, PlayerId, ConversationId)>,
    archived_entities:      Vec<ArchivedEntityRow>,
    registrations:          Vec<BotRegistration>,
}

impl MemStore {
    pub fn new() -> MemStore {
        MemStore::default()
    }

    // Export accessors (archive writers, tests).

    pub fn messages(&self) -> &[MessageRow] {
        &self.messages
    }

    pub fn activity_logs(&self) -> &[ActivityLogRow] {
        &self.logs
    }

    pub fn archived_conversations(&self) -> &[ArchivedConversationRow] {
        &self.archived_conversations
    }

    pub fn archived_entities(&self) -> &[ArchivedEntityRow] {
        &self.archived_entities
    }

    pub fn lootboxes(&self) -> &[LootboxRow] {
        &self.lootboxes
    }

    pub fn participated_count(&self) -> usize {
        self.participated.len()
    }
}

impl TownStore for MemStore {
    fn inventory_value(&self, player: PlayerId) -> i64 {
        self.items
            .iter()
            .filter(|i| i.player_id == player)
            .map(|i| i.value)
            .sum()
    }

    fn relationship(&self, from: PlayerId, to: PlayerId) -> Relationship {
        self.relationships
            .get(&(from, to))
            .copied()
            .unwrap_or_default()
    }

    fn experience(&self, player: PlayerId) -> u64 {
        self.xp.get(&player).copied().unwrap_or(0)
    }

    fn has_pending_registrations(&self) -> bool {
        !self.registrations.is_empty()
    }

    fn archived_conversation(&self, id: ConversationId) -> Option<ArchivedConversationRow> {
        self.archived_conversations.iter().find(|c| c.id == id).cloned()
    }

    fn append_message(&mut self, row: MessageRow) {
        self.messages.push(row);
    }

    fn log_activity(&mut self, row: ActivityLogRow) {
        self.logs.push(row);
    }

    fn adjust_relationship(&mut self, from: PlayerId, to: PlayerId, delta: RelationshipDelta) {
        let row = self.relationships.entry((from, to)).or_default();
        row.trust += delta.trust;
        row.revenge += delta.revenge;
        row.loyalty += delta.loyalty;
        row.fear += delta.fear;
    }

    fn add_item(&mut self, item: InventoryItem) {
        self.items.push(item);
    }

    fn deduct_inventory(&mut self, player: PlayerId, amount: i64) -> i64 {
        let mut remaining = amount.max(0);
        let mut taken = 0;
        for item in self.items.iter_mut().filter(|i| i.player_id == player) {
            if remaining == 0 {
                break;
            }
            let slice = item.value.min(remaining);
            item.value -= slice;
            remaining -= slice;
            taken += slice;
        }
        self.items.retain(|i| i.player_id != player || i.value > 0);
        taken
    }

    fn push_lootbox(&mut self, row: LootboxRow) {
        self.lootboxes.push(row);
    }

    fn add_xp(&mut self, player: PlayerId, amount: u64) {
        *self.xp.entry(player).or_insert(0) += amount;
    }

    fn archive_conversation(&mut self, row: ArchivedConversationRow) {
        self.archived_conversations.push(row);
    }

    fn record_participated(&mut self, a: PlayerId, b: PlayerId, conversation: ConversationId) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        self.participated.insert((lo, hi, conversation));
    }

    fn archive_entity(&mut self, row: ArchivedEntityRow) {
        self.archived_entities.push(row);
    }

    fn push_registration(&mut self, registration: BotRegistration) {
        self.registrations.push(registration);
    }

    fn drain_registrations(&mut self) -> Vec<BotRegistration> {
        std::mem::take(&mut self.registrations)
    }

    fn purge_messages(&mut self, player: PlayerId, cap: usize) -> usize {
        remove_capped(&mut self.messages, cap, |m| m.author == player)
    }

    fn purge_activity_logs(&mut self, player: PlayerId, cap: usize) -> usize {
        remove_capped(&mut self.logs, cap, |l| l.player_id == player)
    }

    fn purge_relationships(&mut self, player: PlayerId) -> usize {
        let before = self.relationships.len();
        self.relationships
            .retain(|(from, to), _| *from != player && *to != player);
        before - self.relationships.len()
    }

    fn purge_inventory(&mut self, player: PlayerId) -> usize {
        let before = self.items.len();
        self.items.retain(|i| i.player_id != player);
        before - self.items.len()
    }

    fn purge_lootboxes(&mut self, player: PlayerId) -> usize {
        let before = self.lootboxes.len();
        self.lootboxes.retain(|l| l.player_id != player);
        before - self.lootboxes.len()
    }

    fn purge_experience(&mut self, player: PlayerId) -> usize {
        usize::from(self.xp.remove(&player).is_some())
    }

    fn purge_participated(&mut self, player: PlayerId, cap: usize) -> usize {
        let doomed: Vec<_> = self
            .participated
            .iter()
            .filter(|(a, b, _)| *a == player || *b == player)
            .take(cap)
            .copied()
            .collect();
        for key in &doomed {
            self.participated.remove(key);
        }
        doomed.len()
    }

    fn purge_archived_conversations(&mut self, player: PlayerId, cap: usize) -> usize {
        remove_capped(&mut self.archived_conversations, cap, |c| {
            c.participants.contains(&player)
        })
    }

    fn purge_registration(&mut self, ai_arena_bot_id: &str) -> usize {
        let before = self.registrations.len();
        self.registrations
            .retain(|r| r.ai_arena_bot_id != ai_arena_bot_id);
        before - self.registrations.len()
    }
}

/// Remove up to `cap` elements matching `doomed`, preserving order.
fn remove_capped<T>(rows: &mut Vec<T>, cap: usize, doomed: impl Fn(&T) -> bool) -> usize {
    let mut removed = 0;
    rows.retain(|row| {
        if removed < cap && doomed(row) {
            removed += 1;
            false
        } else {
            true
        }
    });
    removed
}
