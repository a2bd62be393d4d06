//! `tt-world` — the world aggregate and its tick.
//!
//! # Design
//!
//! One [`World`] owns every live entity of one town: players, the agents
//! bound to them, conversations, and descriptions, all keyed by dense typed
//! ids and cross-referenced *only* by id (arena style — archival moves rows
//! out without renumbering anything).
//!
//! Mutation happens in exactly two places, both driven by the engine under a
//! single-writer discipline:
//!
//! - **Input handlers** ([`apply_input`]) — the closed [`Input`] union,
//!   applied in journal order, each producing an `ok(value)`/`error(kind)`
//!   return value and never partially mutating on error.
//! - **The entity tick** ([`World::tick_entities`]) — agents decide,
//!   players move, conversations reconcile.  Decisions that need slow work
//!   (reasoning, dice, log writes) leave the world as [`ScheduledOp`]s and
//!   come back later as `Finish…` inputs.
//!
//! The tick may *read* the side tables through [`tt_store::TownStore`] but
//! never writes them; writes belong to the operation runtime.

pub mod agent;
pub mod combat;
pub mod conversation;
pub mod descriptions;
pub mod handlers;
pub mod input;
pub mod operation;
pub mod player;
pub mod tick;
pub mod world;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use agent::{Agent, OperationHandle, Personality};
pub use conversation::{Conversation, Participant, ParticipantStatus, Typing};
pub use descriptions::{AgentDescription, PlayerDescription, CHARACTER_ROSTER};
pub use handlers::apply_input;
pub use input::{Decision, Input, InputError, InputResult, ReturnValue};
pub use operation::{OperationKind, ScheduledOp};
pub use player::{Activity, Equipment, Pathfinding, PathfindingState, Player};
pub use tick::TickOutput;
pub use world::World;
