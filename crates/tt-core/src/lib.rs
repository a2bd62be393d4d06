//! `tt-core` — foundational types for the tiletown simulation kernel.
//!
//! This crate is a dependency of every other `tt-*` crate.  It intentionally
//! has no `tt-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module       | Contents                                                 |
//! |--------------|----------------------------------------------------------|
//! | [`ids`]      | `WorldId`, `PlayerId`, `AgentId`, `ConversationId`, …    |
//! | [`time`]     | `GameTime`, `GameDuration`, `WallTime`                   |
//! | [`rng`]      | `WorldRng` (per-world, snapshot-friendly)                |
//! | [`config`]   | `WorldConfig` — every tunable in one struct              |
//! | [`relation`] | `Relationship` scores shared by kernel and side tables   |
//! | [`error`]    | `CoreError`, `CoreResult`                                |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                      |
//! |---------|-------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.         |
//!           | Required by world snapshots and the journal.                |

pub mod config;
pub mod error;
pub mod ids;
pub mod relation;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::WorldConfig;
pub use error::{CoreError, CoreResult};
pub use ids::{
    AgentId, ConversationId, EngineId, GenerationNumber, InputNumber, OperationId, PlayerId,
    WorldId,
};
pub use relation::Relationship;
pub use rng::WorldRng;
pub use time::{GameDuration, GameTime, WallTime};
