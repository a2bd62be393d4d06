//! `tt-store` — the side tables surrounding the simulation kernel.
//!
//! # Why this exists
//!
//! The tick loop owns players, agents, and conversations; everything *about*
//! them that outlives a conversation — messages, activity logs, relationship
//! scores, inventories, lootboxes, experience, archives — lives here, behind
//! the [`TownStore`] trait.  The split enforces the kernel's write
//! discipline: a tick may **read** these tables through the trait, but only
//! operations (running off the tick) and cleanup sweeps **write** them.
//!
//! [`MemStore`] is the default implementation: plain ordered maps, fully
//! deterministic, and the one every kernel test runs against.  The archive
//! writers ([`CsvWriter`], and [`SqliteWriter`] behind the `sqlite` feature)
//! export its contents for analysis.

pub mod archive;
pub mod csv_writer;
pub mod error;
pub mod rows;
pub mod store;

#[cfg(feature = "sqlite")]
pub mod sqlite;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use archive::{export_store, ArchiveWriter};
pub use csv_writer::CsvWriter;
pub use error::{StoreError, StoreResult};
pub use rows::{
    ActivityLogRow, ArchivedConversationRow, ArchivedEntityRow, BotRegistration, InventoryItem,
    LogKind, LootboxRow, MessageKind, MessageRow, RelationshipDelta,
};
pub use store::{level_for_xp, MemStore, TownStore};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;
