//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  Entity IDs (`PlayerId`, `AgentId`,
//! `ConversationId`) are allocated from a single dense per-world counter, so
//! an ID is meaningful only within the world that minted it.  The inner
//! integer is `pub` for display and storage purposes; cross-world comparisons
//! are a caller bug the type system cannot catch.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID" — equivalent to the type's MAX.
            pub const INVALID: $name = $name(<$inner>::MAX);
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

typed_id! {
    /// A world — the unit of isolation.  Allocated by the supervisor.
    pub struct WorldId(u32);
}

typed_id! {
    /// An engine row.  A world may see several engines over its lifetime
    /// (one per restart); inputs are numbered per engine.
    pub struct EngineId(u32);
}

typed_id! {
    /// A player entity within one world.
    pub struct PlayerId(u32);
}

typed_id! {
    /// The autonomy layer bound to a player.  Humans have no `AgentId`.
    pub struct AgentId(u32);
}

typed_id! {
    /// A conversation between players within one world.
    pub struct ConversationId(u32);
}

typed_id! {
    /// A scheduled asynchronous operation.  Dense per world; completion
    /// inputs echo it back so stale completions can be dropped.
    pub struct OperationId(u64);
}

// ── InputNumber ───────────────────────────────────────────────────────────────

/// Position of an input in an engine's journal.
///
/// Numbers are dense and strictly monotone per engine: the set of allocated
/// numbers is always a contiguous prefix of the naturals.  Unlike the entity
/// IDs above this is an ordinal, not a handle, so it gets arithmetic helpers
/// instead of an `INVALID` sentinel.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InputNumber(pub u64);

impl InputNumber {
    pub const ZERO: InputNumber = InputNumber(0);

    /// The number following `self`.
    #[inline]
    pub fn next(self) -> InputNumber {
        InputNumber(self.0 + 1)
    }
}

impl fmt::Display for InputNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ── GenerationNumber ──────────────────────────────────────────────────────────

/// Engine generation counter, bumped on every (re)start.
///
/// A step scheduled under generation `g` must exit without touching the world
/// if the engine has since moved to `g' > g` — this is how stale step
/// schedulers are invalidated without distributed locks.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenerationNumber(pub u32);

impl GenerationNumber {
    /// The generation after a restart.
    #[inline]
    pub fn bump(self) -> GenerationNumber {
        GenerationNumber(self.0 + 1)
    }
}

impl fmt::Display for GenerationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen{}", self.0)
    }
}
