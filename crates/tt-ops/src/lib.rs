//! `tt-ops` — the operation runtime.
//!
//! Operations are the kernel's only escape hatch for slow or side-effectful
//! work: reasoning calls, dice rolls, side-table writes.  The engine collects
//! [`ScheduledOp`](tt_world::ScheduledOp)s from each step and hands them to
//! an [`OperationRuntime`], which executes them *off* the tick and returns,
//! for decision-class operations, exactly one follow-up
//! [`Input`](tt_world::Input) to append to the journal.
//!
//! The runtime is idempotent per operation id — re-dispatching a step's
//! operations after a crash re-executes nothing — and draws all randomness
//! from a stream derived from the operation id, so the order operations run
//! in can never change their outcomes.
//!
//! The reasoning service lives behind the [`AgentMind`] trait.  The bundled
//! [`ScriptedMind`] is deterministic and has no external dependencies; real
//! deployments substitute an implementation that calls out to an LLM.

pub mod mind;
pub mod runtime;

#[cfg(test)]
mod tests;

pub use mind::{ActivityChoice, AgentMind, MessageContext, ScriptedMind};
pub use runtime::{cascade_store_purge, OperationRuntime};
