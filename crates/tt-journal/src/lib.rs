//! `tt-journal` — the ordered input journal.
//!
//! # Why this exists
//!
//! Everything that mutates a world arrives as an [`Input`] row here first.
//! The journal assigns each row a dense, strictly monotone number; the
//! engine consumes rows in number order and records each row's result
//! exactly once.  Because appends during a step receive numbers above the
//! step's start-of-step watermark, the journal is also the synchronization
//! point between the synchronous tick and everything asynchronous around it.
//!
//! # Bounds
//!
//! - Appends beyond the unprocessed-row cap are rejected (`RateLimited`).
//! - The vacuum removes old *processed* rows in capped batches.
//! - The emergency flush fails old *unprocessed* rows without executing them.

pub mod journal;

#[cfg(test)]
mod tests;

pub use journal::{InputRow, Journal, JournalError, JournalResult};
