//! Journal storage and its invariants.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tt_core::{InputNumber, WallTime};
use tt_world::{Input, InputError, ReturnValue};

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal is over its unprocessed-input cap")]
    RateLimited,

    #[error("input {0} not found")]
    UnknownInput(InputNumber),

    #[error("return value for input {0} already recorded")]
    ReturnAlreadyRecorded(InputNumber),
}

pub type JournalResult<T> = Result<T, JournalError>;

// ── InputRow ──────────────────────────────────────────────────────────────────

/// One journal row.  `return_value` is written exactly once, in the same
/// transaction as the mutation it describes, and never changes afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputRow {
    pub number:   InputNumber,
    pub name:     String,
    pub input:    Input,
    /// Wall-clock arrival stamp; drives vacuum and emergency flush.
    pub received: WallTime,
    pub return_value: Option<Result<ReturnValue, InputError>>,
}

// ── Journal ───────────────────────────────────────────────────────────────────

/// Per-engine input journal.
///
/// Numbers start at 1 and are gap-free at allocation time; the vacuum may
/// later remove old rows from the front, which does not disturb numbering.
#[derive(Debug)]
pub struct Journal {
    rows:        BTreeMap<InputNumber, InputRow>,
    last_number: InputNumber,
    /// Rows whose `return_value` is still unset.  Cached for O(1) rate
    /// limiting.
    pending:     usize,
    max_pending: usize,
}

impl Journal {
    pub fn new(max_pending: usize) -> Journal {
        Journal {
            rows: BTreeMap::new(),
            last_number: InputNumber::ZERO,
            pending: 0,
            max_pending,
        }
    }

    // ── Appends ───────────────────────────────────────────────────────────

    /// Append an externally-originated input, subject to the rate limit.
    pub fn append(&mut self, input: Input, received: WallTime) -> JournalResult<InputNumber> {
        if self.pending >= self.max_pending {
            return Err(JournalError::RateLimited);
        }
        Ok(self.push(input, received))
    }

    /// Append a kernel-originated input (agent decisions, operation
    /// completions).  These release in-progress state, so they must never
    /// bounce off the rate limit the way external callers do.
    pub fn append_internal(&mut self, input: Input, received: WallTime) -> InputNumber {
        self.push(input, received)
    }

    fn push(&mut self, input: Input, received: WallTime) -> InputNumber {
        let number = self.last_number.next();
        self.last_number = number;
        self.pending += 1;
        self.rows.insert(number, InputRow {
            number,
            name: input.name().to_string(),
            input,
            received,
            return_value: None,
        });
        number
    }

    // ── Consumption ───────────────────────────────────────────────────────

    /// Highest number allocated so far — the engine captures this at step
    /// start as its processing watermark.
    pub fn last_appended(&self) -> InputNumber {
        self.last_number
    }

    /// Unprocessed rows with `processed < number <= watermark`, in order.
    ///
    /// Rows failed by the emergency flush already carry a return value and
    /// are skipped.
    pub fn pending_in_range(
        &self,
        processed: InputNumber,
        watermark: InputNumber,
    ) -> Vec<(InputNumber, Input)> {
        if processed >= watermark {
            return Vec::new();
        }
        self.rows
            .range(processed.next()..=watermark)
            .filter(|(_, row)| row.return_value.is_none())
            .map(|(number, row)| (*number, row.input.clone()))
            .collect()
    }

    /// Record the result of applying an input.  Exactly-once: a second write
    /// for the same number is an error.
    pub fn record_return(
        &mut self,
        number: InputNumber,
        result: Result<ReturnValue, InputError>,
    ) -> JournalResult<()> {
        let row = self
            .rows
            .get_mut(&number)
            .ok_or(JournalError::UnknownInput(number))?;
        if row.return_value.is_some() {
            return Err(JournalError::ReturnAlreadyRecorded(number));
        }
        row.return_value = Some(result);
        self.pending -= 1;
        Ok(())
    }

    /// The recorded result, if the input has been applied (polled by callers).
    pub fn return_value(&self, number: InputNumber) -> Option<&Result<ReturnValue, InputError>> {
        self.rows.get(&number).and_then(|r| r.return_value.as_ref())
    }

    // ── Bounds enforcement ────────────────────────────────────────────────

    /// Remove up to `batch` processed rows older than `max_age_ms`.
    /// Returns how many were removed; call repeatedly until it returns 0.
    pub fn vacuum(&mut self, now: WallTime, max_age_ms: u64, batch: usize) -> usize {
        let doomed: Vec<InputNumber> = self
            .rows
            .values()
            .filter(|row| row.return_value.is_some() && now.since(row.received) > max_age_ms)
            .take(batch)
            .map(|row| row.number)
            .collect();
        for number in &doomed {
            self.rows.remove(number);
        }
        doomed.len()
    }

    /// Fail every unprocessed row older than `max_age_ms` without executing
    /// it.  Used when a backed-up journal must be cleared to recover a world.
    pub fn emergency_flush(&mut self, now: WallTime, max_age_ms: u64) -> usize {
        let mut flushed = 0;
        for row in self.rows.values_mut() {
            if row.return_value.is_none() && now.since(row.received) > max_age_ms {
                row.return_value =
                    Some(Err(InputError::Internal("emergency flush".to_string())));
                flushed += 1;
            }
        }
        self.pending -= flushed;
        flushed
    }

    /// Remove rows (processed or not) whose arguments reference the given
    /// player or agent, up to `cap`.  Part of the cascade delete.
    pub fn purge_referencing(
        &mut self,
        player: tt_core::PlayerId,
        agent:  Option<tt_core::AgentId>,
        cap:    usize,
    ) -> usize {
        let doomed: Vec<InputNumber> = self
            .rows
            .values()
            .filter(|row| {
                row.input.references_player(player)
                    || agent.is_some_and(|a| row.input.references_agent(a))
            })
            .take(cap)
            .map(|row| row.number)
            .collect();
        for number in &doomed {
            if let Some(row) = self.rows.remove(number) {
                if row.return_value.is_none() {
                    self.pending -= 1;
                }
            }
        }
        doomed.len()
    }

    // ── Introspection ─────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows awaiting processing.
    pub fn pending_count(&self) -> usize {
        self.pending
    }

    pub fn row(&self, number: InputNumber) -> Option<&InputRow> {
        self.rows.get(&number)
    }
}
