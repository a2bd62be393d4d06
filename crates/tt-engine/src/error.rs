use thiserror::Error;

use tt_core::WorldId;
use tt_journal::JournalError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("world {0} not found")]
    UnknownWorld(WorldId),

    #[error("engine for world {0} is not running")]
    NotRunning(WorldId),

    #[error("journal error: {0}")]
    Journal(#[from] JournalError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
