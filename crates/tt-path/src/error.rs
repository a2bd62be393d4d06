use thiserror::Error;

use tt_map::Tile;

#[derive(Debug, Error)]
pub enum PathError {
    #[error("no route from {from} to {to}")]
    Unreachable { from: Tile, to: Tile },

    #[error("destination {0} is outside the map")]
    DestinationOutOfBounds(Tile),

    #[error("walker speed must be positive, got {0}")]
    BadSpeed(f32),
}

pub type PathResult<T> = Result<T, PathError>;
