use thiserror::Error;

use crate::Cell;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum KnowledgeError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Board must have at least one cell and no more mines than cells")]
    InvalidConfig,
    #[error("Cell {cell:?} is a known mine and cannot be observed")]
    ObservedKnownMine { cell: Cell },
    #[error("Clue {count} at {cell:?} exceeds the number of possible neighbors")]
    InvalidClue { cell: Cell, count: u8 },
    #[error("Cell {cell:?} was already observed with count {previous}, now {count}")]
    ConflictingObservation { cell: Cell, previous: u8, count: u8 },
    #[error("Constraint claims {count} mines among {cells} cells")]
    CountOutOfRange { count: i16, cells: usize },
    #[error("Knowledge about {cell:?} is contradictory")]
    Contradiction { cell: Cell },
}

pub type Result<T> = core::result::Result<T, KnowledgeError>;
