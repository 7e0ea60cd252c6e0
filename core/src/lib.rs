#![no_std]

extern crate alloc;

use core::ops::Index;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use error::*;
pub use generator::*;
pub use inference::*;
pub use knowledge::*;
pub use report::*;
pub use sentence::*;
pub use types::*;

mod error;
mod generator;
mod inference;
mod knowledge;
mod report;
mod sentence;
mod types;

/// Board dimensions `(height, width)` and the total number of mines on it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    pub size: Coord2,
    pub mines: CellCount,
}

impl BoardConfig {
    pub const fn new_unchecked(size: Coord2, mines: CellCount) -> Self {
        Self { size, mines }
    }

    /// Clamps the size to at least one cell and the mines to what fits.
    pub fn new((height, width): Coord2, mines: CellCount) -> Self {
        let height = height.clamp(1, Coord::MAX);
        let width = width.clamp(1, Coord::MAX);
        let mines = mines.min(mult(height, width));
        Self::new_unchecked((height, width), mines)
    }

    pub fn try_new(size: Coord2, mines: CellCount) -> Result<Self> {
        let config = Self::new_unchecked(size, mines);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.size.0 == 0 || self.size.1 == 0 || self.mines > self.total_cells() {
            Err(KnowledgeError::InvalidConfig)
        } else {
            Ok(())
        }
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    pub fn validate_coords(&self, cell: Cell) -> Result<Cell> {
        if in_bounds(cell, self.size) {
            Ok(cell)
        } else {
            Err(KnowledgeError::InvalidCoords)
        }
    }
}

/// Ground-truth mine placement, used to answer "how many mines touch this
/// cell" when driving the inference engine with truthful observations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MineLayout {
    mine_mask: Array2<bool>,
    mine_count: CellCount,
}

impl MineLayout {
    pub fn from_mine_mask(mine_mask: Array2<bool>) -> Result<Self> {
        let (rows, cols) = mine_mask.dim();
        let max = usize::from(Coord::MAX);
        if rows == 0 || cols == 0 || rows > max || cols > max {
            return Err(KnowledgeError::InvalidConfig);
        }

        let mine_count = mine_mask.iter().filter(|&&is_mine| is_mine).count();
        let mine_count =
            CellCount::try_from(mine_count).map_err(|_| KnowledgeError::InvalidConfig)?;

        Ok(Self {
            mine_mask,
            mine_count,
        })
    }

    pub(crate) fn from_parts(mine_mask: Array2<bool>, mine_count: CellCount) -> Self {
        Self {
            mine_mask,
            mine_count,
        }
    }

    pub fn from_mine_coords(size: Coord2, mine_coords: &[Cell]) -> Result<Self> {
        if size.0 == 0 || size.1 == 0 {
            return Err(KnowledgeError::InvalidConfig);
        }

        let mut mine_mask: Array2<bool> = Array2::default(size.to_nd_index());

        for &coords in mine_coords {
            if !in_bounds(coords, size) {
                return Err(KnowledgeError::InvalidCoords);
            }
            mine_mask[coords.to_nd_index()] = true;
        }

        Self::from_mine_mask(mine_mask)
    }

    pub fn board_config(&self) -> BoardConfig {
        BoardConfig::new_unchecked(self.size(), self.mine_count)
    }

    pub fn validate_coords(&self, coords: Cell) -> Result<Cell> {
        self.board_config().validate_coords(coords)
    }

    pub fn size(&self) -> Coord2 {
        let (rows, cols) = self.mine_mask.dim();
        // dimensions are checked on construction
        (rows as Coord, cols as Coord)
    }

    pub fn total_cells(&self) -> CellCount {
        mult(self.size().0, self.size().1)
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn contains_mine(&self, coords: Cell) -> bool {
        self[coords]
    }

    pub fn adjacent_mine_count(&self, coords: Cell) -> u8 {
        // at most eight neighbors, so the count always fits
        self.mine_mask
            .iter_neighbors(coords)
            .filter(|&pos| self[pos])
            .count() as u8
    }

    pub fn iter_mines(&self) -> impl Iterator<Item = Cell> + '_ {
        self.mine_mask
            .indexed_iter()
            .filter(|&(_, &is_mine)| is_mine)
            .map(|((row, col), _)| (row as Coord, col as Coord))
    }
}

impl Index<Cell> for MineLayout {
    type Output = bool;

    fn index(&self, coords: Cell) -> &Self::Output {
        &self.mine_mask[coords.to_nd_index()]
    }
}
