use alloc::collections::BTreeSet;
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::*;

/// Logical statement "exactly `count` of `cells` are mines".
///
/// Cells are kept sorted so that equality, hashing and ordering all follow
/// the `(cells, count)` key and the knowledge base can deduplicate on it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawConstraint")]
pub struct Constraint {
    cells: BTreeSet<Cell>,
    count: u8,
}

/// Unchecked wire form, validated through `Constraint::new` on the way in.
#[derive(Deserialize)]
struct RawConstraint {
    cells: BTreeSet<Cell>,
    count: u8,
}

impl TryFrom<RawConstraint> for Constraint {
    type Error = KnowledgeError;

    fn try_from(raw: RawConstraint) -> Result<Self> {
        Constraint::new(raw.cells, raw.count)
    }
}

impl Constraint {
    pub fn new(cells: impl IntoIterator<Item = Cell>, count: u8) -> Result<Self> {
        let cells: BTreeSet<Cell> = cells.into_iter().collect();
        if usize::from(count) > cells.len() {
            return Err(KnowledgeError::CountOutOfRange {
                count: count.into(),
                cells: cells.len(),
            });
        }
        Ok(Self { cells, count })
    }

    pub fn cells(&self) -> &BTreeSet<Cell> {
        &self.cells
    }

    pub fn count(&self) -> u8 {
        self.count
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    /// Every remaining cell, when the count says they are all mines.
    pub fn resolve_mines(&self) -> BTreeSet<Cell> {
        if !self.cells.is_empty() && usize::from(self.count) == self.cells.len() {
            self.cells.clone()
        } else {
            BTreeSet::new()
        }
    }

    /// Every remaining cell, when the count leaves no room for a mine.
    pub fn resolve_safe(&self) -> BTreeSet<Cell> {
        if self.count == 0 {
            self.cells.clone()
        } else {
            BTreeSet::new()
        }
    }

    pub fn is_resolvable(&self) -> bool {
        !self.cells.is_empty() && (self.count == 0 || usize::from(self.count) == self.cells.len())
    }

    /// Removes `cell` and takes one off the count. Returns whether anything changed.
    ///
    /// A zero-count constraint holding a mine is a contradiction and is left
    /// untouched.
    pub fn apply_known_mine(&mut self, cell: Cell) -> Result<bool> {
        if !self.cells.contains(&cell) {
            return Ok(false);
        }
        let count = self
            .count
            .checked_sub(1)
            .ok_or(KnowledgeError::Contradiction { cell })?;
        self.cells.remove(&cell);
        self.count = count;
        Ok(true)
    }

    /// Removes `cell`, count unchanged. Returns whether anything changed.
    ///
    /// A full-count constraint holding a safe cell is a contradiction and is
    /// left untouched.
    pub fn apply_known_safe(&mut self, cell: Cell) -> Result<bool> {
        if !self.cells.contains(&cell) {
            return Ok(false);
        }
        if usize::from(self.count) == self.cells.len() {
            return Err(KnowledgeError::Contradiction { cell });
        }
        self.cells.remove(&cell);
        Ok(true)
    }

    /// Strict subset test on the cell sets.
    pub fn is_proper_subset_of(&self, other: &Constraint) -> bool {
        self.cells.len() < other.cells.len() && self.cells.is_subset(&other.cells)
    }

    /// Subset inference: `self - subset`, where `subset.cells ⊂ self.cells`.
    pub fn subtract(&self, subset: &Constraint) -> Result<Constraint> {
        let cells: BTreeSet<Cell> = self.cells.difference(&subset.cells).copied().collect();
        let count = i16::from(self.count) - i16::from(subset.count);
        match u8::try_from(count) {
            Ok(count) => Constraint::new(cells, count),
            Err(_) => Err(KnowledgeError::CountOutOfRange {
                count,
                cells: cells.len(),
            }),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (row, col)) in self.cells.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "({row}, {col})")?;
        }
        write!(f, "}} = {}", self.count)
    }
}
