use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::*;

/// What a single call into the inference engine learned.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationReport {
    /// Cells that became known mines, in the order they were proven.
    pub mines: Vec<Cell>,
    /// Cells that became known safe, in the order they were proven.
    pub safe: Vec<Cell>,
    /// Constraints added by subset inference.
    pub derived: usize,
    /// Constraints dropped after emptying out or collapsing into a duplicate.
    pub removed: usize,
    /// Fixpoint passes run.
    pub passes: usize,
}

impl PropagationReport {
    pub fn has_update(&self) -> bool {
        !self.mines.is_empty() || !self.safe.is_empty() || self.derived > 0 || self.removed > 0
    }

    pub(crate) fn record(&mut self, cell: Cell, fact: Fact) {
        match fact {
            Fact::Mine => self.mines.push(cell),
            Fact::Safe => self.safe.push(cell),
        }
    }
}
