use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubsetInference {
    Enabled,
    Disabled,
}

impl Default for SubsetInference {
    fn default() -> Self {
        Self::Enabled
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MineCountUsage {
    UseIfKnown,
    Ignore,
}

impl Default for MineCountUsage {
    fn default() -> Self {
        Self::Ignore
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InferenceConfig {
    pub subset_inference: SubsetInference,
    pub mine_count_usage: MineCountUsage,
}

/// Knowledge-based deduction over a single board.
///
/// Every mutating call runs propagation to a fixpoint before returning, so
/// between calls no constraint mentions a known cell and no constraint is
/// left resolvable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InferenceEngine {
    board: BoardConfig,
    config: InferenceConfig,
    clues: Array2<Option<u8>>,
    moves_made: BTreeSet<Cell>,
    known_mines: BTreeSet<Cell>,
    known_safe: BTreeSet<Cell>,
    knowledge: KnowledgeBase,
}

impl InferenceEngine {
    pub fn new(board: BoardConfig) -> Result<Self> {
        Self::with_config(board, InferenceConfig::default())
    }

    /// Fails with `InvalidConfig` for an empty board or more mines than cells.
    pub fn with_config(board: BoardConfig, config: InferenceConfig) -> Result<Self> {
        board.validate()?;
        Ok(Self {
            board,
            config,
            clues: Array2::from_elem(board.size.to_nd_index(), None),
            moves_made: BTreeSet::new(),
            known_mines: BTreeSet::new(),
            known_safe: BTreeSet::new(),
            knowledge: KnowledgeBase::new(),
        })
    }

    pub fn board(&self) -> BoardConfig {
        self.board
    }

    pub fn config(&self) -> InferenceConfig {
        self.config
    }

    pub fn size(&self) -> Coord2 {
        self.board.size
    }

    pub fn total_mines(&self) -> CellCount {
        self.board.mines
    }

    pub fn remaining_mines(&self) -> CellCount {
        let found = CellCount::try_from(self.known_mines.len()).unwrap_or(CellCount::MAX);
        self.board.mines.saturating_sub(found)
    }

    pub fn moves_made(&self) -> &BTreeSet<Cell> {
        &self.moves_made
    }

    pub fn known_mines(&self) -> &BTreeSet<Cell> {
        &self.known_mines
    }

    pub fn known_safe(&self) -> &BTreeSet<Cell> {
        &self.known_safe
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Clue recorded for `cell`, if it has been observed.
    pub fn clue_at(&self, cell: Cell) -> Option<u8> {
        self.clues.get(cell.to_nd_index()).copied().flatten()
    }

    pub fn is_known_mine(&self, cell: Cell) -> bool {
        self.known_mines.contains(&cell)
    }

    pub fn is_known_safe(&self, cell: Cell) -> bool {
        self.known_safe.contains(&cell)
    }

    fn is_determined(&self, cell: Cell) -> bool {
        self.known_mines.contains(&cell) || self.known_safe.contains(&cell)
    }

    /// Known-safe cells that have not been played, in row-major order.
    pub fn safe_moves(&self) -> impl Iterator<Item = Cell> + '_ {
        self.known_safe
            .iter()
            .copied()
            .filter(move |cell| !self.moves_made.contains(cell) && !self.known_mines.contains(cell))
    }

    pub fn next_safe_move(&self) -> Option<Cell> {
        self.safe_moves().next()
    }

    /// Cells that are neither played nor proven either way.
    pub fn undetermined_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let (height, width) = self.board.size;
        (0..height)
            .flat_map(move |row| (0..width).map(move |col| (row, col)))
            .filter(move |&cell| !self.is_determined(cell) && !self.moves_made.contains(&cell))
    }

    pub fn all_mines_found(&self) -> bool {
        self.known_mines.len() == usize::from(self.board.mines)
    }

    /// Folds in the clue revealed at `cell` and propagates to a fixpoint.
    ///
    /// Replaying an observation with the same count changes nothing.
    pub fn record_observation(&mut self, cell: Cell, count: u8) -> Result<PropagationReport> {
        let cell = self.board.validate_coords(cell)?;
        if self.known_mines.contains(&cell) {
            return Err(KnowledgeError::ObservedKnownMine { cell });
        }
        if let Some(previous) = self.clues[cell.to_nd_index()] {
            return if previous == count {
                Ok(PropagationReport::default())
            } else {
                Err(KnowledgeError::ConflictingObservation {
                    cell,
                    previous,
                    count,
                })
            };
        }

        let around = neighbors(cell, self.board.size);
        if usize::from(count) > around.len() {
            return Err(KnowledgeError::InvalidClue { cell, count });
        }

        let mines_around = around
            .iter()
            .filter(|&&neighbor| self.known_mines.contains(&neighbor))
            .count();
        // at most eight neighbors
        let target = i16::from(count) - mines_around as i16;
        let target = u8::try_from(target).map_err(|_| KnowledgeError::Contradiction { cell })?;
        let unresolved = around.iter().copied().filter(|&neighbor| {
            !self.is_determined(neighbor) && !self.moves_made.contains(&neighbor)
        });
        let constraint = Constraint::new(unresolved, target)?;

        let started = Instant::now();
        let mut report = PropagationReport::default();

        self.learn(cell, Fact::Safe, &mut report)?;
        self.moves_made.insert(cell);
        self.clues[cell.to_nd_index()] = Some(count);

        log::trace!("observed {cell:?} = {count}, adding {constraint}");
        self.knowledge.insert(constraint);
        self.propagate(&mut report)?;

        log::debug!(
            "observation {cell:?} = {count}: {} mines, {} safe, {} derived, {} passes in {:?}",
            report.mines.len(),
            report.safe.len(),
            report.derived,
            report.passes,
            started.elapsed()
        );
        Ok(report)
    }

    /// Folds in an externally sourced mine, such as a flag placed by a player.
    pub fn report_known_mine(&mut self, cell: Cell) -> Result<PropagationReport> {
        self.report_fact(cell, Fact::Mine)
    }

    /// Folds in an externally sourced safe cell.
    pub fn report_known_safe(&mut self, cell: Cell) -> Result<PropagationReport> {
        self.report_fact(cell, Fact::Safe)
    }

    /// Adds an arbitrary constraint, after stripping cells that are already known.
    pub fn add_constraint(&mut self, mut constraint: Constraint) -> Result<PropagationReport> {
        for &cell in constraint.cells() {
            self.board.validate_coords(cell)?;
        }

        let known: Vec<Cell> = constraint
            .cells()
            .iter()
            .copied()
            .filter(|&cell| self.is_determined(cell))
            .collect();
        for cell in known {
            if self.known_mines.contains(&cell) {
                constraint.apply_known_mine(cell)?;
            } else {
                constraint.apply_known_safe(cell)?;
            }
        }

        let mut report = PropagationReport::default();
        log::trace!("adding {constraint}");
        if self.knowledge.insert(constraint) {
            self.propagate(&mut report)?;
        }
        Ok(report)
    }

    fn report_fact(&mut self, cell: Cell, fact: Fact) -> Result<PropagationReport> {
        let cell = self.board.validate_coords(cell)?;
        let mut report = PropagationReport::default();

        if self.learn(cell, fact, &mut report)? {
            self.propagate(&mut report)?;
            log::debug!(
                "reported {cell:?} as {fact:?}: {} mines, {} safe follow",
                report.mines.len() - usize::from(fact == Fact::Mine),
                report.safe.len() - usize::from(fact == Fact::Safe)
            );
        }
        Ok(report)
    }

    /// Records `fact` about `cell` and applies it to every constraint.
    ///
    /// Returns `false` when the fact was already known.
    fn learn(&mut self, cell: Cell, fact: Fact, report: &mut PropagationReport) -> Result<bool> {
        let (known, opposite) = match fact {
            Fact::Mine => (&self.known_mines, &self.known_safe),
            Fact::Safe => (&self.known_safe, &self.known_mines),
        };
        if opposite.contains(&cell) {
            return Err(KnowledgeError::Contradiction { cell });
        }
        if known.contains(&cell) {
            return Ok(false);
        }

        let outcome = self.knowledge.apply(cell, fact)?;
        report.removed += outcome.removed;

        match fact {
            Fact::Mine => self.known_mines.insert(cell),
            Fact::Safe => self.known_safe.insert(cell),
        };
        report.record(cell, fact);
        Ok(true)
    }

    fn propagate(&mut self, report: &mut PropagationReport) -> Result<()> {
        loop {
            report.passes += 1;
            let mut changed = false;

            let (mines, safe) = self.knowledge.resolved_cells();
            for cell in mines {
                changed |= self.learn(cell, Fact::Mine, report)?;
            }
            for cell in safe {
                changed |= self.learn(cell, Fact::Safe, report)?;
            }

            if matches!(self.config.mine_count_usage, MineCountUsage::UseIfKnown) {
                changed |= self.apply_mine_count(report)?;
            }

            if matches!(self.config.subset_inference, SubsetInference::Enabled) {
                for constraint in self.knowledge.derive_subsets()? {
                    log::trace!("derived {constraint}");
                    if self.knowledge.insert(constraint) {
                        report.derived += 1;
                        changed = true;
                    }
                }
            }

            if !changed {
                return Ok(());
            }
        }
    }

    /// Settles every undetermined cell once the global mine count allows it.
    fn apply_mine_count(&mut self, report: &mut PropagationReport) -> Result<bool> {
        let total = usize::from(self.board.mines);
        let Some(remaining) = total.checked_sub(self.known_mines.len()) else {
            let cell = self.known_mines.last().copied().unwrap_or_default();
            return Err(KnowledgeError::Contradiction { cell });
        };

        let undetermined: Vec<Cell> = self.undetermined_cells().collect();
        let Some(&first) = undetermined.first() else {
            return Ok(false);
        };

        let fact = if remaining == 0 {
            Fact::Safe
        } else if remaining == undetermined.len() {
            Fact::Mine
        } else if remaining > undetermined.len() {
            return Err(KnowledgeError::Contradiction { cell: first });
        } else {
            return Ok(false);
        };

        log::debug!(
            "mine count settles {} remaining cells as {fact:?}",
            undetermined.len()
        );
        for cell in undetermined {
            self.learn(cell, fact, report)?;
        }
        Ok(true)
    }
}
