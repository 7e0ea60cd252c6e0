use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::*;

pub type ConstraintId = usize;

/// What became known about a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fact {
    Mine,
    Safe,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Constraints that shrank and stayed in the knowledge base.
    pub updated: usize,
    /// Constraints dropped because they emptied out or became duplicates.
    pub removed: usize,
}

/// Deduplicated set of constraints.
///
/// Constraints live under stable ids so the cell index can point at them;
/// iteration always follows id order, which keeps propagation reproducible.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Constraint>", into = "Vec<Constraint>")]
pub struct KnowledgeBase {
    next_id: ConstraintId,
    constraints: BTreeMap<ConstraintId, Constraint>,
    ids: HashMap<Constraint, ConstraintId>,
    by_cell: HashMap<Cell, BTreeSet<ConstraintId>>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.values()
    }

    pub fn contains(&self, constraint: &Constraint) -> bool {
        self.ids.contains_key(constraint)
    }

    /// Whether any constraint still mentions `cell`.
    pub fn mentions(&self, cell: Cell) -> bool {
        self.by_cell.contains_key(&cell)
    }

    /// Adds `constraint` unless it is empty or already present.
    pub fn insert(&mut self, constraint: Constraint) -> bool {
        if constraint.is_empty() || self.ids.contains_key(&constraint) {
            return false;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.link(id, &constraint);
        self.ids.insert(constraint.clone(), id);
        self.constraints.insert(id, constraint);
        true
    }

    pub fn remove(&mut self, id: ConstraintId) -> Option<Constraint> {
        let constraint = self.constraints.remove(&id)?;
        self.ids.remove(&constraint);
        self.unlink(id, &constraint);
        Some(constraint)
    }

    /// Folds a proven fact about `cell` into every constraint mentioning it.
    ///
    /// Nothing is modified when the fact contradicts a constraint.
    pub fn apply(&mut self, cell: Cell, fact: Fact) -> Result<ApplyOutcome> {
        let mut outcome = ApplyOutcome::default();
        let Some(ids) = self.by_cell.get(&cell) else {
            return Ok(outcome);
        };

        for id in ids {
            let constraint = &self.constraints[id];
            let contradicts = match fact {
                Fact::Mine => constraint.count() == 0,
                Fact::Safe => usize::from(constraint.count()) == constraint.len(),
            };
            if contradicts {
                return Err(KnowledgeError::Contradiction { cell });
            }
        }

        let ids = self.by_cell.remove(&cell).unwrap_or_default();
        for id in ids {
            let Some(mut constraint) = self.constraints.remove(&id) else {
                continue;
            };
            self.ids.remove(&constraint);

            // checked against every constraint above, so this cannot fail
            match fact {
                Fact::Mine => constraint.apply_known_mine(cell)?,
                Fact::Safe => constraint.apply_known_safe(cell)?,
            };

            if constraint.is_empty() || self.ids.contains_key(&constraint) {
                log::trace!("dropping {constraint}");
                self.unlink(id, &constraint);
                outcome.removed += 1;
            } else {
                self.ids.insert(constraint.clone(), id);
                self.constraints.insert(id, constraint);
                outcome.updated += 1;
            }
        }

        Ok(outcome)
    }

    /// Cells that some constraint already pins down, as `(mines, safe)`.
    pub fn resolved_cells(&self) -> (BTreeSet<Cell>, BTreeSet<Cell>) {
        let mut mines = BTreeSet::new();
        let mut safe = BTreeSet::new();

        for constraint in self.constraints.values() {
            if !constraint.is_resolvable() {
                continue;
            }
            mines.extend(constraint.resolve_mines());
            safe.extend(constraint.resolve_safe());
        }

        (mines, safe)
    }

    /// Runs subset inference over every ordered pair and returns the
    /// differences that are not in the knowledge base yet.
    ///
    /// Only constraints sharing the subset's first cell can be supersets of
    /// it, so candidates come from the cell index rather than a full scan.
    pub fn derive_subsets(&self) -> Result<BTreeSet<Constraint>> {
        let mut derived = BTreeSet::new();

        for (&id, subset) in &self.constraints {
            let Some(&first) = subset.cells().first() else {
                continue;
            };
            let Some(candidates) = self.by_cell.get(&first) else {
                continue;
            };

            for &other_id in candidates {
                if other_id == id {
                    continue;
                }
                let superset = &self.constraints[&other_id];
                if !subset.is_proper_subset_of(superset) {
                    continue;
                }

                let difference = superset.subtract(subset)?;
                if !difference.is_empty() && !self.ids.contains_key(&difference) {
                    log::trace!("{superset} minus {subset} gives {difference}");
                    derived.insert(difference);
                }
            }
        }

        Ok(derived)
    }

    fn link(&mut self, id: ConstraintId, constraint: &Constraint) {
        for &cell in constraint.cells() {
            self.by_cell.entry(cell).or_default().insert(id);
        }
    }

    fn unlink(&mut self, id: ConstraintId, constraint: &Constraint) {
        for cell in constraint.cells() {
            if let Some(ids) = self.by_cell.get_mut(cell) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.by_cell.remove(cell);
                }
            }
        }
    }
}

impl From<Vec<Constraint>> for KnowledgeBase {
    fn from(constraints: Vec<Constraint>) -> Self {
        let mut knowledge = Self::new();
        for constraint in constraints {
            knowledge.insert(constraint);
        }
        knowledge
    }
}

impl From<KnowledgeBase> for Vec<Constraint> {
    fn from(knowledge: KnowledgeBase) -> Self {
        knowledge.constraints.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn constraint(cells: &[Cell], count: u8) -> Constraint {
        Constraint::new(cells.iter().copied(), count).unwrap()
    }

    #[test]
    fn insert_skips_duplicates_and_empty_constraints() {
        let mut kb = KnowledgeBase::new();

        assert!(kb.insert(constraint(&[(0, 0), (0, 1)], 1)));
        assert!(!kb.insert(constraint(&[(0, 1), (0, 0)], 1)));
        assert!(!kb.insert(constraint(&[], 0)));
        assert!(kb.insert(constraint(&[(0, 0), (0, 1)], 2)));
        assert_eq!(kb.len(), 2);
    }

    #[test]
    fn applying_mine_updates_every_mentioning_constraint() {
        let mut kb = KnowledgeBase::new();
        kb.insert(constraint(&[(0, 0), (0, 1)], 1));
        kb.insert(constraint(&[(0, 1), (0, 2), (1, 2)], 2));
        kb.insert(constraint(&[(3, 3), (3, 4)], 1));

        let outcome = kb.apply((0, 1), Fact::Mine).unwrap();

        assert_eq!(outcome, ApplyOutcome { updated: 2, removed: 0 });
        assert!(!kb.mentions((0, 1)));
        assert!(kb.contains(&constraint(&[(0, 0)], 0)));
        assert!(kb.contains(&constraint(&[(0, 2), (1, 2)], 1)));
        assert!(kb.contains(&constraint(&[(3, 3), (3, 4)], 1)));
    }

    #[test]
    fn applying_fact_removes_emptied_and_duplicate_constraints() {
        let mut kb = KnowledgeBase::new();
        kb.insert(constraint(&[(0, 0)], 0));
        kb.insert(constraint(&[(1, 0), (1, 1)], 1));
        kb.insert(constraint(&[(0, 0), (1, 0), (1, 1)], 1));

        let outcome = kb.apply((0, 0), Fact::Safe).unwrap();

        assert_eq!(outcome, ApplyOutcome { updated: 0, removed: 2 });
        assert_eq!(kb.len(), 1);
        assert!(kb.contains(&constraint(&[(1, 0), (1, 1)], 1)));
        assert!(kb.mentions((1, 0)));
    }

    #[test]
    fn contradicting_fact_leaves_knowledge_untouched() {
        let mut kb = KnowledgeBase::new();
        kb.insert(constraint(&[(0, 0), (0, 1)], 0));
        kb.insert(constraint(&[(0, 1), (0, 2)], 1));

        let err = kb.apply((0, 1), Fact::Mine).unwrap_err();

        assert_eq!(err, KnowledgeError::Contradiction { cell: (0, 1) });
        assert_eq!(kb.len(), 2);
        assert!(kb.mentions((0, 1)));
    }

    #[test]
    fn derives_difference_of_proper_subsets() {
        let mut kb = KnowledgeBase::new();
        kb.insert(constraint(&[(0, 0), (0, 1)], 1));
        kb.insert(constraint(&[(0, 0), (0, 1), (0, 2)], 2));
        kb.insert(constraint(&[(5, 5), (5, 6)], 1));

        let derived = kb.derive_subsets().unwrap();

        assert_eq!(derived.into_iter().collect::<Vec<_>>(), vec![constraint(&[(0, 2)], 1)]);
    }

    #[test]
    fn already_known_differences_are_not_derived_again() {
        let mut kb = KnowledgeBase::new();
        kb.insert(constraint(&[(0, 0), (0, 1)], 1));
        kb.insert(constraint(&[(0, 0), (0, 1), (0, 2)], 2));
        kb.insert(constraint(&[(0, 2)], 1));

        assert!(kb.derive_subsets().unwrap().is_empty());
    }

    #[test]
    fn resolved_cells_collects_both_kinds() {
        let mut kb = KnowledgeBase::new();
        kb.insert(constraint(&[(0, 0), (0, 1)], 2));
        kb.insert(constraint(&[(1, 0)], 0));
        kb.insert(constraint(&[(2, 0), (2, 1)], 1));

        let (mines, safe) = kb.resolved_cells();

        assert_eq!(mines, BTreeSet::from([(0, 0), (0, 1)]));
        assert_eq!(safe, BTreeSet::from([(1, 0)]));
    }

    #[test]
    fn removing_by_id_clears_the_cell_index() {
        let mut kb = KnowledgeBase::new();
        kb.insert(constraint(&[(4, 4), (4, 5)], 1));

        let removed = kb.remove(0).unwrap();

        assert_eq!(removed, constraint(&[(4, 4), (4, 5)], 1));
        assert!(kb.is_empty());
        assert!(!kb.mentions((4, 4)));
        assert!(kb.remove(0).is_none());
    }
}
