use alloc::vec::Vec;
use ndarray::Array2;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::*;

/// Generation strategy that can optionally try to make the starting tile zero or at least safe, but other than that is
/// purely random.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomLayoutGenerator {
    seed: u64,
    start: Cell,
    start_tile: StartTile,
}

impl RandomLayoutGenerator {
    pub fn new(seed: u64, start: Cell, start_tile: StartTile) -> Self {
        Self {
            seed,
            start,
            start_tile,
        }
    }
}

impl LayoutGenerator for RandomLayoutGenerator {
    fn generate(self, config: BoardConfig) -> MineLayout {
        use StartTile::*;

        let config = BoardConfig::new(config.size, config.mines);
        let total_cells = config.total_cells();

        // optimize for full boards
        if config.mines == total_cells {
            return MineLayout::from_parts(
                Array2::from_elem(config.size.to_nd_index(), true),
                config.mines,
            );
        }

        let start_neighbors = neighbors(self.start, config.size);
        let zero_area = 1 + start_neighbors.len() as CellCount;

        let actual_start_tile = match self.start_tile {
            Random => Random,
            SimpleSafe | AlwaysZero if !in_bounds(self.start, config.size) => {
                log::warn!("Start tile {:?} is off the board, fallback to random", self.start);
                Random
            }
            SimpleSafe | AlwaysZero if config.mines + 1 > total_cells => {
                log::warn!("Cannot make start tile safe, fallback to random");
                Random
            }
            SimpleSafe => SimpleSafe,
            AlwaysZero if config.mines + zero_area > total_cells => {
                log::warn!("Cannot make start tile zero, fallback to simple safe");
                SimpleSafe
            }
            AlwaysZero => AlwaysZero,
        };

        let is_protected = |cell: Cell| match actual_start_tile {
            Random => false,
            SimpleSafe => cell == self.start,
            AlwaysZero => cell == self.start || start_neighbors.contains(&cell),
        };

        let (height, width) = config.size;
        let mut free_cells: Vec<Cell> = (0..height)
            .flat_map(|row| (0..width).map(move |col| (row, col)))
            .filter(|&cell| !is_protected(cell))
            .collect();

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let (placed, _) = free_cells.partial_shuffle(&mut rng, usize::from(config.mines));

        let mut mines: Array2<bool> = Array2::default(config.size.to_nd_index());
        for &cell in placed.iter() {
            mines[cell.to_nd_index()] = true;
        }

        // double check mine count
        let count = mines.iter().filter(|&&is_mine| is_mine).count() as CellCount;
        if count != config.mines {
            log::warn!(
                "Generated layout count mismatch, actual: {}, requested: {}",
                count,
                config.mines
            );
        }
        MineLayout::from_parts(mines, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(size: Coord2, mines: CellCount) -> BoardConfig {
        BoardConfig::try_new(size, mines).unwrap()
    }

    #[test]
    fn same_seed_gives_same_layout() {
        let generate = || {
            RandomLayoutGenerator::new(7, (0, 0), StartTile::Random).generate(config((9, 9), 10))
        };
        let first = generate();
        let second = generate();

        assert_eq!(first, second);
        assert_eq!(first.mine_count(), 10);
    }

    #[test]
    fn simple_safe_keeps_start_clear() {
        for seed in 0..20 {
            let layout = RandomLayoutGenerator::new(seed, (1, 1), StartTile::SimpleSafe)
                .generate(config((3, 3), 8));

            assert!(!layout.contains_mine((1, 1)));
            assert_eq!(layout.mine_count(), 8);
        }
    }

    #[test]
    fn always_zero_clears_start_neighborhood() {
        for seed in 0..20 {
            let layout = RandomLayoutGenerator::new(seed, (0, 0), StartTile::AlwaysZero)
                .generate(config((5, 5), 21));

            assert!(!layout.contains_mine((0, 0)));
            assert_eq!(layout.adjacent_mine_count((0, 0)), 0);
            assert_eq!(layout.mine_count(), 21);
        }
    }

    #[test]
    fn always_zero_falls_back_when_board_is_too_crowded() {
        let layout = RandomLayoutGenerator::new(3, (1, 1), StartTile::AlwaysZero)
            .generate(config((3, 3), 5));

        assert!(!layout.contains_mine((1, 1)));
        assert_eq!(layout.mine_count(), 5);
    }

    #[test]
    fn full_board_is_all_mines() {
        let layout = RandomLayoutGenerator::new(0, (0, 0), StartTile::SimpleSafe)
            .generate(config((2, 2), 4));

        assert_eq!(layout.mine_count(), 4);
        assert_eq!(layout.safe_cell_count(), 0);
    }
}
