use ndarray::Array2;
use smallvec::SmallVec;

/// Single coordinate axis used for board height, width, and positions.
pub type Coord = u8;

/// Count type used for mine counts and total-cell counts.
pub type CellCount = u16;

/// Two-dimensional extent `(height, width)`.
pub type Coord2 = (Coord, Coord);

/// Board coordinates `(row, col)`.
pub type Cell = (Coord, Coord);

/// Neighbor list of a single cell, never longer than eight entries.
pub type Neighbors = SmallVec<[Cell; 8]>;

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

pub const fn in_bounds(cell: Cell, size: Coord2) -> bool {
    cell.0 < size.0 && cell.1 < size.1
}

/// Collects the in-bounds neighbors of `cell`, excluding `cell` itself.
///
/// This is the one place that knows what "adjacent" means; observation
/// ingestion and the ground-truth layout both go through it.
pub fn neighbors(cell: Cell, size: Coord2) -> Neighbors {
    NeighborIter::new(cell, size).collect()
}

pub trait NeighborIterExt {
    fn iter_neighbors(&self, index: Cell) -> NeighborIter;
}

impl<T> NeighborIterExt for Array2<T> {
    fn iter_neighbors(&self, index: Cell) -> NeighborIter {
        let (rows, cols) = self.dim();
        let size = (
            Coord::try_from(rows).unwrap_or(Coord::MAX),
            Coord::try_from(cols).unwrap_or(Coord::MAX),
        );
        NeighborIter::new(index, size)
    }
}

const DISPLACEMENTS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Applies `delta` to `cell`, returning a value only when it remains in bounds.
fn apply_delta(cell: Cell, delta: (i8, i8), bounds: Coord2) -> Option<Cell> {
    let (row, col) = cell;
    let (d_row, d_col) = delta;

    let next_row = row.checked_add_signed(d_row)?;
    let next_col = col.checked_add_signed(d_col)?;
    let next = (next_row, next_col);

    in_bounds(next, bounds).then_some(next)
}

/// Iterator over the in-bounds neighbors of a cell, in row-major order.
#[derive(Debug, Clone)]
pub struct NeighborIter {
    center: Cell,
    bounds: Coord2,
    index: u8,
}

impl NeighborIter {
    pub fn new(center: Cell, bounds: Coord2) -> Self {
        Self {
            center,
            bounds,
            index: 0,
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Cell;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let delta = DISPLACEMENTS.get(usize::from(self.index))?;
            self.index += 1;

            if let Some(next_item) = apply_delta(self.center, *delta, self.bounds) {
                return Some(next_item);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    #[test]
    fn corner_has_three_neighbors() {
        let found: Vec<_> = NeighborIter::new((0, 0), (3, 3)).collect();
        assert_eq!(found, vec![(0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn interior_has_eight_neighbors_in_row_major_order() {
        let found = neighbors((1, 1), (3, 3));
        assert_eq!(
            found.as_slice(),
            &[
                (0, 0),
                (0, 1),
                (0, 2),
                (1, 0),
                (1, 2),
                (2, 0),
                (2, 1),
                (2, 2)
            ]
        );
    }

    #[test]
    fn far_edge_is_clipped() {
        let found = neighbors((2, 4), (3, 5));
        assert_eq!(found.as_slice(), &[(1, 3), (1, 4), (2, 3)]);
    }

    #[test]
    fn single_cell_board_has_no_neighbors() {
        assert!(neighbors((0, 0), (1, 1)).is_empty());
    }

    #[test]
    fn array_extension_uses_array_shape() {
        let grid: Array2<bool> = Array2::default((2, 4));
        let found: Vec<_> = grid.iter_neighbors((1, 3)).collect();
        assert_eq!(found, vec![(0, 2), (0, 3), (1, 2)]);
    }
}
