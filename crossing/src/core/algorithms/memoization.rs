use crate::core::algorithms::cheapest;
use crate::core::grid::Grid;
use crate::core::path::{Path, Step};

/// Top-down best-suffix search with an `R x C` cache.
///
/// Same recursion as divide-and-conquer, but each `(row, col)` is solved at
/// most once. A solved slot stores the suffix cost and the row chosen in the
/// next column, so the cached suffixes form linked lists through the table and
/// the full path is read off once at the end.
///
/// # Panics
/// If `start_row` is out of range for a non-empty grid.
pub fn memoization(grid: &Grid, start_row: usize) -> Path {
    if grid.is_empty() {
        return Path::new();
    }
    let mut memo = SuffixTable::new(grid);
    memo.solve(0, start_row);
    memo.path_from(start_row)
}

#[derive(Debug, Clone, Copy)]
struct Solved {
    cost: f64,
    /// Row taken in column `col + 1`; `None` on the last column.
    next_row: Option<usize>,
}

/// Fixed `R x C` arena of optional suffix results, indexed by `(row, col)`.
struct SuffixTable<'a> {
    grid: &'a Grid,
    slots: Vec<Option<Solved>>,
}

impl<'a> SuffixTable<'a> {
    fn new(grid: &'a Grid) -> Self {
        Self {
            grid,
            slots: vec![None; grid.rows() * grid.cols()],
        }
    }

    fn slot(&self, col: usize, row: usize) -> usize {
        row * self.grid.cols() + col
    }

    fn solve(&mut self, col: usize, row: usize) -> f64 {
        let slot = self.slot(col, row);
        if let Some(solved) = self.slots[slot] {
            return solved.cost;
        }

        let here = self.grid.cost(row, col);
        let solved = match self.grid.neighbor_rows(row, col) {
            None => Solved {
                cost: here,
                next_row: None,
            },
            Some(next_rows) => {
                let costs = next_rows.map(|next_row| self.solve(col + 1, next_row));
                let index = cheapest(costs);
                Solved {
                    cost: here + costs[index],
                    next_row: Some(next_rows[index]),
                }
            }
        };
        self.slots[slot] = Some(solved);
        solved.cost
    }

    fn path_from(&self, start_row: usize) -> Path {
        let mut path = Path::with_capacity(self.grid.cols());
        let mut cursor = Some(start_row);
        while let Some(row) = cursor {
            let col = path.len();
            path.push(Step::new(col, row));
            cursor = self.slots[self.slot(col, row)].and_then(|solved| solved.next_row);
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_slot_is_filled_at_most_once_and_reachable_only() {
        let grid = Grid::from_rows(&vec![vec![1.0; 6]; 8]).expect("grid");
        let mut memo = SuffixTable::new(&grid);
        memo.solve(0, 0);
        // Column 1 from row 0 can only reach rows 7, 0, 1.
        let reached: Vec<usize> = (0..8)
            .filter(|row| memo.slots[memo.slot(1, *row)].is_some())
            .collect();
        assert_eq!(reached, vec![0, 1, 7]);
        assert!(memo.slots[memo.slot(0, 4)].is_none());
    }

    #[test]
    fn path_follows_cached_successors() {
        let grid = Grid::from_rows(&[
            vec![20.0, 20.0, 20.0, 20.0],
            vec![20.0, 20.0, 20.0, 20.0],
            vec![1.0, 1.0, 1.0, 1.0],
        ])
        .expect("grid");
        let path = memoization(&grid, 0);
        assert_eq!(
            path,
            vec![Step::new(0, 0), Step::new(1, 2), Step::new(2, 2), Step::new(3, 2)]
        );
        assert_eq!(grid.path_cost(&path), 23.0);
    }
}
