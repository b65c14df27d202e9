use crate::core::algorithms::cheapest;
use crate::core::grid::Grid;
use crate::core::path::{Path, Step};

/// Bottom-up cost table, then a left-to-right walk.
///
/// `table[row][col]` holds the cheapest cost from `(row, col)` to the last
/// column. It is filled from the last column backward; the path is then
/// rebuilt from `(0, start_row)` by stepping to the cheapest already-computed
/// neighbor at each column. No recursion, so the call stack stays flat on
/// arbitrarily wide grids.
///
/// # Panics
/// If `start_row` is out of range for a non-empty grid.
pub fn tabulation(grid: &Grid, start_row: usize) -> Path {
    if grid.is_empty() {
        return Path::new();
    }
    let table = CostTable::build(grid);

    let mut path = Path::with_capacity(grid.cols());
    let mut row = start_row;
    path.push(Step::new(0, row));
    for col in 0..grid.cols() - 1 {
        let Some(next_rows) = grid.neighbor_rows(row, col) else {
            break;
        };
        let costs = next_rows.map(|next_row| table.get(next_row, col + 1));
        row = next_rows[cheapest(costs)];
        path.push(Step::new(col + 1, row));
    }
    path
}

struct CostTable {
    cols: usize,
    costs: Vec<f64>,
}

impl CostTable {
    fn build(grid: &Grid) -> Self {
        let (rows, cols) = (grid.rows(), grid.cols());
        let mut table = Self {
            cols,
            costs: vec![f64::INFINITY; rows * cols],
        };
        let last = cols - 1;
        for row in 0..rows {
            table.set(row, last, grid.cost(row, last));
        }
        for col in (0..last).rev() {
            for row in 0..rows {
                let Some(next_rows) = grid.neighbor_rows(row, col) else {
                    continue;
                };
                let costs = next_rows.map(|next_row| table.get(next_row, col + 1));
                let best = costs[cheapest(costs)];
                table.set(row, col, grid.cost(row, col) + best);
            }
        }
        table
    }

    fn get(&self, row: usize, col: usize) -> f64 {
        self.costs[row * self.cols + col]
    }

    fn set(&mut self, row: usize, col: usize, cost: f64) {
        self.costs[row * self.cols + col] = cost;
    }
}
