use crate::core::algorithms::BestPath;
use crate::core::grid::Grid;
use crate::core::path::{Path, Step};

/// Branch-and-bound search.
///
/// Pruning assumes the accumulated cost never decreases along a path, which
/// only holds for non-negative cells. The search therefore runs on a copy of
/// the grid shifted by `|min|`. Every complete path has exactly `C` cells, so
/// the shift adds the same `C * |min|` to every candidate and leaves their
/// order unchanged. The returned path must be costed against the original grid.
///
/// # Panics
/// If `start_row` is out of range for a non-empty grid.
pub fn backtracking(grid: &Grid, start_row: usize) -> Path {
    let Some(min) = grid.min_value() else {
        return Path::new();
    };
    let shifted = grid.shifted(min.abs());

    let mut search = BranchAndBound {
        grid: &shifted,
        best: BestPath::new(),
        trail: Vec::with_capacity(grid.cols()),
    };
    search.trail.push(Step::new(0, start_row));
    search.descend(start_row, 0, shifted.cost(start_row, 0));
    search.best.path
}

struct BranchAndBound<'a> {
    grid: &'a Grid,
    best: BestPath,
    trail: Vec<Step>,
}

impl BranchAndBound<'_> {
    fn descend(&mut self, row: usize, col: usize, cost: f64) {
        let Some(next_rows) = self.grid.neighbor_rows(row, col) else {
            self.best.offer(cost, &self.trail);
            return;
        };
        // A partial path no cheaper than the best complete one cannot improve on it.
        if cost >= self.best.cost {
            return;
        }
        let next_col = col + 1;
        for next_row in next_rows {
            self.trail.push(Step::new(next_col, next_row));
            let next_cost = cost + self.grid.cost(next_row, next_col);
            self.descend(next_row, next_col, next_cost);
            self.trail.pop();
        }
    }
}
