use crate::core::algorithms::BestPath;
use crate::core::grid::Grid;
use crate::core::path::{Path, Step};

/// Exhaustive search over all `3^(C-1)` paths from `(0, start_row)`.
///
/// # Panics
/// If `start_row` is out of range for a non-empty grid.
pub fn brute_force(grid: &Grid, start_row: usize) -> Path {
    if grid.is_empty() {
        return Path::new();
    }
    let mut search = Exhaustive {
        grid,
        best: BestPath::new(),
        trail: Vec::with_capacity(grid.cols()),
    };
    search.trail.push(Step::new(0, start_row));
    search.descend(start_row, 0, grid.cost(start_row, 0));
    search.best.path
}

struct Exhaustive<'a> {
    grid: &'a Grid,
    best: BestPath,
    trail: Vec<Step>,
}

impl Exhaustive<'_> {
    fn descend(&mut self, row: usize, col: usize, cost: f64) {
        let Some(next_rows) = self.grid.neighbor_rows(row, col) else {
            self.best.offer(cost, &self.trail);
            return;
        };
        let next_col = col + 1;
        for next_row in next_rows {
            self.trail.push(Step::new(next_col, next_row));
            let next_cost = cost + self.grid.cost(next_row, next_col);
            self.descend(next_row, next_col, next_cost);
            self.trail.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_of_equal_cost_paths() {
        // Rows 0 and 2 are both optimal from row 1; "up" is explored first.
        let grid = Grid::from_rows(&[vec![5.0, 1.0], vec![5.0, 9.0], vec![5.0, 1.0]])
            .expect("grid");
        let path = brute_force(&grid, 1);
        assert_eq!(path, vec![Step::new(0, 1), Step::new(1, 0)]);
    }

    #[test]
    fn finds_wrapping_optimum() {
        let grid = Grid::from_rows(&[
            vec![1.0, 10.0, 10.0, 10.0],
            vec![20.0, 20.0, 20.0, 20.0],
            vec![2.0, 1.0, 1.0, 1.0],
        ])
        .expect("grid");
        let path = brute_force(&grid, 0);
        assert_eq!(grid.path_cost(&path), 4.0);
        assert_eq!(path[1], Step::new(1, 2));
    }
}
