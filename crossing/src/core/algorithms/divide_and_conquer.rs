use crate::core::algorithms::cheapest;
use crate::core::grid::Grid;
use crate::core::path::{Path, Step};

/// Recursive best-suffix search without caching.
///
/// `best_suffix(col, row)` solves the three neighbor suffixes in column
/// `col + 1` and extends the cheapest. Shared suffixes are recomputed every
/// time a different ancestor reaches them, so the running time is exponential
/// even though only `R * C` distinct subproblems exist.
///
/// # Panics
/// If `start_row` is out of range for a non-empty grid.
pub fn divide_and_conquer(grid: &Grid, start_row: usize) -> Path {
    if grid.is_empty() {
        return Path::new();
    }
    let mut suffix = best_suffix(grid, 0, start_row);
    suffix.reversed_steps.reverse();
    suffix.reversed_steps
}

/// Optimal path from a cell to the last column.
///
/// Steps are kept last-column-first so extending a suffix is a push.
struct Suffix {
    cost: f64,
    reversed_steps: Vec<Step>,
}

fn best_suffix(grid: &Grid, col: usize, row: usize) -> Suffix {
    let here = Step::new(col, row);
    let Some(next_rows) = grid.neighbor_rows(row, col) else {
        return Suffix {
            cost: grid.cost(row, col),
            reversed_steps: vec![here],
        };
    };

    let [up, same, down] = next_rows.map(|next_row| best_suffix(grid, col + 1, next_row));
    let index = cheapest([up.cost, same.cost, down.cost]);
    let mut best = match index {
        0 => up,
        1 => same,
        _ => down,
    };
    best.cost += grid.cost(row, col);
    best.reversed_steps.push(here);
    best
}
