//! Path representation and legality checks.

use serde::{Deserialize, Serialize};

use crate::core::grid::Grid;

/// One visited cell. Serialized as `[col, row]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(usize, usize)", into = "(usize, usize)")]
pub struct Step {
    pub col: usize,
    pub row: usize,
}

impl Step {
    pub fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }
}

impl From<(usize, usize)> for Step {
    fn from((col, row): (usize, usize)) -> Self {
        Self { col, row }
    }
}

impl From<Step> for (usize, usize) {
    fn from(step: Step) -> Self {
        (step.col, step.row)
    }
}

/// Ordered column-by-column crossing of a grid.
pub type Path = Vec<Step>;

/// Check the path invariants against `grid`:
/// - length equals the column count (zero iff the grid is empty)
/// - starts at column 0 and ends at column `C - 1`
/// - each step advances exactly one column
/// - each row delta, reduced modulo `R`, is `0`, `1` or `R - 1`
///
/// Returns every violation found; an empty list means the path is legal.
pub fn validate_path(grid: &Grid, path: &[Step]) -> Vec<String> {
    let mut errors = Vec::new();
    if grid.is_empty() {
        if !path.is_empty() {
            errors.push(format!("empty grid requires empty path, got {} steps", path.len()));
        }
        return errors;
    }

    let rows = grid.rows();
    let cols = grid.cols();
    if path.len() != cols {
        errors.push(format!("path has {} steps, expected {cols}", path.len()));
    }
    if let Some(first) = path.first()
        && first.col != 0
    {
        errors.push(format!("path starts at column {}, expected 0", first.col));
    }
    if let Some(last) = path.last()
        && last.col != cols - 1
    {
        errors.push(format!(
            "path ends at column {}, expected {}",
            last.col,
            cols - 1
        ));
    }
    if let Some(step) = path.iter().find(|step| step.row >= rows) {
        errors.push(format!("row {} out of range at column {}", step.row, step.col));
        return errors;
    }

    for pair in path.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        if to.col != from.col + 1 {
            errors.push(format!(
                "column jumps from {} to {}",
                from.col, to.col
            ));
        }
        let delta = (to.row + rows - from.row) % rows;
        if delta != 0 && delta != 1 && delta != rows - 1 {
            errors.push(format!(
                "illegal row move {} -> {} at column {}",
                from.row, to.row, to.col
            ));
        }
    }
    errors
}
