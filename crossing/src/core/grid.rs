//! Cost grid with toroidal row adjacency.
//!
//! Rows wrap (row `R-1` is adjacent to row `0`); columns do not. A step always
//! advances exactly one column and moves to one of three rows, evaluated in the
//! fixed order up, same, down. Every search strategy relies on that order for
//! its tie-breaking, so [`Grid::neighbor_rows`] is the only place it is defined.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::core::path::Step;

/// Externally supplied grid: declared dimensions plus row-major data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridDescriptor {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>,
}

/// Immutable `rows x cols` cost matrix, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<f64>,
}

impl Grid {
    /// The empty grid (`R = 0`, `C = 0`).
    pub fn empty() -> Self {
        Self {
            rows: 0,
            cols: 0,
            cells: Vec::new(),
        }
    }

    /// Build a grid from nested rows. All rows must have the same length.
    ///
    /// No rows, or rows with no columns, yield the empty grid.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Ok(Self::empty());
        };
        let cols = first.len();
        let mut cells = Vec::with_capacity(rows.len() * cols);
        for (index, row) in rows.iter().enumerate() {
            if row.len() != cols {
                bail!(
                    "ragged grid: row {index} has {} columns, expected {cols}",
                    row.len()
                );
            }
            cells.extend_from_slice(row);
        }
        if cols == 0 {
            return Ok(Self::empty());
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            cells,
        })
    }

    /// Build a grid from a descriptor, rejecting declared/actual dimension mismatches.
    pub fn from_descriptor(descriptor: &GridDescriptor) -> Result<Self> {
        if descriptor.data.len() != descriptor.rows {
            bail!(
                "grid declares {} rows but data has {}",
                descriptor.rows,
                descriptor.data.len()
            );
        }
        if let Some((index, row)) = descriptor
            .data
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != descriptor.cols)
        {
            bail!(
                "grid declares {} columns but row {index} has {}",
                descriptor.cols,
                row.len()
            );
        }
        Self::from_rows(&descriptor.data)
    }

    /// Descriptor carrying this grid's dimensions and data.
    pub fn to_descriptor(&self) -> GridDescriptor {
        GridDescriptor {
            rows: self.rows,
            cols: self.cols,
            data: self.row_slices().map(<[f64]>::to_vec).collect(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Largest of the two dimensions; drives the adaptive timeout.
    pub fn max_dimension(&self) -> usize {
        self.rows.max(self.cols)
    }

    /// Cost of cell `(row, col)`. Panics on out-of-range indices.
    pub fn cost(&self, row: usize, col: usize) -> f64 {
        debug_assert!(row < self.rows && col < self.cols);
        self.cells[row * self.cols + col]
    }

    /// Rows reachable from `(row, col)` in column `col + 1`, ordered up, same, down.
    ///
    /// Returns `None` on the last column. With fewer than three rows the entries
    /// repeat (a single-row grid yields `[0, 0, 0]`).
    pub fn neighbor_rows(&self, row: usize, col: usize) -> Option<[usize; 3]> {
        if col + 1 >= self.cols {
            return None;
        }
        let up = (row + self.rows - 1) % self.rows;
        let down = (row + 1) % self.rows;
        Some([up, row, down])
    }

    /// Sum of the grid values visited by `path`.
    pub fn path_cost(&self, path: &[Step]) -> f64 {
        path.iter()
            .fold(0.0, |total, step| total + self.cost(step.row, step.col))
    }

    /// Smallest cell value, or `None` for the empty grid.
    pub fn min_value(&self) -> Option<f64> {
        self.cells.iter().copied().reduce(f64::min)
    }

    /// Copy of this grid with `offset` added to every cell.
    pub fn shifted(&self, offset: f64) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            cells: self.cells.iter().map(|value| value + offset).collect(),
        }
    }

    fn row_slices(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact panics on a zero chunk size.
        self.cells.chunks_exact(self.cols.max(1))
    }
}
