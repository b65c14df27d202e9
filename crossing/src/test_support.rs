//! Test-only helpers for building grids and grid files.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::core::grid::Grid;
use crate::io::grid_store::write_grid;

/// Build a grid from row slices; panics on ragged input.
pub fn grid(rows: &[&[f64]]) -> Grid {
    let rows: Vec<Vec<f64>> = rows.iter().map(|row| row.to_vec()).collect();
    Grid::from_rows(&rows).expect("grid")
}

/// An `rows` x `cols` grid filled with `value`.
pub fn uniform(rows: usize, cols: usize, value: f64) -> Grid {
    Grid::from_rows(&vec![vec![value; cols]; rows]).expect("uniform grid")
}

/// Write `grid` as a JSON descriptor to `dir/<name>.json`.
pub fn write_grid_file(dir: &Path, name: &str, grid: &Grid) -> PathBuf {
    let path = dir.join(format!("{name}.json"));
    write_grid(&path, grid).expect("write grid file");
    path
}

/// Write `grid` into a fresh temp directory; keep the guard alive while the file is used.
pub fn grid_file(grid: &Grid) -> (TempDir, PathBuf) {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = write_grid_file(temp.path(), "grid", grid);
    (temp, path)
}
