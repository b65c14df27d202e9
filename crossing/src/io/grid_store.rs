//! Grid descriptor load/save helpers.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::core::grid::{Grid, GridDescriptor};

/// Read a JSON descriptor without checking it against its data.
pub fn read_descriptor(path: &Path) -> Result<GridDescriptor> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read grid {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse grid {}", path.display()))
}

/// Load a descriptor and build the grid, rejecting dimension mismatches.
pub fn load_grid(path: &Path) -> Result<Grid> {
    let descriptor = read_descriptor(path)?;
    Grid::from_descriptor(&descriptor).with_context(|| format!("invalid grid {}", path.display()))
}

/// Write `grid` as a pretty-printed descriptor with trailing newline.
pub fn write_grid(path: &Path, grid: &Grid) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(&grid.to_descriptor()).context("serialize grid")?;
    buf.push('\n');
    fs::write(path, buf).with_context(|| format!("write grid {}", path.display()))
}
