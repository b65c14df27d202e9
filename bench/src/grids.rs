//! Grid sources: descriptor files on disk and seeded random squares.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use crossing::core::grid::Grid;
use crossing::io::grid_store::load_grid;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Inclusive lower / exclusive upper bound of generated cell values.
const VALUE_RANGE: (f64, f64) = (-10.0, 10.0);

pub const DEFAULT_SIZES: [usize; 13] = [5, 7, 9, 10, 11, 12, 15, 18, 20, 30, 50, 75, 100];
pub const DEFAULT_SEEDS: [u64; 5] = [42, 123, 456, 789, 1011];

/// A labeled grid ready to benchmark.
#[derive(Debug, Clone)]
pub struct GridSource {
    /// Recorded as the record's `matrix_type`, e.g. `square_10x10_seed42`.
    pub label: String,
    pub grid: Grid,
    /// SHA-256 of the descriptor file, for grids loaded from disk.
    pub sha256: Option<String>,
}

/// Load every `*.json` descriptor in `dir`, sorted by label (the file stem).
pub fn discover_grids(dir: &Path) -> Result<Vec<GridSource>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read grids dir {}", dir.display()))? {
        let entry = entry.context("read entry")?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        let label = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .with_context(|| format!("grid file without a name {}", path.display()))?;
        let grid = load_grid(&path)?;
        let sha256 = file_sha256(&path)?;
        debug!(%label, rows = grid.rows(), cols = grid.cols(), "grid discovered");
        sources.push(GridSource {
            label,
            grid,
            sha256: Some(sha256),
        });
    }
    Ok(sources)
}

/// A `size` x `size` grid of uniform values in [-10, 10), reproducible from `seed`.
pub fn random_square(size: usize, seed: u64) -> Result<Grid> {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows: Vec<Vec<f64>> = (0..size)
        .map(|_| {
            (0..size)
                .map(|_| rng.gen_range(VALUE_RANGE.0..VALUE_RANGE.1))
                .collect()
        })
        .collect();
    Grid::from_rows(&rows)
}

/// Random squares for every size/seed pair, size-major.
pub fn random_grids(sizes: &[usize], seeds: &[u64]) -> Result<Vec<GridSource>> {
    let mut sources = Vec::with_capacity(sizes.len() * seeds.len());
    for &size in sizes {
        for &seed in seeds {
            sources.push(GridSource {
                label: format!("square_{size}x{size}_seed{seed}"),
                grid: random_square(size, seed)?,
                sha256: None,
            });
        }
    }
    Ok(sources)
}

pub fn file_sha256(path: &Path) -> Result<String> {
    let contents = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let digest = hasher.finalize();
    Ok(hex::encode(digest))
}
