//! Locating the `crossing` worker binary.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// The configured worker, or `crossing` installed next to the running `bench`.
pub fn worker_binary_path(configured: Option<&Path>) -> Result<PathBuf> {
    let path = match configured {
        Some(path) => path.to_path_buf(),
        None => {
            let exe = std::env::current_exe().context("locate bench executable")?;
            sibling_binary(&exe)
        }
    };
    if !path.exists() {
        bail!("worker binary not found at {}", path.display());
    }
    Ok(path)
}

fn sibling_binary(exe: &Path) -> PathBuf {
    let binary = format!("crossing{}", std::env::consts::EXE_SUFFIX);
    exe.with_file_name(binary)
}
