//! Shared helpers for CLI commands.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use qcirc_ir::Circuit;
use qcirc_qasm2::LoadOptions;

/// Read a source file.
pub fn read_source(path: &Path) -> Result<String> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Include directories for `path`: its parent, then the `-I` directories.
pub fn include_dirs(path: &Path, extra: &[PathBuf]) -> Vec<PathBuf> {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .into_iter()
        .chain(extra.iter().cloned())
        .collect()
}

/// Load a circuit, searching `extra` for includes.
pub fn load_circuit(path: &Path, extra: &[PathBuf]) -> Result<Circuit> {
    let source = read_source(path)?;
    let options = LoadOptions {
        include_dirs: include_dirs(path, extra),
    };
    qcirc_qasm2::loads_with(&source, &options)
        .with_context(|| format!("Failed to load {}", path.display()))
}
