//! Ast command implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::common::{include_dirs, read_source};

/// Execute the ast command.
pub fn execute(input: &Path, include: &[PathBuf]) -> Result<()> {
    let source = read_source(input)?;
    let program = qcirc_qasm2::parse_program(&source, &include_dirs(input, include))
        .with_context(|| format!("Failed to parse {}", input.display()))?;

    let json = serde_json::to_string_pretty(&program).context("Failed to encode syntax tree")?;
    println!("{json}");
    Ok(())
}
