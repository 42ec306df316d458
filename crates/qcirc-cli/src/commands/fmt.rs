//! Fmt command implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;
use qcirc_qasm2::DumpOptions;

use super::common::load_circuit;

/// Execute the fmt command.
pub fn execute(
    input: &Path,
    output: Option<&Path>,
    include: &[PathBuf],
    decompose_wrappers: bool,
    keep_names: bool,
) -> Result<()> {
    let circuit = load_circuit(input, include)?;
    let options = DumpOptions::default()
        .with_decompose_wrappers(decompose_wrappers)
        .with_sanitize_names(!keep_names);

    match output {
        Some(path) => {
            qcirc_qasm2::dump_with(&circuit, path, &options)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} Wrote {}",
                style("✓").green().bold(),
                style(path.display()).green()
            );
        }
        None => {
            let text = qcirc_qasm2::dumps_with(&circuit, &options)
                .context("Failed to serialize circuit")?;
            print!("{text}");
        }
    }

    Ok(())
}
