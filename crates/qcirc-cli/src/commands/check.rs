//! Check command implementation.

use std::path::{Path, PathBuf};

use anyhow::Result;
use console::style;
use qcirc_ir::{GateKind, InstructionKind};

use super::common::load_circuit;

/// Execute the check command.
pub fn execute(input: &Path, include: &[PathBuf]) -> Result<()> {
    let circuit = load_circuit(input, include)?;

    let calls = circuit
        .iter()
        .filter(|i| matches!(&i.kind, InstructionKind::Gate(GateKind::Call(_))))
        .count();

    println!(
        "{} {}",
        style("✓").green().bold(),
        style(input.display()).green()
    );
    println!("  Qubits:       {}", circuit.num_qubits());
    println!("  Bits:         {}", circuit.num_clbits());
    println!("  Instructions: {}", circuit.len());
    if calls > 0 {
        println!("  Gate calls:   {calls}");
    }

    Ok(())
}
