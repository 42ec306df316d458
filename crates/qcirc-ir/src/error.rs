//! Error types for the IR crate.

use crate::qubit::{ClbitId, QubitId};
use thiserror::Error;

/// Errors that can occur in IR operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Operation applied to the wrong number of qubits.
    #[error("Gate '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        gate_name: String,
        /// Expected number of qubits.
        expected: u32,
        /// Actual number of qubits provided.
        got: u32,
    },

    /// Operation applied to the wrong number of classical bits.
    #[error("Operation '{op_name}' requires {expected} classical bits, got {got}")]
    ClbitCountMismatch {
        /// Name of the operation.
        op_name: String,
        /// Expected number of bits.
        expected: u32,
        /// Actual number of bits provided.
        got: u32,
    },

    /// Same qubit used twice by one operation.
    #[error("Duplicate qubit {qubit} in operation{}", format_gate_context(.gate_name))]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Same classical bit used twice by one operation.
    #[error("Duplicate classical bit {clbit} in operation{}", format_gate_context(.gate_name))]
    DuplicateClbit {
        /// The duplicate bit.
        clbit: ClbitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Wrong number of arguments for a gate declaration.
    #[error("Gate '{gate_name}' expects {expected} parameters, got {got}")]
    ParameterCountMismatch {
        /// Name of the declaration.
        gate_name: String,
        /// Declared parameter count.
        expected: usize,
        /// Provided argument count.
        got: usize,
    },

    /// The operation has no decomposition into other operations.
    #[error("Operation '{0}' cannot be decomposed")]
    NoDecomposition(String),

    /// A non-unitary operation appeared where only unitaries are allowed.
    #[error("Operation '{0}' is not unitary")]
    NotUnitary(String),
}

/// Helper function to format optional gate context.
#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
