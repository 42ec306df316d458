//! qcirc Circuit Intermediate Representation
//!
//! This crate provides the circuit data structures that the qcirc front
//! ends read into and write out of.
//!
//! # Core Components
//!
//! - **Indices**: [`QubitId`], [`ClbitId`] and [`ZVarId`] address flat qubit,
//!   classical bit and z-register index spaces
//! - **Gates**: [`StandardGate`] for built-in gates, [`GateDecl`] for named
//!   parametric declarations, [`CustomGate`] for opaque user operations, and
//!   the [`GateKind`] wrappers `Inverse`, `Power` and `Control`
//! - **Parameters**: [`ParameterExpression`] for symbolic gate parameters
//! - **Instructions**: [`Instruction`] combining an operation with its operands
//! - **Circuit**: [`Circuit`], an ordered instruction list with a builder API
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use qcirc_ir::{Circuit, ClbitId, QubitId};
//!
//! let mut circuit = Circuit::with_size("bell_state", 2, 2);
//! circuit
//!     .h(QubitId(0))?
//!     .cx(QubitId(0), QubitId(1))?
//!     .measure(QubitId(0), ClbitId(0))?;
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.len(), 3);
//! # Ok::<(), qcirc_ir::IrError>(())
//! ```
//!
//! # Example: Gate Declarations
//!
//! ```rust
//! use qcirc_ir::{Circuit, GateDecl, ParameterExpression, QubitId};
//!
//! let mut body = Circuit::with_size("rot", 1, 0);
//! body.rz(ParameterExpression::symbol("a"), QubitId(0))?;
//! let decl = GateDecl::new("rot", vec!["a".into()], body);
//!
//! let mut circuit = Circuit::with_size("main", 2, 0);
//! circuit.gate(decl.call(vec![0.5.into()])?, [QubitId(1)])?;
//!
//! let flat = circuit.decompose()?;
//! assert_eq!(flat.instructions()[0].name(), "rz");
//! # Ok::<(), qcirc_ir::IrError>(())
//! ```

pub mod bitstring;
pub mod circuit;
pub mod decl;
mod decompose;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod parameter;
pub mod qubit;

pub use bitstring::BitString;
pub use circuit::Circuit;
pub use decl::{DeclId, GateDecl};
pub use error::{IrError, IrResult};
pub use gate::{CustomGate, GateCall, GateKind, StandardGate};
pub use instruction::{Instruction, InstructionKind};
pub use parameter::{MathFn, ParameterExpression};
pub use qubit::{ClbitId, QubitId, ZVarId};
