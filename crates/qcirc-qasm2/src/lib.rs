//! `OpenQASM` 2.0 Loader and Emitter for qcirc
//!
//! This crate reads `OpenQASM` 2.0 programs into [`qcirc_ir::Circuit`]s and
//! writes circuits back out as `OpenQASM` 2.0 text. Loading runs the source
//! through a lexer, a parser producing an [`ast::Program`], and an interpreter;
//! dumping converts the circuit to an AST with the serializer and renders it
//! with the printer.
//!
//! # Supported Features
//!
//! | Feature | Status | Example |
//! |---------|--------|---------|
//! | Version header | ✅ | `OPENQASM 2.0;` |
//! | Includes | ✅ | `include "qelib1.inc";` |
//! | Registers | ✅ | `qreg q[5];`, `creg c[5];` |
//! | Gate declarations | ✅ | `gate bell a,b { h a; cx a,b; }` |
//! | Opaque declarations | ✅ | `opaque rzz(theta) a,b;` |
//! | Parameter expressions | ✅ | `u3(pi/2, -sin(theta), 2^0.5) q[0];` |
//! | Register broadcasting | ✅ | `cx q,r;` |
//! | Classical conditions | ✅ | `if(c==3) x q[0];` |
//! | Measure, reset, barrier | ✅ | `measure q -> c;` |
//!
//! # Example: Loading
//!
//! ```rust
//! let circuit = qcirc_qasm2::loads(r#"
//!     OPENQASM 2.0;
//!     include "qelib1.inc";
//!     qreg q[2];
//!     creg c[2];
//!     h q[0];
//!     cx q[0],q[1];
//!     measure q -> c;
//! "#)?;
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.len(), 4);
//! # Ok::<(), qcirc_qasm2::QasmError>(())
//! ```
//!
//! # Example: Dumping
//!
//! ```rust
//! use qcirc_ir::Circuit;
//!
//! let text = qcirc_qasm2::dumps(&Circuit::bell()?)?;
//! assert!(text.starts_with("OPENQASM 2.0;\ninclude \"qelib1.inc\";\n"));
//! assert!(text.contains("cx q[0],q[1];"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Example: Round-Trip
//!
//! ```rust
//! let source = r#"
//! OPENQASM 2.0;
//! include "qelib1.inc";
//! gate rot(theta) a { rz(theta/2) a; }
//! qreg q[2];
//! rot(pi) q;
//! "#;
//!
//! let circuit = qcirc_qasm2::loads(source)?;
//! let reloaded = qcirc_qasm2::loads(&qcirc_qasm2::dumps(&circuit)?)?;
//! assert_eq!(circuit.decompose()?, reloaded.decompose()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod ast;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod serializer;

use std::path::{Path, PathBuf};

use qcirc_ir::Circuit;
use tracing::instrument;

pub use error::{QasmError, QasmResult};
pub use interpreter::interpret;
pub use lexer::tokenize;
pub use parser::{parse_program, IncludeResolver};
pub use printer::print_ast;
pub use serializer::{circuit_to_ast, DumpOptions};

/// Options controlling program loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Directories searched for include files after the working directory
    /// and the built-in library.
    pub include_dirs: Vec<PathBuf>,
}

impl LoadOptions {
    /// Append an include search directory.
    #[must_use]
    pub fn with_include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }
}

/// Load a circuit from source text.
pub fn loads(source: &str) -> QasmResult<Circuit> {
    loads_with(source, &LoadOptions::default())
}

/// Load a circuit from source text with custom options.
#[instrument(skip_all, fields(bytes = source.len()))]
pub fn loads_with(source: &str, options: &LoadOptions) -> QasmResult<Circuit> {
    let program = parse_program(source, &options.include_dirs)?;
    interpret(&program)
}

/// Load a circuit from a file.
///
/// The file's directory is searched for includes before the configured
/// include directories.
pub fn load(path: impl AsRef<Path>) -> QasmResult<Circuit> {
    load_with(path, &LoadOptions::default())
}

/// Load a circuit from a file with custom options.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_with(path: impl AsRef<Path>, options: &LoadOptions) -> QasmResult<Circuit> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|e| QasmError::io(path, e))?;

    let mut include_dirs = Vec::with_capacity(options.include_dirs.len() + 1);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        include_dirs.push(parent.to_path_buf());
    }
    include_dirs.extend(options.include_dirs.iter().cloned());

    loads_with(&source, &LoadOptions { include_dirs })
}

/// Render a circuit as `OpenQASM` 2.0 text.
pub fn dumps(circuit: &Circuit) -> QasmResult<String> {
    dumps_with(circuit, &DumpOptions::default())
}

/// Render a circuit as `OpenQASM` 2.0 text with custom options.
#[instrument(skip_all, fields(circuit = circuit.name()))]
pub fn dumps_with(circuit: &Circuit, options: &DumpOptions) -> QasmResult<String> {
    let program = circuit_to_ast(circuit, options)?;
    print_ast(&program)
}

/// Write a circuit to a file as `OpenQASM` 2.0.
pub fn dump(circuit: &Circuit, path: impl AsRef<Path>) -> QasmResult<()> {
    dump_with(circuit, path, &DumpOptions::default())
}

/// Write a circuit to a file with custom options.
///
/// Nothing is written when serialization fails.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn dump_with(circuit: &Circuit, path: impl AsRef<Path>, options: &DumpOptions) -> QasmResult<()> {
    let path = path.as_ref();
    let text = dumps_with(circuit, options)?;
    std::fs::write(path, text).map_err(|e| QasmError::io(path, e))
}
