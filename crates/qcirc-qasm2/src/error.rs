//! Error types for the OpenQASM 2.0 pipeline.

use std::path::PathBuf;

use qcirc_ir::IrError;
use thiserror::Error;

use crate::lexer::{Position, Token};

/// The parser's lookahead window at the moment an error was raised.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserSnapshot {
    /// The token most recently consumed.
    pub current: Token,
    /// The next unconsumed token.
    pub next: Token,
}

/// Errors raised while loading or emitting OpenQASM 2.0.
///
/// Every stage fails fast: the first error aborts the whole call.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QasmError {
    /// Malformed lexeme.
    #[error("Token error at {position}: {message} ('{lexeme}')")]
    Token {
        /// Lexer diagnostic.
        message: String,
        /// The offending source text.
        lexeme: String,
        /// Where the lexeme starts.
        position: Position,
    },

    /// Grammar violation.
    #[error("Parse error at {}: {message}, found {} '{}'", .token.start_pos, .token.kind, .token.value)]
    Parse {
        /// What the parser expected.
        message: String,
        /// The offending token.
        token: Box<Token>,
        /// The parser's lookahead window.
        state: Box<ParserSnapshot>,
    },

    /// The program is well formed but semantically meaningless.
    #[error("Structure error: {0}")]
    Structure(String),

    /// Unresolved gate name or cyclic declaration.
    #[error("Undefined gate: {0}")]
    UndefinedGate(String),

    /// Unknown register, or a register of the wrong kind.
    #[error("Undefined register: {0}")]
    UndefinedRegister(String),

    /// Register declared twice.
    #[error("Duplicate register: {0}")]
    DuplicateRegister(String),

    /// Register index past its declared size.
    #[error("Index {index} out of bounds for register '{register}' of size {size}")]
    IndexOutOfBounds {
        /// Register name.
        register: String,
        /// Requested index.
        index: u32,
        /// Declared size.
        size: u32,
    },

    /// Bad call arguments or unsupported opaque gate.
    #[error("Argument error: {0}")]
    Argument(String),

    /// `OPENQASM` header other than 2.0.
    #[error("Unsupported OPENQASM version {0}, only 2.0 is supported")]
    Version(String),

    /// The circuit uses a feature with no OpenQASM 2.0 spelling.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Filesystem failure.
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Writing the rendered text failed.
    #[error("Formatting error: {0}")]
    Format(#[from] std::fmt::Error),

    /// The IR rejected an operation.
    #[error("Circuit error: {0}")]
    Circuit(#[from] IrError),
}

impl QasmError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        QasmError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for OpenQASM 2.0 operations.
pub type QasmResult<T> = Result<T, QasmError>;
