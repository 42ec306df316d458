//! CLI command implementations.

pub mod ast;
pub mod check;
pub mod common;
pub mod fmt;
pub mod tokens;
pub mod version;
