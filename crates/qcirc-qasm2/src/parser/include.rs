//! `include` resolution.

use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use super::ParserState;
use crate::ast::Statement;
use crate::error::{QasmError, QasmResult};
use crate::lexer::TokenKind;

/// Built-in include files, embedded at compile time.
const BUILTIN_INCLUDES: &[(&str, &str)] = &[(
    "qelib1.inc",
    include_str!("../../qasmincs/qelib1.inc"),
)];

/// Include search path and per-load cache of parsed include files.
///
/// Files are looked up relative to the working directory first, then among
/// the built-in includes, then in each search directory in order. The cache
/// is keyed by the file name as written in the `include` statement.
#[derive(Debug, Default)]
pub struct IncludeResolver {
    dirs: Vec<PathBuf>,
    cache: FxHashMap<String, Vec<Statement>>,
    active: FxHashSet<String>,
}

impl IncludeResolver {
    /// Create a resolver searching `dirs` after the built-in includes.
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self {
            dirs,
            ..Self::default()
        }
    }

    /// The caller-supplied search directories.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Number of distinct include files parsed so far.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Find and read an include file.
    fn read(&self, name: &str) -> QasmResult<Option<String>> {
        let local = Path::new(name);
        if local.is_file() {
            debug!(file = name, "resolved include in working directory");
            return read_file(local).map(Some);
        }
        if let Some((_, source)) = BUILTIN_INCLUDES.iter().find(|(n, _)| *n == name) {
            debug!(file = name, "resolved built-in include");
            return Ok(Some((*source).to_string()));
        }
        for dir in &self.dirs {
            let path = dir.join(name);
            if path.is_file() {
                debug!(file = name, path = %path.display(), "resolved include");
                return read_file(&path).map(Some);
            }
        }
        Ok(None)
    }
}

/// Whether `name` is one of the embedded include files.
pub(crate) fn is_builtin_include(name: &str) -> bool {
    BUILTIN_INCLUDES.iter().any(|(n, _)| *n == name)
}

fn read_file(path: &Path) -> QasmResult<String> {
    std::fs::read_to_string(path).map_err(|e| QasmError::io(path, e))
}

impl ParserState<'_, '_> {
    /// `include "file";` yields the statements of the included file.
    pub(super) fn parse_include(&mut self) -> QasmResult<Vec<Statement>> {
        self.advance()?;
        let file = self.expect_next(TokenKind::String)?;
        self.expect_next(TokenKind::Semicolon)?;
        let name = file.value.clone();

        if let Some(statements) = self.includes.cache.get(&name) {
            debug!(file = %name, "include cache hit");
            return Ok(statements.clone());
        }
        if self.includes.active.contains(&name) {
            return Err(self.error_at(format!("include file '{name}' includes itself"), file));
        }
        let Some(source) = self.includes.read(&name)? else {
            return Err(self.error_at(format!("include file '{name}' not found"), file));
        };

        self.includes.active.insert(name.clone());
        let parsed = ParserState::new(&source, &mut *self.includes)
            .and_then(|mut nested| nested.parse_statements());
        self.includes.active.remove(&name);
        let statements = parsed?;

        debug!(file = %name, statements = statements.len(), "parsed include");
        self.includes.cache.insert(name, statements.clone());
        Ok(statements)
    }
}
