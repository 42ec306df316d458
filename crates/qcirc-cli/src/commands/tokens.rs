//! Tokens command implementation.

use std::path::Path;

use anyhow::Result;
use console::style;
use qcirc_qasm2::lexer::TokenKind;

use super::common::read_source;

/// Execute the tokens command.
pub fn execute(input: &Path, all: bool) -> Result<()> {
    let source = read_source(input)?;

    let mut errors = 0;
    for token in qcirc_qasm2::tokenize(&source) {
        if token.kind.is_trivia() && !all {
            continue;
        }
        let span = format!("{}-{}", token.start_pos, token.end_pos);
        if token.is(TokenKind::Error) {
            errors += 1;
            println!(
                "{span:<12} {} {:?} ({})",
                style(token.kind).red().bold(),
                token.value,
                token.error.as_deref().unwrap_or("invalid token")
            );
        } else if token.value.is_empty() {
            println!("{span:<12} {}", style(token.kind).cyan());
        } else {
            println!("{span:<12} {} {:?}", style(token.kind).cyan(), token.value);
        }
    }

    if errors > 0 {
        anyhow::bail!("{errors} invalid token(s) in {}", input.display());
    }
    Ok(())
}
