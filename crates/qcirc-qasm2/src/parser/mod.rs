//! Parser for `OpenQASM` 2.0.

mod expression;
mod include;
mod statement;

use std::mem;
use std::path::PathBuf;

pub use include::IncludeResolver;
pub(crate) use include::is_builtin_include;

use crate::ast::Program;
use crate::error::{ParserSnapshot, QasmError, QasmResult};
use crate::lexer::{Lexer, Position, Token, TokenKind};

/// Parse a source string into a [`Program`], resolving includes against
/// `include_dirs` after the working directory and the built-in library.
pub fn parse_program(source: &str, include_dirs: &[PathBuf]) -> QasmResult<Program> {
    let mut includes = IncludeResolver::new(include_dirs.to_vec());
    parse_program_with(source, &mut includes)
}

/// Parse a source string with a caller-owned include context.
pub fn parse_program_with(source: &str, includes: &mut IncludeResolver) -> QasmResult<Program> {
    let mut parser = ParserState::new(source, includes)?;
    parser.parse_program()
}

/// Parser state: the lexer and a three-token window.
///
/// `current` is the token most recently consumed, `next` and `next2` are
/// lookahead. Trivia never enters the window.
pub(crate) struct ParserState<'src, 'inc> {
    lexer: Lexer<'src>,
    current: Token,
    next: Token,
    next2: Token,
    includes: &'inc mut IncludeResolver,
}

impl<'src, 'inc> ParserState<'src, 'inc> {
    fn new(source: &'src str, includes: &'inc mut IncludeResolver) -> QasmResult<Self> {
        let start = Token::end_marker(Position::START);
        let mut parser = Self {
            lexer: Lexer::new(source),
            current: start.clone(),
            next: start.clone(),
            next2: start,
            includes,
        };
        parser.read_token()?;
        parser.read_token()?;
        Ok(parser)
    }

    /// Shift the window by one significant token.
    ///
    /// A malformed lexeme is reported once it is consumed, so grammar errors
    /// before it keep their own position.
    fn read_token(&mut self) -> QasmResult<()> {
        let token = loop {
            let token = self.lexer.next_token();
            if !token.kind.is_trivia() {
                break token;
            }
        };
        self.current = mem::replace(&mut self.next, mem::replace(&mut self.next2, token));
        if self.current.is(TokenKind::Error) {
            return Err(token_error(&self.current));
        }
        Ok(())
    }

    /// The next unconsumed token.
    pub(super) fn peek(&self) -> &Token {
        &self.next
    }

    pub(super) fn at(&self, kind: TokenKind) -> bool {
        self.next.is(kind)
    }

    /// Consume the next token and return it.
    pub(super) fn advance(&mut self) -> QasmResult<Token> {
        self.read_token()?;
        Ok(self.current.clone())
    }

    /// Consume the next token, which must be of `kind`.
    pub(super) fn expect_next(&mut self, kind: TokenKind) -> QasmResult<Token> {
        self.expect_next_any(&[kind])
    }

    /// Consume the next token, which must be one of `kinds`.
    pub(super) fn expect_next_any(&mut self, kinds: &[TokenKind]) -> QasmResult<Token> {
        if kinds.contains(&self.next.kind) {
            return self.advance();
        }
        let expected = kinds
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" or ");
        Err(self.error(format!("expected {expected}")))
    }

    /// Consume the next token if it is of `kind`.
    pub(super) fn accept(&mut self, kind: TokenKind) -> QasmResult<bool> {
        if self.at(kind) {
            self.read_token()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// A parse error blaming the next token.
    pub(super) fn error(&self, message: impl Into<String>) -> QasmError {
        self.error_at(message, self.next.clone())
    }

    /// A parse error blaming `token`, or its lexer diagnostic when `token`
    /// is malformed.
    pub(super) fn error_at(&self, message: impl Into<String>, token: Token) -> QasmError {
        if token.is(TokenKind::Error) {
            return token_error(&token);
        }
        QasmError::Parse {
            message: message.into(),
            token: Box::new(token),
            state: Box::new(ParserSnapshot {
                current: self.current.clone(),
                next: self.next.clone(),
            }),
        }
    }

    fn parse_program(&mut self) -> QasmResult<Program> {
        let version = if self.accept(TokenKind::OpenQasm)? {
            let version = self.parse_version()?;
            self.expect_next(TokenKind::Semicolon)?;
            version
        } else {
            2.0
        };
        let statements = self.parse_statements()?;
        Ok(Program {
            version,
            statements,
        })
    }

    fn parse_version(&mut self) -> QasmResult<f64> {
        let token = self.expect_next_any(&[TokenKind::Integer, TokenKind::Real])?;
        let version: f64 = token
            .value
            .replace('_', "")
            .parse()
            .map_err(|_| QasmError::Version(token.value.clone()))?;
        if version != 2.0 {
            return Err(QasmError::Version(token.value));
        }
        Ok(version)
    }
}

fn token_error(token: &Token) -> QasmError {
    QasmError::Token {
        message: token
            .error
            .clone()
            .unwrap_or_else(|| "invalid token".to_string()),
        lexeme: token.value.clone(),
        position: token.start_pos,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Argument, Expression, GateCall, Statement};

    fn parse(source: &str) -> QasmResult<Program> {
        parse_program(source, &[])
    }

    #[test]
    fn test_parse_bell() {
        let program = parse(
            r"
            OPENQASM 2.0;
            qreg q[2];
            creg c[2];
            U(pi/2,0,pi) q[0];
            CX q[0],q[1];
            measure q[0] -> c[0];
        ",
        )
        .unwrap();
        assert_eq!(program.version, 2.0);
        assert_eq!(program.statements.len(), 5);
        assert_eq!(
            program.statements[3],
            Statement::Unitary {
                call: GateCall {
                    name: "CX".into(),
                    args: vec![],
                },
                targets: vec![
                    Argument::Indexed {
                        register: "q".into(),
                        index: 0
                    },
                    Argument::Indexed {
                        register: "q".into(),
                        index: 1
                    },
                ],
            }
        );
    }

    #[test]
    fn test_header_optional() {
        let program = parse("qreg q[1];").unwrap();
        assert_eq!(program.version, 2.0);
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn test_version_checked() {
        assert!(matches!(
            parse("OPENQASM 3.0; qreg q[1];"),
            Err(QasmError::Version(_))
        ));
        assert!(matches!(parse("OPENQASM 3; qreg q[1];"), Err(QasmError::Version(_))));
        assert!(parse("OPENQASM 2; qreg q[1];").is_ok());
    }

    #[test]
    fn test_parse_error_carries_token() {
        let err = parse("qreg q[2]\nh q;").unwrap_err();
        match err {
            QasmError::Parse { token, state, .. } => {
                assert_eq!(token.value, "h");
                assert_eq!(token.start_pos.row, 2);
                assert_eq!(state.current.value, "]");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_token_error_surfaces() {
        let err = parse("qreg q[2];\nrx(1.2.3) q[0];").unwrap_err();
        assert!(matches!(err, QasmError::Token { position, .. } if position.row == 2));
    }

    #[test]
    fn test_grammar_error_before_malformed_lexeme() {
        let err = parse("qreg q 1 $;").unwrap_err();
        let QasmError::Parse { token, .. } = err else {
            panic!("expected parse error, got {err:?}");
        };
        assert_eq!(token.value, "1");

        let err = parse("qreg q[1]; x q[0] $;").unwrap_err();
        assert!(matches!(err, QasmError::Token { ref lexeme, .. } if lexeme == "$"), "{err:?}");
    }

    #[test]
    fn test_comments_skipped() {
        let program = parse("// header\nqreg q[1]; // trailing\n").unwrap();
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn test_gate_declaration() {
        let program = parse("gate g(a,b) x,y { rz(a) x; cx x,y; barrier x,y; }").unwrap();
        let Statement::Gate(decl) = &program.statements[0] else {
            panic!("expected gate");
        };
        assert_eq!(decl.signature.name, "g");
        assert_eq!(decl.signature.params, vec!["a", "b"]);
        assert_eq!(decl.signature.qubits, vec!["x", "y"]);
        assert_eq!(decl.body.len(), 3);
    }

    #[test]
    fn test_builtin_names_redeclared() {
        let program = parse("opaque U(a,b,c) q; gate CX a,b { U(0,0,0) a; } qreg q[2]; CX q[0],q[1];")
            .unwrap();
        let Statement::Opaque(sig) = &program.statements[0] else {
            panic!("expected opaque");
        };
        assert_eq!(sig.name, "U");
        let Statement::Gate(decl) = &program.statements[1] else {
            panic!("expected gate");
        };
        assert_eq!(decl.signature.name, "CX");
        assert_eq!(decl.signature.qubits, vec!["a", "b"]);
    }

    #[test]
    fn test_empty_parens() {
        let program = parse("gate g() a { } qreg q[1]; g() q[0];").unwrap();
        let Statement::Unitary { call, .. } = &program.statements[2] else {
            panic!("expected unitary");
        };
        assert!(call.args.is_empty());
    }

    #[test]
    fn test_if_statement() {
        let program = parse("qreg q[1]; creg c[1]; if(c==1) x q[0];").unwrap();
        let Statement::If { register, value, op } = &program.statements[2] else {
            panic!("expected if");
        };
        assert_eq!(register, "c");
        assert_eq!(*value, 1);
        assert!(matches!(**op, Statement::Unitary { .. }));
    }

    #[test]
    fn test_expression_precedence() {
        let program = parse("rz(1-2-3) q; rz(8/2/2) q; rz(-2^2) q; rz(2^-1) q;").unwrap();
        let args: Vec<&Expression> = program
            .statements
            .iter()
            .map(|s| match s {
                Statement::Unitary { call, .. } => &call.args[0],
                _ => panic!("expected unitary"),
            })
            .collect();

        // Left associative
        assert_eq!(
            *args[0],
            Expression::binop(
                crate::ast::BinOp::Sub,
                Expression::binop(
                    crate::ast::BinOp::Sub,
                    Expression::Integer(1),
                    Expression::Integer(2)
                ),
                Expression::Integer(3),
            )
        );
        assert!(matches!(
            args[1],
            Expression::BinOp {
                op: crate::ast::BinOp::Div,
                ..
            }
        ));
        assert!(matches!(args[2], Expression::Neg(_)));
        assert!(matches!(
            args[3],
            Expression::BinOp {
                op: crate::ast::BinOp::Pow,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_semicolon_at_eof() {
        let err = parse("qreg q[1]; h q[0]").unwrap_err();
        assert!(matches!(err, QasmError::Parse { token, .. } if token.kind == TokenKind::EndMarker));
    }
}
