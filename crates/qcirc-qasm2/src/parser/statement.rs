//! Statement parsing for QASM2.

use super::ParserState;
use crate::ast::{Argument, GateCall, GateDeclaration, GateSignature, Statement};
use crate::error::QasmResult;
use crate::lexer::{Token, TokenKind};

impl ParserState<'_, '_> {
    /// Parse statements until end of input. Included files are spliced in
    /// place of their `include` statement.
    pub(super) fn parse_statements(&mut self) -> QasmResult<Vec<Statement>> {
        let mut statements = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::EndMarker => return Ok(statements),
                TokenKind::Include => statements.extend(self.parse_include()?),
                _ => statements.push(self.parse_statement()?),
            }
        }
    }

    fn parse_statement(&mut self) -> QasmResult<Statement> {
        match self.peek().kind {
            TokenKind::QReg | TokenKind::CReg => self.parse_register_decl(),
            TokenKind::Gate => self.parse_gate_decl(),
            TokenKind::Opaque => self.parse_opaque_decl(),
            TokenKind::If => self.parse_if(),
            _ => self.parse_qop(),
        }
    }

    /// `qreg name[size];` or `creg name[size];`
    fn parse_register_decl(&mut self) -> QasmResult<Statement> {
        let keyword = self.advance()?;
        let name = self.expect_next(TokenKind::Identifier)?.value;
        self.expect_next(TokenKind::LBracket)?;
        let size = self.parse_index()?;
        self.expect_next(TokenKind::RBracket)?;
        self.expect_next(TokenKind::Semicolon)?;

        Ok(if keyword.is(TokenKind::QReg) {
            Statement::QReg { name, size }
        } else {
            Statement::CReg { name, size }
        })
    }

    fn parse_gate_decl(&mut self) -> QasmResult<Statement> {
        self.advance()?;
        let signature = self.parse_gate_signature()?;
        self.expect_next(TokenKind::LBrace)?;

        let mut body = Vec::new();
        while !self.at(TokenKind::RBrace) {
            match self.peek().kind {
                TokenKind::U
                | TokenKind::CX
                | TokenKind::Identifier
                | TokenKind::Barrier
                | TokenKind::Measure
                | TokenKind::Reset => body.push(self.parse_qop()?),
                _ => return Err(self.error("expected gate body statement or '}'")),
            }
        }
        self.expect_next(TokenKind::RBrace)?;

        Ok(Statement::Gate(GateDeclaration { signature, body }))
    }

    fn parse_opaque_decl(&mut self) -> QasmResult<Statement> {
        self.advance()?;
        let signature = self.parse_gate_signature()?;
        self.expect_next(TokenKind::Semicolon)?;
        Ok(Statement::Opaque(signature))
    }

    /// `name [ '(' params ')' ] qubits`. The built-in `U` and `CX` may be
    /// redeclared.
    fn parse_gate_signature(&mut self) -> QasmResult<GateSignature> {
        let name = self
            .expect_next_any(&[TokenKind::Identifier, TokenKind::U, TokenKind::CX])?
            .value;
        let params = if self.accept(TokenKind::LParen)? {
            let params = if self.at(TokenKind::RParen) {
                Vec::new()
            } else {
                self.parse_identifier_list()?
            };
            self.expect_next(TokenKind::RParen)?;
            params
        } else {
            Vec::new()
        };
        let qubits = self.parse_identifier_list()?;
        Ok(GateSignature {
            name,
            params,
            qubits,
        })
    }

    fn parse_identifier_list(&mut self) -> QasmResult<Vec<String>> {
        let mut ids = vec![self.expect_next(TokenKind::Identifier)?.value];
        while self.accept(TokenKind::Comma)? {
            ids.push(self.expect_next(TokenKind::Identifier)?.value);
        }
        Ok(ids)
    }

    /// `if ( creg == value ) qop`
    fn parse_if(&mut self) -> QasmResult<Statement> {
        self.advance()?;
        self.expect_next(TokenKind::LParen)?;
        let register = self.expect_next(TokenKind::Identifier)?.value;
        self.expect_next(TokenKind::EqEq)?;
        let token = self.expect_next(TokenKind::Integer)?;
        let value = parse_integer(&token)
            .ok_or_else(|| self.error_at("condition value out of range", token.clone()))?;
        self.expect_next(TokenKind::RParen)?;
        let op = self.parse_qop()?;
        Ok(Statement::If {
            register,
            value,
            op: Box::new(op),
        })
    }

    /// A quantum operation: unitary call, measure, reset or barrier.
    fn parse_qop(&mut self) -> QasmResult<Statement> {
        match self.peek().kind {
            TokenKind::Measure => {
                self.advance()?;
                let qubit = self.parse_argument()?;
                self.expect_next(TokenKind::Arrow)?;
                let bit = self.parse_argument()?;
                self.expect_next(TokenKind::Semicolon)?;
                Ok(Statement::Measure { qubit, bit })
            }
            TokenKind::Reset => {
                self.advance()?;
                let targets = self.parse_argument_list()?;
                self.expect_next(TokenKind::Semicolon)?;
                Ok(Statement::Reset { targets })
            }
            TokenKind::Barrier => {
                self.advance()?;
                let targets = self.parse_argument_list()?;
                self.expect_next(TokenKind::Semicolon)?;
                Ok(Statement::Barrier { targets })
            }
            TokenKind::U | TokenKind::CX | TokenKind::Identifier => self.parse_unitary(),
            _ => Err(self.error("expected statement")),
        }
    }

    fn parse_unitary(&mut self) -> QasmResult<Statement> {
        let token = self.advance()?;
        let name = match token.kind {
            TokenKind::U => "U".to_string(),
            TokenKind::CX => "CX".to_string(),
            _ => token.value,
        };
        let args = if self.accept(TokenKind::LParen)? {
            let args = self.parse_expression_list()?;
            self.expect_next(TokenKind::RParen)?;
            args
        } else {
            Vec::new()
        };
        let targets = self.parse_argument_list()?;
        self.expect_next(TokenKind::Semicolon)?;
        Ok(Statement::Unitary {
            call: GateCall { name, args },
            targets,
        })
    }

    /// `name` or `name[index]`
    fn parse_argument(&mut self) -> QasmResult<Argument> {
        let register = self.expect_next(TokenKind::Identifier)?.value;
        if self.accept(TokenKind::LBracket)? {
            let index = self.parse_index()?;
            self.expect_next(TokenKind::RBracket)?;
            return Ok(Argument::Indexed { register, index });
        }
        Ok(Argument::Register(register))
    }

    fn parse_argument_list(&mut self) -> QasmResult<Vec<Argument>> {
        let mut args = vec![self.parse_argument()?];
        while self.accept(TokenKind::Comma)? {
            args.push(self.parse_argument()?);
        }
        Ok(args)
    }

    fn parse_index(&mut self) -> QasmResult<u32> {
        let token = self.expect_next(TokenKind::Integer)?;
        parse_integer(&token)
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| self.error_at("integer out of range", token))
    }
}

/// Value of an integer token, ignoring digit separators.
pub(super) fn parse_integer(token: &Token) -> Option<u64> {
    token.value.replace('_', "").parse().ok()
}
