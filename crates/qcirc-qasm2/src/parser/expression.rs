//! Expression parsing for QASM2.
//!
//! Levels, lowest to highest: sum (`+ -`), product (`* /`), sign (`-x`,
//! `+x`), power (`^`, right associative) and atoms.

use qcirc_ir::MathFn;

use super::ParserState;
use super::statement::parse_integer;
use crate::ast::{BinOp, Expression};
use crate::error::QasmResult;
use crate::lexer::TokenKind;

impl ParserState<'_, '_> {
    pub(super) fn parse_expression(&mut self) -> QasmResult<Expression> {
        self.parse_sum()
    }

    /// Comma separated expressions up to (not including) `)`.
    pub(super) fn parse_expression_list(&mut self) -> QasmResult<Vec<Expression>> {
        if self.at(TokenKind::RParen) {
            return Ok(Vec::new());
        }
        let mut exprs = vec![self.parse_expression()?];
        while self.accept(TokenKind::Comma)? {
            exprs.push(self.parse_expression()?);
        }
        Ok(exprs)
    }

    fn parse_sum(&mut self) -> QasmResult<Expression> {
        let mut left = self.parse_product()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_product()?;
            left = Expression::binop(op, left, right);
        }
    }

    fn parse_product(&mut self) -> QasmResult<Expression> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_factor()?;
            left = Expression::binop(op, left, right);
        }
    }

    /// Unary signs, which may be chained.
    fn parse_factor(&mut self) -> QasmResult<Expression> {
        if self.accept(TokenKind::Minus)? {
            return Ok(Expression::neg(self.parse_factor()?));
        }
        if self.accept(TokenKind::Plus)? {
            return self.parse_factor();
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> QasmResult<Expression> {
        let base = self.parse_atom()?;
        if self.accept(TokenKind::Caret)? {
            let exponent = self.parse_factor()?;
            return Ok(Expression::binop(BinOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_atom(&mut self) -> QasmResult<Expression> {
        let kind = self.peek().kind;
        match kind {
            TokenKind::Integer => {
                let token = self.advance()?;
                match parse_integer(&token) {
                    Some(v) => Ok(Expression::Integer(v)),
                    None => Err(self.error_at("integer literal out of range", token)),
                }
            }
            TokenKind::Real => {
                let token = self.advance()?;
                match token.value.replace('_', "").parse::<f64>() {
                    Ok(v) => Ok(Expression::Real(v)),
                    Err(_) => Err(self.error_at("invalid real literal", token)),
                }
            }
            TokenKind::Identifier => Ok(Expression::Identifier(self.advance()?.value)),
            TokenKind::LParen => {
                self.advance()?;
                let inner = self.parse_expression()?;
                self.expect_next(TokenKind::RParen)?;
                Ok(inner)
            }
            _ => match math_fn(kind) {
                Some(func) => {
                    self.advance()?;
                    self.expect_next(TokenKind::LParen)?;
                    let arg = self.parse_expression()?;
                    self.expect_next(TokenKind::RParen)?;
                    Ok(Expression::Call {
                        func,
                        arg: Box::new(arg),
                    })
                }
                None => Err(self.error("expected expression")),
            },
        }
    }
}

fn math_fn(kind: TokenKind) -> Option<MathFn> {
    match kind {
        TokenKind::Sin => Some(MathFn::Sin),
        TokenKind::Cos => Some(MathFn::Cos),
        TokenKind::Tan => Some(MathFn::Tan),
        TokenKind::Exp => Some(MathFn::Exp),
        TokenKind::Ln => Some(MathFn::Ln),
        TokenKind::Sqrt => Some(MathFn::Sqrt),
        _ => None,
    }
}
