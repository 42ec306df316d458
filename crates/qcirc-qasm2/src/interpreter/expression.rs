//! Lowering of AST expressions to parameter expressions.

use std::f64::consts::PI;

use qcirc_ir::ParameterExpression;
use rustc_hash::FxHashMap;

use crate::ast::{BinOp, Expression};

/// Evaluate an expression under the current parameter bindings.
///
/// Identifiers resolve to a bound parameter, then to `pi`, and otherwise stay
/// free symbols. Constant subexpressions are folded.
#[allow(clippy::cast_precision_loss)]
pub(super) fn evaluate(
    expr: &Expression,
    vars: &FxHashMap<String, ParameterExpression>,
) -> ParameterExpression {
    let value = match expr {
        Expression::Integer(v) => ParameterExpression::Constant(*v as f64),
        Expression::Real(v) => ParameterExpression::Constant(*v),
        Expression::Identifier(name) => match vars.get(name) {
            Some(bound) => bound.clone(),
            None if name == "pi" => ParameterExpression::Constant(PI),
            None => ParameterExpression::symbol(name.as_str()),
        },
        Expression::Neg(inner) => -evaluate(inner, vars),
        Expression::BinOp { op, left, right } => {
            let l = evaluate(left, vars);
            let r = evaluate(right, vars);
            match op {
                BinOp::Add => l + r,
                BinOp::Sub => l - r,
                BinOp::Mul => l * r,
                BinOp::Div => l / r,
                BinOp::Pow => l.pow(r),
            }
        }
        Expression::Call { func, arg } => ParameterExpression::apply(*func, evaluate(arg, vars)),
    };
    value.simplify()
}
