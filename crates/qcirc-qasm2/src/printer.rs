//! Render an AST back to `OpenQASM` 2.0 text.
//!
//! Binary expressions are always parenthesized, so the output re-parses to the
//! same tree regardless of operator precedence.

use std::f64::consts::PI;
use std::fmt::Write;

use crate::ast::{Argument, BinOp, Expression, GateCall, GateSignature, Program, Statement};
use crate::error::{QasmError, QasmResult};

const INDENT: &str = "    ";

/// Render a program. Every statement ends with a newline.
pub fn print_ast(program: &Program) -> QasmResult<String> {
    let mut out = String::new();
    writeln!(out, "OPENQASM {:?};", program.version)?;
    for stmt in &program.statements {
        print_statement(&mut out, stmt, 0)?;
        out.push('\n');
    }
    Ok(out)
}

/// Render a single expression.
pub fn print_expression(expr: &Expression) -> QasmResult<String> {
    Ok(match expr {
        Expression::Integer(v) => v.to_string(),
        Expression::Real(v) => format_real(*v)?,
        Expression::Identifier(name) => name.clone(),
        Expression::Neg(inner) => format!("-{}", print_expression(inner)?),
        Expression::Call { func, arg } => format!("{}({})", func.name(), print_expression(arg)?),
        Expression::BinOp { op, left, right } => {
            let mut lhs = operand(left)?;
            let rhs = operand(right)?;
            if *op == BinOp::Pow && starts_negative(left, &lhs) {
                lhs = format!("({lhs})");
            }
            format!("({lhs}{}{rhs})", op.symbol())
        }
    })
}

fn print_statement(out: &mut String, stmt: &Statement, level: usize) -> QasmResult<()> {
    out.push_str(&INDENT.repeat(level));
    match stmt {
        Statement::Include { file } => {
            let escaped = file.replace('\\', "\\\\").replace('"', "\\\"");
            write!(out, "include \"{escaped}\";")?;
        }
        Statement::QReg { name, size } => {
            write!(out, "qreg {name}[{size}];")?;
        }
        Statement::CReg { name, size } => {
            write!(out, "creg {name}[{size}];")?;
        }
        Statement::Gate(decl) => {
            out.push_str("gate ");
            out.push_str(&signature(&decl.signature));
            out.push_str(" {\n");
            for inner in &decl.body {
                print_statement(out, inner, level + 1)?;
                out.push('\n');
            }
            out.push_str(&INDENT.repeat(level));
            out.push('}');
        }
        Statement::Opaque(sig) => {
            write!(out, "opaque {};", signature(sig))?;
        }
        Statement::If {
            register,
            value,
            op,
        } => {
            write!(out, "if({register}=={value}) ")?;
            print_statement(out, op, 0)?;
        }
        Statement::Unitary { call, targets } => {
            write!(out, "{} {};", gate_call(call)?, arguments(targets))?;
        }
        Statement::Measure { qubit, bit } => {
            write!(out, "measure {} -> {};", argument(qubit), argument(bit))?;
        }
        Statement::Reset { targets } => {
            write!(out, "reset {};", arguments(targets))?;
        }
        Statement::Barrier { targets } => {
            write!(out, "barrier {};", arguments(targets))?;
        }
    }
    Ok(())
}

fn signature(sig: &GateSignature) -> String {
    if sig.params.is_empty() {
        format!("{} {}", sig.name, sig.qubits.join(","))
    } else {
        format!(
            "{}({}) {}",
            sig.name,
            sig.params.join(","),
            sig.qubits.join(",")
        )
    }
}

fn gate_call(call: &GateCall) -> QasmResult<String> {
    if call.args.is_empty() {
        return Ok(call.name.clone());
    }
    let args = call
        .args
        .iter()
        .map(print_expression)
        .collect::<QasmResult<Vec<_>>>()?;
    Ok(format!("{}({})", call.name, args.join(",")))
}

fn argument(arg: &Argument) -> String {
    match arg {
        Argument::Register(name) => name.clone(),
        Argument::Indexed { register, index } => format!("{register}[{index}]"),
    }
}

fn arguments(args: &[Argument]) -> String {
    args.iter().map(argument).collect::<Vec<_>>().join(",")
}

/// An operand of a binary operator. `pi/2`-style literals get parentheses.
fn operand(expr: &Expression) -> QasmResult<String> {
    let text = print_expression(expr)?;
    if matches!(expr, Expression::Real(_)) && text.contains('/') {
        return Ok(format!("({text})"));
    }
    Ok(text)
}

fn starts_negative(expr: &Expression, text: &str) -> bool {
    matches!(expr, Expression::Neg(_)) || text.starts_with('-')
}

/// Shortest round-trip form, with exact multiples of π spelled out.
fn format_real(value: f64) -> QasmResult<String> {
    if !value.is_finite() {
        return Err(QasmError::Serialization(format!(
            "non-finite parameter value {value}"
        )));
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = value.abs();
    let named = if magnitude == PI {
        Some("pi")
    } else if magnitude == PI / 2.0 {
        Some("pi/2")
    } else if magnitude == PI / 4.0 {
        Some("pi/4")
    } else {
        None
    };
    Ok(match named {
        Some(text) => format!("{sign}{text}"),
        None => format!("{value:?}"),
    })
}
