//! Abstract Syntax Tree for `OpenQASM` 2.0.
//!
//! The parser produces this tree and the serializer builds it in reverse; the
//! printer in [`crate::printer`] renders it back to source text.

use qcirc_ir::MathFn;
use serde::{Deserialize, Serialize};

/// A complete program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Value of the `OPENQASM` header, 2.0 when omitted.
    pub version: f64,
    pub statements: Vec<Statement>,
}

impl Program {
    /// An empty version 2.0 program.
    pub fn new(statements: Vec<Statement>) -> Self {
        Self {
            version: 2.0,
            statements,
        }
    }
}

/// A top-level or gate-body statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// `include "file";`
    Include { file: String },
    /// `qreg name[size];`
    QReg { name: String, size: u32 },
    /// `creg name[size];`
    CReg { name: String, size: u32 },
    /// `gate name(params) qubits { body }`
    Gate(GateDeclaration),
    /// `opaque name(params) qubits;`
    Opaque(GateSignature),
    /// `if (register == value) op`
    If {
        register: String,
        value: u64,
        op: Box<Statement>,
    },
    /// `name(args) targets;`
    Unitary {
        call: GateCall,
        targets: Vec<Argument>,
    },
    /// `measure qubit -> bit;`
    Measure { qubit: Argument, bit: Argument },
    /// `reset targets;`
    Reset { targets: Vec<Argument> },
    /// `barrier targets;`
    Barrier { targets: Vec<Argument> },
}

/// Name, parameter names and qubit names of a gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateSignature {
    pub name: String,
    pub params: Vec<String>,
    pub qubits: Vec<String>,
}

/// A gate declaration with a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDeclaration {
    pub signature: GateSignature,
    pub body: Vec<Statement>,
}

/// A gate name with its parameter expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateCall {
    pub name: String,
    pub args: Vec<Expression>,
}

/// A register reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Argument {
    /// The whole register.
    Register(String),
    /// A single element `name[index]`.
    Indexed { register: String, index: u32 },
}

impl Argument {
    /// The referenced register name.
    pub fn register(&self) -> &str {
        match self {
            Argument::Register(name) | Argument::Indexed { register: name, .. } => name,
        }
    }
}

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Pow => "^",
        }
    }
}

/// A parameter expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Integer(u64),
    Real(f64),
    Identifier(String),
    Neg(Box<Expression>),
    BinOp {
        op: BinOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Call {
        func: MathFn,
        arg: Box<Expression>,
    },
}

impl Expression {
    pub fn binop(op: BinOp, left: Expression, right: Expression) -> Self {
        Expression::BinOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn neg(inner: Expression) -> Self {
        Expression::Neg(Box::new(inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let program = Program::new(vec![
            Statement::QReg {
                name: "q".into(),
                size: 2,
            },
            Statement::Unitary {
                call: GateCall {
                    name: "rx".into(),
                    args: vec![Expression::binop(
                        BinOp::Div,
                        Expression::Identifier("pi".into()),
                        Expression::Integer(2),
                    )],
                },
                targets: vec![Argument::Indexed {
                    register: "q".into(),
                    index: 1,
                }],
            },
        ]);

        let json = serde_json::to_value(&program).unwrap();
        assert_eq!(json["version"], 2.0);
        assert_eq!(json["statements"][0]["QReg"]["size"], 2);
        assert_eq!(
            json["statements"][1]["Unitary"]["targets"][0]["Indexed"]["register"],
            "q"
        );

        let back: Program = serde_json::from_value(json).unwrap();
        assert_eq!(back, program);
    }

    #[test]
    fn test_argument_register() {
        assert_eq!(Argument::Register("q".into()).register(), "q");
        let indexed = Argument::Indexed {
            register: "c".into(),
            index: 3,
        };
        assert_eq!(indexed.register(), "c");
    }
}
