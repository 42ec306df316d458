//! Lowering of individual instructions to statements.

use std::sync::Arc;

use qcirc_ir::{
    ClbitId, GateDecl, GateKind, Instruction, InstructionKind, ParameterExpression,
    QubitId, StandardGate,
};
use tracing::debug;

use super::{names, Serializer, CLASSICAL_REGISTER, QUANTUM_REGISTER};
use crate::ast::{Argument, BinOp, Expression, GateCall, Statement};
use crate::error::{QasmError, QasmResult};

/// Where a statement is emitted. Operands inside a declaration body are the
/// declaration's named qubits rather than register elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Scope {
    Program,
    Declaration,
}

impl Scope {
    fn qubit(self, q: QubitId) -> Argument {
        match self {
            Scope::Program => Argument::Indexed {
                register: QUANTUM_REGISTER.to_string(),
                index: q.0,
            },
            Scope::Declaration => Argument::Register(local_qubit(q.0)),
        }
    }

    fn qubits(self, qubits: &[QubitId]) -> Vec<Argument> {
        qubits.iter().map(|&q| self.qubit(q)).collect()
    }
}

/// Name of the `index`th qubit of an emitted declaration.
pub(super) fn local_qubit(index: u32) -> String {
    format!("q_{index}")
}

fn clbit(c: ClbitId) -> Argument {
    Argument::Indexed {
        register: CLASSICAL_REGISTER.to_string(),
        index: c.0,
    }
}

fn unsupported(what: impl std::fmt::Display) -> QasmError {
    QasmError::Serialization(format!("'{what}' has no OpenQASM 2.0 representation"))
}

impl Serializer {
    /// Append the statements for one instruction to `out`.
    pub(super) fn lower(
        &mut self,
        inst: &Instruction,
        scope: Scope,
        out: &mut Vec<Statement>,
    ) -> QasmResult<()> {
        match &inst.kind {
            InstructionKind::Gate(kind) => self.lower_gate(kind, &inst.qubits, scope, out),
            InstructionKind::Measure => {
                let (Some(&qubit), Some(&bit), Scope::Program) =
                    (inst.qubits.first(), inst.clbits.first(), scope)
                else {
                    return Err(QasmError::Serialization(
                        "measurement inside a gate declaration".to_string(),
                    ));
                };
                out.push(Statement::Measure {
                    qubit: scope.qubit(qubit),
                    bit: clbit(bit),
                });
                Ok(())
            }
            InstructionKind::Reset => {
                if scope == Scope::Declaration {
                    return Err(QasmError::Serialization(
                        "reset inside a gate declaration".to_string(),
                    ));
                }
                out.push(Statement::Reset {
                    targets: scope.qubits(&inst.qubits),
                });
                Ok(())
            }
            InstructionKind::Barrier => {
                out.push(Statement::Barrier {
                    targets: scope.qubits(&inst.qubits),
                });
                Ok(())
            }
            InstructionKind::IfStatement { op, value } => {
                if scope == Scope::Declaration {
                    return Err(QasmError::Serialization(
                        "conditional inside a gate declaration".to_string(),
                    ));
                }
                self.lower_conditional(inst, op, value.to_int(), value.len(), out)
            }
            InstructionKind::Amplitude(_) => Err(unsupported(inst.kind.name())),
        }
    }

    /// `if(c==v)` for each statement of the inner operation.
    ///
    /// The condition must cover the whole classical register in order, since
    /// that is the only comparison `OpenQASM` 2.0 can spell against `c`.
    fn lower_conditional(
        &mut self,
        inst: &Instruction,
        op: &InstructionKind,
        value: Option<u64>,
        width: usize,
        out: &mut Vec<Statement>,
    ) -> QasmResult<()> {
        let inner_bits = inst.clbits.len().saturating_sub(width);
        let condition = &inst.clbits[inner_bits..];
        let whole_register = condition.len() == self.num_clbits as usize
            && condition
                .iter()
                .enumerate()
                .all(|(i, c)| c.0 as usize == i);
        if !whole_register {
            return Err(QasmError::Serialization(
                "conditions must test the whole classical register".to_string(),
            ));
        }
        let value = value.ok_or_else(|| {
            QasmError::Serialization(format!("condition of {width} bits does not fit in 64 bits"))
        })?;

        let inner = Instruction {
            kind: op.clone(),
            qubits: inst.qubits.clone(),
            clbits: inst.clbits[..inner_bits].to_vec(),
            zvars: inst.zvars.clone(),
        };
        let mut body = Vec::new();
        self.lower(&inner, Scope::Program, &mut body)?;
        out.extend(body.into_iter().map(|stmt| Statement::If {
            register: CLASSICAL_REGISTER.to_string(),
            value,
            op: Box::new(stmt),
        }));
        Ok(())
    }

    fn lower_gate(
        &mut self,
        kind: &GateKind,
        qubits: &[QubitId],
        scope: Scope,
        out: &mut Vec<Statement>,
    ) -> QasmResult<()> {
        match kind {
            GateKind::Standard(gate) => {
                if !matches!(gate, StandardGate::U(..)) {
                    self.needs_standard_include = true;
                }
                let args = gate
                    .parameters()
                    .into_iter()
                    .map(expression)
                    .collect::<QasmResult<Vec<_>>>()?;
                out.push(unitary(gate.name().to_string(), args, scope.qubits(qubits)));
                Ok(())
            }
            GateKind::Call(call) => {
                let name = self.declare(&call.decl)?;
                let args = call.args.iter().map(expression).collect::<QasmResult<Vec<_>>>()?;
                out.push(unitary(name, args, scope.qubits(qubits)));
                Ok(())
            }
            GateKind::Power(base, k) => {
                if let GateKind::Inverse(inner) = base.as_ref() {
                    let folded = inner.as_ref().clone().power(*k).inverse();
                    if &folded != kind {
                        return self.lower_gate(&folded, qubits, scope, out);
                    }
                }
                self.splice(kind, qubits, scope, out)
            }
            GateKind::Inverse(_) => self.splice(kind, qubits, scope, out),
            GateKind::Custom(_) | GateKind::Control(..) => {
                let decl = self.synthesize(kind)?;
                let name = self.declare(&decl)?;
                out.push(unitary(name, Vec::new(), scope.qubits(qubits)));
                Ok(())
            }
        }
    }

    /// Emit the one-level decomposition of `kind` in place.
    fn splice(
        &mut self,
        kind: &GateKind,
        qubits: &[QubitId],
        scope: Scope,
        out: &mut Vec<Statement>,
    ) -> QasmResult<()> {
        let inst = Instruction {
            kind: InstructionKind::Gate(kind.clone()),
            qubits: qubits.to_vec(),
            clbits: Vec::new(),
            zvars: Vec::new(),
        };
        let parts = inst.decompose().map_err(|e| {
            QasmError::Serialization(format!("cannot express '{}': {e}", kind.name()))
        })?;
        for part in &parts {
            self.lower(part, scope, out)?;
        }
        Ok(())
    }

    /// A declaration wrapping the decomposition of `kind`, shared by every
    /// equal operation.
    fn synthesize(&mut self, kind: &GateKind) -> QasmResult<Arc<GateDecl>> {
        if let Some((_, decl)) = self.synthesized.iter().find(|(k, _)| k == kind) {
            return Ok(Arc::clone(decl));
        }

        let definition = kind.decompose().map_err(|e| {
            QasmError::Serialization(format!("cannot express '{}': {e}", kind.name()))
        })?;
        if kind.is_trivial_decomposition(&definition) {
            return Err(unsupported(kind.name()));
        }

        let mut body = definition;
        body.ensure_size(kind.num_qubits(), 0);
        let decl = GateDecl::new(names::sanitize(&kind.name()), Vec::new(), body);
        debug!(operation = %kind.name(), "synthesized gate declaration");
        self.synthesized.push((kind.clone(), Arc::clone(&decl)));
        Ok(decl)
    }
}

fn unitary(name: String, args: Vec<Expression>, targets: Vec<Argument>) -> Statement {
    Statement::Unitary {
        call: GateCall { name, args },
        targets,
    }
}

/// Convert a parameter to its source form. Symbols must be identifiers.
pub(super) fn expression(param: &ParameterExpression) -> QasmResult<Expression> {
    Ok(match param {
        ParameterExpression::Constant(v) => Expression::Real(*v),
        ParameterExpression::Symbol(name) => {
            if !names::is_valid_identifier(name) {
                return Err(QasmError::Serialization(format!(
                    "parameter '{name}' is not a valid identifier"
                )));
            }
            Expression::Identifier(name.clone())
        }
        ParameterExpression::Pi => Expression::Identifier("pi".to_string()),
        ParameterExpression::Neg(inner) => Expression::neg(expression(inner)?),
        ParameterExpression::Add(l, r) => binop(BinOp::Add, l, r)?,
        ParameterExpression::Sub(l, r) => binop(BinOp::Sub, l, r)?,
        ParameterExpression::Mul(l, r) => binop(BinOp::Mul, l, r)?,
        ParameterExpression::Div(l, r) => binop(BinOp::Div, l, r)?,
        ParameterExpression::Pow(l, r) => binop(BinOp::Pow, l, r)?,
        ParameterExpression::Func(func, arg) => Expression::Call {
            func: *func,
            arg: Box::new(expression(arg)?),
        },
    })
}

fn binop(op: BinOp, l: &ParameterExpression, r: &ParameterExpression) -> QasmResult<Expression> {
    Ok(Expression::binop(op, expression(l)?, expression(r)?))
}
