//! Lowering of a parsed program into a [`Circuit`].
//!
//! Interpretation runs in two passes. A pre-scan records every top-level gate
//! declaration without compiling it, so declarations may appear in any order.
//! The execution pass then walks statements in source order, compiling gate
//! declarations on first use. Gate bodies run in a child scope with their own
//! registers and parameter bindings but share the gate tables.

mod builtins;
mod expression;

use std::sync::Arc;

use qcirc_ir::{
    BitString, Circuit, ClbitId, GateDecl, GateKind, Instruction, ParameterExpression, QubitId,
};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, instrument};

use crate::ast::{Argument, GateCall, GateDeclaration, GateSignature, Program, Statement};
use crate::error::{QasmError, QasmResult};
use crate::parser::is_builtin_include;
use expression::evaluate;

/// Interpret a parsed program into a circuit.
///
/// The circuit is sized to the declared registers, even where some of their
/// qubits or bits are never used.
#[instrument(skip_all, fields(statements = program.statements.len()))]
pub fn interpret(program: &Program) -> QasmResult<Circuit> {
    if program.version != 2.0 {
        return Err(QasmError::Version(program.version.to_string()));
    }

    let mut gates = GateContext::default();
    for stmt in &program.statements {
        if let Statement::Gate(decl) = stmt {
            gates.declare(decl)?;
        }
    }

    let mut interpreter = Interpreter {
        gates: &mut gates,
        scope: Scope::new("main"),
    };
    for stmt in &program.statements {
        interpreter.execute(stmt)?;
    }

    let Scope {
        mut circuit,
        num_qubits,
        num_clbits,
        ..
    } = interpreter.scope;
    circuit.ensure_size(num_qubits, num_clbits);
    Ok(circuit)
}

/// Gate tables shared by every scope of one interpretation.
#[derive(Default)]
struct GateContext<'p> {
    /// Compiled declarations.
    compiled: FxHashMap<String, Arc<GateDecl>>,
    /// Declarations recorded by the pre-scan and not yet compiled.
    pending: FxHashMap<String, &'p GateDeclaration>,
    /// Names currently being compiled.
    compiling: FxHashSet<String>,
}

impl<'p> GateContext<'p> {
    fn declare(&mut self, decl: &'p GateDeclaration) -> QasmResult<()> {
        let name = &decl.signature.name;
        if let Some(existing) = self.pending.get(name) {
            if *existing != decl {
                return Err(QasmError::Structure(format!(
                    "gate '{name}' is declared twice with different definitions"
                )));
            }
            return Ok(());
        }
        self.pending.insert(name.clone(), decl);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegisterKind {
    Quantum,
    Classical,
}

impl RegisterKind {
    fn describe(self) -> &'static str {
        match self {
            RegisterKind::Quantum => "quantum",
            RegisterKind::Classical => "classical",
        }
    }
}

/// A contiguous index range in the flat qubit or bit space.
#[derive(Debug, Clone, Copy)]
struct Register {
    kind: RegisterKind,
    start: u32,
    size: u32,
}

/// Per-scope state: registers, parameter bindings and the output circuit.
struct Scope {
    registers: FxHashMap<String, Register>,
    num_qubits: u32,
    num_clbits: u32,
    vars: FxHashMap<String, ParameterExpression>,
    circuit: Circuit,
}

impl Scope {
    fn new(name: &str) -> Self {
        Self {
            registers: FxHashMap::default(),
            num_qubits: 0,
            num_clbits: 0,
            vars: FxHashMap::default(),
            circuit: Circuit::new(name),
        }
    }

    fn declare_register(&mut self, name: &str, kind: RegisterKind, size: u32) -> QasmResult<()> {
        if self.registers.contains_key(name) {
            return Err(QasmError::DuplicateRegister(name.to_string()));
        }
        let cursor = match kind {
            RegisterKind::Quantum => &mut self.num_qubits,
            RegisterKind::Classical => &mut self.num_clbits,
        };
        let start = *cursor;
        *cursor = start.checked_add(size).ok_or_else(|| {
            QasmError::Structure(format!("register '{name}' overflows the index space"))
        })?;
        self.registers
            .insert(name.to_string(), Register { kind, start, size });
        Ok(())
    }

    /// Flat indices referenced by `arg`, which must name a register of `kind`.
    fn resolve(&self, arg: &Argument, kind: RegisterKind) -> QasmResult<Vec<u32>> {
        let name = arg.register();
        let reg = self
            .registers
            .get(name)
            .filter(|r| r.kind == kind)
            .ok_or_else(|| {
                QasmError::UndefinedRegister(format!("{} register '{name}'", kind.describe()))
            })?;
        match arg {
            Argument::Register(_) => Ok((reg.start..reg.start + reg.size).collect()),
            Argument::Indexed { index, .. } => {
                if *index >= reg.size {
                    return Err(QasmError::IndexOutOfBounds {
                        register: name.to_string(),
                        index: *index,
                        size: reg.size,
                    });
                }
                Ok(vec![reg.start + index])
            }
        }
    }

    fn qubits(&self, arg: &Argument) -> QasmResult<Vec<QubitId>> {
        Ok(self
            .resolve(arg, RegisterKind::Quantum)?
            .into_iter()
            .map(QubitId)
            .collect())
    }

    fn clbits(&self, arg: &Argument) -> QasmResult<Vec<ClbitId>> {
        Ok(self
            .resolve(arg, RegisterKind::Classical)?
            .into_iter()
            .map(ClbitId)
            .collect())
    }
}

struct Interpreter<'p, 'g> {
    gates: &'g mut GateContext<'p>,
    scope: Scope,
}

impl<'p> Interpreter<'p, '_> {
    fn execute(&mut self, stmt: &'p Statement) -> QasmResult<()> {
        match stmt {
            Statement::Include { file } => {
                if is_builtin_include(file) {
                    Ok(())
                } else {
                    Err(QasmError::Structure(format!(
                        "include '{file}' must be resolved by the parser"
                    )))
                }
            }
            Statement::QReg { name, size } => {
                self.scope
                    .declare_register(name, RegisterKind::Quantum, *size)
            }
            Statement::CReg { name, size } => {
                self.scope
                    .declare_register(name, RegisterKind::Classical, *size)
            }
            Statement::Gate(decl) => {
                self.compile(&decl.signature.name)?;
                Ok(())
            }
            Statement::Opaque(sig) => check_opaque(sig),
            Statement::If {
                register,
                value,
                op,
            } => self.execute_if(register, *value, op),
            Statement::Unitary { call, targets } => self.execute_unitary(call, targets),
            Statement::Measure { qubit, bit } => self.execute_measure(qubit, bit),
            Statement::Reset { targets } => {
                for arg in targets {
                    for q in self.scope.qubits(arg)? {
                        self.scope.circuit.reset(q)?;
                    }
                }
                Ok(())
            }
            Statement::Barrier { targets } => {
                let mut qubits = Vec::new();
                for arg in targets {
                    qubits.extend(self.scope.qubits(arg)?);
                }
                self.scope.circuit.barrier(qubits)?;
                Ok(())
            }
        }
    }

    /// Compiled declaration for `name`, compiling a pending one on demand.
    fn compile(&mut self, name: &str) -> QasmResult<Option<Arc<GateDecl>>> {
        if let Some(decl) = self.gates.compiled.get(name) {
            return Ok(Some(Arc::clone(decl)));
        }
        if self.gates.compiling.contains(name) {
            return Err(QasmError::UndefinedGate(format!(
                "{name} (recursive gate definition)"
            )));
        }
        let Some(&decl) = self.gates.pending.get(name) else {
            return Ok(None);
        };

        self.gates.compiling.insert(name.to_string());
        let result = self.compile_body(decl);
        self.gates.compiling.remove(name);
        let compiled = result?;

        debug!(
            gate = name,
            params = compiled.params().len(),
            instructions = compiled.body().len(),
            "compiled gate declaration"
        );
        self.gates.pending.remove(name);
        self.gates
            .compiled
            .insert(name.to_string(), Arc::clone(&compiled));
        Ok(Some(compiled))
    }

    fn compile_body(&mut self, decl: &'p GateDeclaration) -> QasmResult<Arc<GateDecl>> {
        let sig = &decl.signature;
        let mut scope = Scope::new(&sig.name);
        for qubit in &sig.qubits {
            scope.declare_register(qubit, RegisterKind::Quantum, 1)?;
        }
        for param in &sig.params {
            scope
                .vars
                .insert(param.clone(), ParameterExpression::symbol(param.as_str()));
        }

        let mut child = Interpreter {
            gates: &mut *self.gates,
            scope,
        };
        for stmt in &decl.body {
            child.execute(stmt)?;
        }

        let num_qubits = child.scope.num_qubits;
        let mut body = child.scope.circuit;
        body.ensure_size(num_qubits, 0);
        Ok(GateDecl::new(sig.name.clone(), sig.params.clone(), body))
    }

    /// Resolve a call: declared gates, then built-in gates.
    fn resolve_gate(&mut self, call: &GateCall) -> QasmResult<GateKind> {
        let args: Vec<ParameterExpression> = call
            .args
            .iter()
            .map(|e| evaluate(e, &self.scope.vars))
            .collect();

        if let Some(decl) = self.compile(&call.name)? {
            if args.len() != decl.params().len() {
                return Err(QasmError::Argument(format!(
                    "gate '{}' takes {} parameters, got {}",
                    call.name,
                    decl.params().len(),
                    args.len()
                )));
            }
            return Ok(decl.call(args)?);
        }

        builtins::builtin_gate(&call.name, args)?
            .ok_or_else(|| QasmError::UndefinedGate(call.name.clone()))
    }

    /// Apply a gate, broadcasting over whole-register arguments.
    fn execute_unitary(&mut self, call: &GateCall, targets: &[Argument]) -> QasmResult<()> {
        let gate = self.resolve_gate(call)?;
        let operands = targets
            .iter()
            .map(|arg| self.scope.qubits(arg).map(|q| (arg, q)))
            .collect::<QasmResult<Vec<_>>>()?;

        let width = broadcast_width(
            &call.name,
            operands
                .iter()
                .filter(|(arg, _)| matches!(arg, Argument::Register(_)))
                .map(|(_, q)| q.len()),
        )?;

        for i in 0..width {
            let qubits = operands
                .iter()
                .map(|(arg, q)| match arg {
                    Argument::Register(_) => q[i],
                    Argument::Indexed { .. } => q[0],
                })
                .collect::<Vec<_>>();
            self.scope.circuit.gate(gate.clone(), qubits)?;
        }
        Ok(())
    }

    fn execute_measure(&mut self, qubit: &Argument, bit: &Argument) -> QasmResult<()> {
        let qubits = self.scope.qubits(qubit)?;
        let clbits = self.scope.clbits(bit)?;
        if qubits.len() != clbits.len() {
            return Err(QasmError::Argument(format!(
                "measure maps {} qubits onto {} bits",
                qubits.len(),
                clbits.len()
            )));
        }
        for (q, c) in qubits.into_iter().zip(clbits) {
            self.scope.circuit.measure(q, c)?;
        }
        Ok(())
    }

    /// Lower `if (register == value) op` into a single conditional
    /// instruction.
    fn execute_if(&mut self, register: &str, value: u64, op: &'p Statement) -> QasmResult<()> {
        let condition = self.scope.clbits(&Argument::Register(register.to_string()))?;
        let width = condition.len();
        if width < 64 && value >> width != 0 {
            return Err(QasmError::Structure(format!(
                "condition value {value} does not fit in register '{register}' of {width} bits"
            )));
        }

        // Run the body against the same registers, into a scratch circuit.
        let mut scratch = Scope::new("if");
        scratch.registers = self.scope.registers.clone();
        scratch.vars = self.scope.vars.clone();
        let mut child = Interpreter {
            gates: &mut *self.gates,
            scope: scratch,
        };
        child.execute(op)?;

        let mut body = child.scope.circuit.instructions().to_vec();
        if body.len() != 1 {
            return Err(QasmError::Structure(format!(
                "if statement body must produce exactly one instruction, got {}",
                body.len()
            )));
        }
        let inner = body.remove(0);
        let inst = Instruction::conditional(inner, BitString::from_int(width, value), condition)?;
        self.scope.circuit.push_instruction(inst);
        Ok(())
    }
}

/// Number of times a broadcast gate is applied. Every whole-register operand
/// must have the same length.
fn broadcast_width(name: &str, mut lengths: impl Iterator<Item = usize>) -> QasmResult<usize> {
    let Some(first) = lengths.next() else {
        return Ok(1);
    };
    for len in lengths {
        if len != first {
            return Err(QasmError::Argument(format!(
                "gate '{name}' applied to registers of different sizes ({first} and {len})"
            )));
        }
    }
    Ok(first)
}

/// An `opaque` declaration must name a built-in gate with matching arity.
fn check_opaque(sig: &GateSignature) -> QasmResult<()> {
    let Some((params, qubits)) = builtins::arity(&sig.name) else {
        return Err(QasmError::Argument(format!(
            "unsupported opaque gate '{}'",
            sig.name
        )));
    };
    if sig.params.len() != params || sig.qubits.len() != qubits as usize {
        return Err(QasmError::Argument(format!(
            "opaque gate '{}' declared with {} parameters and {} qubits, expected {params} and {qubits}",
            sig.name,
            sig.params.len(),
            sig.qubits.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;
    use qcirc_ir::{InstructionKind, StandardGate};

    fn run(source: &str) -> QasmResult<Circuit> {
        interpret(&parse_program(source, &[])?)
    }

    #[test]
    fn test_registers_are_sized() {
        let circuit = run("qreg a[2]; qreg b[3]; creg c[4]; h b[1];").unwrap();
        assert_eq!(circuit.num_qubits(), 5);
        assert_eq!(circuit.num_clbits(), 4);
        assert_eq!(circuit.instructions()[0].qubits, vec![QubitId(3)]);
    }

    #[test]
    fn test_duplicate_register() {
        assert!(matches!(
            run("qreg q[1]; creg q[1];"),
            Err(QasmError::DuplicateRegister(_))
        ));
    }

    #[test]
    fn test_register_kinds_checked() {
        assert!(matches!(
            run("qreg q[1]; creg c[1]; h c[0];"),
            Err(QasmError::UndefinedRegister(_))
        ));
        assert!(matches!(
            run("qreg q[1]; measure q[0] -> q[0];"),
            Err(QasmError::UndefinedRegister(_))
        ));
    }

    #[test]
    fn test_index_out_of_bounds() {
        assert!(matches!(
            run("qreg q[2]; x q[2];"),
            Err(QasmError::IndexOutOfBounds { index: 2, size: 2, .. })
        ));
    }

    #[test]
    fn test_broadcast() {
        let circuit = run("qreg a[3]; qreg b[3]; h a; cx a,b; cx a[0],b;").unwrap();
        assert_eq!(circuit.len(), 9);
        assert_eq!(
            circuit.instructions()[4].qubits,
            vec![QubitId(1), QubitId(4)]
        );
        assert_eq!(
            circuit.instructions()[8].qubits,
            vec![QubitId(0), QubitId(5)]
        );
        assert!(matches!(
            run("qreg a[2]; qreg b[3]; cx a,b;"),
            Err(QasmError::Argument(_))
        ));
    }

    #[test]
    fn test_measure_register() {
        let circuit = run("qreg q[2]; creg c[2]; measure q -> c;").unwrap();
        assert_eq!(circuit.len(), 2);
        assert_eq!(circuit.instructions()[1].clbits, vec![ClbitId(1)]);
        assert!(run("qreg q[2]; creg c[1]; measure q -> c;").is_err());
    }

    #[test]
    fn test_reset_and_barrier() {
        let circuit = run("qreg q[3]; reset q; barrier q[0],q[2];").unwrap();
        assert_eq!(circuit.len(), 4);
        assert!(circuit.instructions()[3].is_barrier());
        assert_eq!(circuit.instructions()[3].qubits, vec![QubitId(0), QubitId(2)]);
    }

    #[test]
    fn test_forward_reference() {
        let circuit = run(
            "qreg q[2];
             outer q[0],q[1];
             gate outer a,b { inner a; cx a,b; }
             gate inner a { h a; }",
        )
        .unwrap();
        assert_eq!(circuit.len(), 1);
        let GateKind::Call(call) = circuit.instructions()[0].as_gate().unwrap() else {
            panic!("expected declaration call");
        };
        assert_eq!(call.decl.name(), "outer");
        assert_eq!(call.decl.body().len(), 2);
    }

    #[test]
    fn test_user_gate_shadows_builtin_cx() {
        let circuit = run("gate CX a,b { U(0,0,0) a; U(0,0,0) b; } qreg q[2]; CX q[0],q[1];").unwrap();
        let GateKind::Call(call) = circuit.instructions()[0].as_gate().unwrap() else {
            panic!("expected declaration call");
        };
        assert_eq!(call.decl.name(), "CX");
        assert_eq!(call.decl.body().len(), 2);
    }

    #[test]
    fn test_recursive_gate_rejected() {
        let err = run("qreg q[1]; gate a x { b x; } gate b x { a x; } a q[0];").unwrap_err();
        assert!(matches!(err, QasmError::UndefinedGate(_)));

        let err = run("gate loop x { loop x; }").unwrap_err();
        assert!(matches!(err, QasmError::UndefinedGate(_)));
    }

    #[test]
    fn test_duplicate_gate_declaration() {
        assert!(run("gate g a { h a; } gate g a { h a; }").is_ok());
        assert!(matches!(
            run("gate g a { h a; } gate g a { x a; }"),
            Err(QasmError::Structure(_))
        ));
    }

    #[test]
    fn test_parameters_bound_in_body() {
        let circuit = run("qreg q[1]; gate r(t) a { rz(t/2) a; } r(pi) q[0];").unwrap();
        let GateKind::Call(call) = circuit.instructions()[0].as_gate().unwrap() else {
            panic!("expected declaration call");
        };
        assert_eq!(call.args, vec![ParameterExpression::Constant(std::f64::consts::PI)]);
        let inner = call.decl.body().instructions()[0].as_gate().unwrap();
        assert!(inner.parameters()[0].is_symbolic());
    }

    #[test]
    fn test_parameter_count_checked() {
        assert!(matches!(
            run("qreg q[1]; gate r(t) a { rz(t) a; } r q[0];"),
            Err(QasmError::Argument(_))
        ));
        assert!(matches!(
            run("qreg q[1]; rz(1,2) q[0];"),
            Err(QasmError::Argument(_))
        ));
    }

    #[test]
    fn test_undefined_gate() {
        assert!(matches!(
            run("qreg q[1]; frobnicate q[0];"),
            Err(QasmError::UndefinedGate(name)) if name == "frobnicate"
        ));
    }

    #[test]
    fn test_opaque_validation() {
        assert!(run("opaque rx(t) a;").is_ok());
        assert!(matches!(run("opaque magic a;"), Err(QasmError::Argument(_))));
        assert!(matches!(run("opaque rx a;"), Err(QasmError::Argument(_))));
    }

    #[test]
    fn test_conditional() {
        let circuit = run("qreg q[1]; creg c[2]; if(c==2) x q[0];").unwrap();
        let inst = &circuit.instructions()[0];
        let InstructionKind::IfStatement { op, value } = &inst.kind else {
            panic!("expected conditional");
        };
        assert_eq!(
            **op,
            InstructionKind::Gate(GateKind::Standard(StandardGate::X))
        );
        assert_eq!(value.to_int(), Some(2));
        assert_eq!(inst.clbits, vec![ClbitId(0), ClbitId(1)]);
    }

    #[test]
    fn test_conditional_needs_single_instruction() {
        assert!(matches!(
            run("qreg q[2]; creg c[1]; if(c==1) x q;"),
            Err(QasmError::Structure(_))
        ));
        assert!(matches!(
            run("qreg q[1]; creg c[1]; if(c==2) x q[0];"),
            Err(QasmError::Structure(_))
        ));
    }

    #[test]
    fn test_unused_registers_still_sized() {
        let circuit = run("qreg q[4]; creg c[3];").unwrap();
        assert!(circuit.is_empty());
        assert_eq!(circuit.num_qubits(), 4);
        assert_eq!(circuit.num_clbits(), 3);
    }
}
