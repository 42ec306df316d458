//! Circuit to AST conversion.
//!
//! The serializer is the inverse of the interpreter. Every gate declaration
//! reachable from the circuit becomes one `gate` block, emitted after the
//! declarations it calls. Operations with no `OpenQASM` 2.0 spelling are
//! either spliced in as their decomposition or wrapped in a synthesized
//! declaration that is reused for every identical operation.
//!
//! Emitted declaration names carry a `_<n>` suffix, numbered in the order
//! declarations are first met, so distinct declarations that share a name
//! never collide.

mod lowering;
mod names;

use std::borrow::Cow;
use std::sync::Arc;

use qcirc_ir::{Circuit, DeclId, GateCall, GateDecl, GateKind, InstructionKind};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, instrument, warn};

use crate::ast::{GateDeclaration, GateSignature, Program, Statement};
use crate::error::{QasmError, QasmResult};
use names::is_valid_identifier;
use lowering::Scope;

/// Register names used for every emitted program.
pub(crate) const QUANTUM_REGISTER: &str = "q";
pub(crate) const CLASSICAL_REGISTER: &str = "c";

const STANDARD_INCLUDE: &str = "qelib1.inc";

/// Options controlling circuit emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpOptions {
    /// Decompose the circuit by one level before emitting.
    pub decompose_wrappers: bool,
    /// Rewrite declaration names into valid identifiers instead of rejecting
    /// invalid ones.
    pub sanitize_names: bool,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            decompose_wrappers: false,
            sanitize_names: true,
        }
    }
}

impl DumpOptions {
    /// Set whether to decompose the circuit before emitting.
    #[must_use]
    pub fn with_decompose_wrappers(mut self, decompose: bool) -> Self {
        self.decompose_wrappers = decompose;
        self
    }

    /// Set whether to sanitize declaration names.
    #[must_use]
    pub fn with_sanitize_names(mut self, sanitize: bool) -> Self {
        self.sanitize_names = sanitize;
        self
    }
}

/// Convert a circuit into an `OpenQASM` 2.0 program.
///
/// The program declares `qreg q[n]` and `creg c[m]` sized to the circuit.
/// Fails on z-register variables, on conditions over anything but the whole
/// classical register, and on operations that neither map to a named gate
/// nor decompose.
#[instrument(skip_all, fields(instructions = circuit.len()))]
pub fn circuit_to_ast(circuit: &Circuit, options: &DumpOptions) -> QasmResult<Program> {
    if circuit.num_zvars() > 0 {
        return Err(QasmError::Serialization(format!(
            "circuit uses {} z-register variables, which OpenQASM 2.0 cannot express",
            circuit.num_zvars()
        )));
    }

    let circuit = if options.decompose_wrappers {
        match circuit.decompose() {
            Ok(flat) => Cow::Owned(flat),
            Err(e) => {
                warn!(error = %e, "decomposition failed, emitting circuit as is");
                Cow::Borrowed(circuit)
            }
        }
    } else {
        Cow::Borrowed(circuit)
    };

    let mut serializer = Serializer::new(options.sanitize_names, circuit.num_clbits());
    let collected = serializer.collect(&circuit)?;
    for decl in &collected {
        serializer.declare(decl)?;
    }

    let mut body = Vec::with_capacity(circuit.len());
    for inst in circuit.iter() {
        serializer.lower(inst, Scope::Program, &mut body)?;
    }
    debug!(
        declarations = serializer.declarations.len(),
        synthesized = serializer.synthesized.len(),
        "serialized circuit"
    );

    let mut statements = Vec::with_capacity(body.len() + serializer.declarations.len() + 3);
    if serializer.needs_standard_include {
        statements.push(Statement::Include {
            file: STANDARD_INCLUDE.to_string(),
        });
    }
    statements.append(&mut serializer.declarations);
    if circuit.num_qubits() > 0 {
        statements.push(Statement::QReg {
            name: QUANTUM_REGISTER.to_string(),
            size: circuit.num_qubits(),
        });
    }
    if circuit.num_clbits() > 0 {
        statements.push(Statement::CReg {
            name: CLASSICAL_REGISTER.to_string(),
            size: circuit.num_clbits(),
        });
    }
    statements.append(&mut body);
    Ok(Program::new(statements))
}

/// Per-call emission state.
struct Serializer {
    sanitize: bool,
    num_clbits: u32,
    names: FxHashMap<DeclId, String>,
    next_suffix: usize,
    /// Declarations synthesized for operations without a named gate.
    synthesized: Vec<(GateKind, Arc<GateDecl>)>,
    emitted: FxHashSet<DeclId>,
    in_progress: FxHashSet<DeclId>,
    declarations: Vec<Statement>,
    needs_standard_include: bool,
}

impl Serializer {
    fn new(sanitize: bool, num_clbits: u32) -> Self {
        Self {
            sanitize,
            num_clbits,
            names: FxHashMap::default(),
            next_suffix: 0,
            synthesized: Vec::new(),
            emitted: FxHashSet::default(),
            in_progress: FxHashSet::default(),
            declarations: Vec::new(),
            needs_standard_include: false,
        }
    }

    /// Name every declaration called directly by `circuit` or by the bodies
    /// of those declarations, callees first.
    fn collect(&mut self, circuit: &Circuit) -> QasmResult<Vec<Arc<GateDecl>>> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        self.collect_into(circuit, &mut seen, &mut out)?;
        Ok(out)
    }

    fn collect_into(
        &mut self,
        circuit: &Circuit,
        seen: &mut FxHashSet<DeclId>,
        out: &mut Vec<Arc<GateDecl>>,
    ) -> QasmResult<()> {
        for inst in circuit {
            let kind = match &inst.kind {
                InstructionKind::IfStatement { op, .. } => op.as_ref(),
                kind => kind,
            };
            let InstructionKind::Gate(GateKind::Call(GateCall { decl, .. })) = kind else {
                continue;
            };
            if !seen.insert(decl.id()) {
                continue;
            }
            self.collect_into(decl.body(), seen, out)?;
            self.name_of(decl)?;
            out.push(Arc::clone(decl));
        }
        Ok(())
    }

    /// The emitted name of `decl`, assigned on first use.
    fn name_of(&mut self, decl: &GateDecl) -> QasmResult<String> {
        if let Some(name) = self.names.get(&decl.id()) {
            return Ok(name.clone());
        }

        let is_synthesized = self.synthesized.iter().any(|(_, d)| d.id() == decl.id());
        let base = if self.sanitize || is_synthesized {
            names::sanitize(decl.name())
        } else {
            decl.name().to_string()
        };
        let name = format!("{base}_{}", self.next_suffix);
        if !is_valid_identifier(&name) {
            return Err(QasmError::Serialization(format!(
                "gate name '{}' is not a valid identifier",
                decl.name()
            )));
        }
        if let Some(param) = decl.params().iter().find(|p| !is_valid_identifier(p)) {
            return Err(QasmError::Serialization(format!(
                "parameter '{param}' of gate '{}' is not a valid identifier",
                decl.name()
            )));
        }

        self.next_suffix += 1;
        self.names.insert(decl.id(), name.clone());
        Ok(name)
    }

    /// Emit `decl` unless already emitted, after everything it calls.
    fn declare(&mut self, decl: &GateDecl) -> QasmResult<String> {
        let name = self.name_of(decl)?;
        if self.emitted.contains(&decl.id()) {
            return Ok(name);
        }
        if !self.in_progress.insert(decl.id()) {
            return Err(QasmError::Serialization(format!(
                "gate '{}' is defined in terms of itself",
                decl.name()
            )));
        }
        if decl.num_qubits() == 0 {
            return Err(QasmError::Serialization(format!(
                "gate '{}' acts on no qubits",
                decl.name()
            )));
        }

        let mut body = Vec::with_capacity(decl.body().len());
        for inst in decl.body() {
            self.lower(inst, Scope::Declaration, &mut body)?;
        }
        let qubits = (0..decl.num_qubits()).map(lowering::local_qubit).collect();

        self.in_progress.remove(&decl.id());
        self.emitted.insert(decl.id());
        self.declarations.push(Statement::Gate(GateDeclaration {
            signature: GateSignature {
                name: name.clone(),
                params: decl.params().to_vec(),
                qubits,
            },
            body,
        }));
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Argument, Expression};
    use crate::printer::print_ast;
    use qcirc_ir::{BitString, ClbitId, CustomGate, Instruction, ParameterExpression, QubitId, StandardGate, ZVarId};

    fn dump(circuit: &Circuit) -> String {
        print_ast(&circuit_to_ast(circuit, &DumpOptions::default()).unwrap()).unwrap()
    }

    fn gate_names(program: &Program) -> Vec<String> {
        program
            .statements
            .iter()
            .filter_map(|s| match s {
                Statement::Gate(g) => Some(g.signature.name.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_bell_layout() {
        let text = dump(&Circuit::bell().unwrap());
        assert!(text.starts_with("OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\ncreg c[2];\n"));
        assert!(text.contains("h q[0];\ncx q[0],q[1];\n"));
        assert!(text.contains("measure q[1] -> c[1];\n"));
    }

    #[test]
    fn test_only_u_needs_no_include() {
        let mut circuit = Circuit::with_size("main", 1, 0);
        circuit
            .u(
                ParameterExpression::constant(0.5),
                ParameterExpression::constant(0.0),
                ParameterExpression::constant(0.0),
                QubitId(0),
            )
            .unwrap();
        circuit.barrier([QubitId(0)]).unwrap();
        let program = circuit_to_ast(&circuit, &DumpOptions::default()).unwrap();
        assert!(!program
            .statements
            .iter()
            .any(|s| matches!(s, Statement::Include { .. })));
    }

    #[test]
    fn test_empty_circuit_has_no_registers() {
        let program = circuit_to_ast(&Circuit::new("main"), &DumpOptions::default()).unwrap();
        assert!(program.statements.is_empty());
    }

    #[test]
    fn test_declaration_emitted_once_with_suffix() {
        let mut body = Circuit::with_size("bell", 2, 0);
        body.h(QubitId(0)).unwrap().cx(QubitId(0), QubitId(1)).unwrap();
        let decl = GateDecl::new("bell", vec![], body);

        let mut circuit = Circuit::with_size("main", 4, 0);
        let call = decl.call(vec![]).unwrap();
        circuit.gate(call.clone(), [QubitId(0), QubitId(1)]).unwrap();
        circuit.gate(call, [QubitId(2), QubitId(3)]).unwrap();

        let program = circuit_to_ast(&circuit, &DumpOptions::default()).unwrap();
        assert_eq!(gate_names(&program), vec!["bell_0"]);
        let calls = program
            .statements
            .iter()
            .filter(|s| matches!(s, Statement::Unitary { call, .. } if call.name == "bell_0"))
            .count();
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_same_named_declarations_stay_distinct() {
        let mut a = Circuit::with_size("g", 1, 0);
        a.x(QubitId(0)).unwrap();
        let mut b = Circuit::with_size("g", 1, 0);
        b.y(QubitId(0)).unwrap();

        let mut circuit = Circuit::with_size("main", 1, 0);
        circuit.gate(GateDecl::new("g", vec![], a).call(vec![]).unwrap(), [QubitId(0)]).unwrap();
        circuit.gate(GateDecl::new("g", vec![], b).call(vec![]).unwrap(), [QubitId(0)]).unwrap();

        let program = circuit_to_ast(&circuit, &DumpOptions::default()).unwrap();
        assert_eq!(gate_names(&program), vec!["g_0", "g_1"]);
    }

    #[test]
    fn test_callee_declared_before_caller() {
        let mut inner_body = Circuit::with_size("inner", 1, 0);
        inner_body.h(QubitId(0)).unwrap();
        let inner = GateDecl::new("inner", vec![], inner_body);

        let mut outer_body = Circuit::with_size("outer", 2, 0);
        outer_body.gate(inner.call(vec![]).unwrap(), [QubitId(1)]).unwrap();
        outer_body.cx(QubitId(0), QubitId(1)).unwrap();
        let outer = GateDecl::new("outer", vec![], outer_body);

        let mut circuit = Circuit::with_size("main", 2, 0);
        circuit.gate(outer.call(vec![]).unwrap(), [QubitId(0), QubitId(1)]).unwrap();

        let program = circuit_to_ast(&circuit, &DumpOptions::default()).unwrap();
        assert_eq!(gate_names(&program), vec!["inner_0", "outer_1"]);

        let Statement::Gate(outer) = &program.statements[2] else {
            panic!("expected declaration, got {:?}", program.statements[2]);
        };
        assert_eq!(outer.signature.qubits, vec!["q_0", "q_1"]);
        assert!(matches!(
            &outer.body[0],
            Statement::Unitary { call, targets }
                if call.name == "inner_0" && targets == &[Argument::Register("q_1".into())]
        ));
    }

    #[test]
    fn test_declaration_parameters_stay_symbolic() {
        let mut body = Circuit::with_size("rot", 1, 0);
        body.rz(ParameterExpression::symbol("theta") * ParameterExpression::constant(2.0), QubitId(0))
            .unwrap();
        let decl = GateDecl::new("rot", vec!["theta".into()], body);
        let mut circuit = Circuit::with_size("main", 1, 0);
        circuit
            .gate(decl.call(vec![ParameterExpression::constant(0.5)]).unwrap(), [QubitId(0)])
            .unwrap();

        let text = dump(&circuit);
        assert!(text.contains("gate rot_0(theta) q_0 {\n    rz((theta*2.0)) q_0;\n}\n"), "{text}");
        assert!(text.contains("rot_0(0.5) q[0];"), "{text}");
    }

    #[test]
    fn test_invalid_name_without_sanitizing() {
        let mut body = Circuit::with_size("my gate", 1, 0);
        body.h(QubitId(0)).unwrap();
        let decl = GateDecl::new("my gate", vec![], body);
        let mut circuit = Circuit::with_size("main", 1, 0);
        circuit.gate(decl.call(vec![]).unwrap(), [QubitId(0)]).unwrap();

        let strict = DumpOptions::default().with_sanitize_names(false);
        assert!(matches!(
            circuit_to_ast(&circuit, &strict),
            Err(QasmError::Serialization(_))
        ));
        let program = circuit_to_ast(&circuit, &DumpOptions::default()).unwrap();
        assert_eq!(gate_names(&program), vec!["my_gate_0"]);
    }

    #[test]
    fn test_reserved_words_in_declarations() {
        let mut body = Circuit::with_size("gate", 1, 0);
        body.h(QubitId(0)).unwrap();
        let decl = GateDecl::new("gate", vec![], body);
        let mut circuit = Circuit::with_size("main", 1, 0);
        circuit.gate(decl.call(vec![]).unwrap(), [QubitId(0)]).unwrap();
        let strict = DumpOptions::default().with_sanitize_names(false);
        let program = circuit_to_ast(&circuit, &strict).unwrap();
        assert_eq!(gate_names(&program), vec!["gate_0"]);

        let mut body = Circuit::with_size("rot", 1, 0);
        body.rz(ParameterExpression::symbol("sin"), QubitId(0)).unwrap();
        let decl = GateDecl::new("rot", vec!["sin".into()], body);
        let mut circuit = Circuit::with_size("main", 1, 0);
        circuit
            .gate(decl.call(vec![ParameterExpression::constant(0.5)]).unwrap(), [QubitId(0)])
            .unwrap();
        assert!(matches!(
            circuit_to_ast(&circuit, &DumpOptions::default()),
            Err(QasmError::Serialization(_))
        ));
    }

    #[test]
    fn test_inverse_is_spliced() {
        let mut circuit = Circuit::with_size("main", 2, 0);
        circuit
            .gate(GateKind::from(StandardGate::ISwap).inverse(), [QubitId(0), QubitId(1)])
            .unwrap();
        let program = circuit_to_ast(&circuit, &DumpOptions::default()).unwrap();
        let names: Vec<_> = program
            .statements
            .iter()
            .filter_map(|s| match s {
                Statement::Unitary { call, .. } => Some(call.name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["h", "cx", "cx", "h", "sdg", "sdg"]);
        assert!(gate_names(&program).is_empty());
    }

    #[test]
    fn test_controlled_operation_synthesized_once() {
        let c4x = GateKind::from(StandardGate::X).control(4);
        let mut circuit = Circuit::with_size("main", 5, 0);
        circuit.gate(c4x.clone(), (0..5).map(QubitId)).unwrap();
        circuit.gate(c4x, (0..5).rev().map(QubitId)).unwrap();

        let program = circuit_to_ast(&circuit, &DumpOptions::default()).unwrap();
        let names = gate_names(&program);
        assert!(names.iter().any(|n| n.starts_with("c4x_")), "{names:?}");
        let c4x_count = names.iter().filter(|n| n.starts_with("c4x_")).count();
        assert_eq!(c4x_count, 1);
    }

    #[test]
    fn test_opaque_custom_gate_rejected() {
        let mut circuit = Circuit::with_size("main", 1, 0);
        circuit.gate(CustomGate::new("blackbox", 1), [QubitId(0)]).unwrap();
        let err = circuit_to_ast(&circuit, &DumpOptions::default()).unwrap_err();
        assert!(matches!(err, QasmError::Serialization(msg) if msg.contains("blackbox")));
    }

    #[test]
    fn test_custom_gate_with_definition_synthesized() {
        let mut def = Circuit::with_size("pair", 2, 0);
        def.h(QubitId(0)).unwrap().cz(QubitId(0), QubitId(1)).unwrap();
        let pair = CustomGate::new("Pair", 2).with_definition(def).unwrap();

        let mut circuit = Circuit::with_size("main", 2, 0);
        circuit.gate(pair, [QubitId(1), QubitId(0)]).unwrap();
        let text = dump(&circuit);
        assert!(text.contains("gate g_Pair_0 q_0,q_1 {\n    h q_0;\n    cz q_0,q_1;\n}\n"), "{text}");
        assert!(text.contains("g_Pair_0 q[1],q[0];"), "{text}");
    }

    #[test]
    fn test_zvars_rejected() {
        let mut circuit = Circuit::with_size("main", 1, 0);
        circuit.amplitude(BitString::from_int(1, 0), ZVarId(0)).unwrap();
        assert!(matches!(
            circuit_to_ast(&circuit, &DumpOptions::default()),
            Err(QasmError::Serialization(_))
        ));
    }

    #[test]
    fn test_conditional_on_whole_register() {
        let mut circuit = Circuit::with_size("main", 1, 2);
        let x = Instruction::gate(StandardGate::X, [QubitId(0)]).unwrap();
        let cond = Instruction::conditional(x, BitString::from_int(2, 2), vec![ClbitId(0), ClbitId(1)])
            .unwrap();
        circuit.push_instruction(cond);

        let program = circuit_to_ast(&circuit, &DumpOptions::default()).unwrap();
        let last = program.statements.last().unwrap();
        assert!(matches!(
            last,
            Statement::If { register, value: 2, op }
                if register == "c" && matches!(op.as_ref(), Statement::Unitary { call, .. } if call.name == "x")
        ));
    }

    #[test]
    fn test_conditional_on_partial_register_rejected() {
        let mut circuit = Circuit::with_size("main", 1, 2);
        let x = Instruction::gate(StandardGate::X, [QubitId(0)]).unwrap();
        let cond = Instruction::conditional(x, BitString::from_int(1, 1), vec![ClbitId(1)]).unwrap();
        circuit.push_instruction(cond);
        assert!(matches!(
            circuit_to_ast(&circuit, &DumpOptions::default()),
            Err(QasmError::Serialization(_))
        ));
    }

    #[test]
    fn test_symbolic_parameters() {
        let mut circuit = Circuit::with_size("main", 1, 0);
        circuit
            .rx(ParameterExpression::symbol("alpha") + ParameterExpression::pi(), QubitId(0))
            .unwrap();
        let program = circuit_to_ast(&circuit, &DumpOptions::default()).unwrap();
        let Some(Statement::Unitary { call, .. }) = program.statements.last() else {
            panic!("expected unitary");
        };
        assert!(matches!(
            &call.args[0],
            Expression::BinOp { left, right, .. }
                if **left == Expression::Identifier("alpha".into())
                    && **right == Expression::Identifier("pi".into())
        ));
    }

    #[test]
    fn test_decompose_wrappers_flattens_calls() {
        let mut body = Circuit::with_size("bell", 2, 0);
        body.h(QubitId(0)).unwrap().cx(QubitId(0), QubitId(1)).unwrap();
        let decl = GateDecl::new("bell", vec![], body);
        let mut circuit = Circuit::with_size("main", 2, 0);
        circuit.gate(decl.call(vec![]).unwrap(), [QubitId(0), QubitId(1)]).unwrap();

        let options = DumpOptions::default().with_decompose_wrappers(true);
        let program = circuit_to_ast(&circuit, &options).unwrap();
        assert!(gate_names(&program).is_empty());
    }
}
