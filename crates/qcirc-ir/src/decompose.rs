//! One-level decomposition of operations into simpler operations.
//!
//! Decompositions act on local qubits `0..n` and are remapped onto an
//! instruction's operands by [`Instruction::decompose`].

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::circuit::Circuit;
use crate::error::{IrError, IrResult};
use crate::gate::{CustomGate, GateCall, GateKind, StandardGate};
use crate::instruction::{Instruction, InstructionKind};
use crate::parameter::ParameterExpression;
use crate::qubit::QubitId;
use std::f64::consts::PI;

/// Largest integer exponent expanded by repetition.
const MAX_POWER_REPEAT: f64 = 1024.0;

impl GateKind {
    /// Decompose into a circuit on local qubits `0..num_qubits()`.
    ///
    /// Standard gates without a finer definition decompose into themselves.
    pub fn decompose(&self) -> IrResult<Circuit> {
        match self {
            GateKind::Standard(g) => standard_decomposition(g),
            GateKind::Call(call) => {
                let bindings = call.bindings();
                let body = call.decl.body();
                let mut out =
                    Circuit::with_size(call.decl.name(), self.num_qubits(), body.num_clbits());
                for inst in body {
                    out.push_instruction(Instruction {
                        kind: substitute_kind(&inst.kind, &bindings),
                        ..inst.clone()
                    });
                }
                Ok(out)
            }
            GateKind::Custom(custom) => match &custom.definition {
                Some(definition) => {
                    let mut out = Circuit::clone(definition);
                    out.ensure_size(custom.num_qubits, 0);
                    Ok(out)
                }
                None => Err(IrError::NoDecomposition(custom.name.clone())),
            },
            GateKind::Inverse(op) => inverse_decomposition(self, op),
            GateKind::Power(op, k) => power_decomposition(self, op, *k),
            GateKind::Control(n, op) => control_decomposition(self, *n, op),
        }
    }

    /// Whether `circuit` is just this operation applied to `0..n` again.
    pub fn is_trivial_decomposition(&self, circuit: &Circuit) -> bool {
        match circuit.instructions() {
            [only] => {
                only.kind == InstructionKind::Gate(self.clone())
                    && only.qubits == local_qubits(0..self.num_qubits())
            }
            _ => false,
        }
    }

    /// Replace bound symbols in every parameter.
    #[must_use]
    pub fn substitute(&self, bindings: &FxHashMap<String, ParameterExpression>) -> GateKind {
        match self {
            GateKind::Standard(g) => GateKind::Standard(g.map_params(|p| p.substitute(bindings))),
            GateKind::Call(call) => GateKind::Call(GateCall {
                decl: Arc::clone(&call.decl),
                args: call.args.iter().map(|a| a.substitute(bindings)).collect(),
            }),
            GateKind::Custom(custom) => GateKind::Custom(CustomGate {
                params: custom.params.iter().map(|p| p.substitute(bindings)).collect(),
                ..custom.clone()
            }),
            GateKind::Inverse(op) => GateKind::Inverse(Box::new(op.substitute(bindings))),
            GateKind::Power(op, k) => GateKind::Power(Box::new(op.substitute(bindings)), *k),
            GateKind::Control(n, op) => GateKind::Control(*n, Box::new(op.substitute(bindings))),
        }
    }
}

impl Instruction {
    /// Decompose one level and remap onto this instruction's operands.
    ///
    /// Non-gate instructions decompose into themselves.
    pub fn decompose(&self) -> IrResult<Circuit> {
        let InstructionKind::Gate(gate) = &self.kind else {
            let mut out = Circuit::new(self.name());
            out.push_instruction(self.clone());
            return Ok(out);
        };

        let local = gate.decompose()?;
        let mut out = Circuit::new(gate.name());
        for inst in &local {
            let qubits = inst
                .qubits
                .iter()
                .map(|q| self.qubits.get(q.0 as usize).copied())
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| IrError::QubitCountMismatch {
                    gate_name: gate.name(),
                    expected: local.num_qubits(),
                    got: u32::try_from(self.qubits.len()).unwrap_or(u32::MAX),
                })?;
            let clbits = inst
                .clbits
                .iter()
                .map(|c| self.clbits.get(c.0 as usize).copied())
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| IrError::ClbitCountMismatch {
                    op_name: gate.name(),
                    expected: local.num_clbits(),
                    got: u32::try_from(self.clbits.len()).unwrap_or(u32::MAX),
                })?;
            out.push_instruction(Instruction {
                kind: inst.kind.clone(),
                qubits,
                clbits,
                zvars: inst.zvars.clone(),
            });
        }
        Ok(out)
    }
}

impl Circuit {
    /// Decompose every instruction by one level.
    pub fn decompose(&self) -> IrResult<Circuit> {
        let mut out = Circuit::with_size(self.name(), self.num_qubits(), self.num_clbits());
        for inst in self {
            for sub in &inst.decompose()? {
                out.push_instruction(sub.clone());
            }
        }
        Ok(out)
    }
}

fn local_qubits(range: impl IntoIterator<Item = u32>) -> Vec<QubitId> {
    range.into_iter().map(QubitId).collect()
}

/// A circuit applying `op` once to local qubits.
fn single(op: GateKind) -> IrResult<Circuit> {
    let n = op.num_qubits();
    let mut out = Circuit::with_size(op.name(), n, 0);
    out.gate(op, local_qubits(0..n))?;
    Ok(out)
}

fn substitute_kind(
    kind: &InstructionKind,
    bindings: &FxHashMap<String, ParameterExpression>,
) -> InstructionKind {
    match kind {
        InstructionKind::Gate(g) => InstructionKind::Gate(g.substitute(bindings)),
        InstructionKind::IfStatement { op, value } => InstructionKind::IfStatement {
            op: Box::new(substitute_kind(op, bindings)),
            value: value.clone(),
        },
        other => other.clone(),
    }
}

fn standard_decomposition(gate: &StandardGate) -> IrResult<Circuit> {
    let steps: Vec<(StandardGate, Vec<u32>)> = match gate {
        StandardGate::ISwap => vec![
            (StandardGate::S, vec![0]),
            (StandardGate::S, vec![1]),
            (StandardGate::H, vec![0]),
            (StandardGate::CX, vec![0, 1]),
            (StandardGate::CX, vec![1, 0]),
            (StandardGate::H, vec![1]),
        ],
        StandardGate::DCX => vec![
            (StandardGate::CX, vec![0, 1]),
            (StandardGate::CX, vec![1, 0]),
        ],
        _ => return single(GateKind::Standard(gate.clone())),
    };

    let mut out = Circuit::with_size(gate.name(), gate.num_qubits(), 0);
    for (g, qubits) in steps {
        out.gate(g, local_qubits(qubits))?;
    }
    Ok(out)
}

/// Reverse the decomposition of `op` and invert each step.
fn inverse_decomposition(whole: &GateKind, op: &GateKind) -> IrResult<Circuit> {
    let folded = op.clone().inverse();
    if !matches!(folded, GateKind::Inverse(_)) {
        return single(folded);
    }

    let inner = op.decompose()?;
    if op.is_trivial_decomposition(&inner) {
        return Err(IrError::NoDecomposition(whole.name()));
    }

    let mut out = Circuit::with_size(whole.name(), whole.num_qubits(), 0);
    for inst in inner.iter().rev() {
        match &inst.kind {
            InstructionKind::Gate(g) => {
                out.gate(g.clone().inverse(), inst.qubits.iter().copied())?;
            }
            InstructionKind::Barrier => {
                out.push_instruction(inst.clone());
            }
            other => return Err(IrError::NotUnitary(other.name())),
        }
    }
    Ok(out)
}

/// Closed forms first, then repetition for integer exponents.
fn power_decomposition(whole: &GateKind, op: &GateKind, exponent: f64) -> IrResult<Circuit> {
    let folded = op.clone().power(exponent);
    if !matches!(folded, GateKind::Power(..)) {
        return single(folded);
    }

    if exponent.fract() != 0.0 || exponent.abs() > MAX_POWER_REPEAT {
        return Err(IrError::NoDecomposition(whole.name()));
    }

    let base = if exponent < 0.0 {
        op.clone().inverse()
    } else {
        op.clone()
    };
    let n = whole.num_qubits();
    let mut out = Circuit::with_size(whole.name(), n, 0);
    // Bounded by MAX_POWER_REPEAT above.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let repeats = exponent.abs() as usize;
    for _ in 0..repeats {
        out.gate(base.clone(), local_qubits(0..n))?;
    }
    Ok(out)
}

/// Controls placed on qubits `0..n`, the operation on `n..`.
fn control_decomposition(whole: &GateKind, n: u32, op: &GateKind) -> IrResult<Circuit> {
    let folded = op.clone().control(n);
    let (n, base) = match &folded {
        GateKind::Control(m, base) => (*m, base.as_ref()),
        _ => return single(folded),
    };
    let total = whole.num_qubits();
    let mut out = Circuit::with_size(whole.name(), total, 0);

    if let GateKind::Standard(g) = base {
        if g.num_qubits() == 1 && n >= 2 {
            if let Some(steps) = multi_controlled_single(n, g) {
                for (op, qubits) in steps {
                    out.gate(op, qubits)?;
                }
                return Ok(out);
            }
        }
    }

    let inner = base.decompose()?;
    if base.is_trivial_decomposition(&inner) {
        return Err(IrError::NoDecomposition(whole.name()));
    }
    let controls = local_qubits(0..n);
    for inst in &inner {
        let shifted = inst.qubits.iter().map(|q| QubitId(q.0 + n));
        match &inst.kind {
            InstructionKind::Gate(g) => {
                out.gate(g.clone().control(n), controls.iter().copied().chain(shifted))?;
            }
            InstructionKind::Barrier => {
                out.barrier(shifted)?;
            }
            other => return Err(IrError::NotUnitary(other.name())),
        }
    }
    Ok(out)
}

/// C^n(X) and C^n(SX) conjugate a multi-controlled phase with H. Other gates with a
/// controllable square root V use
/// C^n(W) = CV(c_n,t) C^{n-1}X(c..,c_n) CV†(c_n,t) C^{n-1}X(c..,c_n) C^{n-1}V(c..,t).
fn multi_controlled_single(n: u32, gate: &StandardGate) -> Option<Vec<(GateKind, Vec<QubitId>)>> {
    let target = QubitId(n);
    let all = local_qubits(0..=n);

    let conjugated_phase = match gate {
        StandardGate::X => Some(ParameterExpression::Pi),
        StandardGate::SX => Some(ParameterExpression::Constant(PI / 2.0)),
        StandardGate::SXdg => Some(ParameterExpression::Constant(-PI / 2.0)),
        _ => None,
    };
    if let Some(lambda) = conjugated_phase {
        let phase = GateKind::from(StandardGate::P(lambda)).control(n);
        return Some(vec![
            (StandardGate::H.into(), vec![target]),
            (phase, all),
            (StandardGate::H.into(), vec![target]),
        ]);
    }

    let root = gate.power(0.5)?;
    let controlled_root = GateKind::from(root.controlled(1)?);
    let last = QubitId(n - 1);
    let rest = local_qubits(0..n - 1);
    let flip = GateKind::from(StandardGate::X).control(n - 1);
    let flip_targets: Vec<_> = rest.iter().copied().chain([last]).collect();

    Some(vec![
        (controlled_root.clone(), vec![last, target]),
        (flip.clone(), flip_targets.clone()),
        (controlled_root.inverse(), vec![last, target]),
        (flip, flip_targets),
        (
            GateKind::from(root).control(n - 1),
            rest.into_iter().chain([target]).collect(),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::GateDecl;
    use crate::qubit::ClbitId;

    fn kinds(c: &Circuit) -> Vec<GateKind> {
        c.iter().filter_map(|i| i.as_gate().cloned()).collect()
    }

    #[test]
    fn test_standard_is_trivial() {
        let h = GateKind::from(StandardGate::H);
        let d = h.decompose().unwrap();
        assert!(h.is_trivial_decomposition(&d));
    }

    #[test]
    fn test_call_substitutes_arguments() {
        let mut body = Circuit::with_size("g", 1, 0);
        body.rx(ParameterExpression::symbol("theta"), QubitId(0)).unwrap();
        let decl = GateDecl::new("g", vec!["theta".into()], body);
        let call = decl.call(vec![ParameterExpression::constant(0.25)]).unwrap();

        let d = call.decompose().unwrap();
        assert_eq!(
            kinds(&d),
            vec![GateKind::Standard(StandardGate::Rx(ParameterExpression::constant(0.25)))]
        );
    }

    #[test]
    fn test_inverse_reverses() {
        let iswap_dg = GateKind::from(StandardGate::ISwap).inverse();
        let d = iswap_dg.decompose().unwrap();
        let names: Vec<_> = d.iter().map(Instruction::name).collect();
        assert_eq!(names, vec!["h", "cx", "cx", "h", "sdg", "sdg"]);
    }

    #[test]
    fn test_inverse_of_opaque_custom_fails() {
        let op = GateKind::from(CustomGate::new("blackbox", 1)).inverse();
        assert!(matches!(op.decompose(), Err(IrError::NoDecomposition(_))));
    }

    #[test]
    fn test_integer_power_repeats() {
        let op = GateKind::Power(Box::new(StandardGate::H.into()), 3.0);
        let d = op.decompose().unwrap();
        assert_eq!(d.len(), 3);

        let op = GateKind::Power(Box::new(StandardGate::H.into()), 0.5);
        assert!(op.decompose().is_err());
    }

    #[test]
    fn test_multi_controlled_x_bottoms_out() {
        fn expand(op: GateKind, depth: usize) -> usize {
            assert!(depth < 16, "decomposition does not terminate");
            if !matches!(op, GateKind::Control(..)) {
                return 1;
            }
            let d = op.decompose().unwrap();
            d.iter()
                .map(|i| expand(i.as_gate().unwrap().clone(), depth + 1))
                .sum()
        }

        let c4x = GateKind::from(StandardGate::X).control(4);
        assert!(expand(c4x, 0) > 1);

        let c3sx = GateKind::from(StandardGate::SX).control(3);
        assert!(expand(c3sx, 0) > 1);

        let c2h = GateKind::from(StandardGate::H).control(2);
        assert!(matches!(c2h.decompose(), Err(IrError::NoDecomposition(_))));
    }

    #[test]
    fn test_controlled_call_distributes() {
        let mut body = Circuit::with_size("pair", 2, 0);
        body.h(QubitId(0)).unwrap().cx(QubitId(0), QubitId(1)).unwrap();
        let decl = GateDecl::new("pair", vec![], body);
        let op = decl.call(vec![]).unwrap().control(1);

        let d = op.decompose().unwrap();
        assert_eq!(
            kinds(&d),
            vec![
                GateKind::Standard(StandardGate::CH),
                GateKind::Standard(StandardGate::CCX)
            ]
        );
        assert_eq!(d.instructions()[1].qubits, local_qubits([0, 1, 2]));
    }

    #[test]
    fn test_instruction_remaps_targets() {
        let inst = Instruction::gate(StandardGate::DCX, [QubitId(5), QubitId(2)]).unwrap();
        let d = inst.decompose().unwrap();
        assert_eq!(d.instructions()[0].qubits, vec![QubitId(5), QubitId(2)]);
        assert_eq!(d.instructions()[1].qubits, vec![QubitId(2), QubitId(5)]);
    }

    #[test]
    fn test_circuit_decompose_keeps_measurements() {
        let mut c = Circuit::with_size("c", 2, 1);
        c.gate(GateKind::from(StandardGate::S).power(2.0), [QubitId(0)])
            .unwrap()
            .measure(QubitId(0), ClbitId(0))
            .unwrap();
        let d = c.decompose().unwrap();
        assert_eq!(d.len(), 2);
        assert_eq!(
            d.instructions()[0].as_gate(),
            Some(&GateKind::Standard(StandardGate::P(ParameterExpression::Constant(PI))))
        );
        assert!(d.instructions()[1].is_measure());
        assert_eq!(d.num_qubits(), 2);
    }
}
