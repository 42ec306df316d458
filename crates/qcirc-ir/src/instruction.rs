//! Circuit instructions combining operations with operands.

use rustc_hash::FxHashSet;

use crate::bitstring::BitString;
use crate::error::{IrError, IrResult};
use crate::gate::{GateKind, StandardGate};
use crate::qubit::{ClbitId, QubitId, ZVarId};

/// The kind of instruction in a circuit.
#[derive(Debug, Clone, PartialEq)]
pub enum InstructionKind {
    /// A unitary operation.
    Gate(GateKind),
    /// Measurement of one qubit into one classical bit.
    Measure,
    /// Reset qubit to |0⟩.
    Reset,
    /// Barrier (synchronization point) over any number of qubits.
    Barrier,
    /// An operation applied only when the condition bits equal `value`.
    ///
    /// The instruction's classical bits are the inner operation's bits
    /// followed by the `value.len()` condition bits.
    IfStatement {
        /// The conditioned operation.
        op: Box<InstructionKind>,
        /// Pattern the condition bits must match.
        value: BitString,
    },
    /// Store the amplitude of a basis state into a z-register variable.
    Amplitude(BitString),
}

impl InstructionKind {
    /// Get the name of the instruction kind.
    pub fn name(&self) -> String {
        match self {
            InstructionKind::Gate(g) => g.name(),
            InstructionKind::Measure => "measure".to_string(),
            InstructionKind::Reset => "reset".to_string(),
            InstructionKind::Barrier => "barrier".to_string(),
            InstructionKind::IfStatement { op, .. } => format!("if {}", op.name()),
            InstructionKind::Amplitude(_) => "amplitude".to_string(),
        }
    }

    /// Fixed qubit arity, or `None` for variadic kinds.
    pub fn num_qubits(&self) -> Option<u32> {
        match self {
            InstructionKind::Gate(g) => Some(g.num_qubits()),
            InstructionKind::Measure | InstructionKind::Reset => Some(1),
            InstructionKind::Barrier => None,
            InstructionKind::IfStatement { op, .. } => op.num_qubits(),
            InstructionKind::Amplitude(_) => Some(0),
        }
    }

    /// Number of classical bits the kind reads or writes.
    pub fn num_clbits(&self) -> u32 {
        match self {
            InstructionKind::Measure => 1,
            InstructionKind::IfStatement { op, value } => {
                op.num_clbits() + u32::try_from(value.len()).unwrap_or(u32::MAX)
            }
            _ => 0,
        }
    }

    /// Number of z-register variables the kind writes.
    pub fn num_zvars(&self) -> u32 {
        match self {
            InstructionKind::Amplitude(_) => 1,
            InstructionKind::IfStatement { op, .. } => op.num_zvars(),
            _ => 0,
        }
    }
}

impl From<GateKind> for InstructionKind {
    fn from(gate: GateKind) -> Self {
        InstructionKind::Gate(gate)
    }
}

impl From<StandardGate> for InstructionKind {
    fn from(gate: StandardGate) -> Self {
        InstructionKind::Gate(GateKind::Standard(gate))
    }
}

/// A complete instruction with operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// The kind of instruction.
    pub kind: InstructionKind,
    /// Qubits this instruction operates on.
    pub qubits: Vec<QubitId>,
    /// Classical bits this instruction operates on.
    pub clbits: Vec<ClbitId>,
    /// Z-register variables this instruction writes.
    pub zvars: Vec<ZVarId>,
}

impl Instruction {
    /// Create an instruction, validating operand counts and duplicates.
    pub fn new(
        kind: impl Into<InstructionKind>,
        qubits: Vec<QubitId>,
        clbits: Vec<ClbitId>,
    ) -> IrResult<Self> {
        Self::with_zvars(kind, qubits, clbits, vec![])
    }

    /// Create an instruction that also writes z-register variables.
    pub fn with_zvars(
        kind: impl Into<InstructionKind>,
        qubits: Vec<QubitId>,
        clbits: Vec<ClbitId>,
        zvars: Vec<ZVarId>,
    ) -> IrResult<Self> {
        let kind = kind.into();
        let got = len_u32(qubits.len());
        match kind.num_qubits() {
            Some(expected) if expected != got => {
                return Err(IrError::QubitCountMismatch {
                    gate_name: kind.name(),
                    expected,
                    got,
                });
            }
            None if qubits.is_empty() => {
                return Err(IrError::QubitCountMismatch {
                    gate_name: kind.name(),
                    expected: 1,
                    got: 0,
                });
            }
            _ => {}
        }
        if kind.num_clbits() != len_u32(clbits.len()) {
            return Err(IrError::ClbitCountMismatch {
                op_name: kind.name(),
                expected: kind.num_clbits(),
                got: len_u32(clbits.len()),
            });
        }
        if kind.num_zvars() != len_u32(zvars.len()) {
            return Err(IrError::ClbitCountMismatch {
                op_name: kind.name(),
                expected: kind.num_zvars(),
                got: len_u32(zvars.len()),
            });
        }

        let mut seen = FxHashSet::default();
        for q in &qubits {
            if !seen.insert(*q) {
                return Err(IrError::DuplicateQubit {
                    qubit: *q,
                    gate_name: Some(kind.name()),
                });
            }
        }
        // Condition bits may overlap the conditioned operation's own bits.
        let exclusive = match &kind {
            InstructionKind::IfStatement { op, .. } => op.num_clbits() as usize,
            _ => clbits.len(),
        };
        let mut seen = FxHashSet::default();
        for c in &clbits[..exclusive] {
            if !seen.insert(*c) {
                return Err(IrError::DuplicateClbit {
                    clbit: *c,
                    gate_name: Some(kind.name()),
                });
            }
        }

        Ok(Self {
            kind,
            qubits,
            clbits,
            zvars,
        })
    }

    /// Create a gate instruction.
    pub fn gate(gate: impl Into<GateKind>, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<Self> {
        Self::new(InstructionKind::Gate(gate.into()), qubits.into_iter().collect(), vec![])
    }

    /// Create a measurement instruction.
    pub fn measure(qubit: QubitId, clbit: ClbitId) -> Self {
        Self {
            kind: InstructionKind::Measure,
            qubits: vec![qubit],
            clbits: vec![clbit],
            zvars: vec![],
        }
    }

    /// Create a reset instruction.
    pub fn reset(qubit: QubitId) -> Self {
        Self {
            kind: InstructionKind::Reset,
            qubits: vec![qubit],
            clbits: vec![],
            zvars: vec![],
        }
    }

    /// Create a barrier instruction.
    pub fn barrier(qubits: impl IntoIterator<Item = QubitId>) -> IrResult<Self> {
        Self::new(InstructionKind::Barrier, qubits.into_iter().collect(), vec![])
    }

    /// Wrap an instruction in a classical condition on `condition` bits.
    pub fn conditional(inner: Instruction, value: BitString, condition: Vec<ClbitId>) -> IrResult<Self> {
        let Instruction {
            kind,
            qubits,
            mut clbits,
            zvars,
        } = inner;
        clbits.extend(condition);
        Self::with_zvars(
            InstructionKind::IfStatement {
                op: Box::new(kind),
                value,
            },
            qubits,
            clbits,
            zvars,
        )
    }

    /// Create an amplitude instruction writing into `zvar`.
    pub fn amplitude(state: BitString, zvar: ZVarId) -> Self {
        Self {
            kind: InstructionKind::Amplitude(state),
            qubits: vec![],
            clbits: vec![],
            zvars: vec![zvar],
        }
    }

    /// Check if this is a gate instruction.
    pub fn is_gate(&self) -> bool {
        matches!(self.kind, InstructionKind::Gate(_))
    }

    /// Check if this is a measurement.
    pub fn is_measure(&self) -> bool {
        matches!(self.kind, InstructionKind::Measure)
    }

    /// Check if this is a reset.
    pub fn is_reset(&self) -> bool {
        matches!(self.kind, InstructionKind::Reset)
    }

    /// Check if this is a barrier.
    pub fn is_barrier(&self) -> bool {
        matches!(self.kind, InstructionKind::Barrier)
    }

    /// Check if this is a conditional instruction.
    pub fn is_conditional(&self) -> bool {
        matches!(self.kind, InstructionKind::IfStatement { .. })
    }

    /// Get the gate if this is a gate instruction.
    pub fn as_gate(&self) -> Option<&GateKind> {
        match &self.kind {
            InstructionKind::Gate(g) => Some(g),
            _ => None,
        }
    }

    /// Get the name of the instruction.
    pub fn name(&self) -> String {
        self.kind.name()
    }
}

fn len_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_instruction() {
        let inst = Instruction::gate(StandardGate::H, [QubitId(0)]).unwrap();
        assert!(inst.is_gate());
        assert_eq!(inst.qubits.len(), 1);
        assert_eq!(inst.name(), "h");
    }

    #[test]
    fn test_arity_checked() {
        let err = Instruction::gate(StandardGate::CX, [QubitId(0)]).unwrap_err();
        assert!(matches!(err, IrError::QubitCountMismatch { expected: 2, got: 1, .. }));

        let err = Instruction::gate(StandardGate::CX, [QubitId(1), QubitId(1)]).unwrap_err();
        assert!(matches!(err, IrError::DuplicateQubit { .. }));
    }

    #[test]
    fn test_barrier_instruction() {
        let inst = Instruction::barrier([QubitId(0), QubitId(1), QubitId(2)]).unwrap();
        assert!(inst.is_barrier());
        assert_eq!(inst.qubits.len(), 3);
        assert!(Instruction::barrier([]).is_err());
    }

    #[test]
    fn test_conditional_layout() {
        let inner = Instruction::measure(QubitId(0), ClbitId(2));
        let inst = Instruction::conditional(
            inner,
            BitString::from_int(2, 1),
            vec![ClbitId(0), ClbitId(1)],
        )
        .unwrap();
        assert!(inst.is_conditional());
        assert_eq!(inst.clbits, vec![ClbitId(2), ClbitId(0), ClbitId(1)]);
        assert_eq!(inst.kind.num_clbits(), 3);

        let overlapping = Instruction::conditional(
            Instruction::measure(QubitId(0), ClbitId(0)),
            BitString::from_int(1, 1),
            vec![ClbitId(0)],
        );
        assert!(overlapping.is_ok());
    }

    #[test]
    fn test_amplitude_uses_zvar() {
        let inst = Instruction::amplitude(BitString::zeros(2), ZVarId(0));
        assert_eq!(inst.kind.num_zvars(), 1);
        assert!(inst.qubits.is_empty());
    }
}
