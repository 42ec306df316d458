//! High-level circuit builder API.

use crate::bitstring::BitString;
use crate::error::IrResult;
use crate::gate::{GateKind, StandardGate};
use crate::instruction::{Instruction, InstructionKind};
use crate::parameter::ParameterExpression;
use crate::qubit::{ClbitId, QubitId, ZVarId};

/// A quantum circuit: an ordered instruction list over flat qubit,
/// classical bit and z-variable index spaces.
///
/// The index spaces grow to cover every pushed instruction, and can be
/// reserved up front with [`Circuit::with_size`] or [`Circuit::ensure_size`].
#[derive(Debug, Clone, PartialEq)]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Instructions in program order.
    instructions: Vec<Instruction>,
    num_qubits: u32,
    num_clbits: u32,
    num_zvars: u32,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: vec![],
            num_qubits: 0,
            num_clbits: 0,
            num_zvars: 0,
        }
    }

    /// Create a circuit with reserved qubits and classical bits.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        let mut circuit = Self::new(name);
        circuit.ensure_size(num_qubits, num_clbits);
        circuit
    }

    /// Grow the index spaces to at least the given sizes.
    pub fn ensure_size(&mut self, num_qubits: u32, num_clbits: u32) {
        self.num_qubits = self.num_qubits.max(num_qubits);
        self.num_clbits = self.num_clbits.max(num_clbits);
    }

    /// Validate and append an instruction.
    pub fn push(
        &mut self,
        kind: impl Into<InstructionKind>,
        qubits: impl IntoIterator<Item = QubitId>,
        clbits: impl IntoIterator<Item = ClbitId>,
    ) -> IrResult<&mut Self> {
        let inst = Instruction::new(
            kind,
            qubits.into_iter().collect(),
            clbits.into_iter().collect(),
        )?;
        Ok(self.push_instruction(inst))
    }

    /// Append an already validated instruction.
    pub fn push_instruction(&mut self, inst: Instruction) -> &mut Self {
        if let Some(max) = inst.qubits.iter().map(|q| q.0 + 1).max() {
            self.num_qubits = self.num_qubits.max(max);
        }
        if let Some(max) = inst.clbits.iter().map(|c| c.0 + 1).max() {
            self.num_clbits = self.num_clbits.max(max);
        }
        if let Some(max) = inst.zvars.iter().map(|z| z.0 + 1).max() {
            self.num_zvars = self.num_zvars.max(max);
        }
        self.instructions.push(inst);
        self
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::H, [qubit])
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::X, [qubit])
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Y, [qubit])
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Z, [qubit])
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::S, [qubit])
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::T, [qubit])
    }

    /// Apply sqrt(X) gate.
    pub fn sx(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::SX, [qubit])
    }

    /// Apply RX rotation.
    pub fn rx(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(StandardGate::Rx(theta.into()), [qubit])
    }

    /// Apply RY rotation.
    pub fn ry(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(StandardGate::Ry(theta.into()), [qubit])
    }

    /// Apply RZ rotation.
    pub fn rz(
        &mut self,
        lambda: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(StandardGate::Rz(lambda.into()), [qubit])
    }

    /// Apply phase gate.
    pub fn p(
        &mut self,
        lambda: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(StandardGate::P(lambda.into()), [qubit])
    }

    /// Apply the universal U(θ, φ, λ) gate.
    pub fn u(
        &mut self,
        theta: impl Into<ParameterExpression>,
        phi: impl Into<ParameterExpression>,
        lambda: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(
            StandardGate::U(theta.into(), phi.into(), lambda.into()),
            [qubit],
        )
    }

    // =========================================================================
    // Multi-qubit gates
    // =========================================================================

    /// Apply CNOT gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::CX, [control, target])
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::CZ, [control, target])
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Swap, [q1, q2])
    }

    /// Apply controlled phase gate.
    pub fn cp(
        &mut self,
        lambda: impl Into<ParameterExpression>,
        control: QubitId,
        target: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(StandardGate::CP(lambda.into()), [control, target])
    }

    /// Apply Toffoli gate.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::CCX, [c1, c2, target])
    }

    /// Apply any unitary operation.
    pub fn gate(
        &mut self,
        gate: impl Into<GateKind>,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        let inst = Instruction::gate(gate, qubits)?;
        Ok(self.push_instruction(inst))
    }

    // =========================================================================
    // Non-unitary instructions
    // =========================================================================

    /// Measure a qubit into a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        Ok(self.push_instruction(Instruction::measure(qubit, clbit)))
    }

    /// Reset a qubit to |0⟩.
    pub fn reset(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        Ok(self.push_instruction(Instruction::reset(qubit)))
    }

    /// Insert a barrier.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<&mut Self> {
        let inst = Instruction::barrier(qubits)?;
        Ok(self.push_instruction(inst))
    }

    /// Store the amplitude of `state` into a z-register variable.
    pub fn amplitude(&mut self, state: BitString, zvar: ZVarId) -> IrResult<&mut Self> {
        Ok(self.push_instruction(Instruction::amplitude(state, zvar)))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> u32 {
        self.num_clbits
    }

    /// Get the number of z-register variables.
    pub fn num_zvars(&self) -> u32 {
        self.num_zvars
    }

    /// Instructions in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Iterate over instructions in program order.
    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    // =========================================================================
    // Common circuits
    // =========================================================================

    /// Create a Bell state circuit.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::with_size("bell", 2, 2);
        let q0 = QubitId(0);
        let q1 = QubitId(1);

        circuit
            .h(q0)?
            .cx(q0, q1)?
            .measure(q0, ClbitId(0))?
            .measure(q1, ClbitId(1))?;

        Ok(circuit)
    }

    /// Create a GHZ state circuit.
    pub fn ghz(n: u32) -> IrResult<Self> {
        let mut circuit = Self::with_size("ghz", n, n);
        if n == 0 {
            return Ok(circuit);
        }

        circuit.h(QubitId(0))?;
        for i in 0..n - 1 {
            circuit.cx(QubitId(i), QubitId(i + 1))?;
        }
        for i in 0..n {
            circuit.measure(QubitId(i), ClbitId(i))?;
        }

        Ok(circuit)
    }

    /// Create a QFT circuit (without measurements).
    pub fn qft(n: u32) -> IrResult<Self> {
        use std::f64::consts::PI;

        let mut circuit = Self::with_size("qft", n, 0);

        for i in 0..n {
            circuit.h(QubitId(i))?;
            for j in (i + 1)..n {
                let angle = PI / f64::from(1u32 << (j - i).min(31));
                circuit.cp(angle, QubitId(j), QubitId(i))?;
            }
        }

        for i in 0..n / 2 {
            circuit.swap(QubitId(i), QubitId(n - 1 - i))?;
        }

        Ok(circuit)
    }
}

impl<'a> IntoIterator for &'a Circuit {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_new_circuit() {
        let circuit = Circuit::new("test");
        assert_eq!(circuit.name(), "test");
        assert_eq!(circuit.num_qubits(), 0);
        assert_eq!(circuit.num_clbits(), 0);
        assert!(circuit.is_empty());
    }

    #[test]
    fn test_sizes_grow_with_targets() {
        let mut circuit = Circuit::with_size("test", 1, 0);
        circuit.cx(QubitId(0), QubitId(3)).unwrap();
        circuit.measure(QubitId(0), ClbitId(4)).unwrap();
        assert_eq!(circuit.num_qubits(), 4);
        assert_eq!(circuit.num_clbits(), 5);

        circuit.ensure_size(2, 2);
        assert_eq!(circuit.num_qubits(), 4);
    }

    #[test]
    fn test_bell_state() {
        let circuit = Circuit::bell().unwrap();
        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.num_clbits(), 2);
        let names: Vec<_> = circuit.iter().map(Instruction::name).collect();
        assert_eq!(names, vec!["h", "cx", "measure", "measure"]);
    }

    #[test]
    fn test_ghz_state() {
        let circuit = Circuit::ghz(5).unwrap();
        assert_eq!(circuit.num_qubits(), 5);
        assert_eq!(circuit.len(), 1 + 4 + 5);
    }

    #[test]
    fn test_parameterized_gate() {
        let mut circuit = Circuit::with_size("test", 1, 0);
        circuit.rx(PI / 2.0, QubitId(0)).unwrap();
        circuit
            .ry(ParameterExpression::symbol("theta"), QubitId(0))
            .unwrap();

        assert_eq!(circuit.len(), 2);
        assert!(circuit.instructions()[1].as_gate().unwrap().parameters()[0].is_symbolic());
    }

    #[test]
    fn test_push_validates() {
        let mut circuit = Circuit::new("test");
        assert!(
            circuit
                .push(StandardGate::H, [QubitId(0), QubitId(1)], Vec::<ClbitId>::new())
                .is_err()
        );
        assert!(circuit.is_empty());
    }

    #[test]
    fn test_zvars_counted() {
        let mut circuit = Circuit::new("test");
        circuit.amplitude(BitString::zeros(1), ZVarId(2)).unwrap();
        assert_eq!(circuit.num_zvars(), 3);
    }
}
