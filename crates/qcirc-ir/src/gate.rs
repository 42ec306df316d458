//! Quantum gate types.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::sync::Arc;

use crate::circuit::Circuit;
use crate::decl::GateDecl;
use crate::error::{IrError, IrResult};
use crate::parameter::ParameterExpression;

/// Standard gates with known semantics and a fixed OpenQASM name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    // Single-qubit Pauli and Clifford gates
    /// Identity gate.
    Id,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// sqrt(X)-dagger gate.
    SXdg,

    // Single-qubit rotation gates
    /// Rotation around X axis.
    Rx(ParameterExpression),
    /// Rotation around Y axis.
    Ry(ParameterExpression),
    /// Rotation around Z axis.
    Rz(ParameterExpression),
    /// Phase gate.
    P(ParameterExpression),
    /// Legacy phase gate U1(λ).
    U1(ParameterExpression),
    /// Legacy U2(φ, λ) = U(π/2, φ, λ).
    U2(ParameterExpression, ParameterExpression),
    /// Legacy U3(θ, φ, λ).
    U3(
        ParameterExpression,
        ParameterExpression,
        ParameterExpression,
    ),
    /// Universal single-qubit gate U(θ, φ, λ), the OpenQASM primitive.
    U(
        ParameterExpression,
        ParameterExpression,
        ParameterExpression,
    ),

    // Two-qubit gates
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Y gate.
    CY,
    /// Controlled-Z gate.
    CZ,
    /// Controlled-Hadamard gate.
    CH,
    /// SWAP gate.
    Swap,
    /// iSWAP gate.
    ISwap,
    /// Double CNOT gate.
    DCX,
    /// Echoed cross-resonance gate.
    ECR,
    /// Controlled-S gate.
    CS,
    /// Controlled-S-dagger gate.
    CSdg,
    /// Controlled-sqrt(X) gate.
    CSX,
    /// Controlled-sqrt(X)-dagger gate.
    CSXdg,
    /// Controlled rotation around X.
    CRx(ParameterExpression),
    /// Controlled rotation around Y.
    CRy(ParameterExpression),
    /// Controlled rotation around Z.
    CRz(ParameterExpression),
    /// Controlled phase gate.
    CP(ParameterExpression),
    /// Controlled-U(θ, φ, λ) with global phase γ.
    CU(
        ParameterExpression,
        ParameterExpression,
        ParameterExpression,
        ParameterExpression,
    ),
    /// XX rotation gate.
    RXX(ParameterExpression),
    /// YY rotation gate.
    RYY(ParameterExpression),
    /// ZZ rotation gate.
    RZZ(ParameterExpression),
    /// ZX rotation gate.
    RZX(ParameterExpression),
    /// XX-YY interaction gate (θ, β).
    XXminusYY(ParameterExpression, ParameterExpression),
    /// XX+YY interaction gate (θ, β).
    XXplusYY(ParameterExpression, ParameterExpression),

    // Multi-qubit gates
    /// Toffoli gate (CCX).
    CCX,
    /// Fredkin gate (CSWAP).
    CSwap,
    /// Doubly controlled phase gate.
    CCP(ParameterExpression),
    /// Triply controlled X gate.
    C3X,
}

impl StandardGate {
    /// Get the OpenQASM name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::Id => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::SX => "sx",
            StandardGate::SXdg => "sxdg",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::P(_) => "p",
            StandardGate::U1(_) => "u1",
            StandardGate::U2(_, _) => "u2",
            StandardGate::U3(_, _, _) => "u3",
            StandardGate::U(_, _, _) => "U",
            StandardGate::CX => "cx",
            StandardGate::CY => "cy",
            StandardGate::CZ => "cz",
            StandardGate::CH => "ch",
            StandardGate::Swap => "swap",
            StandardGate::ISwap => "iswap",
            StandardGate::DCX => "dcx",
            StandardGate::ECR => "ecr",
            StandardGate::CS => "cs",
            StandardGate::CSdg => "csdg",
            StandardGate::CSX => "csx",
            StandardGate::CSXdg => "csxdg",
            StandardGate::CRx(_) => "crx",
            StandardGate::CRy(_) => "cry",
            StandardGate::CRz(_) => "crz",
            StandardGate::CP(_) => "cp",
            StandardGate::CU(_, _, _, _) => "cu",
            StandardGate::RXX(_) => "rxx",
            StandardGate::RYY(_) => "ryy",
            StandardGate::RZZ(_) => "rzz",
            StandardGate::RZX(_) => "rzx",
            StandardGate::XXminusYY(_, _) => "xxminusyy",
            StandardGate::XXplusYY(_, _) => "xxplusyy",
            StandardGate::CCX => "ccx",
            StandardGate::CSwap => "cswap",
            StandardGate::CCP(_) => "ccp",
            StandardGate::C3X => "c3x",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::Id
            | StandardGate::X
            | StandardGate::Y
            | StandardGate::Z
            | StandardGate::H
            | StandardGate::S
            | StandardGate::Sdg
            | StandardGate::T
            | StandardGate::Tdg
            | StandardGate::SX
            | StandardGate::SXdg
            | StandardGate::Rx(_)
            | StandardGate::Ry(_)
            | StandardGate::Rz(_)
            | StandardGate::P(_)
            | StandardGate::U1(_)
            | StandardGate::U2(_, _)
            | StandardGate::U3(_, _, _)
            | StandardGate::U(_, _, _) => 1,

            StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::CH
            | StandardGate::Swap
            | StandardGate::ISwap
            | StandardGate::DCX
            | StandardGate::ECR
            | StandardGate::CS
            | StandardGate::CSdg
            | StandardGate::CSX
            | StandardGate::CSXdg
            | StandardGate::CRx(_)
            | StandardGate::CRy(_)
            | StandardGate::CRz(_)
            | StandardGate::CP(_)
            | StandardGate::CU(_, _, _, _)
            | StandardGate::RXX(_)
            | StandardGate::RYY(_)
            | StandardGate::RZZ(_)
            | StandardGate::RZX(_)
            | StandardGate::XXminusYY(_, _)
            | StandardGate::XXplusYY(_, _) => 2,

            StandardGate::CCX | StandardGate::CSwap | StandardGate::CCP(_) => 3,

            StandardGate::C3X => 4,
        }
    }

    /// Get parameters of this gate, in OpenQASM argument order.
    pub fn parameters(&self) -> Vec<&ParameterExpression> {
        match self {
            StandardGate::Rx(p)
            | StandardGate::Ry(p)
            | StandardGate::Rz(p)
            | StandardGate::P(p)
            | StandardGate::U1(p)
            | StandardGate::CRx(p)
            | StandardGate::CRy(p)
            | StandardGate::CRz(p)
            | StandardGate::CP(p)
            | StandardGate::RXX(p)
            | StandardGate::RYY(p)
            | StandardGate::RZZ(p)
            | StandardGate::RZX(p)
            | StandardGate::CCP(p) => vec![p],

            StandardGate::U2(a, b)
            | StandardGate::XXminusYY(a, b)
            | StandardGate::XXplusYY(a, b) => vec![a, b],

            StandardGate::U3(a, b, c) | StandardGate::U(a, b, c) => vec![a, b, c],

            StandardGate::CU(a, b, c, d) => vec![a, b, c, d],

            _ => vec![],
        }
    }

    /// Check if this gate has symbolic parameters.
    pub fn is_parameterized(&self) -> bool {
        self.parameters().iter().any(|p| p.is_symbolic())
    }

    /// Rebuild the gate with `f` applied to every parameter.
    #[must_use]
    pub fn map_params(&self, mut f: impl FnMut(&ParameterExpression) -> ParameterExpression) -> Self {
        use StandardGate as G;
        match self {
            G::Rx(p) => G::Rx(f(p)),
            G::Ry(p) => G::Ry(f(p)),
            G::Rz(p) => G::Rz(f(p)),
            G::P(p) => G::P(f(p)),
            G::U1(p) => G::U1(f(p)),
            G::CRx(p) => G::CRx(f(p)),
            G::CRy(p) => G::CRy(f(p)),
            G::CRz(p) => G::CRz(f(p)),
            G::CP(p) => G::CP(f(p)),
            G::RXX(p) => G::RXX(f(p)),
            G::RYY(p) => G::RYY(f(p)),
            G::RZZ(p) => G::RZZ(f(p)),
            G::RZX(p) => G::RZX(f(p)),
            G::CCP(p) => G::CCP(f(p)),
            G::U2(a, b) => G::U2(f(a), f(b)),
            G::XXminusYY(a, b) => G::XXminusYY(f(a), f(b)),
            G::XXplusYY(a, b) => G::XXplusYY(f(a), f(b)),
            G::U3(a, b, c) => G::U3(f(a), f(b), f(c)),
            G::U(a, b, c) => G::U(f(a), f(b), f(c)),
            G::CU(a, b, c, d) => G::CU(f(a), f(b), f(c), f(d)),
            _ => self.clone(),
        }
    }

    /// The inverse gate, when it is itself a standard gate on the same qubits.
    pub fn inverse(&self) -> Option<StandardGate> {
        use StandardGate as G;
        let gate = match self {
            G::Id
            | G::X
            | G::Y
            | G::Z
            | G::H
            | G::CX
            | G::CY
            | G::CZ
            | G::CH
            | G::Swap
            | G::ECR
            | G::CCX
            | G::CSwap
            | G::C3X => self.clone(),
            G::S => G::Sdg,
            G::Sdg => G::S,
            G::T => G::Tdg,
            G::Tdg => G::T,
            G::SX => G::SXdg,
            G::SXdg => G::SX,
            G::CS => G::CSdg,
            G::CSdg => G::CS,
            G::CSX => G::CSXdg,
            G::CSXdg => G::CSX,
            G::Rx(_)
            | G::Ry(_)
            | G::Rz(_)
            | G::P(_)
            | G::U1(_)
            | G::CRx(_)
            | G::CRy(_)
            | G::CRz(_)
            | G::CP(_)
            | G::RXX(_)
            | G::RYY(_)
            | G::RZZ(_)
            | G::RZX(_)
            | G::CCP(_) => self.map_params(negate),
            G::U2(phi, lambda) => G::U3(
                ParameterExpression::Constant(-PI / 2.0),
                negate(lambda),
                negate(phi),
            ),
            G::U3(theta, phi, lambda) => G::U3(negate(theta), negate(lambda), negate(phi)),
            G::U(theta, phi, lambda) => G::U(negate(theta), negate(lambda), negate(phi)),
            G::CU(theta, phi, lambda, gamma) => {
                G::CU(negate(theta), negate(lambda), negate(phi), negate(gamma))
            }
            G::XXminusYY(theta, beta) => G::XXminusYY(negate(theta), beta.clone()),
            G::XXplusYY(theta, beta) => G::XXplusYY(negate(theta), beta.clone()),
            G::ISwap | G::DCX => return None,
        };
        Some(gate)
    }

    /// The gate raised to `exponent`, when that is a standard gate.
    pub fn power(&self, exponent: f64) -> Option<StandardGate> {
        use StandardGate as G;
        if exponent == 1.0 {
            return Some(self.clone());
        }
        if exponent == -1.0 {
            return self.inverse();
        }
        let gate = match self {
            G::Id => G::Id,
            G::X if exponent == 0.5 => G::SX,
            G::X if exponent == -0.5 => G::SXdg,
            G::Z => G::P(scale(&ParameterExpression::Pi, exponent)),
            G::S => G::P(scale(&ParameterExpression::Constant(PI / 2.0), exponent)),
            G::Sdg => G::P(scale(&ParameterExpression::Constant(-PI / 2.0), exponent)),
            G::T => G::P(scale(&ParameterExpression::Constant(PI / 4.0), exponent)),
            G::Tdg => G::P(scale(&ParameterExpression::Constant(-PI / 4.0), exponent)),
            G::P(lambda) | G::U1(lambda) => G::P(scale(lambda, exponent)),
            G::Rx(_)
            | G::Ry(_)
            | G::Rz(_)
            | G::CRx(_)
            | G::CRy(_)
            | G::CRz(_)
            | G::CP(_)
            | G::RXX(_)
            | G::RYY(_)
            | G::RZZ(_)
            | G::RZX(_)
            | G::CCP(_) => self.map_params(|p| scale(p, exponent)),
            _ => return None,
        };
        Some(gate)
    }

    /// The gate with `n` extra control qubits prepended, when that is a standard gate.
    pub fn controlled(&self, n: u32) -> Option<StandardGate> {
        use StandardGate as G;
        let gate = match (n, self) {
            (0, _) => self.clone(),
            (1, G::X) => G::CX,
            (2, G::X) | (1, G::CX) => G::CCX,
            (3, G::X) | (2, G::CX) | (1, G::CCX) => G::C3X,
            (1, G::Y) => G::CY,
            (1, G::Z) => G::CZ,
            (1, G::H) => G::CH,
            (1, G::Swap) => G::CSwap,
            (1, G::S) => G::CS,
            (1, G::Sdg) => G::CSdg,
            (1, G::SX) => G::CSX,
            (1, G::T) => G::CP(ParameterExpression::Constant(PI / 4.0)),
            (1, G::Tdg) => G::CP(ParameterExpression::Constant(-PI / 4.0)),
            (1, G::SXdg) => G::CSXdg,
            (1, G::Rx(theta)) => G::CRx(theta.clone()),
            (1, G::Ry(theta)) => G::CRy(theta.clone()),
            (1, G::Rz(theta)) => G::CRz(theta.clone()),
            (1, G::P(lambda) | G::U1(lambda)) => G::CP(lambda.clone()),
            (2, G::P(lambda) | G::U1(lambda)) | (1, G::CP(lambda)) => G::CCP(lambda.clone()),
            (1, G::U(theta, phi, lambda) | G::U3(theta, phi, lambda)) => G::CU(
                theta.clone(),
                phi.clone(),
                lambda.clone(),
                ParameterExpression::Constant(0.0),
            ),
            _ => return None,
        };
        Some(gate)
    }
}

fn negate(p: &ParameterExpression) -> ParameterExpression {
    (-p.clone()).simplify()
}

fn scale(p: &ParameterExpression, factor: f64) -> ParameterExpression {
    (p.clone() * ParameterExpression::Constant(factor)).simplify()
}

/// An application of a [`GateDecl`] to concrete arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct GateCall {
    /// The called declaration.
    pub decl: Arc<GateDecl>,
    /// Arguments, one per declared parameter.
    pub args: Vec<ParameterExpression>,
}

/// A user-defined operation outside the standard gate set.
///
/// Custom gates never have a direct OpenQASM spelling; serializers fall
/// back to their `definition`.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomGate {
    /// The name of the gate.
    pub name: String,
    /// The number of qubits it operates on.
    pub num_qubits: u32,
    /// Parameters of the gate.
    pub params: Vec<ParameterExpression>,
    /// Optional definition on local qubits `0..num_qubits`.
    pub definition: Option<Arc<Circuit>>,
}

impl CustomGate {
    /// Create a new custom gate.
    pub fn new(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            params: vec![],
            definition: None,
        }
    }

    /// Add parameters to the gate.
    #[must_use]
    pub fn with_params(mut self, params: Vec<ParameterExpression>) -> Self {
        self.params = params;
        self
    }

    /// Attach a definition circuit.
    ///
    /// Returns an error if the definition acts on more qubits than the gate.
    pub fn with_definition(mut self, definition: Circuit) -> IrResult<Self> {
        if definition.num_qubits() > self.num_qubits {
            return Err(IrError::QubitCountMismatch {
                gate_name: self.name,
                expected: self.num_qubits,
                got: definition.num_qubits(),
            });
        }
        self.definition = Some(Arc::new(definition));
        Ok(self)
    }
}

/// A unitary operation: a standard gate, a declaration call, a custom
/// gate, or a wrapper around another operation.
#[derive(Debug, Clone, PartialEq)]
pub enum GateKind {
    /// A standard gate with known semantics.
    Standard(StandardGate),
    /// A call to a gate declaration.
    Call(GateCall),
    /// A custom user-defined gate.
    Custom(CustomGate),
    /// Adjoint of an operation.
    Inverse(Box<GateKind>),
    /// An operation raised to a real power.
    Power(Box<GateKind>, f64),
    /// An operation with extra control qubits, placed first.
    Control(u32, Box<GateKind>),
}

impl GateKind {
    /// Get the name of this gate.
    pub fn name(&self) -> String {
        match self {
            GateKind::Standard(g) => g.name().to_string(),
            GateKind::Call(c) => c.decl.name().to_string(),
            GateKind::Custom(g) => g.name.clone(),
            GateKind::Inverse(op) => format!("{}†", op.name()),
            GateKind::Power(op, k) => format!("{}^{k}", op.name()),
            GateKind::Control(1, op) => format!("c{}", op.name()),
            GateKind::Control(n, op) => format!("c{n}{}", op.name()),
        }
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> u32 {
        match self {
            GateKind::Standard(g) => g.num_qubits(),
            GateKind::Call(c) => c.decl.num_qubits(),
            GateKind::Custom(g) => g.num_qubits,
            GateKind::Inverse(op) | GateKind::Power(op, _) => op.num_qubits(),
            GateKind::Control(n, op) => n + op.num_qubits(),
        }
    }

    /// Get parameters of this gate.
    pub fn parameters(&self) -> Vec<ParameterExpression> {
        match self {
            GateKind::Standard(g) => g.parameters().into_iter().cloned().collect(),
            GateKind::Call(c) => c.args.clone(),
            GateKind::Custom(g) => g.params.clone(),
            GateKind::Inverse(op) | GateKind::Power(op, _) | GateKind::Control(_, op) => {
                op.parameters()
            }
        }
    }

    /// Adjoint, folded into a standard gate where one exists.
    #[must_use]
    pub fn inverse(self) -> GateKind {
        match self {
            GateKind::Standard(g) => match g.inverse() {
                Some(inv) => GateKind::Standard(inv),
                None => GateKind::Inverse(Box::new(GateKind::Standard(g))),
            },
            GateKind::Inverse(op) => *op,
            other => GateKind::Inverse(Box::new(other)),
        }
    }

    /// Power, folded into a standard gate where one exists.
    #[must_use]
    pub fn power(self, exponent: f64) -> GateKind {
        if exponent == 1.0 {
            return self;
        }
        match self {
            GateKind::Standard(g) => match g.power(exponent) {
                Some(p) => GateKind::Standard(p),
                None => GateKind::Power(Box::new(GateKind::Standard(g)), exponent),
            },
            GateKind::Power(op, k) => op.power(k * exponent),
            other => GateKind::Power(Box::new(other), exponent),
        }
    }

    /// Add `n` control qubits, folded into a standard gate where one exists.
    #[must_use]
    pub fn control(self, n: u32) -> GateKind {
        if n == 0 {
            return self;
        }
        match self {
            GateKind::Standard(g) => match g.controlled(n) {
                Some(c) => GateKind::Standard(c),
                None => GateKind::Control(n, Box::new(GateKind::Standard(g))),
            },
            GateKind::Control(m, op) => op.control(n + m),
            other => GateKind::Control(n, Box::new(other)),
        }
    }

    /// Check if this is a standard gate.
    pub fn is_standard(&self) -> bool {
        matches!(self, GateKind::Standard(_))
    }
}

impl From<StandardGate> for GateKind {
    fn from(gate: StandardGate) -> Self {
        GateKind::Standard(gate)
    }
}

impl From<CustomGate> for GateKind {
    fn from(gate: CustomGate) -> Self {
        GateKind::Custom(gate)
    }
}

impl From<GateCall> for GateKind {
    fn from(call: GateCall) -> Self {
        GateKind::Call(call)
    }
}
