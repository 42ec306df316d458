//! Built-in gate names and their IR constructors.

use qcirc_ir::{GateKind, ParameterExpression, StandardGate};

use crate::error::{QasmError, QasmResult};

/// Parameter and qubit counts of every built-in gate name.
const ARITIES: &[(&str, usize, u32)] = &[
    ("U", 3, 1),
    ("CX", 0, 2),
    ("u3", 3, 1),
    ("u2", 2, 1),
    ("u1", 1, 1),
    ("u", 3, 1),
    ("uphase", 3, 1),
    ("cx", 0, 2),
    ("id", 0, 1),
    ("p", 1, 1),
    ("x", 0, 1),
    ("y", 0, 1),
    ("z", 0, 1),
    ("h", 0, 1),
    ("s", 0, 1),
    ("sdg", 0, 1),
    ("t", 0, 1),
    ("tdg", 0, 1),
    ("rx", 1, 1),
    ("ry", 1, 1),
    ("rz", 1, 1),
    ("sx", 0, 1),
    ("sxdg", 0, 1),
    ("cz", 0, 2),
    ("cy", 0, 2),
    ("swap", 0, 2),
    ("ch", 0, 2),
    ("ccx", 0, 3),
    ("cswap", 0, 3),
    ("crx", 1, 2),
    ("cry", 1, 2),
    ("crz", 1, 2),
    ("cp", 1, 2),
    ("cs", 0, 2),
    ("csdg", 0, 2),
    ("csx", 0, 2),
    ("csxdg", 0, 2),
    ("cu", 4, 2),
    ("rxx", 1, 2),
    ("rzz", 1, 2),
    ("ryy", 1, 2),
    ("rzx", 1, 2),
    ("c3x", 0, 4),
    ("xxminusyy", 2, 2),
    ("xxplusyy", 2, 2),
    ("dcx", 0, 2),
    ("ecr", 0, 2),
    ("iswap", 0, 2),
    ("ccp", 1, 3),
    // Composite factories
    ("cu1", 1, 2),
    ("cu3", 3, 2),
    ("c4x", 0, 5),
    ("c3sqrtx", 0, 4),
];

/// `(parameters, qubits)` of a built-in gate, if `name` is one.
pub(crate) fn arity(name: &str) -> Option<(usize, u32)> {
    ARITIES
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|&(_, params, qubits)| (params, qubits))
}

/// Construct a built-in gate. Returns `Ok(None)` when `name` is not built in.
pub(crate) fn builtin_gate(
    name: &str,
    args: Vec<ParameterExpression>,
) -> QasmResult<Option<GateKind>> {
    let Some((num_params, _)) = arity(name) else {
        return Ok(None);
    };
    if args.len() != num_params {
        return Err(QasmError::Argument(format!(
            "gate '{name}' takes {num_params} parameters, got {}",
            args.len()
        )));
    }

    if let Some(kind) = composite(name, &args) {
        return Ok(Some(kind));
    }

    let mut it = args.into_iter();
    let mut p = || it.next().unwrap_or(ParameterExpression::Constant(0.0));
    let gate = match name {
        "U" | "u" | "uphase" => StandardGate::U(p(), p(), p()),
        "u3" => StandardGate::U3(p(), p(), p()),
        "u2" => StandardGate::U2(p(), p()),
        "u1" => StandardGate::U1(p()),
        "CX" | "cx" => StandardGate::CX,
        "id" => StandardGate::Id,
        "p" => StandardGate::P(p()),
        "x" => StandardGate::X,
        "y" => StandardGate::Y,
        "z" => StandardGate::Z,
        "h" => StandardGate::H,
        "s" => StandardGate::S,
        "sdg" => StandardGate::Sdg,
        "t" => StandardGate::T,
        "tdg" => StandardGate::Tdg,
        "rx" => StandardGate::Rx(p()),
        "ry" => StandardGate::Ry(p()),
        "rz" => StandardGate::Rz(p()),
        "sx" => StandardGate::SX,
        "sxdg" => StandardGate::SXdg,
        "cz" => StandardGate::CZ,
        "cy" => StandardGate::CY,
        "swap" => StandardGate::Swap,
        "ch" => StandardGate::CH,
        "ccx" => StandardGate::CCX,
        "cswap" => StandardGate::CSwap,
        "crx" => StandardGate::CRx(p()),
        "cry" => StandardGate::CRy(p()),
        "crz" => StandardGate::CRz(p()),
        "cp" => StandardGate::CP(p()),
        "cs" => StandardGate::CS,
        "csdg" => StandardGate::CSdg,
        "csx" => StandardGate::CSX,
        "csxdg" => StandardGate::CSXdg,
        "cu" => StandardGate::CU(p(), p(), p(), p()),
        "rxx" => StandardGate::RXX(p()),
        "rzz" => StandardGate::RZZ(p()),
        "ryy" => StandardGate::RYY(p()),
        "rzx" => StandardGate::RZX(p()),
        "c3x" => StandardGate::C3X,
        "xxminusyy" => StandardGate::XXminusYY(p(), p()),
        "xxplusyy" => StandardGate::XXplusYY(p(), p()),
        "dcx" => StandardGate::DCX,
        "ecr" => StandardGate::ECR,
        "iswap" => StandardGate::ISwap,
        "ccp" => StandardGate::CCP(p()),
        _ => return Ok(None),
    };
    Ok(Some(GateKind::Standard(gate)))
}

/// Gates built as controlled versions of another gate.
fn composite(name: &str, args: &[ParameterExpression]) -> Option<GateKind> {
    let base = match (name, args) {
        ("cu1", [lambda]) => GateKind::from(StandardGate::U1(lambda.clone())).control(1),
        ("cu3", [theta, phi, lambda]) => {
            GateKind::from(StandardGate::U3(theta.clone(), phi.clone(), lambda.clone())).control(1)
        }
        ("c4x", []) => GateKind::from(StandardGate::X).control(4),
        ("c3sqrtx", []) => GateKind::from(StandardGate::SX).control(3),
        _ => return None,
    };
    Some(base)
}
