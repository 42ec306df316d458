//! Property-based tests for OpenQASM 2.0 round-trips.
//!
//! Circuits built from built-in gates, measurements, resets and barriers must
//! come back from `dumps` then `loads` with the same instruction sequence.

use qcirc_ir::{Circuit, ClbitId, QubitId};
use qcirc_qasm2::{dumps, loads};
use proptest::prelude::*;
use std::f64::consts::PI;

/// Operations that can be applied to a circuit.
#[derive(Debug, Clone)]
enum Op {
    H(u32),
    X(u32),
    Rx(f64, u32),
    U(f64, f64, f64, u32),
    CX(u32, u32),
    Swap(u32, u32),
    Measure(u32),
    Reset(u32),
    Barrier(Vec<u32>),
}

impl Op {
    fn apply(self, circuit: &mut Circuit) {
        let _ = match self {
            Op::H(q) => circuit.h(QubitId(q)),
            Op::X(q) => circuit.x(QubitId(q)),
            Op::Rx(theta, q) => circuit.rx(theta, QubitId(q)),
            Op::U(theta, phi, lambda, q) => circuit.u(theta, phi, lambda, QubitId(q)),
            Op::CX(c, t) => circuit.cx(QubitId(c), QubitId(t)),
            Op::Swap(a, b) => circuit.swap(QubitId(a), QubitId(b)),
            Op::Measure(q) => circuit.measure(QubitId(q), ClbitId(q)),
            Op::Reset(q) => circuit.reset(QubitId(q)),
            Op::Barrier(qs) => circuit.barrier(qs.into_iter().map(QubitId)),
        };
    }
}

fn arb_angle() -> impl Strategy<Value = f64> {
    prop_oneof![
        -10.0_f64..10.0,
        Just(PI),
        Just(-PI / 2.0),
        Just(PI / 4.0),
        Just(1e-7),
        Just(0.0),
    ]
}

fn arb_op(num_qubits: u32) -> impl Strategy<Value = Op> {
    let q = 0..num_qubits;
    let pair = (0..num_qubits, 0..num_qubits).prop_filter("operands must differ", |(a, b)| a != b);
    prop_oneof![
        q.clone().prop_map(Op::H),
        q.clone().prop_map(Op::X),
        (arb_angle(), q.clone()).prop_map(|(t, q)| Op::Rx(t, q)),
        (arb_angle(), arb_angle(), arb_angle(), q.clone())
            .prop_map(|(t, p, l, q)| Op::U(t, p, l, q)),
        pair.clone().prop_map(|(c, t)| Op::CX(c, t)),
        pair.prop_map(|(a, b)| Op::Swap(a, b)),
        q.clone().prop_map(Op::Measure),
        q.clone().prop_map(Op::Reset),
        proptest::sample::subsequence((0..num_qubits).collect::<Vec<_>>(), 1..=num_qubits as usize)
            .prop_map(Op::Barrier),
    ]
}

fn arb_circuit() -> impl Strategy<Value = Circuit> {
    (2_u32..=5).prop_flat_map(|n| {
        prop::collection::vec(arb_op(n), 0..=20).prop_map(move |ops| {
            let mut circuit = Circuit::with_size("main", n, n);
            for op in ops {
                op.apply(&mut circuit);
            }
            circuit
        })
    })
}

proptest! {
    #[test]
    fn test_builtin_roundtrip_preserves_instructions(circuit in arb_circuit()) {
        let text = dumps(&circuit).expect("dump failed");
        let reloaded = loads(&text).expect("reload failed");

        prop_assert_eq!(reloaded.num_qubits(), circuit.num_qubits());
        prop_assert_eq!(reloaded.num_clbits(), circuit.num_clbits());
        prop_assert_eq!(reloaded.instructions(), circuit.instructions());
    }

    #[test]
    fn test_dump_is_deterministic(circuit in arb_circuit()) {
        prop_assert_eq!(dumps(&circuit).unwrap(), dumps(&circuit).unwrap());
    }

    #[test]
    fn test_dump_is_a_fixed_point(circuit in arb_circuit()) {
        let once = dumps(&circuit).unwrap();
        let twice = dumps(&loads(&once).unwrap()).unwrap();
        prop_assert_eq!(once, twice);
    }
}
