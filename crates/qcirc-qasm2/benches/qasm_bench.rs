//! Benchmarks for OpenQASM 2.0 loading and dumping
//!
//! Run with: cargo bench -p qcirc-qasm2

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use qcirc_ir::Circuit;
use qcirc_qasm2::{dumps, interpret, loads, parse_program, tokenize};

fn qft_source(n: u32) -> String {
    dumps(&Circuit::qft(n).unwrap()).unwrap()
}

/// Benchmark tokenizing
fn bench_tokenize(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");

    for n in &[4, 16, 64] {
        let source = qft_source(*n);
        group.bench_with_input(BenchmarkId::new("qft", n), &source, |b, src| {
            b.iter(|| tokenize(black_box(src)));
        });
    }

    group.finish();
}

/// Benchmark parsing and interpreting
fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");

    for n in &[4, 16, 64] {
        let source = qft_source(*n);
        group.bench_with_input(BenchmarkId::new("parse", n), &source, |b, src| {
            b.iter(|| parse_program(black_box(src), &[]).unwrap());
        });

        let program = parse_program(&source, &[]).unwrap();
        group.bench_with_input(BenchmarkId::new("interpret", n), &program, |b, p| {
            b.iter(|| interpret(black_box(p)).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("loads", n), &source, |b, src| {
            b.iter(|| loads(black_box(src)).unwrap());
        });
    }

    group.finish();
}

/// Benchmark dumping
fn bench_dump(c: &mut Criterion) {
    let mut group = c.benchmark_group("dump");

    for n in &[4, 16, 64] {
        let circuit = Circuit::qft(*n).unwrap();
        group.bench_with_input(BenchmarkId::new("qft", n), &circuit, |b, circ| {
            b.iter(|| dumps(black_box(circ)).unwrap());
        });
    }

    let declared = loads(
        r#"
        include "qelib1.inc";
        gate layer(theta) a,b,c { rx(theta) a; cx a,b; ry(theta/2) b; cx b,c; }
        qreg q[12];
        layer(0.1) q[0],q[1],q[2];
        layer(0.2) q[3],q[4],q[5];
        layer(0.3) q[6],q[7],q[8];
        layer(0.4) q[9],q[10],q[11];
        "#,
    )
    .unwrap();
    group.bench_function("declarations", |b| {
        b.iter(|| dumps(black_box(&declared)).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_tokenize, bench_load, bench_dump);
criterion_main!(benches);
