use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::fmt::Write;

use qasm2_rs::{loads, LoadOptions, Program};

/// A quantum Fourier transform over `size` qubits, followed by measurement.
fn qft(size: usize) -> String {
    let mut source = String::from("OPENQASM 2.0;\ninclude \"qelib1.inc\";\n");
    writeln!(source, "qreg q[{size}];\ncreg c[{size}];").unwrap();
    for target in 0..size {
        writeln!(source, "h q[{target}];").unwrap();
        for control in target + 1..size {
            let power = control - target;
            writeln!(source, "cu1(pi/2^{power}) q[{control}], q[{target}];").unwrap();
        }
    }
    writeln!(source, "barrier q;\nmeasure q -> c;").unwrap();
    source
}

fn benchmark_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for size in [8, 32, 128] {
        let source = qft(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &source, |b, source| {
            b.iter(|| {
                let _ = Program::parse(source, false);
            })
        });
    }
    group.finish();
}

fn benchmark_load(c: &mut Criterion) {
    let options = LoadOptions::default();
    let mut group = c.benchmark_group("load");
    for size in [8, 32, 128] {
        let source = qft(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &source, |b, source| {
            b.iter(|| {
                let _ = loads(source, &options);
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_parse, benchmark_load);
criterion_main!(benches);
