//! Expression Benchmarks
//!
//! Criterion benchmarks for parsing, compiling and evaluating formulas, to
//! confirm evaluation stays well inside the per-report budget.

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tabletfx_expr::prelude::*;

const SMOOTHING: &str = "x + (x - lx) * 0.5";
const HEAVY: &str = "clamp(sqrt((x - lx)^2 + (y - ly)^2) * sin(x / mx * pi) + max(x, lx), 0, mx)";

fn schema() -> VariableSchema {
    VariableSchema::new(["x", "y", "lx", "ly", "mx", "my"])
}

fn compiled(source: &str) -> CompiledExpression {
    match compile_formula(source, &schema()) {
        Ok(expr) => expr,
        Err(e) => panic!("benchmark formula failed to compile: {e}"),
    }
}

fn bench_parse_and_compile(c: &mut Criterion) {
    let schema = schema();
    c.bench_function("compile_heavy_formula", |b| {
        b.iter(|| black_box(compile_formula(black_box(HEAVY), &schema).is_ok()))
    });
}

fn bench_call_with_stack(c: &mut Criterion) {
    let args = [7600.0, 4750.0, 7590.0, 4740.0, 15200.0, 9500.0];

    let smoothing = compiled(SMOOTHING);
    let mut stack = EvalStack::with_capacity(smoothing.max_stack());
    c.bench_function("call_smoothing", |b| {
        b.iter(|| black_box(smoothing.call_with(black_box(&args), &mut stack)))
    });

    let heavy = compiled(HEAVY);
    let mut stack = EvalStack::with_capacity(heavy.max_stack());
    c.bench_function("call_heavy", |b| {
        b.iter(|| black_box(heavy.call_with(black_box(&args), &mut stack)))
    });
}

criterion_group!(benches, bench_parse_and_compile, bench_call_with_stack);
criterion_main!(benches);
