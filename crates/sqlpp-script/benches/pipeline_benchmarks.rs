//! Benchmarks for script expansion and statement assembly
//!
//! Measures the in-memory pipeline on generated scripts with a mix of
//! defines, conditional blocks and batches.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sqlpp_preprocess::SourceExpander;
use sqlpp_script::{ScriptPipeline, StatementAssembler};

/// Generate a script with N batches
fn generate_script(num_batches: usize) -> String {
    let mut script = String::new();
    script.push_str("#define SCHEMA analytics\n#define ACTIVE 1\n");

    for i in 0..num_batches {
        if i % 10 == 0 {
            script.push_str("#ifdef VERBOSE\nPRINT 'checkpoint';\ngo\n#end\n");
        }
        if i % 25 == 0 {
            script.push_str("@schema-tables \"orders\"\n");
        }
        script.push_str(&format!(
            "SELECT id, name\nFROM SCHEMA.table_{}\nWHERE active = ACTIVE;\ngo\n",
            i
        ));
    }

    script
}

fn bench_expand(c: &mut Criterion) {
    let mut group = c.benchmark_group("expand");

    for size in [100, 1_000, 10_000] {
        let script = generate_script(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &script, |b, script| {
            b.iter(|| {
                let lines = SourceExpander::new().expand(black_box(script), "bench.sql").unwrap();
                black_box(lines)
            });
        });
    }

    group.finish();
}

fn bench_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble");

    for size in [100, 1_000, 10_000] {
        let lines = SourceExpander::new().expand(&generate_script(size), "bench.sql").unwrap();
        let assembler = StatementAssembler::new();
        group.bench_with_input(BenchmarkId::from_parameter(size), &lines, |b, lines| {
            b.iter(|| black_box(assembler.assemble(lines.iter().cloned())));
        });
    }

    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let script = generate_script(1_000);
    let pipeline = ScriptPipeline::new();

    c.bench_function("compile_1000_batches", |b| {
        b.iter(|| black_box(pipeline.compile_str(black_box(&script), "bench.sql").unwrap()));
    });
}

criterion_group!(benches, bench_expand, bench_assemble, bench_compile);
criterion_main!(benches);
