use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use speclink_document::{parse, validate};

fn document(requirements: usize) -> String {
    let mut text = String::from(
        "---\nid: SPEC-001\nfeature: Benchmark feature\nstatus: draft\nversion: 1.0.0\n---\n\n# Benchmark\n\n## 1. Overview\n\nText.\n\n## 2. Requirements (EARS Format)\n\n",
    );
    let shapes = [
        "The system shall do thing {n}.",
        "WHEN event {n} occurs, the system shall react.",
        "WHILE in state {n}, the system shall wait.",
        "WHERE feature {n} is enabled, the system shall show it.",
        "IF input {n} is invalid, THEN the system shall NOT save.",
    ];
    for n in 0..requirements {
        text.push_str("- ");
        text.push_str(&shapes[n % shapes.len()].replace("{n}", &n.to_string()));
        text.push('\n');
    }
    text.push_str("\n## 7. Traceability Matrix\n\n| Requirement | Code File | Test File | Status |\n|---|---|---|---|\n");
    text
}

fn bench_parse_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_validate");
    for size in [10, 100, 1000] {
        let raw = document(size);
        group.throughput(Throughput::Bytes(raw.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &raw, |b, raw| {
            b.iter(|| {
                let doc = parse(black_box(raw)).expect("benchmark document parses");
                black_box(validate(&doc))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_parse_validate);
criterion_main!(benches);
