//! Benchmarks for template expansion.
#![cfg_attr(
    test,
    allow(
        clippy::missing_panics_doc,
        clippy::missing_errors_doc,
        reason = "Allow for tests"
    )
)]

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use mirage_deps::serde_json::json;
use mirage_template::TemplateProcessor;

/// Benchmark placeholder-only documents
fn bench_placeholders(criterion: &mut Criterion) {
    let processor = TemplateProcessor::with_seed(1);
    let document = json!({
        "id": "{{uuid}}",
        "name": "{{person.fullName}}",
        "email": "{{internet.email}}",
        "bio": "{{lorem.paragraph}}",
        "greeting": "Hello {{person.fullName}}, you have {{number.int(1,99)}} messages",
    });

    criterion.bench_function("expand_placeholders", |bencher| {
        bencher.iter(|| {
            processor
                .expand(black_box(&document))
                .unwrap_or_else(|err| panic!("Expansion failed: {err}"))
        });
    });
}

/// Benchmark `generate` directives at increasing row counts
fn bench_generate(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("expand_generate");
    let processor = TemplateProcessor::with_seed(2);

    for count in [10_u64, 100, 1_000] {
        let document = json!({
            "generate": {
                "count": count,
                "template": {
                    "id": "{{uuid}}",
                    "title": "{{lorem.sentence}}",
                    "createdAt": "{{date.recent}}"
                }
            }
        });
        group.throughput(Throughput::Elements(count));
        group.bench_with_input(BenchmarkId::from_parameter(count), &document, |bencher, document| {
            bencher.iter(|| {
                processor
                    .expand(black_box(document))
                    .unwrap_or_else(|err| panic!("Expansion failed: {err}"))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_placeholders, bench_generate);
criterion_main!(benches);
