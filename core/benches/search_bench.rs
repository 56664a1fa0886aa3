use criterion::{criterion_group, criterion_main, Criterion};
use kb_core::tokenizer::tokenize;
use kb_core::{search, Document, Index};

const TEXT: &str = "Rivian operates the Rivian Adventure Network of DC fast chargers along \
    popular road trip routes and near trailheads. Waypoints chargers are open to all EVs. \
    The R1T and R1S support home charging with the Rivian Wall Charger, and battery \
    preconditioning helps keep charging speeds high in cold weather.";

fn corpus() -> Index {
    let docs = (0..200)
        .map(|i| Document::new(i.to_string(), format!("Page {i}"), TEXT.repeat(1 + i % 7), None))
        .collect();
    Index::build(docs, 1)
}

fn bench_tokenize(c: &mut Criterion) {
    c.bench_function("tokenize_paragraph", |b| b.iter(|| tokenize(TEXT)));
}

fn bench_search(c: &mut Criterion) {
    let idx = corpus();
    c.bench_function("search_exact", |b| b.iter(|| search("wall charger", &idx)));
    c.bench_function("search_fuzzy", |b| b.iter(|| search("precondtioning bateries", &idx)));
}

criterion_group!(benches, bench_tokenize, bench_search);
criterion_main!(benches);
