//! End-to-end query throughput over stores of a few different sizes.
//!
//! Run with: cargo bench --package sparql --bench select_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rdf_model::{Term, Triple};
use sparql::{execute_select, prepare, ExecutionControl};
use storage::TripleStore;

fn build_store(note_count: usize) -> TripleStore {
    let mut store = TripleStore::new();
    let task_class = Term::iri("http://ex/Task");
    let type_pred = Term::iri("http://ex/type");
    let priority_pred = Term::iri("http://ex/priority");
    for i in 0..note_count {
        let note = Term::iri(format!("http://ex/note{i}"));
        store.add(Triple::new(note.clone(), type_pred.clone(), task_class.clone()));
        if i % 3 == 0 {
            store.add(Triple::new(note, priority_pred.clone(), Term::plain_literal("high")));
        }
    }
    store
}

fn benchmark_direct_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_direct_match");
    for size in [100, 1_000, 10_000].iter() {
        let store = build_store(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let prepared = prepare("PREFIX ex: <http://ex/> SELECT ?n WHERE { ?n ex:type ex:Task }", &store).unwrap();
                let results: Vec<_> = execute_select(&prepared, &store, ExecutionControl::unbounded())
                    .unwrap()
                    .collect::<Result<Vec<_>, _>>()
                    .unwrap();
                black_box(results)
            });
        });
    }
    group.finish();
}

fn benchmark_optional_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_optional_join");
    let store = build_store(5_000);
    group.bench_function("optional_priority", |b| {
        b.iter(|| {
            let prepared = prepare(
                "PREFIX ex: <http://ex/> SELECT ?n ?p WHERE { ?n ex:type ex:Task . OPTIONAL { ?n ex:priority ?p } }",
                &store,
            )
            .unwrap();
            let results: Vec<_> = execute_select(&prepared, &store, ExecutionControl::unbounded())
                .unwrap()
                .collect::<Result<Vec<_>, _>>()
                .unwrap();
            black_box(results)
        });
    });
    group.finish();
}

criterion_group!(benches, benchmark_direct_match, benchmark_optional_join);
criterion_main!(benches);
