//! Throughput of the core store operations at a few input sizes.
//!
//! Run with: cargo bench --package storage --bench triple_store_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rdf_model::{Dictionary, Term, Triple};
use storage::{TermPattern, TriplePattern, TripleStore};

fn benchmark_triple_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("triple_insert");

    for size in [100, 1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut store = TripleStore::new();
                for i in 0..size {
                    let subject = Term::iri(format!("http://example.org/subject{i}"));
                    let predicate = Term::iri("http://example.org/predicate");
                    let object = Term::iri(format!("http://example.org/object{i}"));
                    store.add(Triple::new(subject, predicate, object));
                }
                black_box(store)
            });
        });
    }

    group.finish();
}

fn benchmark_pattern_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("pattern_lookup");

    let mut store = TripleStore::new();
    let predicate = Term::iri("http://example.org/predicate");
    for i in 0..10_000 {
        let subject = Term::iri(format!("http://example.org/subject{i}"));
        let object = Term::iri(format!("http://example.org/object{i}"));
        store.add(Triple::new(subject, predicate.clone(), object));
    }

    group.bench_function("lookup_by_subject", |b| {
        let target = Term::iri("http://example.org/subject5000");
        let pattern = TriplePattern::new(TermPattern::Concrete(target), TermPattern::Any, TermPattern::Any);
        b.iter(|| {
            let matches: Vec<_> = store.match_pattern(&pattern).collect();
            black_box(matches)
        });
    });

    group.bench_function("lookup_by_predicate", |b| {
        let pattern = TriplePattern::new(TermPattern::Any, TermPattern::Concrete(predicate.clone()), TermPattern::Any);
        b.iter(|| {
            let matches: Vec<_> = store.match_pattern(&pattern).collect();
            black_box(matches)
        });
    });

    group.finish();
}

fn benchmark_dictionary_intern(c: &mut Criterion) {
    let mut group = c.benchmark_group("dictionary");

    group.bench_function("intern_new", |b| {
        b.iter(|| {
            let dict = Dictionary::new();
            for i in 0..1000 {
                let uri = format!("http://example.org/resource{i}");
                black_box(dict.intern(&uri));
            }
        });
    });

    group.bench_function("intern_duplicate", |b| {
        let dict = Dictionary::new();
        for i in 0..100 {
            dict.intern(&format!("http://example.org/resource{i}"));
        }
        b.iter(|| {
            for i in 0..100 {
                let uri = format!("http://example.org/resource{i}");
                black_box(dict.intern(&uri));
            }
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_triple_insert, benchmark_pattern_lookup, benchmark_dictionary_intern);
criterion_main!(benches);
