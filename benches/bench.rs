//! Criterion benchmarks for Phalanx searchers.
//!
//! Every benchmark drives a freshly built searcher tree over the same
//! in-memory index to exhaustion:
//! - Term and conjunction merge-join throughput
//! - Disjunction heap throughput
//! - Phrase and ordered-template positional checks
//! - Nested-array filtering

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use phalanx::prelude::*;
use std::hint::black_box;

/// Generate a test index for benchmarking.
fn generate_test_index(count: usize) -> MemoryIndex {
    let words = [
        "search", "engine", "full", "text", "index", "query", "document", "field", "term",
        "phrase", "boolean", "vector", "similarity", "relevance", "score", "analysis",
    ];

    let mut builder = MemoryIndex::builder();
    for i in 0..count {
        let doc_length = 20 + (i % 40); // Variable length documents
        let mut doc_words = Vec::with_capacity(doc_length);
        for j in 0..doc_length {
            let word_idx = (i * 7 + j * 13) % words.len(); // Pseudo-random distribution
            doc_words.push(words[word_idx]);
        }

        let element = (i % 3) as u64;
        builder = builder.add_document(
            MemoryDocument::new(format!("doc{i}"))
                .add_text("body", doc_words.join(" "))
                .add_array_text("items", vec![element], doc_words[..5].join(" ")),
        );
    }
    builder.build()
}

fn term(
    index: &MemoryIndex,
    field: &str,
    word: &str,
    options: SearcherOptions,
) -> Box<dyn Searcher> {
    Box::new(TermSearcher::new(index, word, field, 1.0, options).unwrap())
}

fn drain(mut searcher: Box<dyn Searcher>) -> usize {
    let mut ctx = SearchContext::new(searcher.document_match_pool_size());
    let mut hits = 0;
    while let Some(dm) = searcher.next(&mut ctx).unwrap() {
        hits += 1;
        ctx.put(black_box(dm));
    }
    searcher.close().unwrap();
    hits
}

/// Benchmark boolean combinators.
fn bench_boolean(c: &mut Criterion) {
    let mut group = c.benchmark_group("boolean");
    let index = generate_test_index(5000);
    let options = SearcherOptions::default();
    group.throughput(Throughput::Elements(5000));

    group.bench_function("term", |b| {
        b.iter(|| black_box(drain(term(&index, "body", "query", options))))
    });

    group.bench_function("conjunction_two_terms", |b| {
        b.iter(|| {
            let searcher = ConjunctionSearcher::new(
                vec![
                    term(&index, "body", "query", options),
                    term(&index, "body", "score", options),
                ],
                options,
            )
            .unwrap();
            black_box(drain(Box::new(searcher)))
        })
    });

    group.bench_function("conjunction_four_terms", |b| {
        b.iter(|| {
            let searcher = ConjunctionSearcher::new(
                vec![
                    term(&index, "body", "query", options),
                    term(&index, "body", "score", options),
                    term(&index, "body", "vector", options),
                    term(&index, "body", "field", options),
                ],
                options,
            )
            .unwrap();
            black_box(drain(Box::new(searcher)))
        })
    });

    group.bench_function("disjunction_three_terms", |b| {
        b.iter(|| {
            let searcher = DisjunctionSearcher::new(
                vec![
                    term(&index, "body", "query", options),
                    term(&index, "body", "score", options),
                    term(&index, "body", "vector", options),
                ],
                1,
                options,
            )
            .unwrap();
            black_box(drain(Box::new(searcher)))
        })
    });

    group.finish();
}

/// Benchmark positional searchers.
fn bench_positional(c: &mut Criterion) {
    let mut group = c.benchmark_group("positional");
    group.sample_size(30); // Term vectors make every match heavier
    let index = generate_test_index(2000);
    let options = SearcherOptions::default().with_term_vectors(true);
    group.throughput(Throughput::Elements(2000));

    group.bench_function("phrase_two_terms", |b| {
        b.iter(|| {
            let searcher =
                PhraseSearcher::for_terms(&index, "body", &["query", "score"], 1.0, options)
                    .unwrap();
            black_box(drain(Box::new(searcher)))
        })
    });

    group.bench_function("ordered_template", |b| {
        b.iter(|| {
            let searcher = OrderedConjunctionSearcher::new(
                vec![
                    SearchAtPosition::new(term(&index, "body", "query", options), 1, 1),
                    SearchAtPosition::new(term(&index, "body", "score", options), 3, 3),
                ],
                options,
            )
            .unwrap();
            black_box(drain(Box::new(searcher)))
        })
    });

    group.bench_function("nested_array_depth_one", |b| {
        b.iter(|| {
            let searcher = NestedArraySearcher::for_terms(
                &index,
                "items",
                &["search", "query"],
                1,
                1.0,
                options,
            )
            .unwrap();
            black_box(drain(Box::new(searcher)))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_boolean, bench_positional);

criterion_main!(benches);
