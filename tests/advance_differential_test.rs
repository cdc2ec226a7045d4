//! Randomized checks that `advance` agrees with a plain `next` loop

use phalanx::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const WORDS: [&str; 5] = ["a", "b", "c", "d", "e"];
const DOCS: u64 = 300;

fn random_index(rng: &mut StdRng) -> MemoryIndex {
    let mut builder = MemoryIndex::builder();
    for n in 0..DOCS {
        let mut doc = MemoryDocument::new(format!("doc-{n}"));
        let values = rng.random_range(1..=3);
        for _ in 0..values {
            let len = rng.random_range(1..=6);
            let text: Vec<&str> = (0..len)
                .map(|_| WORDS[rng.random_range(0..WORDS.len())])
                .collect();
            let element = rng.random_range(0..3u64);
            doc = doc.add_array_text("body", vec![element], text.join(" "));
        }
        builder = builder.add_document(doc);
    }
    builder.build()
}

type Factory = Box<dyn Fn(&MemoryIndex) -> Result<Box<dyn Searcher>>>;

fn term(index: &MemoryIndex, word: &str) -> Result<Box<dyn Searcher>> {
    Ok(Box::new(TermSearcher::new(
        index,
        word,
        "body",
        1.0,
        SearcherOptions::default().with_term_vectors(true),
    )?))
}

fn factories() -> Vec<(&'static str, Factory)> {
    vec![
        ("term", Box::new(|index: &MemoryIndex| term(index, "a")) as Factory),
        (
            "conjunction",
            Box::new(|index: &MemoryIndex| -> Result<Box<dyn Searcher>> {
                Ok(Box::new(ConjunctionSearcher::new(
                    vec![term(index, "a")?, term(index, "b")?, term(index, "c")?],
                    SearcherOptions::default(),
                )?))
            }) as Factory,
        ),
        (
            "disjunction",
            Box::new(|index: &MemoryIndex| -> Result<Box<dyn Searcher>> {
                Ok(Box::new(DisjunctionSearcher::new(
                    vec![term(index, "d")?, term(index, "e")?],
                    1,
                    SearcherOptions::default(),
                )?))
            }) as Factory,
        ),
        (
            "disjunction-min-2",
            Box::new(|index: &MemoryIndex| -> Result<Box<dyn Searcher>> {
                Ok(Box::new(DisjunctionSearcher::new(
                    vec![term(index, "a")?, term(index, "d")?, term(index, "e")?],
                    2,
                    SearcherOptions::default(),
                )?))
            }) as Factory,
        ),
        (
            "phrase",
            Box::new(|index: &MemoryIndex| -> Result<Box<dyn Searcher>> {
                Ok(Box::new(PhraseSearcher::for_terms(
                    index,
                    "body",
                    &["a", "b"],
                    1.0,
                    SearcherOptions::default(),
                )?))
            }) as Factory,
        ),
        (
            "ordered",
            Box::new(|index: &MemoryIndex| -> Result<Box<dyn Searcher>> {
                Ok(Box::new(OrderedConjunctionSearcher::new(
                    vec![
                        SearchAtPosition::new(term(index, "c")?, 1, 1),
                        SearchAtPosition::new(term(index, "d")?, 3, 3),
                    ],
                    SearcherOptions::default(),
                )?))
            }) as Factory,
        ),
        (
            "synonym-phrase",
            Box::new(|index: &MemoryIndex| -> Result<Box<dyn Searcher>> {
                Ok(Box::new(SynonymPhraseSearcher::new(
                    vec![
                        SynonymSlot::new(vec![term(index, "a")?, term(index, "b")?], 1, 1),
                        SynonymSlot::new(vec![term(index, "c")?], 2, 2),
                    ],
                    SearcherOptions::default(),
                )?))
            }) as Factory,
        ),
        (
            "nested-array",
            Box::new(|index: &MemoryIndex| -> Result<Box<dyn Searcher>> {
                Ok(Box::new(NestedArraySearcher::for_terms(
                    index,
                    "body",
                    &["a", "e"],
                    1,
                    1.0,
                    SearcherOptions::default(),
                )?))
            }) as Factory,
        ),
    ]
}

fn collect_all(searcher: &mut dyn Searcher) -> Result<Vec<u64>> {
    let mut ctx = SearchContext::new(searcher.document_match_pool_size());
    let mut ids = Vec::new();
    while let Some(dm) = searcher.next(&mut ctx)? {
        ids.push(dm.index_internal_id.value()?);
        ctx.put(dm);
    }
    Ok(ids)
}

#[test]
fn test_results_are_strictly_increasing() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(7);
    let index = random_index(&mut rng);

    for (name, factory) in factories() {
        let mut searcher = factory(&index)?;
        let ids = collect_all(searcher.as_mut())?;
        assert!(
            ids.windows(2).all(|w| w[0] < w[1]),
            "{name} returned ids out of order"
        );
        assert!(searcher.count() >= ids.len() as u64, "{name} undercounts");
        searcher.close()?;
    }
    Ok(())
}

#[test]
fn test_advance_matches_next_loop() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);
    let index = random_index(&mut rng);

    for (name, factory) in factories() {
        let expected = collect_all(factory(&index)?.as_mut())?;

        for round in 0..20 {
            let mut searcher = factory(&index)?;
            let mut ctx = SearchContext::new(searcher.document_match_pool_size());
            // index into `expected` of the next unreturned match
            let mut pos = 0;
            let mut last: Option<u64> = None;

            loop {
                let use_advance = rng.random_bool(0.5);
                let (got, want) = if use_advance {
                    let target = last.map(|l| l + 1).unwrap_or(0) + rng.random_range(0..8);
                    let got = searcher.advance(&mut ctx, &IndexInternalId::from_u64(target))?;
                    while pos < expected.len() && expected[pos] < target {
                        pos += 1;
                    }
                    (got, expected.get(pos).copied())
                } else {
                    (searcher.next(&mut ctx)?, expected.get(pos).copied())
                };

                let got_id = match got {
                    Some(dm) => {
                        let id = dm.index_internal_id.value()?;
                        ctx.put(dm);
                        Some(id)
                    }
                    None => None,
                };
                assert_eq!(got_id, want, "{name} diverged in round {round}");

                match got_id {
                    Some(id) => {
                        pos += 1;
                        last = Some(id);
                    }
                    None => break,
                }
            }
            searcher.close()?;
        }
    }
    Ok(())
}
