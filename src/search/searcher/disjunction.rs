//! Union of child searchers.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::collections::binary_heap::PeekMut;
use std::mem;

use log::debug;

use crate::error::Result;
use crate::index::IndexInternalId;
use crate::search::document_match::DocumentMatch;
use crate::search::options::SearcherOptions;
use crate::search::pool::SearchContext;
use crate::search::scorer::DisjunctionQueryScorer;
use crate::search::searcher::{Searcher, children_pool_size, close_all, compute_query_norm};

/// Current match of one child, ordered so the heap yields the smallest id first.
#[derive(Debug)]
struct HeapEntry {
    child: usize,
    curr: DocumentMatch,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap
        other
            .curr
            .index_internal_id
            .cmp(&self.curr.index_internal_id)
            .then_with(|| other.child.cmp(&self.child))
    }
}

/// Searcher matching documents that at least `min` children match.
#[derive(Debug)]
pub struct DisjunctionSearcher {
    searchers: Vec<Box<dyn Searcher>>,
    heap: BinaryHeap<HeapEntry>,
    /// Entries sharing the current smallest id.
    matching: Vec<HeapEntry>,
    /// Scratch list of matches handed to the scorer.
    constituents: Vec<DocumentMatch>,
    /// Children to pull forward after a match.
    matched_children: Vec<usize>,
    min: usize,
    query_norm: f64,
    scorer: DisjunctionQueryScorer,
    initialized: bool,
    closed: bool,
}

impl DisjunctionSearcher {
    /// Create a disjunction scored with coordination.
    pub fn new(
        searchers: Vec<Box<dyn Searcher>>,
        min: usize,
        options: SearcherOptions,
    ) -> Result<Self> {
        Ok(Self::build(
            searchers,
            min,
            DisjunctionQueryScorer::new(options),
        ))
    }

    /// Create a disjunction over interchangeable alternatives.
    ///
    /// Any single alternative is enough and scores are summed without
    /// coordination.
    pub fn for_synonyms(searchers: Vec<Box<dyn Searcher>>, options: SearcherOptions) -> Result<Self> {
        Ok(Self::build(
            searchers,
            1,
            DisjunctionQueryScorer::without_coord(options),
        ))
    }

    fn build(
        mut searchers: Vec<Box<dyn Searcher>>,
        min: usize,
        scorer: DisjunctionQueryScorer,
    ) -> Self {
        let query_norm = compute_query_norm(&mut searchers).text;
        debug!(
            "Disjunction over {} searchers, min {min}",
            searchers.len()
        );

        let n = searchers.len();
        DisjunctionSearcher {
            searchers,
            heap: BinaryHeap::with_capacity(n),
            matching: Vec::with_capacity(n),
            constituents: Vec::with_capacity(n),
            matched_children: Vec::with_capacity(n),
            min,
            query_norm,
            scorer,
            initialized: false,
            closed: false,
        }
    }

    /// Norm applied to the children.
    pub fn query_norm(&self) -> f64 {
        self.query_norm
    }

    fn push(&mut self, child: usize, curr: Option<DocumentMatch>) {
        if let Some(curr) = curr {
            self.heap.push(HeapEntry { child, curr });
        }
    }
}

impl Searcher for DisjunctionSearcher {
    fn next(&mut self, ctx: &mut SearchContext) -> Result<Option<DocumentMatch>> {
        if !self.initialized {
            for i in 0..self.searchers.len() {
                let curr = self.searchers[i].next(ctx)?;
                self.push(i, curr);
            }
            self.initialized = true;
        }

        loop {
            let Some(first) = self.heap.pop() else {
                return Ok(None);
            };
            self.matching.push(first);

            while let Some(top) = self.heap.peek_mut() {
                if top.curr.index_internal_id != self.matching[0].curr.index_internal_id {
                    break;
                }
                self.matching.push(PeekMut::pop(top));
            }

            let matched = self.matching.len();
            self.matched_children
                .extend(self.matching.iter().map(|entry| entry.child));

            let rv = if matched >= self.min {
                self.constituents
                    .extend(self.matching.drain(..).map(|entry| entry.curr));
                self.scorer
                    .score(ctx, &mut self.constituents, self.searchers.len())
            } else {
                for entry in self.matching.drain(..) {
                    ctx.put(entry.curr);
                }
                None
            };

            let mut children = mem::take(&mut self.matched_children);
            for child in children.drain(..) {
                let curr = self.searchers[child].next(ctx)?;
                self.push(child, curr);
            }
            self.matched_children = children;

            if rv.is_some() {
                return Ok(rv);
            }
        }
    }

    fn advance(
        &mut self,
        ctx: &mut SearchContext,
        target: &IndexInternalId,
    ) -> Result<Option<DocumentMatch>> {
        if !self.initialized {
            for i in 0..self.searchers.len() {
                let curr = self.searchers[i].advance(ctx, target)?;
                self.push(i, curr);
            }
            self.initialized = true;
            return self.next(ctx);
        }

        let entries = mem::take(&mut self.heap).into_vec();
        for entry in entries {
            if entry.curr.index_internal_id >= *target {
                self.heap.push(entry);
                continue;
            }
            ctx.put(entry.curr);
            let curr = self.searchers[entry.child].advance(ctx, target)?;
            self.push(entry.child, curr);
        }

        self.next(ctx)
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        close_all(self.searchers.iter_mut())
    }

    fn weight(&self) -> f64 {
        self.searchers.iter().map(|searcher| searcher.weight()).sum()
    }

    fn set_query_norm(&mut self, query_norm: f64) {
        for searcher in self.searchers.iter_mut() {
            searcher.set_query_norm(query_norm);
        }
    }

    fn count(&self) -> u64 {
        self.searchers.iter().map(|searcher| searcher.count()).sum()
    }

    fn min(&self) -> usize {
        self.min
    }

    fn document_match_pool_size(&self) -> usize {
        self.searchers.len() + children_pool_size(&self.searchers)
    }

    fn size(&self) -> usize {
        mem::size_of::<DisjunctionSearcher>()
            + self.searchers.iter().map(|s| s.size()).sum::<usize>()
            + self
                .heap
                .iter()
                .map(|entry| entry.curr.size())
                .sum::<usize>()
    }
}
