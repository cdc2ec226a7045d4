//! Conjunctions restricted to one element of a nested array.
//!
//! Fields inside arrays of objects are flattened at index time; every term
//! occurrence keeps the array path of the value it came from. A plain
//! conjunction over such fields happily matches terms from different array
//! elements. The searchers here keep only documents where all terms share one
//! array element at a given nesting depth.

use std::cmp::Ordering;
use std::mem;

use ahash::AHashMap;
use log::debug;

use crate::error::Result;
use crate::index::{IndexInternalId, IndexReader};
use crate::search::document_match::{ArrayPositions, DocumentMatch};
use crate::search::options::SearcherOptions;
use crate::search::pool::SearchContext;
use crate::search::searcher::conjunction::ConjunctionSearcher;
use crate::search::searcher::filtering::{DocumentFilter, FilteringSearcher};
use crate::search::searcher::term::TermSearcher;
use crate::search::searcher::{Searcher, close_all};

/// Compare two array paths element by element.
///
/// Paths of equal length compare lexicographically; a shorter path that is a
/// prefix of a longer one sorts first.
pub fn compare_array_positions(a: &[u64], b: &[u64]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.cmp(y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

/// Accepts matches whose terms all occur in one array element at `depth`.
#[derive(Debug, Clone)]
pub struct ArrayDepthFilter {
    depth: usize,
    /// Terms that must be present, when known up front.
    required_terms: Vec<String>,
    /// Fewest distinct terms a match must carry locations for.
    min_terms: usize,
    /// term -> index into `paths`, rebuilt for every match
    term_slots: AHashMap<String, usize>,
    /// Per-term array paths of length `depth`.
    paths: Vec<Vec<ArrayPositions>>,
    cursors: Vec<usize>,
}

impl ArrayDepthFilter {
    /// Create a filter for array paths of length `depth`.
    pub fn new(depth: usize) -> Self {
        ArrayDepthFilter {
            depth,
            required_terms: Vec::new(),
            min_terms: 0,
            term_slots: AHashMap::new(),
            paths: Vec::new(),
            cursors: Vec::new(),
        }
    }

    /// Require every one of `terms` to occur at the filter's depth.
    pub fn with_required_terms(mut self, terms: Vec<String>) -> Self {
        self.required_terms = terms;
        self
    }

    /// Require locations for at least `min_terms` distinct terms.
    ///
    /// A child that matched without loading term vectors leaves no locations
    /// behind, so its term would otherwise go unchecked.
    pub fn with_min_terms(mut self, min_terms: usize) -> Self {
        self.min_terms = min_terms;
        self
    }

    /// The nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Check one match.
    pub fn check(&mut self, dm: &DocumentMatch) -> bool {
        if dm.locations.is_empty() {
            return false;
        }

        self.term_slots.clear();
        for paths in self.paths.iter_mut() {
            paths.clear();
        }

        let mut used = 0;
        for (_, terms) in dm.locations.iter() {
            for (term, locations) in terms.iter() {
                let slot = match self.term_slots.get(term) {
                    Some(&slot) => slot,
                    None => {
                        let slot = used;
                        used += 1;
                        if self.paths.len() < used {
                            self.paths.push(Vec::new());
                        }
                        self.term_slots.insert(term.clone(), slot);
                        slot
                    }
                };
                for location in locations {
                    if location.array_positions.len() == self.depth {
                        self.paths[slot].push(location.array_positions.clone());
                    }
                }
            }
        }

        if used < self.min_terms {
            return false;
        }
        if self
            .required_terms
            .iter()
            .any(|term| !self.term_slots.contains_key(term))
        {
            return false;
        }

        let lists = &mut self.paths[..used];
        // a matched term with no occurrence at this depth
        if lists.iter().any(Vec::is_empty) {
            return false;
        }
        for list in lists.iter_mut() {
            list.sort_unstable_by(|a, b| compare_array_positions(a, b));
        }

        check_for_intersection(lists, &mut self.cursors)
    }
}

impl DocumentFilter for ArrayDepthFilter {
    fn accept(&mut self, dm: &DocumentMatch) -> bool {
        self.check(dm)
    }

    fn size(&self) -> usize {
        mem::size_of::<ArrayDepthFilter>()
            + self
                .paths
                .iter()
                .flatten()
                .map(|path| path.len() * mem::size_of::<u64>())
                .sum::<usize>()
    }
}

/// Check whether one array path occurs in every sorted, non-empty list.
fn check_for_intersection(lists: &[Vec<ArrayPositions>], cursors: &mut Vec<usize>) -> bool {
    match lists {
        [] => false,
        [_] => true,
        [a, b] if a.len() == 1 && b.len() == 1 => {
            compare_array_positions(&a[0], &b[0]) == Ordering::Equal
        }
        [base_list, rest @ ..] => {
            cursors.clear();
            cursors.resize(rest.len(), 0);

            for base in base_list {
                let mut matched = 0;
                for (list, cursor) in rest.iter().zip(cursors.iter_mut()) {
                    while *cursor < list.len()
                        && compare_array_positions(&list[*cursor], base) == Ordering::Less
                    {
                        *cursor += 1;
                    }
                    // everything left in the base list is larger still
                    if *cursor == list.len() {
                        return false;
                    }
                    if compare_array_positions(&list[*cursor], base) == Ordering::Equal {
                        matched += 1;
                    }
                }
                if matched == rest.len() {
                    return true;
                }
            }
            false
        }
    }
}

/// Conjunction keeping only documents whose terms share an array element at
/// a fixed depth.
#[derive(Debug)]
pub struct NestedArraySearcher {
    inner: FilteringSearcher<ArrayDepthFilter>,
}

impl NestedArraySearcher {
    /// Wrap a conjunction over `searchers`.
    ///
    /// Children must load term vectors, otherwise nothing matches. Every
    /// child has to contribute locations for at least one term.
    pub fn new(
        depth: usize,
        searchers: Vec<Box<dyn Searcher>>,
        options: SearcherOptions,
    ) -> Result<Self> {
        let filter = ArrayDepthFilter::new(depth).with_min_terms(searchers.len());
        Self::with_filter(filter, searchers, options)
    }

    /// Build term searchers (with term vectors) for `terms` in `field` and
    /// require all of them to occur in one array element at `depth`.
    pub fn for_terms<S: AsRef<str>>(
        index_reader: &dyn IndexReader,
        field: &str,
        terms: &[S],
        depth: usize,
        boost: f64,
        options: SearcherOptions,
    ) -> Result<Self> {
        let options = options.with_term_vectors(true);
        let mut required = Vec::with_capacity(terms.len());
        let mut searchers: Vec<Box<dyn Searcher>> = Vec::with_capacity(terms.len());
        for term in terms {
            let term = term.as_ref();
            if required.iter().any(|t: &String| t == term) {
                continue;
            }
            match TermSearcher::new(index_reader, term, field, boost, options) {
                Ok(searcher) => searchers.push(Box::new(searcher)),
                Err(e) => {
                    let _ = close_all(searchers.iter_mut());
                    return Err(e);
                }
            }
            required.push(term.to_string());
        }

        let filter = ArrayDepthFilter::new(depth).with_required_terms(required);
        Self::with_filter(filter, searchers, options)
    }

    fn with_filter(
        filter: ArrayDepthFilter,
        searchers: Vec<Box<dyn Searcher>>,
        options: SearcherOptions,
    ) -> Result<Self> {
        debug!(
            "Nested array searcher over {} searchers at depth {}",
            searchers.len(),
            filter.depth()
        );
        let conjunction = ConjunctionSearcher::new(searchers, options)?;
        Ok(NestedArraySearcher {
            inner: FilteringSearcher::new(Box::new(conjunction), filter),
        })
    }
}

impl Searcher for NestedArraySearcher {
    fn next(&mut self, ctx: &mut SearchContext) -> Result<Option<DocumentMatch>> {
        self.inner.next(ctx)
    }

    fn advance(
        &mut self,
        ctx: &mut SearchContext,
        target: &IndexInternalId,
    ) -> Result<Option<DocumentMatch>> {
        self.inner.advance(ctx, target)
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }

    fn weight(&self) -> f64 {
        self.inner.weight()
    }

    fn set_query_norm(&mut self, query_norm: f64) {
        self.inner.set_query_norm(query_norm);
    }

    fn count(&self) -> u64 {
        self.inner.count()
    }

    fn document_match_pool_size(&self) -> usize {
        self.inner.document_match_pool_size()
    }

    fn size(&self) -> usize {
        self.inner.size()
    }
}
