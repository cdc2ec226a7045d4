//! Searcher trait and implementations.
//!
//! A searcher is a forward-only cursor over matching documents, yielding
//! results in strictly ascending internal-id order. Leaf searchers read a
//! posting list; combinators compose child searchers into intersections,
//! unions, positional templates and filters.

pub mod conjunction;
pub mod disjunction;
pub mod filtering;
pub mod nested_array;
pub mod ordered_conjunction;
pub mod phrase;
pub mod positions;
pub mod synonym_phrase;
pub mod term;

use std::fmt::Debug;

use log::warn;

use crate::error::Result;
use crate::index::IndexInternalId;
use crate::search::document_match::DocumentMatch;
use crate::search::pool::SearchContext;

pub use conjunction::ConjunctionSearcher;
pub use disjunction::DisjunctionSearcher;
pub use filtering::{DocumentFilter, FilteringSearcher};
pub use nested_array::{ArrayDepthFilter, NestedArraySearcher};
pub use ordered_conjunction::{OrderedConjunctionSearcher, SearchAtPosition};
pub use phrase::PhraseSearcher;
pub use positions::{PhraseTemplate, TemplateSlot};
pub use synonym_phrase::{SynonymPhraseSearcher, SynonymSlot};
pub use term::TermSearcher;

/// Trait for searchers that iterate over matching documents.
///
/// Every result handed out comes from the context's pool; callers return
/// results they no longer need with [`SearchContext::put`].
pub trait Searcher: Send + Debug {
    /// Get the next match, `None` once exhausted.
    fn next(&mut self, ctx: &mut SearchContext) -> Result<Option<DocumentMatch>>;

    /// Get the first match whose id is >= `target`.
    fn advance(
        &mut self,
        ctx: &mut SearchContext,
        target: &IndexInternalId,
    ) -> Result<Option<DocumentMatch>>;

    /// Release all resources held by this searcher and its children.
    ///
    /// Calling `close` more than once is a no-op.
    fn close(&mut self) -> Result<()>;

    /// Contribution of this searcher to the query norm.
    fn weight(&self) -> f64;

    /// Apply the query norm computed by the enclosing combinator.
    fn set_query_norm(&mut self, query_norm: f64);

    /// Upper bound on the number of matches.
    fn count(&self) -> u64;

    /// Minimum number of children that must match, 0 when not applicable.
    fn min(&self) -> usize {
        0
    }

    /// Number of results this searcher may hold at once, children included.
    fn document_match_pool_size(&self) -> usize;

    /// Approximate size in bytes.
    fn size(&self) -> usize;

    /// Whether this searcher scores by vector similarity.
    fn is_vector(&self) -> bool {
        false
    }
}

/// Norms computed over a set of sibling searchers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryNorm {
    /// Norm applied to text searchers.
    pub text: f64,
    /// Norm applied to vector searchers.
    pub vector: f64,
}

fn norm_of(sum_of_weights: f64) -> f64 {
    if sum_of_weights == 0.0 {
        0.0
    } else {
        1.0 / sum_of_weights.sqrt()
    }
}

/// Compute and apply the query norm for a set of sibling searchers.
///
/// Text and vector searchers are normalized separately so a similarity score
/// never distorts the norm of the text clauses.
pub fn compute_query_norm(searchers: &mut [Box<dyn Searcher>]) -> QueryNorm {
    let mut sum_of_weights = 0.0;
    let mut sum_of_vector_weights = 0.0;
    for searcher in searchers.iter() {
        if searcher.is_vector() {
            sum_of_vector_weights += searcher.weight();
        } else {
            sum_of_weights += searcher.weight();
        }
    }

    let norm = QueryNorm {
        text: norm_of(sum_of_weights),
        vector: norm_of(sum_of_vector_weights),
    };

    for searcher in searchers.iter_mut() {
        if searcher.is_vector() {
            searcher.set_query_norm(norm.vector);
        } else {
            searcher.set_query_norm(norm.text);
        }
    }

    norm
}

/// Sort searchers by ascending `count`, cheapest first.
pub fn sort_by_count(searchers: &mut [Box<dyn Searcher>]) {
    searchers.sort_by_key(|searcher| searcher.count());
}

/// Close every searcher, even after a failure.
///
/// Returns the first error; later ones are logged.
pub fn close_all<'a, I>(searchers: I) -> Result<()>
where
    I: IntoIterator<Item = &'a mut Box<dyn Searcher>>,
{
    let mut first_err = None;
    for searcher in searchers {
        if let Err(e) = searcher.close() {
            if first_err.is_none() {
                first_err = Some(e);
            } else {
                warn!("Failed to close searcher: {e}");
            }
        }
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Sum of the pool sizes of `searchers`.
pub(crate) fn children_pool_size(searchers: &[Box<dyn Searcher>]) -> usize {
    searchers
        .iter()
        .map(|searcher| searcher.document_match_pool_size())
        .sum()
}
