//! Conjunction whose children must appear at fixed relative positions.

use log::debug;

use crate::error::Result;
use crate::index::IndexInternalId;
use crate::search::document_match::DocumentMatch;
use crate::search::options::SearcherOptions;
use crate::search::pool::SearchContext;
use crate::search::searcher::conjunction::ConjunctionSearcher;
use crate::search::searcher::positions::TemplateSlot;
use crate::search::searcher::Searcher;

/// A child searcher together with the phrase positions it covers.
#[derive(Debug)]
pub struct SearchAtPosition {
    /// The child searcher.
    pub searcher: Box<dyn Searcher>,
    /// First phrase position covered.
    pub first_pos: u64,
    /// Last phrase position covered.
    pub last_pos: u64,
}

impl SearchAtPosition {
    /// Place `searcher` at `first_pos..=last_pos`.
    pub fn new(searcher: Box<dyn Searcher>, first_pos: u64, last_pos: u64) -> Self {
        SearchAtPosition {
            searcher,
            first_pos,
            last_pos,
        }
    }
}

/// Matches documents where every child matches and the children's hit runs
/// can be chained with the same gaps as their template positions.
///
/// The template `[4..4, 6..8, 13..16]` accepts a document with runs `[10]`,
/// `[12, 13, 14]` and `[19, 20, 21, 22]`: each run starts as far after the
/// previous run's end as its slot starts after the previous slot's end.
#[derive(Debug)]
pub struct OrderedConjunctionSearcher {
    inner: ConjunctionSearcher,
}

impl OrderedConjunctionSearcher {
    /// Create an ordered conjunction. Slots keep the given order.
    pub fn new(slots: Vec<SearchAtPosition>, options: SearcherOptions) -> Result<Self> {
        debug!("Ordered conjunction over {} slots", slots.len());

        let (searchers, template): (Vec<_>, Vec<_>) = slots
            .into_iter()
            .map(|slot| {
                (
                    slot.searcher,
                    TemplateSlot::new(slot.first_pos, slot.last_pos),
                )
            })
            .unzip();

        Ok(OrderedConjunctionSearcher {
            inner: ConjunctionSearcher::with_positions(searchers, template, options)?,
        })
    }
}

impl Searcher for OrderedConjunctionSearcher {
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
