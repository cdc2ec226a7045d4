//! Post-filtering of another searcher's matches.

use std::fmt;
use std::mem;

use log::trace;

use crate::error::Result;
use crate::index::IndexInternalId;
use crate::search::document_match::DocumentMatch;
use crate::search::pool::SearchContext;
use crate::search::searcher::Searcher;

/// Predicate deciding whether a match is kept.
pub trait DocumentFilter: Send {
    /// Return true to keep the match.
    fn accept(&mut self, dm: &DocumentMatch) -> bool;

    /// Approximate size in bytes of state held by the filter.
    fn size(&self) -> usize {
        0
    }
}

impl<F> DocumentFilter for F
where
    F: FnMut(&DocumentMatch) -> bool + Send,
{
    fn accept(&mut self, dm: &DocumentMatch) -> bool {
        self(dm)
    }
}

/// Searcher yielding only the child's matches accepted by a filter.
pub struct FilteringSearcher<F> {
    child: Box<dyn Searcher>,
    filter: F,
}

impl<F: DocumentFilter> FilteringSearcher<F> {
    /// Wrap `child`, keeping the matches `filter` accepts.
    pub fn new(child: Box<dyn Searcher>, filter: F) -> Self {
        FilteringSearcher { child, filter }
    }

    /// Get the filter.
    pub fn filter(&self) -> &F {
        &self.filter
    }
}

impl<F> fmt::Debug for FilteringSearcher<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilteringSearcher")
            .field("child", &self.child)
            .finish_non_exhaustive()
    }
}

impl<F: DocumentFilter> Searcher for FilteringSearcher<F> {
    fn next(&mut self, ctx: &mut SearchContext) -> Result<Option<DocumentMatch>> {
        while let Some(dm) = self.child.next(ctx)? {
            if self.filter.accept(&dm) {
                return Ok(Some(dm));
            }
            trace!("Filtered out {dm}");
            ctx.put(dm);
        }
        Ok(None)
    }

    fn advance(
        &mut self,
        ctx: &mut SearchContext,
        target: &IndexInternalId,
    ) -> Result<Option<DocumentMatch>> {
        match self.child.advance(ctx, target)? {
            None => Ok(None),
            Some(dm) if self.filter.accept(&dm) => Ok(Some(dm)),
            Some(dm) => {
                trace!("Filtered out {dm}");
                ctx.put(dm);
                self.next(ctx)
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        self.child.close()
    }

    fn weight(&self) -> f64 {
        self.child.weight()
    }

    fn set_query_norm(&mut self, query_norm: f64) {
        self.child.set_query_norm(query_norm);
    }

    fn count(&self) -> u64 {
        self.child.count()
    }

    fn min(&self) -> usize {
        self.child.min()
    }

    fn document_match_pool_size(&self) -> usize {
        self.child.document_match_pool_size()
    }

    fn size(&self) -> usize {
        mem::size_of::<Self>() + self.child.size() + self.filter.size()
    }

    fn is_vector(&self) -> bool {
        self.child.is_vector()
    }
}
