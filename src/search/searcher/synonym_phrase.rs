//! Phrases whose positions may be filled by any of several alternatives.

use log::debug;

use crate::error::{PhalanxError, Result};
use crate::index::IndexInternalId;
use crate::search::document_match::DocumentMatch;
use crate::search::options::SearcherOptions;
use crate::search::pool::SearchContext;
use crate::search::searcher::conjunction::ConjunctionSearcher;
use crate::search::searcher::disjunction::DisjunctionSearcher;
use crate::search::searcher::positions::TemplateSlot;
use crate::search::searcher::{Searcher, close_all};

/// One phrase slot and the searchers that may fill it.
///
/// Alternatives may span several tokens (a multi-word synonym is usually a
/// [`PhraseSearcher`](crate::search::searcher::PhraseSearcher)); each reports
/// its occurrences as hit runs.
#[derive(Debug)]
pub struct SynonymSlot {
    /// Interchangeable searchers for this slot.
    pub alternatives: Vec<Box<dyn Searcher>>,
    /// First phrase position covered.
    pub first_pos: u64,
    /// Last phrase position covered.
    pub last_pos: u64,
}

impl SynonymSlot {
    /// Create a slot covering `first_pos..=last_pos`.
    pub fn new(alternatives: Vec<Box<dyn Searcher>>, first_pos: u64, last_pos: u64) -> Self {
        SynonymSlot {
            alternatives,
            first_pos,
            last_pos,
        }
    }
}

/// Ordered conjunction over synonym slots.
#[derive(Debug)]
pub struct SynonymPhraseSearcher {
    inner: ConjunctionSearcher,
}

impl SynonymPhraseSearcher {
    /// Create a synonym phrase searcher.
    ///
    /// A slot with several alternatives is served by a disjunction over them.
    /// A slot without alternatives is an error; every searcher passed in is
    /// closed before it is returned.
    pub fn new(slots: Vec<SynonymSlot>, options: SearcherOptions) -> Result<Self> {
        if let Some(empty) = slots.iter().position(|slot| slot.alternatives.is_empty()) {
            let mut slots = slots;
            let _ = close_all(
                slots
                    .iter_mut()
                    .flat_map(|slot| slot.alternatives.iter_mut()),
            );
            return Err(PhalanxError::invalid_template(format!(
                "slot {empty} has no alternatives"
            )));
        }

        debug!("Synonym phrase over {} slots", slots.len());

        let mut searchers: Vec<Box<dyn Searcher>> = Vec::with_capacity(slots.len());
        let mut template = Vec::with_capacity(slots.len());
        let mut remaining = slots.into_iter();
        while let Some(mut slot) = remaining.next() {
            template.push(TemplateSlot::new(slot.first_pos, slot.last_pos));
            if slot.alternatives.len() == 1 {
                searchers.extend(slot.alternatives.pop());
                continue;
            }
            match DisjunctionSearcher::for_synonyms(slot.alternatives, options) {
                Ok(searcher) => searchers.push(Box::new(searcher)),
                Err(e) => {
                    let _ = close_all(searchers.iter_mut());
                    for mut rest in remaining {
                        let _ = close_all(rest.alternatives.iter_mut());
                    }
                    return Err(e);
                }
            }
        }

        Ok(SynonymPhraseSearcher {
            inner: ConjunctionSearcher::with_positions(searchers, template, options)?,
        })
    }
}

impl Searcher for SynonymPhraseSearcher {
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
