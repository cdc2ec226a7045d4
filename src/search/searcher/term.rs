//! Leaf searcher over the posting list of one term.

use std::mem;

use log::debug;

use crate::error::Result;
use crate::index::{IndexInternalId, IndexReader, TermFieldReader};
use crate::search::document_match::DocumentMatch;
use crate::search::options::SearcherOptions;
use crate::search::pool::SearchContext;
use crate::search::scorer::TermQueryScorer;
use crate::search::searcher::Searcher;

/// Searcher that matches every document containing a term in a field.
#[derive(Debug)]
pub struct TermSearcher {
    reader: Box<dyn TermFieldReader>,
    scorer: TermQueryScorer,
    closed: bool,
}

impl TermSearcher {
    /// Open a posting reader for `term` in `field` and wrap it.
    pub fn new(
        index_reader: &dyn IndexReader,
        term: &str,
        field: &str,
        boost: f64,
        options: SearcherOptions,
    ) -> Result<Self> {
        let mut reader = index_reader.term_field_reader(
            term,
            field,
            true,
            true,
            options.include_term_vectors,
        )?;
        let doc_total = match index_reader.doc_count() {
            Ok(count) => count,
            Err(e) => {
                let _ = reader.close();
                return Err(e);
            }
        };

        debug!(
            "Term searcher {field}:{term} over {} of {doc_total} documents",
            reader.count()
        );

        Ok(Self::from_reader(reader, term, field, boost, doc_total, options))
    }

    /// Wrap an already opened posting reader.
    pub fn from_reader(
        reader: Box<dyn TermFieldReader>,
        term: &str,
        field: &str,
        boost: f64,
        doc_total: u64,
        options: SearcherOptions,
    ) -> Self {
        let scorer = TermQueryScorer::new(term, field, boost, doc_total, reader.count(), options);
        TermSearcher {
            reader,
            scorer,
            closed: false,
        }
    }
}

impl Searcher for TermSearcher {
    fn next(&mut self, ctx: &mut SearchContext) -> Result<Option<DocumentMatch>> {
        Ok(self
            .reader
            .next()?
            .map(|term_match| self.scorer.score(ctx, &term_match)))
    }

    fn advance(
        &mut self,
        ctx: &mut SearchContext,
        target: &IndexInternalId,
    ) -> Result<Option<DocumentMatch>> {
        Ok(self
            .reader
            .advance(target)?
            .map(|term_match| self.scorer.score(ctx, &term_match)))
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.reader.close()
    }

    fn weight(&self) -> f64 {
        self.scorer.weight()
    }

    fn set_query_norm(&mut self, query_norm: f64) {
        self.scorer.set_query_norm(query_norm);
    }

    fn count(&self) -> u64 {
        self.reader.count()
    }

    fn document_match_pool_size(&self) -> usize {
        1
    }

    fn size(&self) -> usize {
        mem::size_of::<TermSearcher>() + self.scorer.size()
    }
}
