//! Exact phrase matching.
//!
//! A phrase searcher wraps a conjunction over the distinct phrase terms and
//! keeps only the candidates in which the terms occur at consecutive
//! positions inside the same array element.

use std::mem;

use log::{debug, trace};

use crate::error::{PhalanxError, Result};
use crate::index::{IndexInternalId, IndexReader};
use crate::search::document_match::{DocumentMatch, FieldTermLocationMap, TermLocationMap};
use crate::search::options::SearcherOptions;
use crate::search::pool::SearchContext;
use crate::search::searcher::conjunction::ConjunctionSearcher;
use crate::search::searcher::term::TermSearcher;
use crate::search::searcher::{Searcher, close_all};

/// Searcher matching documents that contain a phrase.
///
/// Empty strings in the phrase are placeholders: they occupy a position but
/// accept any token there. Occurrences are anchored on the first non-empty
/// term, so leading placeholders only require room before it.
#[derive(Debug)]
pub struct PhraseSearcher {
    must: ConjunctionSearcher,
    terms: Vec<String>,
    /// Index of the first non-empty term.
    anchor: usize,
    query_norm: f64,
    /// Candidate pulled from `must` but not yet checked.
    curr_must: Option<DocumentMatch>,
    initialized: bool,
}

impl PhraseSearcher {
    /// Wrap a conjunction over the phrase terms.
    ///
    /// The conjunction's children must load term vectors. At least one term
    /// must not be a placeholder.
    pub fn new(mut must: ConjunctionSearcher, terms: Vec<String>) -> Result<Self> {
        let Some(anchor) = terms.iter().position(|term| !term.is_empty()) else {
            let _ = must.close();
            return Err(PhalanxError::query("phrase has no terms"));
        };

        let weight = must.weight();
        let query_norm = if weight == 0.0 {
            0.0
        } else {
            1.0 / weight.sqrt()
        };
        must.set_query_norm(query_norm);

        debug!("Phrase searcher for {terms:?}");

        Ok(PhraseSearcher {
            must,
            terms,
            anchor,
            query_norm,
            curr_must: None,
            initialized: false,
        })
    }

    /// Build a phrase searcher for `terms` in `field`.
    ///
    /// A term searcher with term vectors is opened for every distinct
    /// non-empty term.
    pub fn for_terms<S: AsRef<str>>(
        index_reader: &dyn IndexReader,
        field: &str,
        terms: &[S],
        boost: f64,
        options: SearcherOptions,
    ) -> Result<Self> {
        let options = options.with_term_vectors(true);
        let terms: Vec<String> = terms.iter().map(|t| t.as_ref().to_string()).collect();

        let mut distinct: Vec<&str> = Vec::new();
        for term in terms.iter().filter(|t| !t.is_empty()) {
            if !distinct.contains(&term.as_str()) {
                distinct.push(term);
            }
        }

        let mut searchers: Vec<Box<dyn Searcher>> = Vec::with_capacity(distinct.len());
        for term in distinct {
            match TermSearcher::new(index_reader, term, field, boost, options) {
                Ok(searcher) => searchers.push(Box::new(searcher)),
                Err(e) => {
                    let _ = close_all(searchers.iter_mut());
                    return Err(e);
                }
            }
        }

        let must = ConjunctionSearcher::new(searchers, options)?;
        Self::new(must, terms)
    }

    /// Norm applied to the wrapped conjunction.
    pub fn query_norm(&self) -> f64 {
        self.query_norm
    }

    /// Check the candidate, returning it with only the phrase occurrences
    /// left in its locations. Non-matching candidates go back to the pool.
    fn check_current_must_match(
        &self,
        ctx: &mut SearchContext,
        mut candidate: DocumentMatch,
    ) -> Option<DocumentMatch> {
        let mut locations = FieldTermLocationMap::new();
        let mut hit_positions = Vec::new();
        let mut freq = 0;

        for (field, terms) in candidate.locations.iter() {
            let mut field_matches = TermLocationMap::new();
            freq += self.check_field(terms, &mut field_matches, &mut hit_positions);
            if !field_matches.is_empty() {
                locations.insert(field.clone(), field_matches);
            }
        }

        if freq == 0 {
            trace!("Phrase rejected {candidate}");
            ctx.put(candidate);
            return None;
        }

        candidate.locations = locations;
        candidate.hit_positions = hit_positions;
        Some(candidate)
    }

    /// Collect every phrase occurrence in one field.
    fn check_field(
        &self,
        terms: &TermLocationMap,
        matches: &mut TermLocationMap,
        hit_positions: &mut Vec<Vec<u64>>,
    ) -> usize {
        let anchor_term = &self.terms[self.anchor];
        let Some(anchor_locations) = terms.get(anchor_term) else {
            return 0;
        };

        let mut freq = 0;
        'occurrence: for anchor in anchor_locations {
            // position of the phrase's first slot
            let start = anchor.pos - self.anchor as f64;
            if start < 1.0 {
                continue;
            }

            let mut occurrence = TermLocationMap::new();
            occurrence.add_location(anchor_term, anchor.clone());

            for (offset, term) in self.terms.iter().enumerate().skip(self.anchor + 1) {
                if term.is_empty() {
                    continue;
                }
                let expected = start + offset as f64;
                let found = terms.get(term).and_then(|locations| {
                    locations
                        .iter()
                        .find(|loc| loc.pos == expected && loc.same_array_element(anchor))
                });
                match found {
                    Some(location) => occurrence.add_location(term, location.clone()),
                    None => continue 'occurrence,
                }
            }

            freq += 1;
            matches.merge(occurrence);
            hit_positions.push(phrase_run(start as u64, self.terms.len()));
        }

        freq
    }
}

/// Positions covered by one phrase occurrence starting at `start`.
fn phrase_run(start: u64, len: usize) -> Vec<u64> {
    (start..start + len as u64).collect()
}

impl Searcher for PhraseSearcher {
    fn next(&mut self, ctx: &mut SearchContext) -> Result<Option<DocumentMatch>> {
        if !self.initialized {
            self.curr_must = self.must.next(ctx)?;
            self.initialized = true;
        }

        while let Some(candidate) = self.curr_must.take() {
            let rv = self.check_current_must_match(ctx, candidate);
            self.curr_must = self.must.next(ctx)?;
            if rv.is_some() {
                return Ok(rv);
            }
        }

        Ok(None)
    }

    fn advance(
        &mut self,
        ctx: &mut SearchContext,
        target: &IndexInternalId,
    ) -> Result<Option<DocumentMatch>> {
        if !self.initialized {
            self.curr_must = self.must.advance(ctx, target)?;
            self.initialized = true;
            return self.next(ctx);
        }

        // a held candidate at or past the target is still unchecked
        let keep = matches!(&self.curr_must, Some(dm) if dm.index_internal_id >= *target);
        if !keep {
            ctx.recycle(self.curr_must.take());
            self.curr_must = self.must.advance(ctx, target)?;
        }

        self.next(ctx)
    }

    fn close(&mut self) -> Result<()> {
        self.must.close()
    }

    fn weight(&self) -> f64 {
        self.must.weight()
    }

    fn set_query_norm(&mut self, query_norm: f64) {
        self.must.set_query_norm(query_norm);
    }

    fn count(&self) -> u64 {
        self.must.count()
    }

    fn document_match_pool_size(&self) -> usize {
        self.must.document_match_pool_size() + 1
    }

    fn size(&self) -> usize {
        mem::size_of::<PhraseSearcher>()
            + self.must.size()
            + self.terms.iter().map(String::len).sum::<usize>()
            + self.curr_must.as_ref().map(DocumentMatch::size).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::memory::{MemoryDocument, MemoryIndex};

    fn test_index() -> MemoryIndex {
        MemoryIndex::builder()
            .add_document(MemoryDocument::new("1").add_text("desc", "angst beer is good"))
            .add_document(MemoryDocument::new("2").add_text("desc", "beer angst"))
            .add_document(MemoryDocument::new("3").add_text("desc", "angst beer angst beer"))
            .add_document(MemoryDocument::new("4").add_text("desc", "angst and beer"))
            .build()
    }

    fn external_ids(searcher: &mut PhraseSearcher, index: &MemoryIndex) -> Vec<String> {
        let mut ctx = SearchContext::new(searcher.document_match_pool_size());
        let mut ids = Vec::new();
        while let Some(dm) = searcher.next(&mut ctx).unwrap() {
            ids.push(index.external_id(&dm.index_internal_id).unwrap());
            ctx.put(dm);
        }
        ids
    }

    #[test]
    fn test_phrase_matches_adjacent_terms() {
        let index = test_index();
        let mut searcher =
            PhraseSearcher::for_terms(&index, "desc", &["angst", "beer"], 1.0, SearcherOptions::default())
                .unwrap();
        assert_eq!(external_ids(&mut searcher, &index), vec!["1", "3"]);
    }

    #[test]
    fn test_phrase_locations_and_runs() {
        let index = test_index();
        let mut searcher =
            PhraseSearcher::for_terms(&index, "desc", &["angst", "beer"], 1.0, SearcherOptions::default())
                .unwrap();
        let mut ctx = SearchContext::new(searcher.document_match_pool_size());

        let dm = searcher
            .advance(&mut ctx, &IndexInternalId::from_u64(2))
            .unwrap()
            .unwrap();
        assert_eq!(index.external_id(&dm.index_internal_id).unwrap(), "3");
        assert_eq!(dm.hit_positions, vec![vec![1, 2], vec![3, 4]]);
        let desc = dm.locations.get("desc").unwrap();
        assert_eq!(desc.get("angst").unwrap().len(), 2);
        assert_eq!(desc.get("beer").unwrap().len(), 2);
    }

    #[test]
    fn test_phrase_placeholder() {
        let index = test_index();
        let mut searcher =
            PhraseSearcher::for_terms(&index, "desc", &["angst", "", "beer"], 1.0, SearcherOptions::default())
                .unwrap();
        assert_eq!(external_ids(&mut searcher, &index), vec!["4"]);
    }

    #[test]
    fn test_phrase_rejects_bad_terms() {
        let index = test_index();
        let empty: [&str; 0] = [];
        assert!(PhraseSearcher::for_terms(&index, "desc", &empty, 1.0, SearcherOptions::default()).is_err());
        assert!(PhraseSearcher::for_terms(&index, "desc", &["", ""], 1.0, SearcherOptions::default()).is_err());
    }

    #[test]
    fn test_phrase_leading_placeholder() {
        let index = test_index();
        let mut searcher =
            PhraseSearcher::for_terms(&index, "desc", &["", "", "beer"], 1.0, SearcherOptions::default())
                .unwrap();
        let mut ctx = SearchContext::new(searcher.document_match_pool_size());

        // "beer" needs two tokens before it
        let dm = searcher.next(&mut ctx).unwrap().unwrap();
        assert_eq!(index.external_id(&dm.index_internal_id).unwrap(), "3");
        assert_eq!(dm.hit_positions, vec![vec![2, 3, 4]]);
        ctx.put(dm);
        let dm = searcher.next(&mut ctx).unwrap().unwrap();
        assert_eq!(index.external_id(&dm.index_internal_id).unwrap(), "4");
        assert_eq!(dm.hit_positions, vec![vec![1, 2, 3]]);
        ctx.put(dm);
        assert!(searcher.next(&mut ctx).unwrap().is_none());
    }

    #[test]
    fn test_phrase_pool_size() {
        let index = test_index();
        let searcher =
            PhraseSearcher::for_terms(&index, "desc", &["angst", "beer"], 1.0, SearcherOptions::default())
                .unwrap();
        // conjunction: 2 currs + 2 term searchers, plus the held candidate
        assert_eq!(searcher.document_match_pool_size(), 5);
    }

    #[test]
    fn test_phrase_advance_keeps_held_candidate() {
        let index = MemoryIndex::builder()
            .add_document(MemoryDocument::new("a").add_text("desc", "angst beer"))
            .add_document(MemoryDocument::new("b").add_text("desc", "angst beer"))
            .add_document(MemoryDocument::new("c").add_text("desc", "beer angst beer"))
            .build();
        let mut searcher =
            PhraseSearcher::for_terms(&index, "desc", &["angst", "beer"], 1.0, SearcherOptions::default())
                .unwrap();
        let mut ctx = SearchContext::new(searcher.document_match_pool_size());

        // after returning "a" the searcher already holds candidate "b"
        let dm = searcher.next(&mut ctx).unwrap().unwrap();
        assert_eq!(index.external_id(&dm.index_internal_id).unwrap(), "a");
        ctx.put(dm);

        let dm = searcher
            .advance(&mut ctx, &IndexInternalId::from_u64(1))
            .unwrap()
            .unwrap();
        assert_eq!(index.external_id(&dm.index_internal_id).unwrap(), "b");
        ctx.put(dm);

        let dm = searcher.next(&mut ctx).unwrap().unwrap();
        assert_eq!(index.external_id(&dm.index_internal_id).unwrap(), "c");
        assert!(searcher.next(&mut ctx).unwrap().is_none());
    }
}
