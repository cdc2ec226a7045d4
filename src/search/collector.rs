//! Collectors drive a searcher tree and gather its results.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::index::IndexReader;
use crate::search::document_match::DocumentMatch;
use crate::search::pool::SearchContext;
use crate::search::searcher::Searcher;

/// Results gathered by a collector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Best hits, highest score first.
    pub hits: Vec<DocumentMatch>,
    /// Number of documents the searcher matched.
    pub total_hits: u64,
    /// Highest score seen.
    pub max_score: f64,
}

/// A hit in the heap, ordered so the worst hit sits on top.
#[derive(Debug)]
struct RankedHit(DocumentMatch);

impl PartialEq for RankedHit {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RankedHit {}

impl PartialOrd for RankedHit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RankedHit {
    fn cmp(&self, other: &Self) -> Ordering {
        // Lower scores are worse; among equal scores later documents are worse
        other
            .0
            .score
            .partial_cmp(&self.0.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.0.index_internal_id.cmp(&other.0.index_internal_id))
    }
}

/// A collector that keeps the top N documents by score.
#[derive(Debug)]
pub struct TopNCollector {
    /// Number of hits to return.
    size: usize,
    /// Number of best hits to skip.
    skip: usize,
    /// Collected hits (worst on top).
    hits: BinaryHeap<RankedHit>,
}

impl TopNCollector {
    /// Create a collector returning `size` hits after skipping the best `skip`.
    pub fn new(size: usize, skip: usize) -> Self {
        TopNCollector {
            size,
            skip,
            hits: BinaryHeap::with_capacity(size + skip),
        }
    }

    /// Get the number of hits to return.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get the number of hits skipped.
    pub fn skip(&self) -> usize {
        self.skip
    }

    /// Drain `searcher` and return the best hits with their external ids.
    pub fn collect(
        &mut self,
        searcher: &mut dyn Searcher,
        reader: &dyn IndexReader,
    ) -> Result<SearchResult> {
        let keep = self.size + self.skip;
        let mut ctx = SearchContext::new(searcher.document_match_pool_size() + keep + 1);
        self.hits.clear();

        let mut total_hits = 0;
        let mut max_score = 0.0f64;

        while let Some(mut dm) = searcher.next(&mut ctx)? {
            total_hits += 1;
            dm.hit_number = total_hits;
            if dm.score > max_score {
                max_score = dm.score;
            }

            if keep == 0 {
                ctx.put(dm);
                continue;
            }

            let hit = RankedHit(dm);
            if self.hits.len() < keep {
                self.hits.push(hit);
            } else if let Some(mut worst) = self.hits.peek_mut() {
                if hit < *worst {
                    // Replace the worst hit
                    let replaced = std::mem::replace(&mut *worst, hit);
                    ctx.put(replaced.0);
                } else {
                    ctx.put(hit.0);
                }
            }
        }

        debug!("Collected {total_hits} hits, max score {max_score}");

        let mut hits = Vec::with_capacity(self.size);
        for RankedHit(mut dm) in std::mem::take(&mut self.hits)
            .into_sorted_vec()
            .into_iter()
            .skip(self.skip)
        {
            dm.id = reader.external_id(&dm.index_internal_id)?;
            hits.push(dm);
        }

        Ok(SearchResult {
            hits,
            total_hits,
            max_score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::memory::{MemoryDocument, MemoryIndex};
    use crate::search::options::SearcherOptions;
    use crate::search::searcher::TermSearcher;

    fn test_index() -> MemoryIndex {
        MemoryIndex::builder()
            .add_document(MemoryDocument::new("one").add_text("desc", "beer water"))
            .add_document(MemoryDocument::new("two").add_text("desc", "beer beer beer beer"))
            .add_document(MemoryDocument::new("three").add_text("desc", "water"))
            .add_document(MemoryDocument::new("four").add_text("desc", "beer and water and more"))
            .build()
    }

    #[test]
    fn test_top_n_collector() {
        let index = test_index();
        let mut searcher =
            TermSearcher::new(&index, "beer", "desc", 1.0, SearcherOptions::default()).unwrap();

        let mut collector = TopNCollector::new(2, 0);
        let result = collector.collect(&mut searcher, &index).unwrap();
        assert_eq!(result.total_hits, 3);
        assert_eq!(result.hits.len(), 2);
        // "two" holds nothing but the term, "one" is half water
        assert_eq!(result.hits[0].id, "two");
        assert_eq!(result.hits[1].id, "one");
        assert_eq!(result.max_score, result.hits[0].score);
        assert!(result.hits[0].score >= result.hits[1].score);
    }

    #[test]
    fn test_top_n_collector_skip() {
        let index = test_index();
        let mut searcher =
            TermSearcher::new(&index, "beer", "desc", 1.0, SearcherOptions::default()).unwrap();

        let mut collector = TopNCollector::new(5, 2);
        let result = collector.collect(&mut searcher, &index).unwrap();
        assert_eq!(result.total_hits, 3);
        assert_eq!(result.hits.len(), 1);
        assert_eq!(result.hits[0].id, "four");
    }

    #[test]
    fn test_top_n_collector_ties_by_id() {
        let index = MemoryIndex::builder()
            .add_document(MemoryDocument::new("a").add_text("desc", "beer"))
            .add_document(MemoryDocument::new("b").add_text("desc", "beer"))
            .add_document(MemoryDocument::new("c").add_text("desc", "beer"))
            .build();
        let mut searcher =
            TermSearcher::new(&index, "beer", "desc", 1.0, SearcherOptions::default()).unwrap();

        let mut collector = TopNCollector::new(2, 0);
        let result = collector.collect(&mut searcher, &index).unwrap();
        let ids: Vec<&str> = result.hits.iter().map(|dm| dm.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_search_result_json() {
        let result = SearchResult {
            hits: Vec::new(),
            total_hits: 3,
            max_score: 1.5,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"hits":[],"total_hits":3,"max_score":1.5}"#);
    }
}
