//! Scoring implementations for ranking search results.
//!
//! Leaf searchers score postings with [`TermQueryScorer`]; combinators fold the
//! matches of their children into one result with [`ConjunctionQueryScorer`] or
//! [`DisjunctionQueryScorer`].

use std::mem;

use crate::index::TermFieldDoc;
use crate::search::document_match::{DocumentMatch, Location};
use crate::search::explanation::Explanation;
use crate::search::options::SearcherOptions;
use crate::search::pool::SearchContext;

/// TF-IDF scorer for a single term in a single field.
#[derive(Debug, Clone)]
pub struct TermQueryScorer {
    /// The term being scored.
    query_term: String,
    /// The field the term is searched in.
    query_field: String,
    /// Boost factor.
    query_boost: f64,
    /// Number of documents in the index.
    doc_total: u64,
    /// Number of documents containing the term.
    doc_term: u64,
    /// Inverse document frequency.
    idf: f64,
    /// Options the scorer was created with.
    options: SearcherOptions,
    /// Normalization pushed down by the enclosing combinator.
    query_norm: f64,
    /// boost * idf * query_norm
    query_weight: f64,
    idf_explanation: Option<Explanation>,
    query_weight_explanation: Option<Explanation>,
}

impl TermQueryScorer {
    /// Create a new term scorer.
    pub fn new(
        query_term: &str,
        query_field: &str,
        query_boost: f64,
        doc_total: u64,
        doc_term: u64,
        options: SearcherOptions,
    ) -> Self {
        let idf = 1.0 + (doc_total as f64 / (doc_term as f64 + 1.0)).ln();
        let idf_explanation = options.explain.then(|| {
            Explanation::new(
                idf,
                format!("idf(docFreq={doc_term}, maxDocs={doc_total})"),
            )
        });

        TermQueryScorer {
            query_term: query_term.to_string(),
            query_field: query_field.to_string(),
            query_boost,
            doc_total,
            doc_term,
            idf,
            options,
            query_norm: 1.0,
            query_weight: 1.0,
            idf_explanation,
            query_weight_explanation: None,
        }
    }

    /// Get the inverse document frequency.
    pub fn idf(&self) -> f64 {
        self.idf
    }

    /// Get the current query norm.
    pub fn query_norm(&self) -> f64 {
        self.query_norm
    }

    /// Squared weight of this term, summed by combinators into the query norm.
    pub fn weight(&self) -> f64 {
        let sum = self.query_boost * self.idf;
        sum * sum
    }

    /// Apply the query norm computed by the enclosing combinator.
    pub fn set_query_norm(&mut self, query_norm: f64) {
        self.query_norm = query_norm;
        self.query_weight = self.query_boost * self.idf * self.query_norm;

        if self.options.explain {
            let mut children = vec![Explanation::new(self.query_boost, "boost")];
            if let Some(idf) = &self.idf_explanation {
                children.push(idf.clone());
            }
            children.push(Explanation::new(self.query_norm, "queryNorm"));
            self.query_weight_explanation = Some(Explanation::with_children(
                self.query_weight,
                format!(
                    "queryWeight({}:{}^{}), product of:",
                    self.query_field, self.query_term, self.query_boost
                ),
                children,
            ));
        }
    }

    /// Score one posting into a pooled result.
    pub fn score(&self, ctx: &mut SearchContext, term_match: &TermFieldDoc) -> DocumentMatch {
        let mut rv = ctx.get();
        rv.index_internal_id.set(term_match.id.as_bytes());

        if self.options.scoring_enabled() {
            let tf = (term_match.freq as f64).sqrt();
            let mut score = tf * term_match.norm * self.idf;

            let mut explanation = None;
            if self.options.explain {
                let mut children = vec![
                    Explanation::new(
                        tf,
                        format!(
                            "tf(termFreq({}:{})={})",
                            self.query_field, self.query_term, term_match.freq
                        ),
                    ),
                    Explanation::new(
                        term_match.norm,
                        format!("fieldNorm(field={}, doc={})", self.query_field, term_match.id),
                    ),
                ];
                if let Some(idf) = &self.idf_explanation {
                    children.push(idf.clone());
                }
                explanation = Some(Explanation::with_children(
                    score,
                    format!(
                        "fieldWeight({}:{} in {}), product of:",
                        self.query_field, self.query_term, term_match.id
                    ),
                    children,
                ));
            }

            // a weight of exactly 1 means no combinator normalized us
            if self.query_weight != 1.0 {
                score *= self.query_weight;
                if let Some(field_weight) = explanation.take() {
                    let mut children = Vec::with_capacity(2);
                    if let Some(query_weight) = &self.query_weight_explanation {
                        children.push(query_weight.clone());
                    }
                    children.push(field_weight);
                    explanation = Some(Explanation::with_children(
                        score,
                        format!(
                            "weight({}:{}^{} in {}), product of:",
                            self.query_field, self.query_term, self.query_boost, term_match.id
                        ),
                        children,
                    ));
                }
            }

            rv.score = score;
            rv.expl = explanation;
        }

        for vector in &term_match.vectors {
            rv.locations.add_location(
                &vector.field,
                &term_match.term,
                Location {
                    pos: vector.pos as f64,
                    start: vector.start,
                    end: vector.end,
                    array_positions: vector.array_positions.clone(),
                },
            );
            rv.hit_positions.push(vec![vector.pos]);
        }

        rv
    }

    /// Approximate size in bytes.
    pub fn size(&self) -> usize {
        mem::size_of::<TermQueryScorer>()
            + self.query_term.len()
            + self.query_field.len()
            + self.idf_explanation.as_ref().map(Explanation::size).unwrap_or(0)
            + self
                .query_weight_explanation
                .as_ref()
                .map(Explanation::size)
                .unwrap_or(0)
    }

    /// Document totals the idf was computed from.
    pub fn doc_stats(&self) -> (u64, u64) {
        (self.doc_total, self.doc_term)
    }
}

/// Folds the per-child matches of one document into a single result.
#[derive(Debug, Clone, Default)]
pub struct ConjunctionQueryScorer {
    options: SearcherOptions,
}

impl ConjunctionQueryScorer {
    /// Create a new conjunction scorer.
    pub fn new(options: SearcherOptions) -> Self {
        ConjunctionQueryScorer { options }
    }

    /// Sum the constituent scores into the first constituent.
    ///
    /// Drains `constituents`; every constituent other than the returned one goes
    /// back to the pool.
    pub fn score(
        &self,
        ctx: &mut SearchContext,
        constituents: &mut Vec<DocumentMatch>,
    ) -> Option<DocumentMatch> {
        fold_constituents(ctx, constituents, self.options, "sum of:")
    }
}

/// Scores documents matched by some of the children of a disjunction.
#[derive(Debug, Clone, Default)]
pub struct DisjunctionQueryScorer {
    options: SearcherOptions,
    coord: bool,
}

impl DisjunctionQueryScorer {
    /// Create a scorer that scales the sum by the fraction of matching children.
    pub fn new(options: SearcherOptions) -> Self {
        DisjunctionQueryScorer {
            options,
            coord: true,
        }
    }

    /// Create a scorer that reports the plain sum, used for synonym alternatives.
    pub fn without_coord(options: SearcherOptions) -> Self {
        DisjunctionQueryScorer {
            options,
            coord: false,
        }
    }

    /// Fold the matching children into one result.
    pub fn score(
        &self,
        ctx: &mut SearchContext,
        constituents: &mut Vec<DocumentMatch>,
        count_total: usize,
    ) -> Option<DocumentMatch> {
        let count_matched = constituents.len();
        let mut rv = fold_constituents(ctx, constituents, self.options, "sum of:")?;

        if self.coord && self.options.scoring_enabled() && count_total > 0 {
            let coord = count_matched as f64 / count_total as f64;
            rv.score *= coord;
            if let Some(sum) = rv.expl.take() {
                rv.expl = Some(Explanation::with_children(
                    rv.score,
                    "product of:",
                    vec![
                        sum,
                        Explanation::new(coord, format!("coord({count_matched}/{count_total})")),
                    ],
                ));
            }
        }

        Some(rv)
    }
}

fn fold_constituents(
    ctx: &mut SearchContext,
    constituents: &mut Vec<DocumentMatch>,
    options: SearcherOptions,
    message: &str,
) -> Option<DocumentMatch> {
    let mut drain = constituents.drain(..);
    let mut rv = drain.next()?;

    let mut sum = rv.score;
    let mut children = Vec::new();
    if options.explain {
        children.extend(rv.expl.take());
    }

    for mut constituent in drain {
        sum += constituent.score;
        if options.explain {
            children.extend(constituent.expl.take());
        }
        rv.merge_positional_data(&mut constituent);
        ctx.put(constituent);
    }

    if options.scoring_enabled() {
        rv.score = sum;
        rv.expl = options
            .explain
            .then(|| Explanation::with_children(sum, message, children));
    } else {
        rv.score = 0.0;
        rv.expl = None;
    }

    Some(rv)
}
