//! Intersection of child searchers.

use std::cmp::Ordering;
use std::mem;

use log::debug;

use crate::error::{PhalanxError, Result};
use crate::index::IndexInternalId;
use crate::search::document_match::DocumentMatch;
use crate::search::options::SearcherOptions;
use crate::search::pool::SearchContext;
use crate::search::scorer::ConjunctionQueryScorer;
use crate::search::searcher::positions::{PhraseTemplate, TemplateSlot};
use crate::search::searcher::{
    Searcher, children_pool_size, close_all, compute_query_norm, sort_by_count,
};

/// Searcher matching documents that every child matches.
///
/// Children are merge-joined: the child holding the largest current id drives
/// the others forward with `advance` until all agree on one document.
#[derive(Debug)]
pub struct ConjunctionSearcher {
    searchers: Vec<Box<dyn Searcher>>,
    /// Current match of each child, `None` before the first pull or once exhausted.
    currs: Vec<Option<DocumentMatch>>,
    /// Index of the child holding the largest current id.
    max_id_idx: usize,
    /// Buffer holding the id every child is being driven to.
    max_id: IndexInternalId,
    query_norm: f64,
    scorer: ConjunctionQueryScorer,
    template: Option<PhraseTemplate>,
    /// Scratch list of matches handed to the scorer.
    constituents: Vec<DocumentMatch>,
    initialized: bool,
    closed: bool,
}

impl ConjunctionSearcher {
    /// Create a conjunction over `searchers`.
    ///
    /// Children are reordered cheapest first; only the result set matters.
    pub fn new(mut searchers: Vec<Box<dyn Searcher>>, options: SearcherOptions) -> Result<Self> {
        sort_by_count(&mut searchers);
        Ok(Self::build(searchers, None, options))
    }

    /// Create a conjunction whose children must also line up along `slots`.
    ///
    /// Child `i` covers `slots[i]`. Children keep their order. On error every
    /// child is closed before returning.
    pub fn with_positions(
        mut searchers: Vec<Box<dyn Searcher>>,
        slots: Vec<TemplateSlot>,
        options: SearcherOptions,
    ) -> Result<Self> {
        let template = if searchers.len() != slots.len() {
            Err(PhalanxError::invalid_template(format!(
                "{} searchers for {} template slots",
                searchers.len(),
                slots.len()
            )))
        } else {
            PhraseTemplate::new(slots)
        };

        match template {
            Ok(template) => Ok(Self::build(searchers, Some(template), options)),
            Err(e) => {
                let _ = close_all(searchers.iter_mut());
                Err(e)
            }
        }
    }

    fn build(
        mut searchers: Vec<Box<dyn Searcher>>,
        template: Option<PhraseTemplate>,
        options: SearcherOptions,
    ) -> Self {
        let query_norm = compute_query_norm(&mut searchers).text;
        debug!(
            "Conjunction over {} searchers (positional: {})",
            searchers.len(),
            template.is_some()
        );

        let currs = (0..searchers.len()).map(|_| None).collect();
        let constituents = Vec::with_capacity(searchers.len());
        ConjunctionSearcher {
            searchers,
            currs,
            max_id_idx: 0,
            max_id: IndexInternalId::default(),
            query_norm,
            scorer: ConjunctionQueryScorer::new(options),
            template,
            constituents,
            initialized: false,
            closed: false,
        }
    }

    /// Norm applied to the children.
    pub fn query_norm(&self) -> f64 {
        self.query_norm
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.searchers.len()
    }

    /// Check whether there are no children.
    pub fn is_empty(&self) -> bool {
        self.searchers.is_empty()
    }

    fn init_searchers(&mut self, ctx: &mut SearchContext) -> Result<()> {
        for i in 0..self.searchers.len() {
            ctx.recycle(self.currs[i].take());
            self.currs[i] = self.searchers[i].next(ctx)?;
        }
        self.initialized = true;
        Ok(())
    }

    /// Whether the current (all-equal) matches satisfy the template, if any.
    fn positions_match(&mut self) -> bool {
        let Some(template) = self.template.as_mut() else {
            return true;
        };
        let currs = &self.currs;
        template.matches(move |i| {
            currs[i]
                .as_ref()
                .map(|dm| dm.hit_positions.as_slice())
                .unwrap_or(&[])
        })
    }
}

/// Replace child `i`'s current match with its first match >= `target`.
fn advance_child(
    searchers: &mut [Box<dyn Searcher>],
    currs: &mut [Option<DocumentMatch>],
    ctx: &mut SearchContext,
    i: usize,
    target: &IndexInternalId,
) -> Result<()> {
    ctx.recycle(currs[i].take());
    currs[i] = searchers[i].advance(ctx, target)?;
    Ok(())
}

impl Searcher for ConjunctionSearcher {
    fn next(&mut self, ctx: &mut SearchContext) -> Result<Option<DocumentMatch>> {
        if !self.initialized {
            self.init_searchers(ctx)?;
        }
        if self.currs.is_empty() {
            return Ok(None);
        }

        'outer: loop {
            match &self.currs[self.max_id_idx] {
                Some(dm) => self.max_id.set(dm.index_internal_id.as_bytes()),
                None => return Ok(None),
            }

            let mut i = 0;
            while i < self.currs.len() {
                if i == self.max_id_idx {
                    i += 1;
                    continue;
                }
                let ordering = match &self.currs[i] {
                    Some(dm) => self.max_id.compare(&dm.index_internal_id),
                    None => return Ok(None),
                };
                match ordering {
                    Ordering::Equal => i += 1,
                    Ordering::Less => {
                        // child i is ahead: it becomes the new target and every
                        // child scanned before it has to catch up
                        self.max_id_idx = i;
                        if let Some(dm) = &self.currs[i] {
                            self.max_id.set(dm.index_internal_id.as_bytes());
                        }
                        for x in 0..i {
                            advance_child(&mut self.searchers, &mut self.currs, ctx, x, &self.max_id)?;
                        }
                        continue 'outer;
                    }
                    Ordering::Greater => {
                        // re-check the same child after it moves
                        advance_child(&mut self.searchers, &mut self.currs, ctx, i, &self.max_id)?;
                    }
                }
            }

            let rv = if self.positions_match() {
                self.constituents
                    .extend(self.currs.iter_mut().filter_map(Option::take));
                self.scorer.score(ctx, &mut self.constituents)
            } else {
                for curr in self.currs.iter_mut() {
                    ctx.recycle(curr.take());
                }
                None
            };

            for i in 0..self.searchers.len() {
                self.currs[i] = self.searchers[i].next(ctx)?;
            }

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
                self.currs[i] = self.searchers[i].advance(ctx, target)?;
            }
            self.initialized = true;
            return self.next(ctx);
        }

        for i in 0..self.searchers.len() {
            // exhausted children stay exhausted
            let behind =
                matches!(&self.currs[i], Some(dm) if dm.index_internal_id < *target);
            if behind {
                advance_child(&mut self.searchers, &mut self.currs, ctx, i, target)?;
            }
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

    fn document_match_pool_size(&self) -> usize {
        self.currs.len() + children_pool_size(&self.searchers)
    }

    fn size(&self) -> usize {
        mem::size_of::<ConjunctionSearcher>()
            + self.max_id.as_bytes().len()
            + self.searchers.iter().map(|s| s.size()).sum::<usize>()
            + self
                .currs
                .iter()
                .flatten()
                .map(DocumentMatch::size)
                .sum::<usize>()
            + self.template.as_ref().map(PhraseTemplate::size).unwrap_or(0)
    }
}
