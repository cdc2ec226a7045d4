//! Reuse of [`DocumentMatch`] values across a query.
//!
//! A composed searcher tree reports how many results it can hold at once via
//! `document_match_pool_size`; the pool is pre-filled with that many values so a
//! well-behaved tree never allocates a fresh result while iterating.

use crate::search::document_match::DocumentMatch;

/// A free list of result objects.
#[derive(Debug, Default)]
pub struct DocumentMatchPool {
    avail: Vec<DocumentMatch>,
    allocated: usize,
}

impl DocumentMatchPool {
    /// Create a pool pre-filled with `size` results.
    pub fn new(size: usize) -> Self {
        DocumentMatchPool {
            avail: (0..size).map(|_| DocumentMatch::new()).collect(),
            allocated: 0,
        }
    }

    /// Borrow a reset result, allocating when the pool has run dry.
    pub fn get(&mut self) -> DocumentMatch {
        match self.avail.pop() {
            Some(dm) => dm,
            None => {
                self.allocated += 1;
                DocumentMatch::new()
            }
        }
    }

    /// Return a result. It is reset before it is handed out again.
    pub fn put(&mut self, mut dm: DocumentMatch) {
        dm.reset();
        self.avail.push(dm);
    }

    /// Number of results currently available.
    pub fn available(&self) -> usize {
        self.avail.len()
    }

    /// Number of results allocated beyond the initial size.
    pub fn allocated(&self) -> usize {
        self.allocated
    }
}

/// Per-query state threaded through every `next`/`advance` call.
///
/// Not shareable between callers; each concurrently running query needs its
/// own context.
#[derive(Debug, Default)]
pub struct SearchContext {
    /// Pool of reusable results.
    pub document_match_pool: DocumentMatchPool,
}

impl SearchContext {
    /// Create a context whose pool holds `pool_size` results.
    pub fn new(pool_size: usize) -> Self {
        SearchContext {
            document_match_pool: DocumentMatchPool::new(pool_size),
        }
    }

    /// Borrow a result from the pool.
    pub fn get(&mut self) -> DocumentMatch {
        self.document_match_pool.get()
    }

    /// Return a result to the pool.
    pub fn put(&mut self, dm: DocumentMatch) {
        self.document_match_pool.put(dm);
    }

    /// Return an optional result to the pool.
    pub fn recycle(&mut self, dm: Option<DocumentMatch>) {
        if let Some(dm) = dm {
            self.put(dm);
        }
    }
}
