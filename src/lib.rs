//! # Phalanx
//!
//! Composable document-match searchers for full-text queries.
//!
//! ## Features
//!
//! - Pull-based searcher trees driven through `next` and `advance`
//! - Skip-ahead merge-join conjunctions and heap-based disjunctions
//! - Exact phrases, ordered templates and synonym phrases
//! - Nested-array scoped matching
//! - TF-IDF scoring with optional explanations
//! - Pooled result objects

pub mod error;
pub mod index;
pub mod search;

pub mod prelude {
    //! Commonly used types.

    pub use crate::error::{PhalanxError, Result};
    pub use crate::index::memory::{MemoryDocument, MemoryIndex};
    pub use crate::index::{IndexInternalId, IndexReader, TermFieldReader};
    pub use crate::search::searcher::{
        ConjunctionSearcher, DisjunctionSearcher, FilteringSearcher, NestedArraySearcher,
        OrderedConjunctionSearcher, PhraseSearcher, SearchAtPosition, Searcher,
        SynonymPhraseSearcher, SynonymSlot, TermSearcher,
    };
    pub use crate::search::{
        DocumentMatch, SearchContext, SearchResult, SearcherOptions, TopNCollector,
    };
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
