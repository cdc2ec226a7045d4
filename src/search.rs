//! Document-match searchers and the result model they share.

pub mod collector;
pub mod document_match;
pub mod explanation;
pub mod options;
pub mod pool;
pub mod scorer;
pub mod searcher;

pub use collector::{SearchResult, TopNCollector};
pub use document_match::{ArrayPositions, DocumentMatch, FieldTermLocationMap, Location, TermLocationMap};
pub use explanation::Explanation;
pub use options::{ScoreMode, SearcherOptions};
pub use pool::{DocumentMatchPool, SearchContext};
pub use searcher::Searcher;
