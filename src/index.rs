//! Index reader interfaces consumed by the searchers.
//!
//! Storage, segment layout and term dictionary decoding live behind these
//! traits. Searchers only ever see document identifiers and per-document term
//! occurrences.

pub mod memory;

use std::cmp::Ordering;
use std::fmt;

use crate::error::{PhalanxError, Result};

/// Opaque, totally-ordered document identifier within one reader snapshot.
///
/// Ordering is plain lexicographic byte order, so identifiers built with
/// [`IndexInternalId::from_u64`] sort numerically.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexInternalId(Vec<u8>);

impl IndexInternalId {
    /// Create an identifier from raw bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        IndexInternalId(bytes)
    }

    /// Create an identifier from a document number (big-endian encoded).
    pub fn from_u64(value: u64) -> Self {
        IndexInternalId(value.to_be_bytes().to_vec())
    }

    /// Decode a big-endian document number.
    pub fn value(&self) -> Result<u64> {
        let bytes: [u8; 8] = self.0.as_slice().try_into().map_err(|_| {
            PhalanxError::index(format!(
                "internal id of {} bytes is not a document number",
                self.0.len()
            ))
        })?;
        Ok(u64::from_be_bytes(bytes))
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Compare against another identifier.
    pub fn compare(&self, other: &IndexInternalId) -> Ordering {
        self.0.cmp(&other.0)
    }

    /// Reuse the identifier's buffer for new contents.
    pub fn set(&mut self, bytes: &[u8]) {
        self.0.clear();
        self.0.extend_from_slice(bytes);
    }

    /// Clear the identifier while keeping its allocation.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Check whether the identifier is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[u8]> for IndexInternalId {
    fn from(bytes: &[u8]) -> Self {
        IndexInternalId(bytes.to_vec())
    }
}

impl From<&str> for IndexInternalId {
    fn from(s: &str) -> Self {
        IndexInternalId(s.as_bytes().to_vec())
    }
}

impl fmt::Display for IndexInternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Trait for index readers bound to one snapshot.
pub trait IndexReader: Send + Sync + fmt::Debug {
    /// Get the number of live documents in the snapshot.
    fn doc_count(&self) -> Result<u64>;

    /// Resolve an internal identifier to the external document id.
    fn external_id(&self, id: &IndexInternalId) -> Result<String>;

    /// Open a posting reader for one term in one field.
    fn term_field_reader(
        &self,
        term: &str,
        field: &str,
        include_freq: bool,
        include_norm: bool,
        include_term_vectors: bool,
    ) -> Result<Box<dyn TermFieldReader>>;
}

/// One occurrence of a term inside a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermFieldVector {
    /// The field the occurrence belongs to.
    pub field: String,
    /// Token position (1-based).
    pub pos: u64,
    /// Byte offset where the token starts.
    pub start: u64,
    /// Byte offset where the token ends.
    pub end: u64,
    /// Path of indices locating the value inside nested/array structure.
    pub array_positions: Vec<u64>,
}

/// Posting entry for one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermFieldDoc {
    /// The term this entry belongs to.
    pub term: String,
    /// Internal document identifier.
    pub id: IndexInternalId,
    /// Term frequency in the document.
    pub freq: u64,
    /// Field length norm.
    pub norm: f64,
    /// Term occurrences, populated only when term vectors were requested.
    pub vectors: Vec<TermFieldVector>,
}

/// Iterator over the posting list of a single term.
pub trait TermFieldReader: Send + fmt::Debug {
    /// Move to the next posting, `None` when exhausted.
    fn next(&mut self) -> Result<Option<TermFieldDoc>>;

    /// Move to the first posting whose id is >= target.
    fn advance(&mut self, target: &IndexInternalId) -> Result<Option<TermFieldDoc>>;

    /// Number of documents in the posting list.
    fn count(&self) -> u64;

    /// Release the reader.
    fn close(&mut self) -> Result<()>;
}
