//! In-memory index reader.
//!
//! `MemoryIndex` keeps fully analyzed postings in memory and hands out
//! [`TermFieldReader`]s over them. It is meant for tests, benchmarks and for
//! embedding small corpora; text is split on whitespace. Positions start at 1
//! and run on across the values of a field, with a gap of
//! [`VALUE_POSITION_GAP`] between consecutive values so no phrase spans two of
//! them.

use std::sync::Arc;

use ahash::AHashMap;

use crate::error::{PhalanxError, Result};
use crate::index::{IndexInternalId, IndexReader, TermFieldDoc, TermFieldReader, TermFieldVector};

/// Positions skipped between two values of the same field.
pub const VALUE_POSITION_GAP: u64 = 100;

/// A document to be loaded into a [`MemoryIndex`].
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    id: String,
    values: Vec<FieldText>,
}

#[derive(Debug, Clone)]
struct FieldText {
    field: String,
    array_positions: Vec<u64>,
    text: String,
}

impl MemoryDocument {
    /// Create a new document with the given external id.
    pub fn new<S: Into<String>>(id: S) -> Self {
        MemoryDocument {
            id: id.into(),
            values: Vec::new(),
        }
    }

    /// Add a plain text value.
    pub fn add_text<F: Into<String>, T: Into<String>>(self, field: F, text: T) -> Self {
        self.add_array_text(field, Vec::new(), text)
    }

    /// Add a text value located at `array_positions` inside nested structure.
    pub fn add_array_text<F: Into<String>, T: Into<String>>(
        mut self,
        field: F,
        array_positions: Vec<u64>,
        text: T,
    ) -> Self {
        self.values.push(FieldText {
            field: field.into(),
            array_positions,
            text: text.into(),
        });
        self
    }

    /// Get the external id.
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Builder for [`MemoryIndex`].
#[derive(Debug, Default)]
pub struct MemoryIndexBuilder {
    documents: Vec<MemoryDocument>,
}

impl MemoryIndexBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document. Documents get internal ids in insertion order.
    pub fn add_document(mut self, document: MemoryDocument) -> Self {
        self.documents.push(document);
        self
    }

    /// Analyze all documents and build the index.
    pub fn build(self) -> MemoryIndex {
        let mut postings: AHashMap<(String, String), Vec<TermFieldDoc>> = AHashMap::new();
        let mut external_ids = Vec::with_capacity(self.documents.len());

        for (doc_num, document) in self.documents.into_iter().enumerate() {
            let internal_id = IndexInternalId::from_u64(doc_num as u64);

            // field -> term -> occurrences
            let mut field_terms: AHashMap<String, AHashMap<String, Vec<TermFieldVector>>> =
                AHashMap::new();
            let mut field_lengths: AHashMap<String, u64> = AHashMap::new();
            // field -> last position handed out
            let mut field_positions: AHashMap<String, u64> = AHashMap::new();

            for value in &document.values {
                let mut pos = match field_positions.get(&value.field) {
                    Some(&last) => last + VALUE_POSITION_GAP,
                    None => 0,
                };
                let mut tokens = 0;
                for (start, token) in tokenize(&value.text) {
                    pos += 1;
                    tokens += 1;
                    field_terms
                        .entry(value.field.clone())
                        .or_default()
                        .entry(token.to_string())
                        .or_default()
                        .push(TermFieldVector {
                            field: value.field.clone(),
                            pos,
                            start: start as u64,
                            end: (start + token.len()) as u64,
                            array_positions: value.array_positions.clone(),
                        });
                }
                *field_lengths.entry(value.field.clone()).or_default() += tokens;
                field_positions.insert(value.field.clone(), pos);
            }

            for (field, terms) in field_terms {
                let length = field_lengths.get(&field).copied().unwrap_or(1).max(1);
                let norm = 1.0 / (length as f64).sqrt();
                for (term, vectors) in terms {
                    postings
                        .entry((field.clone(), term.clone()))
                        .or_default()
                        .push(TermFieldDoc {
                            term,
                            id: internal_id.clone(),
                            freq: vectors.len() as u64,
                            norm,
                            vectors,
                        });
                }
            }

            external_ids.push(document.id);
        }

        let postings = postings
            .into_iter()
            .map(|(key, list)| (key, Arc::new(list)))
            .collect();

        MemoryIndex {
            external_ids,
            postings,
        }
    }
}

/// Split text on whitespace, returning byte offsets with each token.
fn tokenize(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split_whitespace()
        .map(move |token| (token.as_ptr() as usize - text.as_ptr() as usize, token))
}

/// An index reader over in-memory postings.
#[derive(Debug, Clone)]
pub struct MemoryIndex {
    external_ids: Vec<String>,
    postings: AHashMap<(String, String), Arc<Vec<TermFieldDoc>>>,
}

impl MemoryIndex {
    /// Create a builder.
    pub fn builder() -> MemoryIndexBuilder {
        MemoryIndexBuilder::new()
    }

    /// Document frequency of a term, 0 if the term is unknown.
    pub fn doc_freq(&self, field: &str, term: &str) -> u64 {
        self.postings
            .get(&(field.to_string(), term.to_string()))
            .map(|list| list.len() as u64)
            .unwrap_or(0)
    }
}

impl IndexReader for MemoryIndex {
    fn doc_count(&self) -> Result<u64> {
        Ok(self.external_ids.len() as u64)
    }

    fn external_id(&self, id: &IndexInternalId) -> Result<String> {
        let doc_num = id.value()?;
        self.external_ids
            .get(doc_num as usize)
            .cloned()
            .ok_or_else(|| PhalanxError::not_found(format!("internal id {id}")))
    }

    fn term_field_reader(
        &self,
        term: &str,
        field: &str,
        include_freq: bool,
        include_norm: bool,
        include_term_vectors: bool,
    ) -> Result<Box<dyn TermFieldReader>> {
        let postings = self
            .postings
            .get(&(field.to_string(), term.to_string()))
            .cloned()
            .unwrap_or_default();
        Ok(Box::new(MemoryTermFieldReader {
            postings,
            cursor: 0,
            include_freq,
            include_norm,
            include_term_vectors,
            closed: false,
        }))
    }
}

/// Posting reader handed out by [`MemoryIndex`].
#[derive(Debug)]
pub struct MemoryTermFieldReader {
    postings: Arc<Vec<TermFieldDoc>>,
    cursor: usize,
    include_freq: bool,
    include_norm: bool,
    include_term_vectors: bool,
    closed: bool,
}

impl MemoryTermFieldReader {
    fn emit(&mut self, index: usize) -> Option<TermFieldDoc> {
        let posting = self.postings.get(index)?;
        self.cursor = index + 1;
        Some(TermFieldDoc {
            term: posting.term.clone(),
            id: posting.id.clone(),
            freq: if self.include_freq { posting.freq } else { 0 },
            norm: if self.include_norm { posting.norm } else { 1.0 },
            vectors: if self.include_term_vectors {
                posting.vectors.clone()
            } else {
                Vec::new()
            },
        })
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(PhalanxError::index("term field reader is closed"));
        }
        Ok(())
    }
}

impl TermFieldReader for MemoryTermFieldReader {
    fn next(&mut self) -> Result<Option<TermFieldDoc>> {
        self.check_open()?;
        Ok(self.emit(self.cursor))
    }

    fn advance(&mut self, target: &IndexInternalId) -> Result<Option<TermFieldDoc>> {
        self.check_open()?;
        let remaining = &self.postings[self.cursor.min(self.postings.len())..];
        let offset = remaining.partition_point(|posting| posting.id < *target);
        Ok(self.emit(self.cursor + offset))
    }

    fn count(&self) -> u64 {
        self.postings.len() as u64
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
