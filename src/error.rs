//! Error types for the Phalanx library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`PhalanxError`] enum. Reader failures are carried through unchanged so the
//! caller sees exactly what the storage layer reported.
//!
//! # Examples
//!
//! ```
//! use phalanx::error::{PhalanxError, Result};
//!
//! fn build_template() -> Result<()> {
//!     Err(PhalanxError::invalid_template("slot 1 starts before slot 0 ends"))
//! }
//!
//! match build_template() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Phalanx operations.
#[derive(Error, Debug)]
pub enum PhalanxError {
    /// I/O errors raised by an index reader.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Index-related errors (term dictionary decoding, unknown documents, etc.)
    #[error("Index error: {0}")]
    Index(String),

    /// Query construction errors.
    #[error("Query error: {0}")]
    Query(String),

    /// Malformed phrase template (slot order, slot bounds, slot counts).
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Errors surfaced by external reader implementations.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with PhalanxError.
pub type Result<T> = std::result::Result<T, PhalanxError>;

impl PhalanxError {
    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        PhalanxError::Index(msg.into())
    }

    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        PhalanxError::Query(msg.into())
    }

    /// Create a new invalid template error.
    pub fn invalid_template<S: Into<String>>(msg: S) -> Self {
        PhalanxError::InvalidTemplate(msg.into())
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        PhalanxError::Index(format!("Not found: {}", msg.into()))
    }
}
