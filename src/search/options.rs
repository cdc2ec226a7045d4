//! Construction-time searcher configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How matches are scored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScoreMode {
    /// Compute relevance scores.
    #[default]
    Default,
    /// Skip scoring entirely; every match scores 0.
    None,
}

impl From<String> for ScoreMode {
    fn from(value: String) -> Self {
        ScoreMode::from(value.as_str())
    }
}

impl From<&str> for ScoreMode {
    fn from(value: &str) -> Self {
        if value == "none" {
            ScoreMode::None
        } else {
            ScoreMode::Default
        }
    }
}

impl From<ScoreMode> for String {
    fn from(mode: ScoreMode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for ScoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreMode::Default => write!(f, ""),
            ScoreMode::None => write!(f, "none"),
        }
    }
}

/// Options recognized by every searcher constructor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearcherOptions {
    /// Attach a scoring explanation to every match.
    pub explain: bool,
    /// Load term occurrences (positions, offsets, array paths) with every match.
    pub include_term_vectors: bool,
    /// Scoring mode.
    pub score: ScoreMode,
}

impl SearcherOptions {
    /// Options with explanations turned on.
    pub fn explain() -> Self {
        SearcherOptions {
            explain: true,
            ..Default::default()
        }
    }

    /// Set whether explanations are attached.
    pub fn with_explain(mut self, explain: bool) -> Self {
        self.explain = explain;
        self
    }

    /// Set whether term vectors are loaded.
    pub fn with_term_vectors(mut self, include_term_vectors: bool) -> Self {
        self.include_term_vectors = include_term_vectors;
        self
    }

    /// Set the scoring mode.
    pub fn with_score(mut self, score: ScoreMode) -> Self {
        self.score = score;
        self
    }

    /// Whether scores are computed at all.
    pub fn scoring_enabled(&self) -> bool {
        self.score != ScoreMode::None
    }

    /// Parse options from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
