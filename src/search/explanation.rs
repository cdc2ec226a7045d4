//! Scoring explanations.

use std::fmt;
use std::mem;

use serde::{Deserialize, Serialize};

/// A tree describing how a score was computed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    /// The value this node contributes.
    pub value: f64,
    /// Human-readable description.
    pub message: String,
    /// Sub-explanations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Explanation>,
}

impl Explanation {
    /// Create a leaf explanation.
    pub fn new<S: Into<String>>(value: f64, message: S) -> Self {
        Explanation {
            value,
            message: message.into(),
            children: Vec::new(),
        }
    }

    /// Create an explanation with children.
    pub fn with_children<S: Into<String>>(
        value: f64,
        message: S,
        children: Vec<Explanation>,
    ) -> Self {
        Explanation {
            value,
            message: message.into(),
            children,
        }
    }

    /// Approximate heap and inline size in bytes.
    pub fn size(&self) -> usize {
        mem::size_of::<Explanation>()
            + self.message.len()
            + self.children.iter().map(Explanation::size).sum::<usize>()
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(f, "{:indent$}{} = {}", "", self.message, self.value, indent = depth * 2)?;
        for child in &self.children {
            child.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explanation_display() {
        let expl = Explanation::with_children(
            3.0,
            "sum of:",
            vec![Explanation::new(1.0, "a"), Explanation::new(2.0, "b")],
        );
        let rendered = expl.to_string();
        assert!(rendered.starts_with("sum of: = 3"));
        assert!(rendered.contains("\n  a = 1"));
        assert!(rendered.contains("\n  b = 2"));
    }

    #[test]
    fn test_explanation_json() {
        let expl = Explanation::new(1.0, "idf");
        let json = serde_json::to_string(&expl).unwrap();
        assert_eq!(json, r#"{"value":1.0,"message":"idf"}"#);
        let back: Explanation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expl);
    }
}
