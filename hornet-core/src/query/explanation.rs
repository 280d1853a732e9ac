//! Score explanations

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Score;

/// Human-readable breakdown of how a document was scored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub value: Score,
    pub description: String,
    /// Whether the document matched at this level
    pub is_match: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<Explanation>,
}

impl Explanation {
    /// A matching node
    pub fn new(value: Score, description: impl Into<String>) -> Self {
        Self {
            value,
            description: description.into(),
            is_match: true,
            details: Vec::new(),
        }
    }

    /// A non-matching node with a zero value
    pub fn no_match(description: impl Into<String>) -> Self {
        Self {
            value: 0.0,
            description: description.into(),
            is_match: false,
            details: Vec::new(),
        }
    }

    pub fn with_detail(mut self, detail: Explanation) -> Self {
        self.details.push(detail);
        self
    }

    pub fn add_detail(&mut self, detail: Explanation) {
        self.details.push(detail);
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(
            f,
            "{:indent$}{} = {}",
            "",
            self.value,
            self.description,
            indent = depth * 2
        )?;
        for detail in &self.details {
            detail.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}
