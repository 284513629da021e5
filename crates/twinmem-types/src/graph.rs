//! Graph triple types.
//!
//! A triple is the unit the extraction step produces and the graph store
//! appends: `(source) -[relation]-> (target)`. No schema is imposed on
//! entity labels or relation types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single `(source, relation, target)` edge extracted from a fact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphTriple {
    /// Label of the source entity (e.g., "Alex").
    pub source: String,
    /// Relation type (e.g., "WORKS_AS").
    pub relation: String,
    /// Label of the target entity (e.g., "Python Developer").
    pub target: String,
}

impl GraphTriple {
    pub fn new(
        source: impl Into<String>,
        relation: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            relation: relation.into(),
            target: target.into(),
        }
    }

    /// Normalize a relation label to `UPPER_SNAKE_CASE`.
    ///
    /// Extraction models emit "works as", "works-as", "WorksAs" and so on for
    /// the same relation; collapsing them keeps the graph readable.
    pub fn normalize_relation(relation: &str) -> String {
        let mut out = String::with_capacity(relation.len());
        let mut prev_lower = false;
        for ch in relation.trim().chars() {
            if ch.is_alphanumeric() {
                if ch.is_uppercase() && prev_lower {
                    out.push('_');
                }
                prev_lower = ch.is_lowercase() || ch.is_numeric();
                out.extend(ch.to_uppercase());
            } else {
                if !out.ends_with('_') && !out.is_empty() {
                    out.push('_');
                }
                prev_lower = false;
            }
        }
        out.trim_end_matches('_').to_string()
    }

    /// A triple is usable only when every part is non-blank.
    pub fn is_complete(&self) -> bool {
        !self.source.trim().is_empty()
            && !self.relation.trim().is_empty()
            && !self.target.trim().is_empty()
    }
}

impl fmt::Display for GraphTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --[{}]--> {}", self.source, self.relation, self.target)
    }
}
