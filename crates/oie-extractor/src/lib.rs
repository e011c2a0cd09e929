//! OIE Extractor - Open relation extraction over dependency graphs
//!
//! Expands the anchors of pattern matches into complete phrases,
//! assembles them into (argument, relation, argument) triples, and
//! ranks the triples produced by many pattern extractors.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use oie_core::{Interval, NodeSet};

pub mod builder;
pub mod expand;
pub mod extractor;
pub mod pattern;
pub mod pipeline;

#[cfg(test)]
mod test_support;

pub use builder::build_extraction;
pub use extractor::{load_extractors, parse_extractors, Confidence, PatternExtractor};
pub use pattern::{EdgeMatcher, GraphPattern, PathPattern};
pub use pipeline::{OpenExtractor, SentenceRecord};

/// Group holding the relation anchor
pub const REL: &str = "rel";
/// Group holding the first argument anchor
pub const ARG1: &str = "arg1";
/// Group holding the second argument anchor
pub const ARG2: &str = "arg2";

// ============================================================================
// Matches
// ============================================================================

/// Result of matching a pattern against a graph: named node groups
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Match {
    groups: BTreeMap<String, usize>,
}

impl Match {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a group name to a node index
    pub fn with_group(mut self, name: impl Into<String>, index: usize) -> Self {
        self.groups.insert(name.into(), index);
        self
    }

    pub fn group(&self, name: &str) -> Option<usize> {
        self.groups.get(name).copied()
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, usize)> {
        self.groups.iter().map(|(name, &index)| (name.as_str(), index))
    }
}

// ============================================================================
// Extractions
// ============================================================================

/// One rendered part of a triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionPart {
    pub text: String,
    pub nodes: NodeSet,
}

impl ExtractionPart {
    pub fn new(text: impl Into<String>, nodes: NodeSet) -> Self {
        Self {
            text: text.into(),
            nodes,
        }
    }

    pub fn span(&self) -> Option<Interval> {
        self.nodes.span()
    }
}

/// A triple together with where it came from
///
/// Two extractions are equal when they render the same triple and come
/// from the same pattern; the originating match is provenance only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedExtraction {
    /// Description of the originating pattern
    pub pattern: String,
    /// Match the extraction was built from
    pub matched: Match,
    pub arg1: ExtractionPart,
    pub rel: ExtractionPart,
    pub arg2: ExtractionPart,
}

impl DetailedExtraction {
    pub fn new(
        pattern: impl Into<String>,
        matched: Match,
        arg1: ExtractionPart,
        rel: ExtractionPart,
        arg2: ExtractionPart,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            matched,
            arg1,
            rel,
            arg2,
        }
    }

    /// Replace the rendered relation text, keeping its nodes
    pub fn with_relation_text(mut self, text: impl Into<String>) -> Self {
        self.rel.text = text.into();
        self
    }

    fn key(&self) -> (&str, &str, &str, &str) {
        (
            self.arg1.text.as_str(),
            self.rel.text.as_str(),
            self.arg2.text.as_str(),
            self.pattern.as_str(),
        )
    }
}

impl PartialEq for DetailedExtraction {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for DetailedExtraction {}

impl Hash for DetailedExtraction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl std::fmt::Display for DetailedExtraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}; {}; {})", self.arg1.text, self.rel.text, self.arg2.text)
    }
}

/// An extraction with its confidence
///
/// Ordered by confidence descending, then by the canonical string form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredExtraction {
    pub confidence: f64,
    pub extraction: DetailedExtraction,
}

impl ScoredExtraction {
    pub fn new(confidence: f64, extraction: DetailedExtraction) -> Self {
        Self {
            confidence,
            extraction,
        }
    }
}

impl Ord for ScoredExtraction {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .confidence
            .total_cmp(&self.confidence)
            .then_with(|| self.extraction.to_string().cmp(&other.extraction.to_string()))
            .then_with(|| self.extraction.pattern.cmp(&other.extraction.pattern))
    }
}

impl PartialOrd for ScoredExtraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScoredExtraction {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoredExtraction {}

// ============================================================================
// Tests
// ============================================================================
