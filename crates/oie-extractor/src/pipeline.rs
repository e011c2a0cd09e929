//! Extraction pipeline
//!
//! Runs every loaded extractor over one sentence graph, then filters,
//! deduplicates and ranks what they produce. The pipeline only reads its
//! configuration and extractors, so one instance can be shared by many
//! workers.

use std::borrow::Cow;
use std::collections::HashMap;

use tracing::debug;

use oie_core::{AppConfig, DependencyGraph, ExtractionConfig, OieError, Result};

use crate::builder::build_extraction;
use crate::extractor::{load_extractors, PatternExtractor};
use crate::{DetailedExtraction, Match, ScoredExtraction, ARG1, ARG2};

/// Argument anchor tags accepted when arguments are restricted
pub const VALID_ARGUMENT_POSTAGS: &[&str] =
    &["NN", "NNS", "NNP", "NNPS", "JJ", "JJS", "CD", "PRP"];

/// Pattern-based open extractor
#[derive(Debug, Clone)]
pub struct OpenExtractor {
    config: ExtractionConfig,
    extractors: Vec<PatternExtractor>,
}

impl OpenExtractor {
    pub fn new(config: ExtractionConfig, extractors: Vec<PatternExtractor>) -> Self {
        Self { config, extractors }
    }

    /// Validate the configuration and load every configured model
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;

        let mut extractors = Vec::new();
        for source in &config.extractors {
            extractors.extend(load_extractors(source)?);
        }

        tracing::info!(
            extractors = extractors.len(),
            threshold = config.extraction.confidence_threshold,
            "Open extractor ready"
        );
        Ok(Self::new(config.extraction.clone(), extractors))
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn extractors(&self) -> &[PatternExtractor] {
        &self.extractors
    }

    /// Ranked extractions for one sentence
    pub fn extract(&self, graph: &DependencyGraph) -> Result<Vec<ScoredExtraction>> {
        let graph = self.prepare(graph);
        let graph = graph.as_ref();
        let threshold = self.config.confidence_threshold;
        let expand = self.config.expand_extraction;
        let restrict = self.config.restrict_arguments;

        let mut scored = Vec::new();
        for extractor in &self.extractors {
            let pattern = extractor.pattern().describe();

            if !extractor.is_feasible(graph) {
                debug!(pattern = %pattern, "Pruned infeasible pattern");
                continue;
            }

            if let Some(confidence) = extractor.independent_confidence() {
                if confidence < threshold {
                    debug!(pattern = %pattern, confidence, threshold, "Skipped pattern below threshold");
                    continue;
                }
            }

            let extractions = extractor.extract(
                graph,
                |graph, m, pattern| build_extraction(graph, m, pattern, expand),
                |graph, m| valid_match(restrict, graph, m),
            )?;

            for extraction in extractions {
                let confidence = extractor.confidence(graph, &extraction);
                if confidence >= threshold {
                    scored.push(ScoredExtraction::new(confidence, extraction));
                } else {
                    debug!(extraction = %extraction, confidence, "Dropped extraction below threshold");
                }
            }
        }

        let mut ranked = if self.config.keep_duplicates {
            scored
        } else {
            deduplicate(scored)
        };
        ranked.sort();
        Ok(ranked)
    }

    fn prepare<'a>(&self, graph: &'a DependencyGraph) -> Cow<'a, DependencyGraph> {
        let mut prepared = Cow::Borrowed(graph);
        if self.config.simplify_postags {
            prepared = Cow::Owned(prepared.simplify_postags());
        }
        if self.config.simplify_vb_postags {
            prepared = Cow::Owned(prepared.simplify_vb_postags());
        }
        prepared
    }
}

/// Whether both argument anchors carry an argument-like tag.
///
/// Missing groups pass so the builder can report them.
pub fn valid_match(restrict: bool, graph: &DependencyGraph, m: &Match) -> bool {
    if !restrict {
        return true;
    }
    [ARG1, ARG2].iter().all(|group| match m.group(group) {
        Some(index) => graph
            .node(index)
            .map_or(false, |node| VALID_ARGUMENT_POSTAGS.contains(&node.postag.as_str())),
        None => true,
    })
}

/// Keep the best-scoring member of each group of equal extractions,
/// in order of first appearance
pub fn deduplicate(scored: Vec<ScoredExtraction>) -> Vec<ScoredExtraction> {
    let mut index: HashMap<DetailedExtraction, usize> = HashMap::new();
    let mut kept: Vec<ScoredExtraction> = Vec::new();

    for candidate in scored {
        match index.get(&candidate.extraction) {
            Some(&slot) => {
                if candidate.confidence > kept[slot].confidence {
                    kept[slot] = candidate;
                }
            }
            None => {
                index.insert(candidate.extraction.clone(), kept.len());
                kept.push(candidate);
            }
        }
    }
    kept
}

// ============================================================================
// Sentence records
// ============================================================================

/// One input line: optional raw text, then the graph as JSON
#[derive(Debug, Clone, PartialEq)]
pub struct SentenceRecord {
    pub text: Option<String>,
    pub graph: DependencyGraph,
}

impl SentenceRecord {
    /// Parse `[raw text TAB] graph-json`
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim_end();
        let (text, json) = match line.split_once('\t') {
            Some((text, json)) => (Some(text.to_string()), json),
            None => (None, line),
        };

        let json = json.trim();
        if json.is_empty() {
            return Err(OieError::InvalidRecord("empty graph".to_string()));
        }

        let graph = DependencyGraph::from_json(json)?;
        Ok(Self { text, graph })
    }

    /// The raw text, or the graph's own rendering when there is none
    pub fn sentence(&self) -> Cow<'_, str> {
        match &self.text {
            Some(text) => Cow::Borrowed(text.as_str()),
            None => Cow::Owned(self.graph.text()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
