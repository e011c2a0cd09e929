//! Pattern extractors
//!
//! Each extractor pairs a graph pattern with a way of scoring what it
//! finds. Extractors are loaded from tab separated model files, one
//! extractor per pattern.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use oie_core::{
    ConfigError, DependencyGraph, ExtractorKind, ExtractorSource, OieError, Result,
};

use crate::pattern::{GraphPattern, PathPattern};
use crate::{DetailedExtraction, Match, REL};

/// How an extractor scores its extractions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Confidence {
    /// Same confidence for every extraction, known before matching
    Independent(f64),
    /// Depends on the extraction itself
    Dependent,
}

// ============================================================================
// Variants
// ============================================================================

/// Pattern with a fixed confidence
#[derive(Debug, Clone)]
pub struct GeneralExtractor {
    pub pattern: Arc<dyn GraphPattern>,
    pub confidence: f64,
}

/// Pattern that only fires for listed relation lemmas
#[derive(Debug, Clone)]
pub struct SpecificExtractor {
    pub pattern: Arc<dyn GraphPattern>,
    pub lemmas: BTreeSet<String>,
    pub confidence: f64,
}

/// Probability of each relation string for one pattern
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicDistribution {
    probabilities: HashMap<String, f64>,
}

impl TopicDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, relation: impl Into<String>, probability: f64) {
        self.probabilities.insert(relation.into(), probability);
    }

    /// Probability of `relation`, 0 when never seen
    pub fn probability(&self, relation: &str) -> f64 {
        self.probabilities.get(relation).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }
}

/// Pattern scored by a precomputed relation distribution
#[derive(Debug, Clone)]
pub struct TopicModelExtractor {
    pub pattern: Arc<dyn GraphPattern>,
    pub distribution: TopicDistribution,
}

/// Relation text rewrite, e.g. `be {rel} of`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationTemplate(String);

impl RelationTemplate {
    pub const PLACEHOLDER: &'static str = "{rel}";

    pub fn parse(template: &str) -> std::result::Result<Self, String> {
        if !template.contains(Self::PLACEHOLDER) {
            return Err(format!(
                "template `{}` has no {} placeholder",
                template,
                Self::PLACEHOLDER
            ));
        }
        Ok(Self(template.to_string()))
    }

    pub fn apply(&self, relation: &str) -> String {
        self.0.replace(Self::PLACEHOLDER, relation)
    }
}

impl std::fmt::Display for RelationTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pattern whose relation text is rewritten by a template
#[derive(Debug, Clone)]
pub struct TemplateExtractor {
    pub pattern: Arc<dyn GraphPattern>,
    pub template: RelationTemplate,
    pub confidence: f64,
}

/// One pattern-based extractor
#[derive(Debug, Clone)]
pub enum PatternExtractor {
    General(GeneralExtractor),
    Specific(SpecificExtractor),
    TopicModel(TopicModelExtractor),
    Template(TemplateExtractor),
}

impl PatternExtractor {
    pub fn general(pattern: Arc<dyn GraphPattern>, confidence: f64) -> Self {
        Self::General(GeneralExtractor {
            pattern,
            confidence,
        })
    }

    pub fn pattern(&self) -> &Arc<dyn GraphPattern> {
        match self {
            Self::General(e) => &e.pattern,
            Self::Specific(e) => &e.pattern,
            Self::TopicModel(e) => &e.pattern,
            Self::Template(e) => &e.pattern,
        }
    }

    pub fn kind(&self) -> ExtractorKind {
        match self {
            Self::General(_) => ExtractorKind::General,
            Self::Specific(_) => ExtractorKind::Specific,
            Self::TopicModel(_) => ExtractorKind::TopicModel,
            Self::Template(_) => ExtractorKind::Template,
        }
    }

    pub fn confidence_kind(&self) -> Confidence {
        match self {
            Self::General(e) => Confidence::Independent(e.confidence),
            Self::Specific(e) => Confidence::Independent(e.confidence),
            Self::Template(e) => Confidence::Independent(e.confidence),
            Self::TopicModel(_) => Confidence::Dependent,
        }
    }

    /// Confidence shared by every extraction, if there is one
    pub fn independent_confidence(&self) -> Option<f64> {
        match self.confidence_kind() {
            Confidence::Independent(confidence) => Some(confidence),
            Confidence::Dependent => None,
        }
    }

    /// Confidence of one extraction produced by this extractor
    pub fn confidence(&self, graph: &DependencyGraph, extraction: &DetailedExtraction) -> f64 {
        match self {
            Self::TopicModel(e) => e
                .distribution
                .probability(&graph.render_lemmas(&extraction.rel.nodes)),
            _ => self.independent_confidence().unwrap_or(0.0),
        }
    }

    /// Whether every edge matcher accepts at least one edge of `graph`
    pub fn is_feasible(&self, graph: &DependencyGraph) -> bool {
        self.pattern()
            .edge_matchers()
            .iter()
            .all(|matcher| graph.edges().iter().any(|edge| matcher.can_match(edge)))
    }

    /// Match, filter and build.
    ///
    /// `valid` rejects matches before anything is built; `build` turns a
    /// match into an extraction or declines it with `Ok(None)`.
    pub fn extract<B, V>(
        &self,
        graph: &DependencyGraph,
        build: B,
        valid: V,
    ) -> Result<Vec<DetailedExtraction>>
    where
        B: Fn(&DependencyGraph, &Match, &str) -> Result<Option<DetailedExtraction>>,
        V: Fn(&DependencyGraph, &Match) -> bool,
    {
        let pattern = self.pattern();
        let description = pattern.describe();

        let mut extractions = Vec::new();
        for m in pattern.find_matches(graph) {
            if !valid(graph, &m) || !self.accepts(graph, &m) {
                continue;
            }
            if let Some(extraction) = build(graph, &m, description)? {
                extractions.push(self.finish(extraction));
            }
        }
        Ok(extractions)
    }

    fn accepts(&self, graph: &DependencyGraph, m: &Match) -> bool {
        match self {
            Self::Specific(e) => match m.group(REL) {
                Some(rel) => graph
                    .node(rel)
                    .map_or(false, |node| e.lemmas.contains(&node.lemma)),
                // let the builder report the broken pattern
                None => true,
            },
            _ => true,
        }
    }

    fn finish(&self, extraction: DetailedExtraction) -> DetailedExtraction {
        match self {
            Self::Template(e) => {
                let text = e.template.apply(&extraction.rel.text);
                extraction.with_relation_text(text)
            }
            _ => extraction,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load the extractors described by one configured source
pub fn load_extractors(source: &ExtractorSource) -> Result<Vec<PatternExtractor>> {
    let path = source.path.as_ref().ok_or_else(|| {
        ConfigError::MissingRequired(format!("path for {} extractor", source.kind))
    })?;

    let content = std::fs::read_to_string(path).map_err(|e| OieError::IoError {
        path: path.display().to_string(),
        source: e,
    })?;

    let extractors = parse_extractors(source.kind, &content, path)?;
    tracing::info!(
        kind = %source.kind,
        path = %path.display(),
        count = extractors.len(),
        "Loaded extractors"
    );
    Ok(extractors)
}

/// Parse a model file's content; `origin` is only used in error messages
pub fn parse_extractors(
    kind: ExtractorKind,
    content: &str,
    origin: &Path,
) -> Result<Vec<PatternExtractor>> {
    let invalid = |line: usize, reason: String| OieError::InvalidModel {
        path: origin.display().to_string(),
        line,
        reason,
    };

    let mut extractors = Vec::new();
    // topic model rows are grouped by pattern, keeping first-seen order
    let mut topics: Vec<(Arc<dyn GraphPattern>, TopicDistribution)> = Vec::new();
    let mut topic_index: HashMap<String, usize> = HashMap::new();

    for (i, raw) in content.lines().enumerate() {
        let line = i + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = trimmed.split('\t').map(str::trim).collect();
        let expected = match kind {
            ExtractorKind::General => 2,
            _ => 3,
        };
        if fields.len() != expected {
            return Err(invalid(
                line,
                format!("expected {} tab separated fields, found {}", expected, fields.len()),
            ));
        }

        let pattern: Arc<dyn GraphPattern> = Arc::new(
            PathPattern::parse(fields[0]).map_err(|e| invalid(line, e.to_string()))?,
        );
        let score = parse_score(fields[expected - 1]).map_err(|reason| invalid(line, reason))?;

        match kind {
            ExtractorKind::General => {
                extractors.push(PatternExtractor::general(pattern, score));
            }
            ExtractorKind::Specific => {
                let lemmas: BTreeSet<String> = fields[1]
                    .split(',')
                    .map(str::trim)
                    .filter(|lemma| !lemma.is_empty())
                    .map(str::to_string)
                    .collect();
                if lemmas.is_empty() {
                    return Err(invalid(line, "no relation lemmas listed".to_string()));
                }
                extractors.push(PatternExtractor::Specific(SpecificExtractor {
                    pattern,
                    lemmas,
                    confidence: score,
                }));
            }
            ExtractorKind::Template => {
                let template =
                    RelationTemplate::parse(fields[1]).map_err(|reason| invalid(line, reason))?;
                extractors.push(PatternExtractor::Template(TemplateExtractor {
                    pattern,
                    template,
                    confidence: score,
                }));
            }
            ExtractorKind::TopicModel => {
                let key = pattern.describe().to_string();
                let slot = *topic_index.entry(key).or_insert_with(|| {
                    topics.push((pattern, TopicDistribution::new()));
                    topics.len() - 1
                });
                topics[slot].1.insert(fields[1], score);
            }
        }
    }

    extractors.extend(topics.into_iter().map(|(pattern, distribution)| {
        PatternExtractor::TopicModel(TopicModelExtractor {
            pattern,
            distribution,
        })
    }));

    Ok(extractors)
}

fn parse_score(field: &str) -> std::result::Result<f64, String> {
    let score: f64 = field
        .parse()
        .map_err(|_| format!("`{}` is not a number", field))?;
    if !score.is_finite() || score < 0.0 {
        return Err(format!("score {} must be finite and non-negative", score));
    }
    Ok(score)
}

// ============================================================================
// Tests
// ============================================================================
