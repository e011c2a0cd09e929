//! Graph patterns
//!
//! A pattern is anything that can list the edges it needs and find
//! matches in a graph. `PathPattern` is the linear form used by the
//! model files:
//!
//! ```text
//! {arg1:postag=NN.*} <nsubj< {rel:postag=VB.*} >dobj> {arg2}
//! ```
//!
//! `>label>` follows an edge from the left node to the right node,
//! `<label<` follows one from the right node to the left node. Node
//! constraints (`postag`, `text`, `lemma`) and edge labels are regular
//! expressions matched against the whole value.

use std::str::FromStr;

use regex::Regex;

use oie_core::{DependencyGraph, Edge, Node, OieError, Result};

use crate::Match;

/// Something that finds matches in a dependency graph
pub trait GraphPattern: Send + Sync + std::fmt::Debug {
    /// Edge matchers that must each match some edge for a match to exist
    fn edge_matchers(&self) -> &[EdgeMatcher];

    /// Every match of the pattern in `graph`
    fn find_matches(&self, graph: &DependencyGraph) -> Vec<Match>;

    /// Canonical textual form, used as extraction provenance
    fn describe(&self) -> &str;
}

// ============================================================================
// Matchers
// ============================================================================

/// Direction an edge is followed in, relative to the pattern's reading order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// From the left node to the right node (`>label>`)
    Down,
    /// From the right node to the left node (`<label<`)
    Up,
}

/// Matches edges by label
#[derive(Debug, Clone)]
pub struct EdgeMatcher {
    label: Regex,
    direction: Direction,
}

impl EdgeMatcher {
    pub fn new(label: &str, direction: Direction) -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            label: anchored(label)?,
            direction,
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether this matcher could ever accept `edge`
    pub fn can_match(&self, edge: &Edge) -> bool {
        self.label.is_match(&edge.label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Postag,
    Text,
    Lemma,
}

/// Matches a node, optionally binding it to a group
#[derive(Debug, Clone)]
struct NodeMatcher {
    group: Option<String>,
    constraints: Vec<(Field, Regex)>,
}

impl NodeMatcher {
    fn matches(&self, node: &Node) -> bool {
        self.constraints.iter().all(|(field, regex)| match field {
            Field::Postag => regex.is_match(&node.postag),
            Field::Text => regex.is_match(&node.text),
            Field::Lemma => regex.is_match(&node.lemma),
        })
    }
}

fn anchored(source: &str) -> std::result::Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", source))
}

// ============================================================================
// Path patterns
// ============================================================================

/// A linear pattern alternating node and edge matchers
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    nodes: Vec<NodeMatcher>,
    edges: Vec<EdgeMatcher>,
}

impl PathPattern {
    pub fn parse(source: &str) -> Result<Self> {
        let invalid = |reason: String| OieError::InvalidPattern {
            pattern: source.to_string(),
            reason,
        };

        let tokens: Vec<&str> = source.split_whitespace().collect();
        if tokens.len() % 2 == 0 {
            return Err(invalid(
                "expected alternating nodes and edges, starting and ending with a node".to_string(),
            ));
        }

        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        for (i, token) in tokens.iter().enumerate() {
            if i % 2 == 0 {
                nodes.push(parse_node(token).map_err(invalid)?);
            } else {
                edges.push(parse_edge(token).map_err(invalid)?);
            }
        }

        let mut groups: Vec<&str> = nodes.iter().filter_map(|n| n.group.as_deref()).collect();
        groups.sort_unstable();
        if let Some(pair) = groups.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(invalid(format!("group `{}` bound twice", pair[0])));
        }

        Ok(Self {
            source: tokens.join(" "),
            nodes,
            edges,
        })
    }

    /// Names of the groups this pattern binds
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(|node| node.group.as_deref())
    }

    fn walk(&self, graph: &DependencyGraph, path: &mut Vec<usize>, out: &mut Vec<Match>) {
        let step = path.len() - 1;
        if step == self.edges.len() {
            out.push(self.bind(path));
            return;
        }

        let current = path[step];
        let edge = &self.edges[step];
        let next_matcher = &self.nodes[step + 1];

        let candidates: Vec<usize> = match edge.direction {
            Direction::Down => graph
                .outgoing(current)
                .filter(|e| edge.can_match(e))
                .map(|e| e.dest)
                .collect(),
            Direction::Up => graph
                .incoming(current)
                .filter(|e| edge.can_match(e))
                .map(|e| e.source)
                .collect(),
        };

        for next in candidates {
            if path.contains(&next) {
                continue;
            }
            let accepted = graph
                .node(next)
                .map_or(false, |node| next_matcher.matches(node));
            if accepted {
                path.push(next);
                self.walk(graph, path, out);
                path.pop();
            }
        }
    }

    fn bind(&self, path: &[usize]) -> Match {
        self.nodes
            .iter()
            .zip(path)
            .filter_map(|(matcher, &index)| matcher.group.as_ref().map(|g| (g, index)))
            .fold(Match::new(), |m, (group, index)| m.with_group(group.as_str(), index))
    }
}

impl GraphPattern for PathPattern {
    fn edge_matchers(&self) -> &[EdgeMatcher] {
        &self.edges
    }

    fn find_matches(&self, graph: &DependencyGraph) -> Vec<Match> {
        let mut matches = Vec::new();
        for node in graph.nodes() {
            if self.nodes[0].matches(node) {
                let mut path = vec![node.index];
                self.walk(graph, &mut path, &mut matches);
            }
        }
        matches
    }

    fn describe(&self) -> &str {
        &self.source
    }
}

impl FromStr for PathPattern {
    type Err = OieError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

fn parse_node(token: &str) -> std::result::Result<NodeMatcher, String> {
    let inner = token
        .strip_prefix('{')
        .and_then(|t| t.strip_suffix('}'))
        .ok_or_else(|| format!("node `{}` must be wrapped in braces", token))?;

    let mut group = None;
    let mut constraints = Vec::new();
    for (i, part) in inner.split(':').enumerate() {
        match part.split_once('=') {
            Some((key, value)) => {
                let field = match key {
                    "postag" => Field::Postag,
                    "text" => Field::Text,
                    "lemma" => Field::Lemma,
                    _ => return Err(format!("unknown node constraint `{}`", key)),
                };
                let regex = anchored(value).map_err(|e| e.to_string())?;
                constraints.push((field, regex));
            }
            None if i == 0 && !part.is_empty() => group = Some(part.to_string()),
            None if i == 0 => {}
            None => return Err(format!("constraint `{}` is missing a value", part)),
        }
    }

    Ok(NodeMatcher { group, constraints })
}

fn parse_edge(token: &str) -> std::result::Result<EdgeMatcher, String> {
    let (label, direction) = if let Some(label) =
        token.strip_prefix('>').and_then(|t| t.strip_suffix('>'))
    {
        (label, Direction::Down)
    } else if let Some(label) = token.strip_prefix('<').and_then(|t| t.strip_suffix('<')) {
        (label, Direction::Up)
    } else {
        return Err(format!("edge `{}` must look like >label> or <label<", token));
    };

    if label.is_empty() {
        return Err(format!("edge `{}` has an empty label", token));
    }

    EdgeMatcher::new(label, direction).map_err(|e| e.to_string())
}

// ============================================================================
// Tests
// ============================================================================
