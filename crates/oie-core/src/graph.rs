//! Dependency graph primitives
//!
//! Nodes live in an array sorted by token index and every node slot owns
//! an adjacency list of edge ids in each direction. All closure queries
//! are worklist traversals with a visited set, so malformed graphs that
//! contain cycles are handled without recursion.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::interval::Interval;
use crate::{OieError, Result};

// ============================================================================
// Nodes and Edges
// ============================================================================

/// A token of the parsed sentence
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    /// Position of the token in the sentence (unique within a graph)
    pub index: usize,
    /// Surface text
    pub text: String,
    /// Part-of-speech tag
    pub postag: String,
    /// Lemma, empty when the upstream tagger did not provide one
    #[serde(default)]
    pub lemma: String,
    /// Proper noun flag, kept separately so tag simplification never loses it
    #[serde(default)]
    pub proper_noun: bool,
}

impl Node {
    /// Create a node, inferring the proper noun flag from the tag
    pub fn new(index: usize, text: impl Into<String>, postag: impl Into<String>) -> Self {
        let text = text.into();
        let postag = postag.into();
        Self {
            index,
            lemma: text.to_lowercase(),
            proper_noun: postag.starts_with("NNP"),
            text,
            postag,
        }
    }

    /// Set the lemma
    pub fn with_lemma(mut self, lemma: impl Into<String>) -> Self {
        self.lemma = lemma.into();
        self
    }

    /// Override the proper noun flag
    pub fn with_proper_noun(mut self, proper_noun: bool) -> Self {
        self.proper_noun = proper_noun;
        self
    }
}

/// A labeled dependency from `source` (governor) to `dest` (dependent)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: usize,
    pub dest: usize,
    pub label: String,
}

impl Edge {
    pub fn new(source: usize, dest: usize, label: impl Into<String>) -> Self {
        Self {
            source,
            dest,
            label: label.into(),
        }
    }

    /// The endpoint opposite to `index`
    pub fn other(&self, index: usize) -> usize {
        if self.source == index {
            self.dest
        } else {
            self.source
        }
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({}, {})", self.label, self.source, self.dest)
    }
}

// ============================================================================
// Node Sets
// ============================================================================

/// Sorted, deduplicated set of node indices
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeSet(Vec<usize>);

impl NodeSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn singleton(index: usize) -> Self {
        Self(vec![index])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.0.binary_search(&index).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Hull of the contained indices
    pub fn span(&self) -> Option<Interval> {
        match (self.0.first(), self.0.last()) {
            (Some(&first), Some(&last)) => Some(Interval::new(first, last)),
            _ => None,
        }
    }

    /// Linear merge of two sorted sets
    pub fn union(&self, other: &NodeSet) -> NodeSet {
        let (a, b) = (&self.0, &other.0);
        let mut merged = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => {
                    merged.push(a[i]);
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    merged.push(b[j]);
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    merged.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        merged.extend_from_slice(&a[i..]);
        merged.extend_from_slice(&b[j..]);
        NodeSet(merged)
    }

    /// True if no index is shared
    pub fn is_disjoint(&self, other: &NodeSet) -> bool {
        let (a, b) = (&self.0, &other.0);
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => return false,
            }
        }
        true
    }

    /// True if every index of `other` is contained here
    pub fn is_superset(&self, other: &NodeSet) -> bool {
        other.iter().all(|index| self.contains(index))
    }
}

impl FromIterator<usize> for NodeSet {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        let mut indices: Vec<usize> = iter.into_iter().collect();
        indices.sort_unstable();
        indices.dedup();
        NodeSet(indices)
    }
}

impl<'a> IntoIterator for &'a NodeSet {
    type Item = usize;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, usize>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}

// ============================================================================
// Dependency Graph
// ============================================================================

/// Serialized form of a dependency graph
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GraphRecord {
    nodes: Vec<Node>,
    #[serde(default)]
    edges: Vec<Edge>,
}

/// Immutable dependency graph of one sentence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GraphRecord", into = "GraphRecord")]
pub struct DependencyGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    /// Per node slot: ids of edges leaving the node
    outgoing: Vec<Vec<usize>>,
    /// Per node slot: ids of edges entering the node
    incoming: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// Build a graph, validating node indices and edge endpoints
    pub fn new(mut nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self> {
        nodes.sort_by_key(|node| node.index);
        if let Some(pair) = nodes.windows(2).find(|pair| pair[0].index == pair[1].index) {
            return Err(OieError::InvalidGraph(format!(
                "duplicate node index {}",
                pair[0].index
            )));
        }

        let mut outgoing = vec![Vec::new(); nodes.len()];
        let mut incoming = vec![Vec::new(); nodes.len()];

        for (id, edge) in edges.iter().enumerate() {
            let source = slot_of(&nodes, edge.source).ok_or_else(|| {
                OieError::InvalidGraph(format!("edge {} has unknown source", edge))
            })?;
            let dest = slot_of(&nodes, edge.dest).ok_or_else(|| {
                OieError::InvalidGraph(format!("edge {} has unknown destination", edge))
            })?;
            outgoing[source].push(id);
            incoming[dest].push(id);
        }

        Ok(Self {
            nodes,
            edges,
            outgoing,
            incoming,
        })
    }

    /// Parse the JSON record form
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| OieError::InvalidRecord(e.to_string()))
    }

    /// Serialize to the JSON record form
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| OieError::InvalidRecord(e.to_string()))
    }

    /// Nodes ordered by index
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        slot_of(&self.nodes, index).map(|slot| &self.nodes[slot])
    }

    /// Nodes of a set, in index order
    pub fn nodes_of<'a>(&'a self, set: &'a NodeSet) -> impl Iterator<Item = &'a Node> + 'a {
        set.iter().filter_map(move |index| self.node(index))
    }

    /// Edges leaving `index`
    pub fn outgoing(&self, index: usize) -> impl Iterator<Item = &Edge> + '_ {
        self.adjacent(&self.outgoing, index)
    }

    /// Edges entering `index`
    pub fn incoming(&self, index: usize) -> impl Iterator<Item = &Edge> + '_ {
        self.adjacent(&self.incoming, index)
    }

    fn adjacent<'a>(
        &'a self,
        lists: &'a [Vec<usize>],
        index: usize,
    ) -> impl Iterator<Item = &'a Edge> + 'a {
        slot_of(&self.nodes, index)
            .map(|slot| lists[slot].as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&id| &self.edges[id])
    }

    /// Direct dependents over edges satisfying `pred`
    pub fn successors<P>(&self, index: usize, pred: P) -> NodeSet
    where
        P: Fn(&Edge) -> bool,
    {
        self.outgoing(index)
            .filter(|edge| pred(edge))
            .map(|edge| edge.dest)
            .collect()
    }

    /// Direct governors over edges satisfying `pred`
    pub fn predecessors<P>(&self, index: usize, pred: P) -> NodeSet
    where
        P: Fn(&Edge) -> bool,
    {
        self.incoming(index)
            .filter(|edge| pred(edge))
            .map(|edge| edge.source)
            .collect()
    }

    /// Direct neighbors in either direction over edges satisfying `pred`
    pub fn neighbors<P>(&self, index: usize, pred: P) -> NodeSet
    where
        P: Fn(&Edge) -> bool,
    {
        self.outgoing(index)
            .chain(self.incoming(index))
            .filter(|edge| pred(edge))
            .map(|edge| edge.other(index))
            .collect()
    }

    /// Downward transitive closure from `index` (inclusive) over edges
    /// satisfying `pred`
    pub fn inferiors<P>(&self, index: usize, pred: P) -> NodeSet
    where
        P: Fn(&Edge) -> bool,
    {
        self.closure(index, |current| {
            self.outgoing(current)
                .filter(|edge| pred(edge))
                .map(|edge| edge.dest)
                .collect()
        })
    }

    /// Undirected transitive closure from `index` (inclusive) over edges
    /// satisfying `pred`
    pub fn connected<P>(&self, index: usize, pred: P) -> NodeSet
    where
        P: Fn(&Edge) -> bool,
    {
        self.closure(index, |current| {
            self.outgoing(current)
                .chain(self.incoming(current))
                .filter(|edge| pred(edge))
                .map(|edge| edge.other(current))
                .collect()
        })
    }

    fn closure<F>(&self, start: usize, step: F) -> NodeSet
    where
        F: Fn(usize) -> Vec<usize>,
    {
        let Some(start_slot) = slot_of(&self.nodes, start) else {
            return NodeSet::new();
        };

        let mut seen = vec![false; self.nodes.len()];
        seen[start_slot] = true;
        let mut found = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for next in step(current) {
                if let Some(slot) = slot_of(&self.nodes, next) {
                    if !seen[slot] {
                        seen[slot] = true;
                        found.push(next);
                        queue.push_back(next);
                    }
                }
            }
        }

        found.into_iter().collect()
    }

    /// Every node whose index lies inside `interval`
    pub fn nodes_within(&self, interval: Interval) -> NodeSet {
        let lo = self.nodes.partition_point(|node| node.index < interval.start());
        let hi = self.nodes.partition_point(|node| node.index <= interval.end());
        NodeSet(self.nodes[lo..hi].iter().map(|node| node.index).collect())
    }

    /// Surface text of a node set, tokens joined by a single space
    pub fn render(&self, set: &NodeSet) -> String {
        self.nodes_of(set)
            .map(|node| node.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Lemmas of a node set, joined by a single space
    pub fn render_lemmas(&self, set: &NodeSet) -> String {
        self.nodes_of(set)
            .map(|node| node.lemma.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Full sentence text
    pub fn text(&self) -> String {
        self.nodes
            .iter()
            .map(|node| node.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn contains_proper_noun(&self, set: &NodeSet) -> bool {
        self.nodes_of(set).any(|node| node.proper_noun)
    }

    /// Collapse fine-grained adjective, noun, adverb and pronoun tags
    pub fn simplify_postags(&self) -> Self {
        self.map_postags(|postag| match postag {
            "JJR" | "JJS" => Some("JJ"),
            "NNS" => Some("NN"),
            "NNPS" => Some("NNP"),
            "RBR" | "RBS" => Some("RB"),
            "PRP$" => Some("PRP"),
            _ => None,
        })
    }

    /// Collapse finite verb tags to `VB`
    pub fn simplify_vb_postags(&self) -> Self {
        self.map_postags(|postag| match postag {
            "VBD" | "VBP" | "VBZ" => Some("VB"),
            _ => None,
        })
    }

    fn map_postags<F>(&self, f: F) -> Self
    where
        F: Fn(&str) -> Option<&'static str>,
    {
        let nodes = self
            .nodes
            .iter()
            .map(|node| match f(&node.postag) {
                Some(postag) => Node {
                    postag: postag.to_string(),
                    ..node.clone()
                },
                None => node.clone(),
            })
            .collect();

        Self {
            nodes,
            edges: self.edges.clone(),
            outgoing: self.outgoing.clone(),
            incoming: self.incoming.clone(),
        }
    }
}

fn slot_of(nodes: &[Node], index: usize) -> Option<usize> {
    nodes.binary_search_by_key(&index, |node| node.index).ok()
}

impl TryFrom<GraphRecord> for DependencyGraph {
    type Error = OieError;

    fn try_from(mut record: GraphRecord) -> Result<Self> {
        // records from taggers without lemmatization or NER
        for node in &mut record.nodes {
            if node.lemma.is_empty() {
                node.lemma = node.text.to_lowercase();
            }
            node.proper_noun |= node.postag.starts_with("NNP");
        }
        Self::new(record.nodes, record.edges)
    }
}

impl From<DependencyGraph> for GraphRecord {
    fn from(graph: DependencyGraph) -> Self {
        Self {
            nodes: graph.nodes,
            edges: graph.edges,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // "John and Mary saw the film ."
    fn sample_graph() -> DependencyGraph {
        let nodes = vec![
            Node::new(0, "John", "NNP"),
            Node::new(1, "and", "CC"),
            Node::new(2, "Mary", "NNP"),
            Node::new(3, "saw", "VBD").with_lemma("see"),
            Node::new(4, "the", "DT"),
            Node::new(5, "films", "NNS").with_lemma("film"),
            Node::new(6, ".", "."),
        ];
        let edges = vec![
            Edge::new(3, 0, "nsubj"),
            Edge::new(0, 2, "conj_and"),
            Edge::new(3, 5, "dobj"),
            Edge::new(5, 4, "det"),
            Edge::new(3, 6, "punct"),
        ];
        DependencyGraph::new(nodes, edges).unwrap()
    }

    #[test]
    fn test_rejects_unknown_edge_endpoint() {
        let nodes = vec![Node::new(0, "a", "DT")];
        let edges = vec![Edge::new(0, 3, "det")];
        let result = DependencyGraph::new(nodes, edges);
        assert!(matches!(result, Err(OieError::InvalidGraph(_))));
    }

    #[test]
    fn test_rejects_duplicate_index() {
        let nodes = vec![Node::new(1, "a", "DT"), Node::new(1, "b", "DT")];
        assert!(DependencyGraph::new(nodes, Vec::new()).is_err());
    }

    #[test]
    fn test_nodes_sorted_by_index() {
        let nodes = vec![Node::new(2, "c", "NN"), Node::new(0, "a", "DT")];
        let graph = DependencyGraph::new(nodes, Vec::new()).unwrap();
        assert_eq!(graph.nodes()[0].index, 0);
        assert_eq!(graph.node(2).unwrap().text, "c");
        assert!(graph.node(1).is_none());
    }

    #[test]
    fn test_inferiors_follow_predicate() {
        let graph = sample_graph();
        let all = graph.inferiors(3, |_| true);
        assert_eq!(all.as_slice(), &[0, 2, 3, 4, 5, 6]);

        let dobj = graph.inferiors(3, |e| e.label == "dobj" || e.label == "det");
        assert_eq!(dobj.as_slice(), &[3, 4, 5]);
    }

    #[test]
    fn test_inferiors_terminate_on_cycles() {
        let nodes = vec![
            Node::new(0, "a", "NN"),
            Node::new(1, "b", "NN"),
            Node::new(2, "c", "NN"),
        ];
        let edges = vec![
            Edge::new(0, 1, "nn"),
            Edge::new(1, 2, "nn"),
            Edge::new(2, 0, "nn"),
        ];
        let graph = DependencyGraph::new(nodes, edges).unwrap();
        assert_eq!(graph.inferiors(1, |_| true).as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn test_connected_is_undirected() {
        let graph = sample_graph();
        let conj = |e: &Edge| e.label == "conj_and";
        assert_eq!(graph.connected(0, conj).as_slice(), &[0, 2]);
        assert_eq!(graph.connected(2, conj).as_slice(), &[0, 2]);
    }

    #[test]
    fn test_direct_queries() {
        let graph = sample_graph();
        assert_eq!(graph.successors(3, |e| e.label == "dobj").as_slice(), &[5]);
        assert_eq!(graph.predecessors(5, |_| true).as_slice(), &[3]);
        assert_eq!(graph.neighbors(5, |_| true).as_slice(), &[3, 4]);
    }

    #[test]
    fn test_nodes_within_interval() {
        let graph = sample_graph();
        let set = graph.nodes_within(Interval::new(1, 4));
        assert_eq!(set.as_slice(), &[1, 2, 3, 4]);
        assert_eq!(graph.render(&set), "and Mary saw the");
    }

    #[test]
    fn test_node_set_merge() {
        let a: NodeSet = vec![5, 1, 3].into_iter().collect();
        let b: NodeSet = vec![2, 3, 8].into_iter().collect();
        assert_eq!(a.union(&b).as_slice(), &[1, 2, 3, 5, 8]);
        assert!(!a.is_disjoint(&b));
        assert!(a.is_disjoint(&NodeSet::singleton(4)));
        assert_eq!(a.span(), Some(Interval::new(1, 5)));
        assert!(a.union(&b).is_superset(&a));
    }

    #[test]
    fn test_simplify_postags_returns_new_graph() {
        let graph = sample_graph();
        let simple = graph.simplify_postags().simplify_vb_postags();

        assert_eq!(simple.node(5).unwrap().postag, "NN");
        assert_eq!(simple.node(3).unwrap().postag, "VB");
        assert_eq!(simple.node(0).unwrap().postag, "NNP");
        assert!(simple.node(0).unwrap().proper_noun);

        // source untouched
        assert_eq!(graph.node(5).unwrap().postag, "NNS");
        assert_eq!(graph.node(3).unwrap().postag, "VBD");
    }

    #[test]
    fn test_proper_noun_flag_overrides_tag() {
        let graph = DependencyGraph::new(
            vec![
                Node::new(0, "apple", "NN").with_proper_noun(true),
                Node::new(1, "Smith", "NNP").with_proper_noun(false),
            ],
            Vec::new(),
        )
        .unwrap();

        assert!(graph.contains_proper_noun(&NodeSet::singleton(0)));
        assert!(!graph.contains_proper_noun(&NodeSet::singleton(1)));
        // the flag is carried through tag simplification
        let simple = graph.simplify_postags();
        assert!(simple.contains_proper_noun(&NodeSet::singleton(0)));
    }

    #[test]
    fn test_json_round_trip() {
        let graph = sample_graph();
        let json = graph.to_json().unwrap();
        let parsed = DependencyGraph::from_json(&json).unwrap();
        assert_eq!(parsed, graph);
        assert_eq!(parsed.outgoing(3).count(), 3);
    }

    #[test]
    fn test_from_json_fills_missing_lemma_and_proper_noun() {
        let json = r#"{"nodes":[{"index":0,"text":"Paris","postag":"NNP"},
                                {"index":1,"text":"Runs","postag":"VBZ","lemma":"run"}]}"#;
        let graph = DependencyGraph::from_json(json).unwrap();
        assert_eq!(graph.node(0).unwrap().lemma, "paris");
        assert!(graph.node(0).unwrap().proper_noun);
        assert_eq!(graph.node(1).unwrap().lemma, "run");
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn test_from_json_rejects_bad_edges() {
        let json = r#"{"nodes":[{"index":0,"text":"a","postag":"DT"}],
                       "edges":[{"source":0,"dest":9,"label":"det"}]}"#;
        assert!(DependencyGraph::from_json(json).is_err());
    }
}
