//! Span expansion
//!
//! Grows an anchor node into the full set of tokens forming its phrase.
//! Every function takes an exclusion set (`until` / `without`) that the
//! expansion never crosses, which keeps an argument from swallowing the
//! other argument or the relation.

use oie_core::{DependencyGraph, Edge, Interval, Node, NodeSet};

// ============================================================================
// Label sets
// ============================================================================

/// Edges absorbed into an argument: determiners, modifiers, number and
/// possessive markers, compounds, negation
pub const ARGUMENT_LABELS: &[&str] = &[
    "det", "prep_of", "amod", "num", "nn", "poss", "quantmod", "neg",
];

/// Edges absorbed into a relational noun
pub const RELATION_NOUN_LABELS: &[&str] =
    &["det", "amod", "num", "nn", "poss", "quantmod", "neg"];

/// Edges attaching subordinate clauses to an argument
pub const CLAUSE_LABELS: &[&str] = &["rcmod", "infmod", "partmod", "ref", "prepc_of"];

/// Coordination edges
pub const CONJUNCTION_LABELS: &[&str] = &["conj_and", "conj_or"];

/// Object edges that may attach to a relation
const OBJECT_LABELS: &[&str] = &["dobj", "iobj"];

fn has_label(labels: &[&str], edge: &Edge) -> bool {
    labels.contains(&edge.label.as_str())
}

// ============================================================================
// Primitive expansions
// ============================================================================

/// Every graph node in the hull of `node` and the nearest run of
/// `inferiors` on each side that contains no `until` member.
///
/// Returning all nodes in the hull, not only the collected ones, recovers
/// tokens the parser collapsed into edge labels (the "of" in `prep_of`).
pub fn neighbors_until(
    graph: &DependencyGraph,
    node: usize,
    inferiors: &[usize],
    until: &NodeSet,
) -> NodeSet {
    let left_end = inferiors.partition_point(|&index| index < node);
    let right_start = inferiors.partition_point(|&index| index <= node);

    let lefts = inferiors[..left_end]
        .iter()
        .rev()
        .copied()
        .take_while(|&index| !until.contains(index));
    let rights = inferiors[right_start..]
        .iter()
        .copied()
        .take_while(|&index| !until.contains(index));

    let hull = Interval::span(std::iter::once(node).chain(lefts).chain(rights));
    hull.map_or_else(NodeSet::new, |interval| graph.nodes_within(interval))
}

/// Closure of `node` over `labels`, bounded by `until`
pub fn expand(
    graph: &DependencyGraph,
    node: usize,
    until: &NodeSet,
    labels: &[&str],
) -> NodeSet {
    let inferiors = graph.inferiors(node, |edge| has_label(labels, edge));
    neighbors_until(graph, node, inferiors.as_slice(), until)
}

/// Like [`expand`], but absorbs closure members only while they stay
/// contiguous with what has already been absorbed
pub fn expand_adjacent(
    graph: &DependencyGraph,
    node: usize,
    until: &NodeSet,
    labels: &[&str],
) -> NodeSet {
    if graph.node(node).is_none() {
        return NodeSet::new();
    }

    let inferiors = graph.inferiors(node, |edge| has_label(labels, edge));
    let members = inferiors.as_slice();
    let left_end = members.partition_point(|&index| index < node);
    let right_start = members.partition_point(|&index| index <= node);

    let mut absorbed = Interval::point(node);
    let mut taken = vec![node];
    absorb_adjacent(
        members[..left_end].iter().rev().copied(),
        until,
        &mut absorbed,
        &mut taken,
    );
    absorb_adjacent(
        members[right_start..].iter().copied(),
        until,
        &mut absorbed,
        &mut taken,
    );

    taken.into_iter().collect()
}

fn absorb_adjacent<I>(candidates: I, until: &NodeSet, absorbed: &mut Interval, taken: &mut Vec<usize>)
where
    I: Iterator<Item = usize>,
{
    for index in candidates {
        let point = Interval::point(index);
        if until.contains(index) || !point.borders(absorbed) {
            break;
        }
        *absorbed = absorbed.union(&point);
        taken.push(index);
    }
}

/// Subordinate clauses hanging off `node` through `labels`.
///
/// Each clause is the closure of the edge target, never following edges
/// back into `node` and, unless `nested`, never crossing another edge in
/// `labels`. Clauses touching `without` are dropped; survivors are
/// widened to every node inside their hull.
pub fn components(
    graph: &DependencyGraph,
    node: usize,
    labels: &[&str],
    without: &NodeSet,
    nested: bool,
) -> NodeSet {
    graph
        .outgoing(node)
        .filter(|edge| edge.dest != node && has_label(labels, edge))
        .map(|edge| {
            graph.inferiors(edge.dest, |inner| {
                inner.dest != node && (nested || !has_label(labels, inner))
            })
        })
        .filter(|component| component.is_disjoint(without))
        .filter_map(|component| component.span())
        .fold(NodeSet::new(), |acc, span| acc.union(&graph.nodes_within(span)))
}

/// Closure of each direct successor of `node` reached by an edge
/// satisfying `pred`, kept as separate sets.
///
/// `without` is accepted for call-site symmetry but does not filter.
// TODO: decide whether `without` should bound these closures once callers
// outside relation expansion exist
pub fn augment<P>(graph: &DependencyGraph, node: usize, _without: &NodeSet, pred: P) -> Vec<NodeSet>
where
    P: Fn(&Edge, &Node) -> bool,
{
    graph
        .successors(node, |edge| {
            graph
                .node(edge.dest)
                .map_or(false, |dest| pred(edge, dest))
        })
        .iter()
        .map(|successor| graph.inferiors(successor, |_| true))
        .collect()
}

// ============================================================================
// Argument expansion
// ============================================================================

/// Expand an argument anchor into its full noun phrase.
///
/// Coordinated arguments ("X and Y") are expanded as one: every member of
/// the conjunction chain is expanded and the result is every node inside
/// the hull of all members, coordinator included.
pub fn expand_argument(graph: &DependencyGraph, node: usize, until: &NodeSet) -> NodeSet {
    let chain = graph.connected(node, |edge| has_label(CONJUNCTION_LABELS, edge));

    if chain.len() <= 1 {
        return expand_conjunct(graph, node, until);
    }

    let hull = Interval::hull(
        chain
            .iter()
            .filter_map(|member| expand_conjunct(graph, member, until).span()),
    );
    hull.map_or_else(NodeSet::new, |interval| graph.nodes_within(interval))
}

fn expand_conjunct(graph: &DependencyGraph, node: usize, until: &NodeSet) -> NodeSet {
    let base = expand(graph, node, until, ARGUMENT_LABELS);

    // named entities do not absorb trailing clauses
    if graph.contains_proper_noun(&base) {
        return base;
    }

    base.union(&components(graph, node, CLAUSE_LABELS, until, false))
}

// ============================================================================
// Relation expansion
// ============================================================================

/// Nodes and rendered text of an expanded relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedRelation {
    pub nodes: NodeSet,
    pub text: String,
}

fn is_relation_modifier(edge: &Edge, dest: &Node) -> bool {
    match edge.label.as_str() {
        "advmod" => dest.postag.starts_with("RB"),
        "aux" | "cop" | "auxpass" | "prt" => true,
        _ => false,
    }
}

/// Expand a relation anchor.
///
/// The relation is assembled from separate parts: the anchor with its
/// noun modifiers, each auxiliary/copula/particle/adverb, and an object
/// clause when the anchor has exactly one edge of that kind. Parts are
/// ordered by position and their texts joined with single spaces, so
/// tokens between parts are skipped.
pub fn expand_relation(graph: &DependencyGraph, node: usize, until: &NodeSet) -> ExpandedRelation {
    let attach: Vec<&str> = OBJECT_LABELS
        .iter()
        .copied()
        .filter(|&label| graph.outgoing(node).filter(|e| e.label == label).count() == 1)
        .collect();

    let mut parts = vec![expand(graph, node, until, RELATION_NOUN_LABELS)];
    parts.extend(augment(graph, node, until, |edge, dest| {
        edge.dest != node && is_relation_modifier(edge, dest)
    }));

    let objects = components(graph, node, &attach, until, true);
    if !objects.is_empty() {
        parts.push(objects);
    }

    parts.retain(|part| !part.is_empty());
    parts.sort_by_key(|part| part.span());

    let nodes = parts.iter().fold(NodeSet::new(), |acc, part| acc.union(part));
    let text = parts
        .iter()
        .map(|part| graph.render(part))
        .collect::<Vec<_>>()
        .join(" ");

    ExpandedRelation { nodes, text }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    fn set(indices: &[usize]) -> NodeSet {
        indices.iter().copied().collect()
    }

    #[test]
    fn test_expand_argument_absorbs_relative_clause() {
        let graph = dog_sentence();
        let until = set(&[6, 8]);
        let expanded = expand_argument(&graph, 2, &until);
        assert_eq!(
            graph.render(&expanded),
            "The small dog that barked loudly"
        );
    }

    #[test]
    fn test_expand_argument_object() {
        let graph = dog_sentence();
        let expanded = expand_argument(&graph, 8, &set(&[6, 2]));
        assert_eq!(expanded.as_slice(), &[7, 8]);
        assert_eq!(graph.render(&expanded), "the cat");
    }

    #[test]
    fn test_expand_relation_skips_excluded_object() {
        let graph = dog_sentence();
        let until = set(&[0, 1, 2, 3, 4, 5, 7, 8]);
        let relation = expand_relation(&graph, 6, &until);
        assert_eq!(relation.nodes.as_slice(), &[6]);
        assert_eq!(relation.text, "chased");
    }

    #[test]
    fn test_proper_noun_suppresses_clause() {
        let graph = obama_sentence(true);
        let expanded = expand_argument(&graph, 0, &set(&[5, 6]));
        assert_eq!(graph.render(&expanded), "Obama");

        // the same clause is absorbed by a common noun
        let graph = obama_sentence(false);
        let expanded = expand_argument(&graph, 0, &set(&[5, 6]));
        assert_eq!(graph.render(&expanded), "Obama who won the election");
    }

    #[test]
    fn test_conjunction_expands_as_one_argument() {
        let graph = conjunction_sentence();
        let until = set(&[3, 5]);
        let from_john = expand_argument(&graph, 0, &until);
        let from_mary = expand_argument(&graph, 2, &until);
        assert_eq!(graph.render(&from_john), "John and Mary");
        assert_eq!(from_john, from_mary);
    }

    #[test]
    fn test_collapsed_preposition_is_recovered() {
        let graph = president_phrase();
        let expanded = expand_argument(&graph, 1, &NodeSet::new());
        assert_eq!(graph.render(&expanded), "the president of France");
    }

    #[test]
    fn test_neighbors_until_stops_at_exclusion() {
        let graph = ball_phrase();
        let expanded = expand(&graph, 3, &set(&[1]), ARGUMENT_LABELS);
        assert_eq!(graph.render(&expanded), "red ball");

        let expanded = expand(&graph, 3, &NodeSet::new(), ARGUMENT_LABELS);
        assert_eq!(graph.render(&expanded), "the big red ball");
    }

    #[test]
    fn test_neighbors_until_is_a_fixed_point() {
        let graph = dog_sentence();
        let until = set(&[6, 8]);
        let once = expand(&graph, 2, &until, ARGUMENT_LABELS);
        let twice = neighbors_until(&graph, 2, once.as_slice(), &until);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_expand_adjacent_stops_at_gap() {
        let graph = gapped_ball_phrase();
        // closure is {a, big, ball}; "old" is not attached
        let adjacent = expand_adjacent(&graph, 3, &NodeSet::new(), ARGUMENT_LABELS);
        assert_eq!(adjacent.as_slice(), &[3]);

        let interval = expand(&graph, 3, &NodeSet::new(), ARGUMENT_LABELS);
        assert_eq!(interval.as_slice(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_expand_adjacent_stops_at_exclusion() {
        let graph = ball_phrase();
        let adjacent = expand_adjacent(&graph, 3, &set(&[1]), ARGUMENT_LABELS);
        assert_eq!(adjacent.as_slice(), &[2, 3]);

        let adjacent = expand_adjacent(&graph, 3, &NodeSet::new(), ARGUMENT_LABELS);
        assert_eq!(adjacent.as_slice(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_components_nested_and_flat() {
        let graph = nested_clause_sentence();
        let flat = components(&graph, 0, &["rcmod"], &NodeSet::new(), false);
        assert_eq!(flat.as_slice(), &[1, 2, 3, 4]);

        let nested = components(&graph, 0, &["rcmod"], &NodeSet::new(), true);
        assert_eq!(nested.as_slice(), &[1, 2, 3, 4, 5, 6]);

        let blocked = components(&graph, 0, &["rcmod"], &set(&[4]), false);
        assert!(blocked.is_empty());
    }

    #[test]
    fn test_augment_keeps_sets_separate() {
        let graph = phrasal_verb_sentence();
        let parts = augment(&graph, 3, &NodeSet::new(), |edge, _| {
            edge.label == "aux" || edge.label == "prt"
        });
        assert_eq!(parts, vec![set(&[2]), set(&[4])]);
    }

    #[test]
    fn test_expand_relation_orders_parts_by_position() {
        let graph = phrasal_verb_sentence();
        let until = set(&[0, 1, 5, 6]);
        let relation = expand_relation(&graph, 3, &until);
        assert_eq!(relation.nodes.as_slice(), &[2, 3, 4]);
        assert_eq!(relation.text, "has given up");
    }

    #[test]
    fn test_expand_relation_attaches_single_object() {
        let graph = walk_sentence(false);
        let until = set(&[0, 5, 6]);
        let relation = expand_relation(&graph, 1, &until);
        assert_eq!(relation.text, "took a walk");
    }

    #[test]
    fn test_expand_relation_ignores_ambiguous_objects() {
        let graph = walk_sentence(true);
        let until = set(&[0, 5, 6]);
        let relation = expand_relation(&graph, 1, &until);
        assert_eq!(relation.text, "took");
    }

    #[test]
    fn test_relation_text_skips_uncaptured_tokens() {
        // "indeed" hangs off an unlabeled dependency and is not rendered
        let graph = copula_sentence();
        let relation = expand_relation(&graph, 5, &set(&[0]));
        assert_eq!(relation.text, "is the best president");
        assert_eq!(relation.nodes.as_slice(), &[1, 3, 4, 5]);
    }

    #[test]
    fn test_unknown_anchor_expands_to_nothing() {
        let graph = dog_sentence();
        assert!(expand_argument(&graph, 42, &NodeSet::new()).is_empty());
        assert!(expand_adjacent(&graph, 42, &NodeSet::new(), ARGUMENT_LABELS).is_empty());
        assert!(expand_relation(&graph, 42, &NodeSet::new()).text.is_empty());
    }
}
