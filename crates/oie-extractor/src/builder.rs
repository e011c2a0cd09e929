//! Extraction assembly
//!
//! Turns one pattern match into a triple. The three anchors are expanded
//! independently of each other, so the result does not depend on the
//! order in which the arguments are processed.

use oie_core::{DependencyGraph, NodeSet, OieError, Result};

use crate::expand::{expand_argument, expand_relation, ExpandedRelation};
use crate::{DetailedExtraction, ExtractionPart, Match, ARG1, ARG2, REL};

/// Look up a group the builder cannot work without
pub fn required_group(m: &Match, group: &str, pattern: &str) -> Result<usize> {
    m.group(group).ok_or_else(|| OieError::MissingGroup {
        group: group.to_string(),
        pattern: pattern.to_string(),
    })
}

/// Build an extraction from a match.
///
/// Returns `Ok(None)` when the expanded arguments overlap; a missing
/// `rel`/`arg1`/`arg2` group is an error.
pub fn build_extraction(
    graph: &DependencyGraph,
    m: &Match,
    pattern: &str,
    expand: bool,
) -> Result<Option<DetailedExtraction>> {
    let rel = required_group(m, REL, pattern)?;
    let arg1 = required_group(m, ARG1, pattern)?;
    let arg2 = required_group(m, ARG2, pattern)?;

    for index in [rel, arg1, arg2] {
        if graph.node(index).is_none() {
            return Err(OieError::InvalidGraph(format!(
                "match from `{}` references unknown node {}",
                pattern, index
            )));
        }
    }

    let (arg1_nodes, arg2_nodes, relation) = if expand {
        let arg1_nodes = expand_argument(graph, arg1, &[rel, arg2].into_iter().collect());
        let arg2_nodes = expand_argument(graph, arg2, &[rel, arg1].into_iter().collect());
        let relation = expand_relation(graph, rel, &arg1_nodes.union(&arg2_nodes));
        (arg1_nodes, arg2_nodes, relation)
    } else {
        let nodes = NodeSet::singleton(rel);
        let relation = ExpandedRelation {
            text: graph.render(&nodes),
            nodes,
        };
        (NodeSet::singleton(arg1), NodeSet::singleton(arg2), relation)
    };

    let overlapping = match (arg1_nodes.span(), arg2_nodes.span()) {
        (Some(a), Some(b)) => a.intersects(&b),
        _ => true,
    };
    if overlapping {
        tracing::info!(
            pattern = %pattern,
            arg1 = %graph.render(&arg1_nodes),
            arg2 = %graph.render(&arg2_nodes),
            "Discarding extraction with overlapping arguments"
        );
        return Ok(None);
    }

    Ok(Some(DetailedExtraction::new(
        pattern,
        m.clone(),
        ExtractionPart::new(graph.render(&arg1_nodes), arg1_nodes),
        ExtractionPart::new(relation.text, relation.nodes),
        ExtractionPart::new(graph.render(&arg2_nodes), arg2_nodes),
    )))
}

// ============================================================================
// Tests
// ============================================================================
