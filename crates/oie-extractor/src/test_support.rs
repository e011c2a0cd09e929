//! Hand-built parses shared by the unit tests

use oie_core::{DependencyGraph, Edge, Node};

fn graph(nodes: Vec<Node>, edges: &[(usize, usize, &str)]) -> DependencyGraph {
    let edges = edges
        .iter()
        .map(|&(source, dest, label)| Edge::new(source, dest, label))
        .collect();
    DependencyGraph::new(nodes, edges).unwrap()
}

/// "The small dog that barked loudly chased the cat ."
pub fn dog_sentence() -> DependencyGraph {
    graph(
        vec![
            Node::new(0, "The", "DT"),
            Node::new(1, "small", "JJ"),
            Node::new(2, "dog", "NN"),
            Node::new(3, "that", "WDT"),
            Node::new(4, "barked", "VBD").with_lemma("bark"),
            Node::new(5, "loudly", "RB"),
            Node::new(6, "chased", "VBD").with_lemma("chase"),
            Node::new(7, "the", "DT"),
            Node::new(8, "cat", "NN"),
            Node::new(9, ".", "."),
        ],
        &[
            (2, 0, "det"),
            (2, 1, "amod"),
            (6, 2, "nsubj"),
            (4, 3, "nsubj"),
            (2, 4, "rcmod"),
            (4, 5, "advmod"),
            (6, 8, "dobj"),
            (8, 7, "det"),
            (6, 9, "punct"),
        ],
    )
}

/// "Obama who won the election visited Paris ."
pub fn obama_sentence(proper: bool) -> DependencyGraph {
    let obama = if proper {
        Node::new(0, "Obama", "NNP")
    } else {
        Node::new(0, "Obama", "NN")
    };
    graph(
        vec![
            obama,
            Node::new(1, "who", "WP"),
            Node::new(2, "won", "VBD").with_lemma("win"),
            Node::new(3, "the", "DT"),
            Node::new(4, "election", "NN"),
            Node::new(5, "visited", "VBD").with_lemma("visit"),
            Node::new(6, "Paris", "NNP"),
            Node::new(7, ".", "."),
        ],
        &[
            (5, 0, "nsubj"),
            (0, 2, "rcmod"),
            (2, 1, "nsubj"),
            (2, 4, "dobj"),
            (4, 3, "det"),
            (5, 6, "dobj"),
            (5, 7, "punct"),
        ],
    )
}

/// "John and Mary saw the film ."
pub fn conjunction_sentence() -> DependencyGraph {
    graph(
        vec![
            Node::new(0, "John", "NNP"),
            Node::new(1, "and", "CC"),
            Node::new(2, "Mary", "NNP"),
            Node::new(3, "saw", "VBD").with_lemma("see"),
            Node::new(4, "the", "DT"),
            Node::new(5, "film", "NN"),
            Node::new(6, ".", "."),
        ],
        &[
            (3, 0, "nsubj"),
            (0, 2, "conj_and"),
            (0, 1, "cc"),
            (3, 5, "dobj"),
            (5, 4, "det"),
            (3, 6, "punct"),
        ],
    )
}

/// "the president of France", with "of" collapsed into `prep_of`
pub fn president_phrase() -> DependencyGraph {
    graph(
        vec![
            Node::new(0, "the", "DT"),
            Node::new(1, "president", "NN"),
            Node::new(2, "of", "IN"),
            Node::new(3, "France", "NNP"),
        ],
        &[(1, 0, "det"), (1, 3, "prep_of")],
    )
}

/// "the big red ball"
pub fn ball_phrase() -> DependencyGraph {
    graph(
        vec![
            Node::new(0, "the", "DT"),
            Node::new(1, "big", "JJ"),
            Node::new(2, "red", "JJ"),
            Node::new(3, "ball", "NN"),
        ],
        &[(3, 0, "det"), (3, 1, "amod"), (3, 2, "amod")],
    )
}

/// "a big old ball" where "old" is left unattached
pub fn gapped_ball_phrase() -> DependencyGraph {
    graph(
        vec![
            Node::new(0, "a", "DT"),
            Node::new(1, "big", "JJ"),
            Node::new(2, "old", "JJ"),
            Node::new(3, "ball", "NN"),
        ],
        &[(3, 0, "det"), (3, 1, "amod")],
    )
}

/// "dog that chased the cat that ran"
pub fn nested_clause_sentence() -> DependencyGraph {
    graph(
        vec![
            Node::new(0, "dog", "NN"),
            Node::new(1, "that", "WDT"),
            Node::new(2, "chased", "VBD"),
            Node::new(3, "the", "DT"),
            Node::new(4, "cat", "NN"),
            Node::new(5, "that", "WDT"),
            Node::new(6, "ran", "VBD"),
        ],
        &[
            (0, 2, "rcmod"),
            (2, 1, "nsubj"),
            (2, 4, "dobj"),
            (4, 3, "det"),
            (4, 6, "rcmod"),
            (6, 5, "nsubj"),
        ],
    )
}

/// "The company has given up the plan ."
pub fn phrasal_verb_sentence() -> DependencyGraph {
    graph(
        vec![
            Node::new(0, "The", "DT"),
            Node::new(1, "company", "NN"),
            Node::new(2, "has", "VBZ"),
            Node::new(3, "given", "VBN").with_lemma("give"),
            Node::new(4, "up", "RP"),
            Node::new(5, "the", "DT"),
            Node::new(6, "plan", "NN"),
            Node::new(7, ".", "."),
        ],
        &[
            (1, 0, "det"),
            (3, 1, "nsubj"),
            (3, 2, "aux"),
            (3, 4, "prt"),
            (3, 6, "dobj"),
            (6, 5, "det"),
            (3, 7, "punct"),
        ],
    )
}

/// "He took a walk in the park home", optionally with a second `dobj`
pub fn walk_sentence(second_object: bool) -> DependencyGraph {
    let mut edges = vec![
        (1, 0, "nsubj"),
        (1, 3, "dobj"),
        (3, 2, "det"),
        (1, 6, "prep_in"),
        (6, 5, "det"),
    ];
    if second_object {
        edges.push((1, 7, "dobj"));
    }
    graph(
        vec![
            Node::new(0, "He", "PRP"),
            Node::new(1, "took", "VBD").with_lemma("take"),
            Node::new(2, "a", "DT"),
            Node::new(3, "walk", "NN"),
            Node::new(4, "in", "IN"),
            Node::new(5, "the", "DT"),
            Node::new(6, "park", "NN"),
            Node::new(7, "home", "NN"),
        ],
        &edges,
    )
}

/// "He is indeed the best president"
pub fn copula_sentence() -> DependencyGraph {
    graph(
        vec![
            Node::new(0, "He", "PRP"),
            Node::new(1, "is", "VBZ").with_lemma("be"),
            Node::new(2, "indeed", "RB"),
            Node::new(3, "the", "DT"),
            Node::new(4, "best", "JJS").with_lemma("good"),
            Node::new(5, "president", "NN"),
        ],
        &[
            (5, 0, "nsubj"),
            (5, 1, "cop"),
            (5, 2, "dep"),
            (5, 3, "det"),
            (5, 4, "amod"),
        ],
    )
}
