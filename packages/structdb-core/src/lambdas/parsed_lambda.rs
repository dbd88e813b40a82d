//! Immutable node sequence produced by the expression parsers.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::ops::Range;

use super::nodes::Node;

/// Ordered, immutable sequence of nodes plus its canonical string form.
///
/// Predicate nodes are stored in postfix order: operands precede the
/// operator consuming them. Sorting and Include nodes stand alone.
#[derive(Debug, Clone)]
pub struct ParsedLambda {
    nodes: Vec<Node>,
    fragments: Vec<Range<usize>>,
    canonical: String,
}

impl ParsedLambda {
    pub fn new(nodes: Vec<Node>) -> Self {
        let fragments = compute_fragments(&nodes);
        let canonical = nodes
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(";");
        Self {
            nodes,
            fragments,
            canonical,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Canonical string form, used for structural equality.
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Self-contained node groups: each complete predicate at the root, or
    /// each standalone Sorting/Include node.
    pub fn fragments(&self) -> impl Iterator<Item = &[Node]> {
        self.fragments.iter().map(move |r| &self.nodes[r.clone()])
    }

    /// Returns a new lambda holding the union of both inputs' fragments,
    /// first-seen order preserved. Neither input is modified.
    ///
    /// Root predicate fragments left side by side are conjoined by the
    /// query compiler.
    pub fn merge_as_new(&self, other: &ParsedLambda) -> ParsedLambda {
        let mut seen = HashSet::new();
        let mut nodes = Vec::with_capacity(self.nodes.len() + other.nodes.len());
        for fragment in self.fragments().chain(other.fragments()) {
            if seen.insert(fragment_key(fragment)) {
                nodes.extend_from_slice(fragment);
            }
        }
        ParsedLambda::new(nodes)
    }
}

impl Default for ParsedLambda {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for ParsedLambda {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for ParsedLambda {}

impl Hash for ParsedLambda {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

fn fragment_key(fragment: &[Node]) -> String {
    fragment
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(";")
}

/// Splits a postfix node sequence into root-level fragments by simulating
/// the compiler's operand stack. A malformed sequence becomes one fragment.
fn compute_fragments(nodes: &[Node]) -> Vec<Range<usize>> {
    let mut starts: Vec<usize> = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        match node {
            Node::Operator(op) => {
                let arity = op.arity();
                if starts.len() < arity {
                    return if nodes.is_empty() {
                        Vec::new()
                    } else {
                        vec![0..nodes.len()]
                    };
                }
                let start = starts[starts.len() - arity];
                starts.truncate(starts.len() - arity);
                starts.push(start);
            }
            _ => starts.push(i),
        }
    }

    let mut fragments = Vec::with_capacity(starts.len());
    for (i, start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(nodes.len());
        fragments.push(*start..end);
    }
    fragments
}
