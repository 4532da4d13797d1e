//! Docstring resolver for Ruby declarations
//!
//! A Ruby declaration documents itself from inside its block, either by
//! assigning the doc field (`@doc = "..."`, `self.doc = "..."`) or by calling
//! a descriptor method with a single argument (`desc "..."`, `doc= "..."`).
//! The first candidate in depth-first pre-order wins; the search stops there.

use crate::docstring::scrub;
use crate::resolve::node_as_string;
use puppet_etch_syntax::ruby::{Node, NodeKind};

/// Outcome of a docstring search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocSearch {
    /// Scrubbed docstring text, and the line it was found on
    Found { text: String, line: usize },
    /// No candidate in the searched subtree
    NotFound,
    /// A candidate whose value is not a plain literal
    Unresolvable { line: usize },
}

impl DocSearch {
    /// Resolve a value node that is known to hold the docstring
    pub fn of_value(value: &Node) -> Self {
        match node_as_string(value) {
            Some(text) => DocSearch::Found {
                text: scrub(&text),
                line: value.line,
            },
            None => DocSearch::Unresolvable { line: value.line },
        }
    }
}

/// Search `root` and everything below it
pub fn find_docstring(root: &Node) -> DocSearch {
    search(root.preorder())
}

/// Search `root`, without entering subtrees for which `prune` holds
pub fn find_docstring_pruned(root: &Node, prune: impl Fn(&Node) -> bool) -> DocSearch {
    let mut nodes = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        nodes.push(node);
        stack.extend(
            node.children()
                .into_iter()
                .rev()
                .filter(|child| !prune(*child)),
        );
    }
    search(nodes)
}

/// Visit nodes in order and stop at the first docstring candidate
pub fn search<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> DocSearch {
    nodes
        .into_iter()
        .find_map(candidate)
        .map_or(DocSearch::NotFound, DocSearch::of_value)
}

/// The value node of a docstring candidate
fn candidate(node: &Node) -> Option<&Node> {
    match &node.kind {
        NodeKind::Assign { target, value } if is_doc_field(target) => Some(value.as_ref()),
        NodeKind::Call(call) if matches!(call.method.as_str(), "desc" | "doc=") => {
            match call.args.as_slice() {
                [value] if call.block.is_none() => Some(value),
                _ => None,
            }
        }
        _ => None,
    }
}

/// `@doc` or `self.doc`
fn is_doc_field(target: &Node) -> bool {
    match &target.kind {
        NodeKind::IVar(name) => name == "@doc",
        NodeKind::Call(call) => {
            call.method == "doc"
                && call.args.is_empty()
                && matches!(call.receiver.as_deref().map(|r| &r.kind), Some(NodeKind::SelfRef))
        }
        _ => false,
    }
}
