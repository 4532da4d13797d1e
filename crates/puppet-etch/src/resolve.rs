//! Static resolution of literal values
//!
//! Names and docstrings are only documented when they are written as
//! literals. Anything else resolves to `None`, and callers decide whether
//! to fall back to the node's source text.

use puppet_etch_syntax::ruby::{Node, NodeKind};
use puppet_etch_syntax::SyntaxTree;

/// Text of a symbol, label, uninterpolated string, or regular expression
pub fn node_as_string(node: &Node) -> Option<String> {
    match &node.kind {
        NodeKind::Symbol(name) => Some(name.clone()),
        NodeKind::DynSymbol(lit) | NodeKind::Str(lit) if !lit.interpolated => {
            Some(lit.value.clone())
        }
        NodeKind::Regex(source) => Some(source.clone()),
        _ => None,
    }
}

/// Literal text of `node`, or its source text when it is not a literal
pub fn literal_or_source(tree: &SyntaxTree, node: &Node) -> String {
    node_as_string(node).unwrap_or_else(|| tree.text(node.span).to_string())
}

/// Literal texts of `node`, flattening array literals
pub fn literal_list(tree: &SyntaxTree, node: &Node) -> Vec<String> {
    match &node.kind {
        NodeKind::Array(items) => items.iter().map(|i| literal_or_source(tree, i)).collect(),
        _ => vec![literal_or_source(tree, node)],
    }
}

/// Value stored under the symbol or label `key` of a hash literal
pub fn hash_value<'a>(node: &'a Node, key: &str) -> Option<&'a Node> {
    let NodeKind::Hash(entries) = &node.kind else {
        return None;
    };
    entries.iter().find_map(|entry| match &entry.kind {
        NodeKind::Pair { key: k, value } if k.symbol_name() == Some(key) => Some(value.as_ref()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_arg(tree: &SyntaxTree) -> &Node {
        let puppet_etch_syntax::SyntaxRoot::Ruby(root) = tree.root() else {
            panic!("expected ruby");
        };
        &root.statements()[0].as_call().unwrap().args[0]
    }

    fn resolve(source: &str) -> Option<String> {
        let tree = SyntaxTree::parse_ruby("t.rb", source).unwrap();
        node_as_string(first_arg(&tree))
    }

    #[test]
    fn test_literals_resolve() {
        assert_eq!(resolve("f :mysql\n").as_deref(), Some("mysql"));
        assert_eq!(resolve("f 'mysql'\n").as_deref(), Some("mysql"));
        assert_eq!(resolve("f \"my#{'sql'}\"\n"), None);
        assert_eq!(resolve("f :\"my sql\"\n").as_deref(), Some("my sql"));
        assert_eq!(resolve("f \"a\" \"b\"\n").as_deref(), Some("ab"));
    }

    #[test]
    fn test_non_literals_do_not_resolve() {
        assert_eq!(resolve("f name\n"), None);
        assert_eq!(resolve("f 'a' + 'b'\n"), None);
        assert_eq!(resolve("f Foo::Bar\n"), None);
    }

    #[test]
    fn test_source_fallback() {
        let tree = SyntaxTree::parse_ruby("t.rb", "f Facter.value(:kernel)\n").unwrap();
        assert_eq!(literal_or_source(&tree, first_arg(&tree)), "Facter.value(:kernel)");

        let tree = SyntaxTree::parse_ruby("t.rb", "f [:a, 'b', c]\n").unwrap();
        assert_eq!(literal_list(&tree, first_arg(&tree)), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_hash_value_lookup() {
        let tree = SyntaxTree::parse_ruby("t.rb", "f({ type: 'String', :desc => 'A name.' })\n").unwrap();
        let hash = first_arg(&tree);
        assert_eq!(hash_value(hash, "type").and_then(node_as_string).as_deref(), Some("String"));
        assert_eq!(hash_value(hash, "desc").and_then(node_as_string).as_deref(), Some("A name."));
        assert!(hash_value(hash, "default").is_none());
    }
}
