//! Ruby syntax tree
//!
//! The tree models expressions and statements closely enough to expose
//! declaration shapes: calls with receivers, arguments and blocks, literals,
//! assignments, and the namespace-level structure of classes and modules.
//! Anything else is kept as a generic node with its children so that
//! traversals still reach nested calls.

use crate::span::Span;
use serde::{Deserialize, Serialize};

/// A decoded string literal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrLit {
    pub value: String,
    /// Whether the literal contains `#{}` interpolation
    pub interpolated: bool,
}

/// A node of the tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    /// 1-indexed line the node starts on
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A sequence of statements
    Statements(Vec<Node>),
    /// Method call, with or without receiver
    Call(Box<Call>),
    Assign {
        target: Box<Node>,
        value: Box<Node>,
    },
    OpAssign {
        op: String,
        target: Box<Node>,
        value: Box<Node>,
    },
    Binary {
        op: String,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Unary {
        op: String,
        operand: Box<Node>,
    },
    /// Local variable or method name without receiver and arguments
    Ident(String),
    /// `Name` or `Scope::Name`
    Const {
        scope: Option<Box<Node>>,
        name: String,
    },
    IVar(String),
    CVar(String),
    GVar(String),
    /// Symbol without the leading colon
    Symbol(String),
    /// `"..."` symbol with its decoded name
    DynSymbol(StrLit),
    Str(StrLit),
    XStr(StrLit),
    /// Regular expression, as written
    Regex(String),
    Number(String),
    Nil,
    True,
    False,
    SelfRef,
    Array(Vec<Node>),
    /// Hash literal or trailing keyword arguments
    Hash(Vec<Node>),
    /// `key => value` or `key: value`
    Pair {
        key: Box<Node>,
        value: Box<Node>,
    },
    /// `*value` or `**value`
    Splat {
        double: bool,
        value: Option<Box<Node>>,
    },
    /// `&block`
    BlockPass(Option<Box<Node>>),
    Def {
        name: String,
        singleton: bool,
        params: Vec<Param>,
        body: Box<Node>,
    },
    /// `class`, `module`, or `class << self`
    Namespace {
        keyword: NamespaceKind,
        name: Option<Box<Node>>,
        superclass: Option<Box<Node>>,
        body: Box<Node>,
    },
    /// `if`, `unless`, `while`, `until`, `for`, `case`, `begin`, ternaries and
    /// modifiers. Children are conditions and bodies in source order.
    Control {
        keyword: String,
        children: Vec<Node>,
    },
    /// `->(x) { ... }` or `lambda { ... }`
    Lambda {
        params: Vec<Param>,
        body: Box<Node>,
    },
    /// `return`, `break`, `next`, `yield`, `super`
    Jump {
        keyword: String,
        args: Vec<Node>,
    },
    /// A construct the parser does not model in detail
    Opaque(Vec<Node>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamespaceKind {
    Class,
    Module,
    SingletonClass,
}

/// A method call
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub receiver: Option<Box<Node>>,
    pub method: String,
    pub args: Vec<Node>,
    /// Whether the arguments were written in parentheses
    pub parens: bool,
    pub block: Option<Block>,
}

/// A `do ... end` or `{ ... }` block attached to a call
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub params: Vec<Param>,
    pub body: Box<Node>,
    pub span: Span,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamKind {
    Required,
    Optional,
    Rest,
    Keyword,
    KeywordRest,
    Block,
}

/// A method or block parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
    pub default: Option<Node>,
    pub span: Span,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span, line: usize) -> Self {
        Self { kind, span, line }
    }

    /// The call, if this node is one
    pub fn as_call(&self) -> Option<&Call> {
        match &self.kind {
            NodeKind::Call(call) => Some(call),
            _ => None,
        }
    }

    /// Statements of a body node; a single expression counts as one statement
    pub fn statements(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Statements(nodes) => nodes,
            _ => std::slice::from_ref(self),
        }
    }

    /// Direct children in source order
    pub fn children(&self) -> Vec<&Node> {
        match &self.kind {
            NodeKind::Statements(nodes)
            | NodeKind::Array(nodes)
            | NodeKind::Hash(nodes)
            | NodeKind::Opaque(nodes) => nodes.iter().collect(),
            NodeKind::Control { children, .. } => children.iter().collect(),
            NodeKind::Jump { args, .. } => args.iter().collect(),
            NodeKind::Call(call) => {
                let mut out: Vec<&Node> = Vec::new();
                if let Some(receiver) = &call.receiver {
                    out.push(receiver.as_ref());
                }
                out.extend(call.args.iter());
                if let Some(block) = &call.block {
                    out.extend(block.params.iter().filter_map(|p| p.default.as_ref()));
                    out.push(block.body.as_ref());
                }
                out
            }
            NodeKind::Assign { target, value } | NodeKind::OpAssign { target, value, .. } => {
                vec![target.as_ref(), value.as_ref()]
            }
            NodeKind::Binary { lhs, rhs, .. } => vec![lhs.as_ref(), rhs.as_ref()],
            NodeKind::Unary { operand, .. } => vec![operand.as_ref()],
            NodeKind::Const { scope, .. } => scope.iter().map(|s| s.as_ref()).collect(),
            NodeKind::Pair { key, value } => vec![key.as_ref(), value.as_ref()],
            NodeKind::Splat { value, .. } | NodeKind::BlockPass(value) => {
                value.iter().map(|v| v.as_ref()).collect()
            }
            NodeKind::Def { params, body, .. } | NodeKind::Lambda { params, body } => {
                let mut out: Vec<&Node> =
                    params.iter().filter_map(|p| p.default.as_ref()).collect();
                out.push(body.as_ref());
                out
            }
            NodeKind::Namespace {
                name,
                superclass,
                body,
                ..
            } => {
                let mut out: Vec<&Node> = Vec::new();
                out.extend(name.iter().map(|n| n.as_ref()));
                out.extend(superclass.iter().map(|n| n.as_ref()));
                out.push(body.as_ref());
                out
            }
            NodeKind::Ident(_)
            | NodeKind::IVar(_)
            | NodeKind::CVar(_)
            | NodeKind::GVar(_)
            | NodeKind::Symbol(_)
            | NodeKind::DynSymbol(_)
            | NodeKind::Str(_)
            | NodeKind::XStr(_)
            | NodeKind::Regex(_)
            | NodeKind::Number(_)
            | NodeKind::Nil
            | NodeKind::True
            | NodeKind::False
            | NodeKind::SelfRef => Vec::new(),
        }
    }

    /// Depth-first pre-order traversal starting at (and including) this node
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder { stack: vec![self] }
    }

    /// Fully qualified constant path, e.g. `Puppet::Type`
    pub fn const_path(&self) -> Option<String> {
        match &self.kind {
            NodeKind::Const { scope: None, name } => Some(name.clone()),
            NodeKind::Const {
                scope: Some(scope),
                name,
            } => {
                if let NodeKind::Const { .. } = scope.kind {
                    Some(format!("{}::{}", scope.const_path()?, name))
                } else if matches!(scope.kind, NodeKind::Opaque(ref c) if c.is_empty()) {
                    // `::Puppet` (top-level scope)
                    Some(name.clone())
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

/// Iterator produced by [`Node::preorder`]
#[derive(Debug, Clone)]
pub struct Preorder<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().into_iter().rev());
        Some(node)
    }
}

impl Call {
    /// Whether the call's receiver is the constant path `path`
    pub fn receiver_is(&self, path: &str) -> bool {
        self.receiver
            .as_deref()
            .and_then(Node::const_path)
            .is_some_and(|p| p == path)
    }

    /// Arguments other than a trailing options hash and block pass
    pub fn positional_args(&self) -> &[Node] {
        let mut end = self.args.len();
        if end > 0 && matches!(self.args[end - 1].kind, NodeKind::BlockPass(_)) {
            end -= 1;
        }
        if end > 0 && matches!(self.args[end - 1].kind, NodeKind::Hash(_)) {
            end -= 1;
        }
        &self.args[..end]
    }

    /// The trailing options hash (`key => value` or `key: value`)
    pub fn options(&self) -> Option<&Node> {
        self.args
            .iter()
            .rev()
            .find(|a| !matches!(a.kind, NodeKind::BlockPass(_)))
            .filter(|a| matches!(a.kind, NodeKind::Hash(_)))
    }

    /// Look up `key` in the trailing options hash
    pub fn option(&self, key: &str) -> Option<&Node> {
        let NodeKind::Hash(entries) = &self.options()?.kind else {
            return None;
        };
        entries.iter().find_map(|entry| match &entry.kind {
            NodeKind::Pair { key: k, value } if k.symbol_name() == Some(key) => Some(value.as_ref()),
            _ => None,
        })
    }
}

impl Node {
    /// Name of a plain symbol or label key
    pub fn symbol_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Symbol(name) => Some(name),
            NodeKind::DynSymbol(lit) if !lit.interpolated => Some(&lit.value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(kind: NodeKind, start: usize) -> Node {
        Node::new(kind, Span::new(start, start + 1), 1)
    }

    #[test]
    fn test_preorder_visits_in_source_order() {
        let call = Call {
            receiver: Some(Box::new(leaf(NodeKind::Ident("a".into()), 0))),
            method: "m".into(),
            args: vec![leaf(NodeKind::Symbol("x".into()), 2)],
            parens: true,
            block: Some(Block {
                params: Vec::new(),
                body: Box::new(leaf(NodeKind::Ident("b".into()), 5)),
                span: Span::new(4, 8),
                line: 1,
            }),
        };
        let root = leaf(NodeKind::Call(Box::new(call)), 0);
        let visited: Vec<String> = root
            .preorder()
            .skip(1)
            .map(|n| format!("{:?}", n.kind))
            .collect();
        assert_eq!(
            visited,
            vec![r#"Ident("a")"#, r#"Symbol("x")"#, r#"Ident("b")"#]
        );
    }

    #[test]
    fn test_const_path() {
        let puppet = leaf(
            NodeKind::Const {
                scope: None,
                name: "Puppet".into(),
            },
            0,
        );
        let path = leaf(
            NodeKind::Const {
                scope: Some(Box::new(puppet)),
                name: "Type".into(),
            },
            0,
        );
        assert_eq!(path.const_path().as_deref(), Some("Puppet::Type"));
    }

    #[test]
    fn test_options_lookup() {
        let pair = leaf(
            NodeKind::Pair {
                key: Box::new(leaf(NodeKind::Symbol("namevar".into()), 0)),
                value: Box::new(leaf(NodeKind::True, 3)),
            },
            0,
        );
        let call = Call {
            receiver: None,
            method: "newparam".into(),
            args: vec![
                leaf(NodeKind::Symbol("name".into()), 0),
                leaf(NodeKind::Hash(vec![pair]), 2),
            ],
            parens: true,
            block: None,
        };
        assert_eq!(call.positional_args().len(), 1);
        assert_eq!(call.option("namevar").map(|n| &n.kind), Some(&NodeKind::True));
        assert!(call.option("parent").is_none());
    }
}
