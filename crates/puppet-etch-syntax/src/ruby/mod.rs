//! Ruby front-end: lexer, tree and parser

mod ast;
mod lexer;
mod parser;
mod token;

pub use ast::{
    Block, Call, NamespaceKind, Node, NodeKind, Param, ParamKind, Preorder, StrLit,
};
pub use lexer::{Lexer, Token};
pub use parser::Parser;
pub use token::TokenKind;

use crate::comment::Comments;
use crate::error::SyntaxResult;
use crate::span::LineIndex;

/// Parse Ruby source into its statement tree and comments
pub fn parse(text: &str, index: &LineIndex) -> SyntaxResult<(Node, Comments)> {
    let (tokens, comments) = Lexer::new(text, index).tokenize()?;
    let root = Parser::new(text, index, tokens).parse_program()?;
    Ok((root, comments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyntaxErrorKind;
    use pretty_assertions::assert_eq;

    fn parse_ok(text: &str) -> Node {
        let index = LineIndex::new(text);
        parse(text, &index).unwrap().0
    }

    fn first_call(root: &Node) -> &Call {
        root.statements()[0].as_call().unwrap()
    }

    #[test]
    fn test_newtype_with_do_block() {
        let root = parse_ok(
            "Puppet::Type.newtype(:database) do\n  newparam(:name) do\n    desc 'The name.'\n  end\nend\n",
        );
        let call = first_call(&root);
        assert_eq!(call.method, "newtype");
        assert!(call.receiver_is("Puppet::Type"));
        assert_eq!(call.args[0].symbol_name(), Some("database"));

        let block = call.block.as_ref().unwrap();
        let inner = block.body.statements()[0].as_call().unwrap();
        assert_eq!(inner.method, "newparam");
        let desc = inner.block.as_ref().unwrap().body.statements()[0]
            .as_call()
            .unwrap();
        assert_eq!(desc.method, "desc");
        assert!(!desc.parens);
        assert!(matches!(&desc.args[0].kind, NodeKind::Str(s) if s.value == "The name."));
    }

    #[test]
    fn test_do_block_binds_to_outer_command() {
        let root = parse_ok("newproperty :ensure do\n  defaultto :present\nend\n");
        let call = first_call(&root);
        assert_eq!(call.method, "newproperty");
        assert!(call.block.is_some());
        assert_eq!(call.args.len(), 1);
    }

    #[test]
    fn test_provider_chain_with_options() {
        let root = parse_ok(
            "Puppet::Type.type(:database).provide(:mysql, :parent => Puppet::Provider) do\nend\n",
        );
        let provide = first_call(&root);
        assert_eq!(provide.method, "provide");
        assert_eq!(provide.positional_args().len(), 1);
        assert!(provide.option("parent").is_some());

        let type_call = provide.receiver.as_deref().unwrap().as_call().unwrap();
        assert_eq!(type_call.method, "type");
        assert!(type_call.receiver_is("Puppet::Type"));
    }

    #[test]
    fn test_command_hash_arguments() {
        let root = parse_ok("confine :osfamily => :redhat, 'kernel' => 'Linux'\n");
        let call = first_call(&root);
        assert_eq!(call.args.len(), 1);
        let NodeKind::Hash(entries) = &call.args[0].kind else {
            panic!("expected hash");
        };
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_doc_assignments() {
        let root = parse_ok("@doc = 'ivar'\nself.doc = 'attr'\n");
        let statements = root.statements();
        assert!(matches!(&statements[0].kind, NodeKind::Assign { target, .. }
            if matches!(&target.kind, NodeKind::IVar(name) if name == "@doc")));
        let NodeKind::Assign { target, .. } = &statements[1].kind else {
            panic!("expected assignment");
        };
        let attr = target.as_call().unwrap();
        assert_eq!(attr.method, "doc");
        assert!(matches!(attr.receiver.as_deref().map(|r| &r.kind), Some(NodeKind::SelfRef)));
    }

    #[test]
    fn test_heredoc_argument_in_parens() {
        let root = parse_ok(
            "newfunction(:foo, :type => :rvalue, :doc => <<-EOS\n  Does foo.\n  EOS\n) do |args|\n  args\nend\n",
        );
        let call = first_call(&root);
        assert_eq!(call.method, "newfunction");
        assert!(call.block.is_some());
        let doc = call.option("doc").unwrap();
        assert!(matches!(&doc.kind, NodeKind::Str(s) if s.value == "  Does foo.\n"));
    }

    #[test]
    fn test_adjacent_strings_are_joined() {
        let root = parse_ok("desc 'one ' \\\n  'two'\n");
        let call = first_call(&root);
        assert!(matches!(&call.args[0].kind, NodeKind::Str(s) if s.value == "one two"));
    }

    #[test]
    fn test_namespace_and_def_bodies() {
        let root = parse_ok(
            "module Puppet\n  class Foo < Bar\n    def self.run(a, b = 1, *rest, key:, &blk)\n      a + b\n    rescue StandardError => e\n      nil\n    end\n  end\nend\n",
        );
        let NodeKind::Namespace { keyword, body, .. } = &root.statements()[0].kind else {
            panic!("expected module");
        };
        assert_eq!(*keyword, NamespaceKind::Module);
        let NodeKind::Namespace { superclass, body, .. } = &body.statements()[0].kind else {
            panic!("expected class");
        };
        assert!(superclass.is_some());
        let NodeKind::Def {
            name,
            singleton,
            params,
            ..
        } = &body.statements()[0].kind
        else {
            panic!("expected def");
        };
        assert_eq!(name, "run");
        assert!(singleton);
        let kinds: Vec<ParamKind> = params.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ParamKind::Required,
                ParamKind::Optional,
                ParamKind::Rest,
                ParamKind::Keyword,
                ParamKind::Block
            ]
        );
    }

    #[test]
    fn test_control_flow_keeps_nested_calls_reachable() {
        let root = parse_ok(
            "if Facter.value(:kernel) == 'Linux'\n  commands :foo => 'foo'\nelsif x\n  y\nelse\n  z unless w\nend\n",
        );
        let methods: Vec<&str> = root
            .preorder()
            .filter_map(|n| n.as_call().map(|c| c.method.as_str()))
            .collect();
        assert!(methods.contains(&"commands"));
        assert!(methods.contains(&"value"));
    }

    #[test]
    fn test_labels_and_nested_hashes() {
        let root = parse_ok(
            "Puppet::ResourceApi.register_type(\n  name: 'thing',\n  attributes: {\n    ensure: { type: 'Enum[present, absent]' },\n  },\n)\n",
        );
        let call = first_call(&root);
        assert_eq!(call.method, "register_type");
        assert!(call.option("name").is_some());
        let NodeKind::Hash(attributes) = &call.option("attributes").unwrap().kind else {
            panic!("expected hash");
        };
        assert_eq!(attributes.len(), 1);
    }

    #[test]
    fn test_stray_end_is_unbalanced() {
        let index = LineIndex::new("foo\nend\n");
        let err = parse("foo\nend\n", &index).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::Unbalanced("end".to_string()));
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_missing_end_is_unexpected_eof() {
        let index = LineIndex::new("foo do\n  bar\n");
        let err = parse("foo do\n  bar\n", &index).unwrap_err();
        assert!(matches!(err.kind, SyntaxErrorKind::UnexpectedEof(_)));
    }
}
