//! Puppet language front-end

mod ast;
mod lexer;
mod parser;

pub use ast::{Definition, DefinitionKind, Manifest, Parameter};
pub use lexer::{Lexer, PuppetToken, Token};
pub use parser::Parser;

use crate::comment::Comments;
use crate::error::SyntaxResult;
use crate::span::LineIndex;

/// Parse a manifest into its declarations and comments
pub fn parse(text: &str, index: &LineIndex) -> SyntaxResult<(Manifest, Comments)> {
    let (tokens, comments) = Lexer::new(text, index).tokenize()?;
    let manifest = Parser::new(text, index, tokens).parse_manifest()?;
    Ok((manifest, comments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyntaxErrorKind;
    use pretty_assertions::assert_eq;

    fn parse_ok(text: &str) -> (Manifest, Comments) {
        let index = LineIndex::new(text);
        parse(text, &index).unwrap()
    }

    #[test]
    fn test_class_with_parameters() {
        let (manifest, comments) = parse_ok(
            "# Installs foo.\n# @param ensure Whether foo is present.\nclass foo (\n  Enum['present', 'absent'] $ensure = 'present',\n  Hash[String, Integer] $ports = { 'http' => 80 },\n  $untyped,\n) inherits foo::params {\n  package { 'foo': ensure => $ensure }\n}\n",
        );
        let class = &manifest.definitions[0];
        assert_eq!(class.kind, DefinitionKind::Class);
        assert_eq!(class.name, "foo");
        assert_eq!(class.parent.as_deref(), Some("foo::params"));
        assert_eq!(class.line, 3);

        let names: Vec<&str> = class.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["ensure", "ports", "untyped"]);
        assert_eq!(
            class.params[0].type_expr.as_deref(),
            Some("Enum['present', 'absent']")
        );
        assert_eq!(class.params[0].default.as_deref(), Some("'present'"));
        assert_eq!(class.params[1].default.as_deref(), Some("{ 'http' => 80 }"));
        assert_eq!(class.params[2].type_expr, None);

        let block = comments.block_before(class.line).unwrap();
        assert_eq!(block.text, "Installs foo.\n@param ensure Whether foo is present.");
    }

    #[test]
    fn test_nested_define_and_resource_like_class() {
        let (manifest, _) = parse_ok(
            "class outer {\n  class { 'inner': }\n  define outer::thing($x) {\n    notify { $x: }\n  }\n}\n",
        );
        assert_eq!(manifest.definitions.len(), 1);
        let nested = &manifest.definitions[0].nested;
        assert_eq!(nested.len(), 1);
        assert_eq!(nested[0].kind, DefinitionKind::DefinedType);
        assert_eq!(nested[0].name, "outer::thing");
        assert_eq!(manifest.all_definitions().len(), 2);
    }

    #[test]
    fn test_function_type_alias_and_plan() {
        let (manifest, _) = parse_ok(
            "function mymod::add(Integer $a, Integer *$rest) >> Integer {\n  $a\n}\ntype Mymod::Port = Integer[1, 65535]\nplan mymod::deploy(TargetSpec $targets) {\n  run_task('x', $targets)\n}\n",
        );
        let kinds: Vec<DefinitionKind> = manifest.definitions.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DefinitionKind::Function,
                DefinitionKind::TypeAlias,
                DefinitionKind::Plan
            ]
        );
        let function = &manifest.definitions[0];
        assert_eq!(function.return_type.as_deref(), Some("Integer"));
        assert!(function.params[1].captures_rest);
        let alias = &manifest.definitions[1];
        assert_eq!(alias.name, "Mymod::Port");
        assert_eq!(alias.aliased_type.as_deref(), Some("Integer[1, 65535]"));
    }

    #[test]
    fn test_unclosed_body_is_an_error() {
        let index = LineIndex::new("class foo {\n  notify { 'x': }\n");
        let err = parse("class foo {\n  notify { 'x': }\n", &index).unwrap_err();
        assert!(matches!(err.kind, SyntaxErrorKind::UnexpectedEof(_)));
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_stray_closing_brace() {
        let index = LineIndex::new("}\n");
        let err = parse("}\n", &index).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::Unbalanced("}".to_string()));
    }
}
