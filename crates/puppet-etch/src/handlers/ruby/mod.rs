//! Ruby construct matchers
//!
//! Namespace-level statements of a Ruby file are classified into the closed
//! set of declaration idioms Puppet understands. Matching only looks at the
//! shape of the call: its receiver, method name and arguments.
//!
//! ```text
//! Puppet::Type.newtype(:t) do ... end                  ResourceType
//! Puppet::Type.type(:t).newparam(:p) do ... end        TypeExtension
//! Puppet::Type.type(:t).provide(:p) do ... end         Provider
//! Puppet::Functions.create_function(:f) do ... end     Function4x
//! Puppet::Parser::Functions.newfunction(:f, ...) do    Function3x
//! Puppet::DataTypes.create_type('T') do ... end        DataType
//! Puppet::ResourceApi.register_type(name: 't', ...)    ResourceApiType
//! ```

mod data_type;
mod function;
pub mod metadata;
mod provider;
mod resource_api;
mod resource_type;

pub use resource_type::AttributeCall;

use super::HandlerContext;
use crate::diagnostics::EtchResult;
use crate::params::AttributeKind;
use crate::resolve::node_as_string;
use puppet_etch_syntax::ruby::{Call, Node, NodeKind};

/// A recognized Ruby declaration
#[derive(Debug, Clone, Copy)]
pub enum RubyConstruct<'a> {
    ResourceType(&'a Call),
    TypeExtension {
        type_call: &'a Call,
        call: &'a Call,
        kind: AttributeKind,
    },
    Provider {
        type_call: &'a Call,
        call: &'a Call,
    },
    Function4x(&'a Call),
    Function3x(&'a Call),
    DataType(&'a Call),
    ResourceApiType(&'a Call),
    NoMatch,
}

impl<'a> RubyConstruct<'a> {
    /// Classify a statement by the shape of its call
    pub fn classify(node: &'a Node) -> Self {
        let Some(call) = node.as_call() else {
            return RubyConstruct::NoMatch;
        };
        match call.method.as_str() {
            "newtype" if call.receiver_is("Puppet::Type") => RubyConstruct::ResourceType(call),
            "provide" | "newparam" | "newproperty" => match type_lookup(call) {
                Some(type_call) => match call.method.as_str() {
                    "provide" => RubyConstruct::Provider { type_call, call },
                    "newparam" => RubyConstruct::TypeExtension {
                        type_call,
                        call,
                        kind: AttributeKind::Parameter,
                    },
                    _ => RubyConstruct::TypeExtension {
                        type_call,
                        call,
                        kind: AttributeKind::Property,
                    },
                },
                None => RubyConstruct::NoMatch,
            },
            "create_function" if call.receiver_is("Puppet::Functions") => {
                RubyConstruct::Function4x(call)
            }
            "newfunction"
                if call.receiver.is_none() || call.receiver_is("Puppet::Parser::Functions") =>
            {
                RubyConstruct::Function3x(call)
            }
            "create_type" if call.receiver_is("Puppet::DataTypes") => RubyConstruct::DataType(call),
            "register_type" if call.receiver_is("Puppet::ResourceApi") => {
                RubyConstruct::ResourceApiType(call)
            }
            _ => RubyConstruct::NoMatch,
        }
    }
}

/// The `Puppet::Type.type(<name>)` receiver of a call
fn type_lookup(call: &Call) -> Option<&Call> {
    let type_call = call.receiver.as_deref()?.as_call()?;
    (type_call.method == "type" && type_call.receiver_is("Puppet::Type") && !type_call.args.is_empty())
        .then_some(type_call)
}

/// Walk the namespace-level statements of a Ruby file
pub fn process(ctx: &mut HandlerContext<'_>, root: &Node) {
    for statement in root.statements() {
        visit(ctx, statement);
    }
}

fn visit(ctx: &mut HandlerContext<'_>, node: &Node) {
    let construct = RubyConstruct::classify(node);
    if let RubyConstruct::NoMatch = construct {
        descend(ctx, node);
        return;
    }
    if let Err(err) = handle(ctx, node, construct) {
        ctx.diagnostics.report(&err);
    }
}

/// Enter module and class bodies and conditional blocks; method bodies and
/// blocks are not namespace level
fn descend(ctx: &mut HandlerContext<'_>, node: &Node) {
    match &node.kind {
        NodeKind::Statements(statements) => {
            for statement in statements {
                visit(ctx, statement);
            }
        }
        NodeKind::Namespace { body, .. } => process(ctx, body),
        NodeKind::Control { keyword, children }
            if matches!(keyword.as_str(), "if" | "unless" | "case" | "begin") =>
        {
            for child in children {
                process(ctx, child);
            }
        }
        _ => {}
    }
}

fn handle(ctx: &mut HandlerContext<'_>, node: &Node, construct: RubyConstruct<'_>) -> EtchResult<()> {
    tracing::debug!(
        file = %ctx.file(),
        line = node.line,
        construct = construct.name(),
        "matched ruby construct"
    );
    match construct {
        RubyConstruct::ResourceType(call) => resource_type::handle_newtype(ctx, node, call),
        RubyConstruct::TypeExtension {
            type_call,
            call,
            kind,
        } => resource_type::handle_extension(ctx, node, type_call, call, kind),
        RubyConstruct::Provider { type_call, call } => {
            provider::handle_provider(ctx, node, type_call, call)
        }
        RubyConstruct::Function4x(call) => function::handle_create_function(ctx, node, call),
        RubyConstruct::Function3x(call) => function::handle_newfunction(ctx, node, call),
        RubyConstruct::DataType(call) => data_type::handle_create_type(ctx, node, call),
        RubyConstruct::ResourceApiType(call) => {
            resource_api::handle_register_type(ctx, node, call)
        }
        RubyConstruct::NoMatch => Ok(()),
    }
}

impl RubyConstruct<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            RubyConstruct::ResourceType(_) => "resource type",
            RubyConstruct::TypeExtension { .. } => "resource type extension",
            RubyConstruct::Provider { .. } => "provider",
            RubyConstruct::Function4x(_) => "function (4.x API)",
            RubyConstruct::Function3x(_) => "function (3.x API)",
            RubyConstruct::DataType(_) => "data type",
            RubyConstruct::ResourceApiType(_) => "resource type (Resource API)",
            RubyConstruct::NoMatch => "none",
        }
    }
}

/// Literal first positional argument of `call`, naming the declared object
fn required_name(ctx: &HandlerContext<'_>, node: &Node, call: &Call) -> EtchResult<String> {
    let Some(first) = call.positional_args().first() else {
        return Err(ctx.undocumentable(
            node.line,
            format!("Expected at least one parameter to '{}'", call.method),
        ));
    };
    node_as_string(first).ok_or_else(|| {
        ctx.undocumentable(
            node.line,
            format!(
                "Expected a symbol or string literal for first parameter but found '{}'",
                ctx.tree.text(first.span)
            ),
        )
    })
}

/// Literal name in `Puppet::Type.type(<name>)`
fn resource_type_name(
    ctx: &HandlerContext<'_>,
    node: &Node,
    type_call: &Call,
    what: &str,
) -> EtchResult<String> {
    type_call
        .args
        .first()
        .and_then(node_as_string)
        .ok_or_else(|| {
            ctx.undocumentable(
                node.line,
                format!("Could not determine the resource type name for the {} defined", what),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use puppet_etch_syntax::{SyntaxRoot, SyntaxTree};

    fn classify_name(source: &str) -> &'static str {
        let tree = SyntaxTree::parse_ruby("t.rb", source).unwrap();
        let SyntaxRoot::Ruby(root) = tree.root() else {
            panic!("expected ruby");
        };
        RubyConstruct::classify(&root.statements()[0]).name()
    }

    #[test]
    fn test_classify_declarations() {
        assert_eq!(classify_name("Puppet::Type.newtype(:db) do\nend\n"), "resource type");
        assert_eq!(
            classify_name("Puppet::Type.type(:db).provide(:mysql) do\nend\n"),
            "provider"
        );
        assert_eq!(
            classify_name("Puppet::Type.type(:db).newproperty(:file) do\nend\n"),
            "resource type extension"
        );
        assert_eq!(
            classify_name("Puppet::Functions.create_function(:'m::f') do\nend\n"),
            "function (4.x API)"
        );
        assert_eq!(classify_name("newfunction(:f) do |args|\nend\n"), "function (3.x API)");
        assert_eq!(
            classify_name("Puppet::Parser::Functions.newfunction(:f) do |args|\nend\n"),
            "function (3.x API)"
        );
        assert_eq!(
            classify_name("Puppet::DataTypes.create_type('Foo') do\nend\n"),
            "data type"
        );
        assert_eq!(
            classify_name("Puppet::ResourceApi.register_type(name: 'x')\n"),
            "resource type (Resource API)"
        );
        assert_eq!(
            classify_name("::Puppet::Type.newtype(:db) do\nend\n"),
            "resource type"
        );
    }

    #[test]
    fn test_classify_declines_other_shapes() {
        assert_eq!(classify_name("Foo.newtype(:db)\n"), "none");
        assert_eq!(classify_name("Puppet::Type.type.provide(:x)\n"), "none");
        assert_eq!(classify_name("Puppet::Type.other(:db).provide(:x)\n"), "none");
        assert_eq!(classify_name("provide(:x)\n"), "none");
        assert_eq!(classify_name("x = 1\n"), "none");
    }
}
