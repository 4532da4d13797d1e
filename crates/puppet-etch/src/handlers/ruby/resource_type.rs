//! `Puppet::Type.newtype` and type extensions

use super::{required_name, resource_type_name};
use crate::diagnostics::{DiagnosticCode, EtchResult};
use crate::handlers::docstring::{find_docstring, find_docstring_pruned, DocSearch};
use crate::handlers::HandlerContext;
use crate::params::{Attribute, AttributeKind};
use crate::registry::TypeExtension;
use crate::resolve::{literal_list, literal_or_source};
use crate::resource_type::{Feature, ResourceType};
use crate::visibility::mark_public_unless_tagged;
use puppet_etch_syntax::ruby::{Call, Node, NodeKind};

const ENSURE_DOC: &str = "The basic property that the resource should be in.";

/// A statement in the body of a resource type
#[derive(Debug, Clone, Copy)]
pub enum AttributeCall<'a> {
    Declare(AttributeKind, &'a Call),
    /// `ensurable`, with its block when it has one
    Ensurable(Option<&'a Call>),
    Feature(&'a Call),
    Other,
}

impl<'a> AttributeCall<'a> {
    pub fn classify(node: &'a Node) -> Self {
        if bare_word(node) == Some("ensurable") {
            return AttributeCall::Ensurable(None);
        }
        let Some(call) = node.as_call().filter(|c| c.receiver.is_none()) else {
            return AttributeCall::Other;
        };
        match call.method.as_str() {
            "newparam" => AttributeCall::Declare(AttributeKind::Parameter, call),
            "newproperty" => AttributeCall::Declare(AttributeKind::Property, call),
            "ensurable" => AttributeCall::Ensurable(Some(call)),
            "feature" => AttributeCall::Feature(call),
            _ => AttributeCall::Other,
        }
    }
}

/// A method called without receiver, arguments or block
fn bare_word(node: &Node) -> Option<&str> {
    match &node.kind {
        NodeKind::Ident(name) => Some(name),
        _ => None,
    }
}

/// Calls whose blocks document something other than the type itself
fn is_nested_declaration(node: &Node) -> bool {
    node.as_call().is_some_and(|call| {
        call.receiver.is_none()
            && matches!(
                call.method.as_str(),
                "newparam" | "newproperty" | "newcheck" | "newmetaparam" | "ensurable"
            )
    })
}

pub(super) fn handle_newtype(ctx: &mut HandlerContext<'_>, node: &Node, call: &Call) -> EtchResult<()> {
    let name = required_name(ctx, node, call)?;
    let subject = format!("Puppet resource type '{}'", name);

    let mut ty = ResourceType::new(&name, ctx.location(node.line));
    let search = match &call.block {
        Some(block) => find_docstring_pruned(&block.body, is_nested_declaration),
        None => DocSearch::NotFound,
    };
    ty.docstring = ctx.docstring(search, &subject, node.line);

    if let Some(block) = &call.block {
        let mut ensurable = None;
        for statement in block.body.statements() {
            match AttributeCall::classify(statement) {
                AttributeCall::Declare(kind, attr_call) => {
                    match read_attribute(ctx, statement, attr_call, kind, &name) {
                        Ok(attribute) => ty.add_attribute(kind, attribute),
                        Err(err) => ctx.diagnostics.report(&err),
                    }
                }
                AttributeCall::Ensurable(attr_call) => {
                    let ensure = read_ensurable(ctx, attr_call, &name);
                    ensurable = Some((ty.properties.len(), ensure));
                }
                AttributeCall::Feature(feature_call) => {
                    match read_feature(ctx, statement, feature_call) {
                        Ok(feature) => ty.add_feature(feature),
                        Err(err) => ctx.diagnostics.report(&err),
                    }
                }
                AttributeCall::Other => {}
            }
        }
        if let Some((index, ensure)) = ensurable {
            if ty.property("ensure").is_none() {
                let index = index.min(ty.properties.len());
                ty.properties.insert(index, ensure);
            }
        }
    }

    mark_public_unless_tagged(&mut ty.docstring);
    ctx.register(ty);
    Ok(())
}

/// `Puppet::Type.type(:t).newparam(...)` outside the type's declaration
pub(super) fn handle_extension(
    ctx: &mut HandlerContext<'_>,
    node: &Node,
    type_call: &Call,
    call: &Call,
    kind: AttributeKind,
) -> EtchResult<()> {
    let what = match kind {
        AttributeKind::Parameter => "parameter",
        AttributeKind::Property => "property",
    };
    let type_name = resource_type_name(ctx, node, type_call, what)?;
    let attribute = read_attribute(ctx, node, call, kind, &type_name)?;
    tracing::debug!(
        type_name = %type_name,
        attribute = %attribute.name,
        "recorded resource type extension"
    );
    let location = ctx.location(node.line);
    ctx.registry.add_extension(TypeExtension {
        type_name,
        kind,
        attribute,
        location,
    });
    Ok(())
}

fn attribute_subject(kind: AttributeKind, name: &str, type_name: &str) -> String {
    let what = match kind {
        AttributeKind::Parameter => "parameter",
        AttributeKind::Property => "property",
    };
    format!("Puppet resource {} '{}' of type '{}'", what, name, type_name)
}

fn read_attribute(
    ctx: &mut HandlerContext<'_>,
    node: &Node,
    call: &Call,
    kind: AttributeKind,
    type_name: &str,
) -> EtchResult<Attribute> {
    let name = required_name(ctx, node, call)?;
    let mut attribute = Attribute::named(&name);

    if call.option("namevar").is_some_and(|v| matches!(v.kind, NodeKind::True)) {
        attribute.isnamevar = true;
    }
    if let Some(features) = call.option("required_features") {
        attribute.required_features = Some(literal_list(ctx.tree, features).join(", "));
    }
    let boolean = call.option("boolean").is_some_and(|v| matches!(v.kind, NodeKind::True))
        || call
            .option("parent")
            .and_then(Node::const_path)
            .is_some_and(|p| p == "Puppet::Parameter::Boolean");
    if boolean {
        attribute.add_value("true");
        attribute.add_value("false");
    }

    let subject = attribute_subject(kind, &name, type_name);
    let search = match &call.block {
        Some(block) => find_docstring(&block.body),
        None => DocSearch::NotFound,
    };
    attribute.docstring = ctx.docstring_text(search, &subject, node.line);

    if let Some(block) = &call.block {
        read_attribute_body(ctx, &mut attribute, &block.body);
    }
    Ok(attribute)
}

/// Values, aliases, defaults and the namevar flag declared in an attribute block
fn read_attribute_body(ctx: &mut HandlerContext<'_>, attribute: &mut Attribute, body: &Node) {
    for statement in body.statements() {
        if bare_word(statement) == Some("isnamevar") {
            attribute.isnamevar = true;
            continue;
        }
        let Some(call) = statement.as_call().filter(|c| c.receiver.is_none()) else {
            continue;
        };
        match call.method.as_str() {
            "newvalues" => {
                for arg in call.positional_args() {
                    for value in literal_list(ctx.tree, arg) {
                        attribute.add_value(value);
                    }
                }
            }
            "newvalue" => {
                if let Some(value) = call.positional_args().first() {
                    attribute.add_value(literal_or_source(ctx.tree, value));
                }
            }
            "aliasvalue" => match call.positional_args() {
                [alias, target] => attribute.add_alias(
                    literal_or_source(ctx.tree, alias),
                    literal_or_source(ctx.tree, target),
                ),
                _ => ctx.warn(
                    DiagnosticCode::MalformedMetadata,
                    statement.line,
                    format!(
                        "Expected two parameters to 'aliasvalue' for attribute '{}'.",
                        attribute.name
                    ),
                ),
            },
            "defaultto" => {
                let default = match (call.args.first(), &call.block) {
                    (Some(value), _) => Some(literal_or_source(ctx.tree, value)),
                    (None, Some(block)) => Some(ctx.tree.text(block.body.span).trim().to_string()),
                    (None, None) => None,
                };
                attribute.default = default.filter(|d| !d.is_empty());
            }
            "isnamevar" => attribute.isnamevar = true,
            _ => {}
        }
    }
}

/// The `ensure` property added by `ensurable`
fn read_ensurable(ctx: &mut HandlerContext<'_>, call: Option<&Call>, type_name: &str) -> Attribute {
    let mut ensure = Attribute::named("ensure");
    let Some(block) = call.and_then(|c| c.block.as_ref()) else {
        return default_ensure(ensure);
    };

    ensure.docstring = match find_docstring(&block.body) {
        DocSearch::NotFound => ENSURE_DOC.to_string(),
        search => {
            let subject = attribute_subject(AttributeKind::Property, "ensure", type_name);
            ctx.docstring_text(search, &subject, block.line)
        }
    };
    read_attribute_body(ctx, &mut ensure, &block.body);

    let defaultvalues = block.body.statements().iter().any(|s| {
        bare_word(s) == Some("defaultvalues")
            || s.as_call()
                .is_some_and(|c| c.receiver.is_none() && c.method == "defaultvalues")
    });
    if defaultvalues || ensure.values.is_empty() {
        ensure.add_value("present");
        ensure.add_value("absent");
        if ensure.default.is_none() {
            ensure.default = Some("present".to_string());
        }
    }
    ensure
}

fn default_ensure(ensure: Attribute) -> Attribute {
    let mut ensure = ensure.with_docstring(ENSURE_DOC).with_default("present");
    ensure.add_value("present");
    ensure.add_value("absent");
    ensure
}

/// `feature :name, "doc", :methods => [...]`
fn read_feature(ctx: &mut HandlerContext<'_>, node: &Node, call: &Call) -> EtchResult<Feature> {
    let name = required_name(ctx, node, call)?;
    let docstring = match call.positional_args().get(1) {
        Some(doc) => {
            let subject = format!("feature '{}'", name);
            ctx.docstring_text(DocSearch::of_value(doc), &subject, node.line)
        }
        None => String::new(),
    };
    let mut feature = Feature::new(name, docstring);
    if let Some(methods) = call.option("methods") {
        feature.methods = literal_list(ctx.tree, methods);
    }
    Ok(feature)
}

#[cfg(test)]
mod tests {
    use crate::diagnostics::DiagnosticCode;
    use crate::test::extract_ruby;
    use pretty_assertions::assert_eq;

    const DATABASE: &str = r#"
Puppet::Type.newtype(:database) do
  desc <<-EOS
    An example database server type.

    @example Declaring a database
      database { 'db': file => '/tmp/db' }
  EOS

  feature :encryption, 'The provider can encrypt.', :methods => [:encrypt]

  ensurable

  newparam(:address) do
    isnamevar
    desc 'The database server name.'
  end

  newproperty(:file) do
    desc 'The database file to use.'
    newvalues(/\/.+/)
  end

  newproperty(:log_level, :required_features => :encryption) do
    desc 'The log level to use.'
    newvalue(:debug)
    newvalue(:warn)
    aliasvalue(:warning, :warn)
    defaultto :warn
  end

  newparam(:backup, :boolean => true) do
    desc 'Whether to back up.'
  end
end
"#;

    #[test]
    fn test_newtype_attributes() {
        let extraction = extract_ruby(DATABASE);
        let ty = extraction.registry.resource_type("database").unwrap();

        assert_eq!(ty.docstring.text(), "An example database server type.");
        assert_eq!(ty.docstring.examples().count(), 1);
        assert_eq!(ty.docstring.api(), Some("public"));

        let names: Vec<&str> = ty.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["ensure", "file", "log_level"]);
        let names: Vec<&str> = ty.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["address", "backup"]);

        let address = ty.parameter("address").unwrap();
        assert!(address.isnamevar);
        assert_eq!(address.docstring, "The database server name.");

        let log_level = ty.property("log_level").unwrap();
        assert_eq!(log_level.values, vec!["debug", "warn"]);
        assert_eq!(log_level.aliases.get("warning").map(String::as_str), Some("warn"));
        assert_eq!(log_level.default.as_deref(), Some("warn"));
        assert_eq!(log_level.required_features.as_deref(), Some("encryption"));

        assert_eq!(ty.parameter("backup").unwrap().values, vec!["true", "false"]);
        assert_eq!(ty.property("file").unwrap().values, vec!["/\\/.+/"]);

        assert_eq!(ty.features.len(), 1);
        assert_eq!(ty.features[0].docstring, "The provider can encrypt.");
        assert_eq!(ty.features[0].methods, vec!["encrypt"]);
    }

    #[test]
    fn test_ensurable_defaults() {
        let extraction = extract_ruby(DATABASE);
        let ensure = extraction
            .registry
            .resource_type("database")
            .unwrap()
            .property("ensure")
            .unwrap()
            .clone();
        assert_eq!(ensure.values, vec!["present", "absent"]);
        assert_eq!(ensure.default.as_deref(), Some("present"));
        assert_eq!(ensure.docstring, "The basic property that the resource should be in.");
    }

    #[test]
    fn test_explicit_ensure_property_wins() {
        let extraction = extract_ruby(
            "Puppet::Type.newtype(:svc) do\n  desc 'A service.'\n  ensurable\n  newproperty(:ensure) do\n    desc 'Whether running.'\n    newvalue(:running)\n  end\nend\n",
        );
        let ty = extraction.registry.resource_type("svc").unwrap();
        assert_eq!(ty.properties.len(), 1);
        assert_eq!(ty.properties[0].docstring, "Whether running.");
        assert_eq!(ty.properties[0].values, vec!["running"]);
    }

    #[test]
    fn test_namevar_defaults_to_name_parameter() {
        let extraction = extract_ruby(
            "Puppet::Type.newtype(:database) do\n  desc 'A db.'\n  newparam(:name) do\n    desc 'The name.'\n  end\nend\n",
        );
        let ty = extraction.registry.resource_type("database").unwrap();
        assert!(ty.parameter("name").unwrap().isnamevar);
    }

    #[test]
    fn test_type_extension_applies_to_declared_type() {
        let extraction = extract_ruby(
            "Puppet::Type.newtype(:database) do\n  desc 'An example database server resource type.'\nend\n\nPuppet::Type.type(:database).newproperty(:file) do\n  desc 'The database file to use.'\nend\n",
        );
        let types: Vec<_> = extraction.registry.resource_types().collect();
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].properties.len(), 1);
        assert_eq!(types[0].properties[0].name, "file");
        assert_eq!(types[0].properties[0].docstring, "The database file to use.");
    }

    #[test]
    fn test_type_extension_without_declaration_warns() {
        let extraction =
            extract_ruby("Puppet::Type.type(:ghost).newparam(:name) do\n  desc 'A name.'\nend\n");
        let ty = extraction.registry.resource_type("ghost").unwrap();
        assert!(ty.parameter("name").unwrap().isnamevar);
        assert_eq!(
            extraction
                .diagnostics
                .with_code(DiagnosticCode::UndeclaredType)
                .count(),
            1
        );
    }

    #[test]
    fn test_unnamed_attribute_is_skipped() {
        let extraction = extract_ruby(
            "Puppet::Type.newtype(:db) do\n  desc 'A db.'\n  newparam(name_var) do\n  end\n  newparam(:port) do\n    desc 'Port.'\n  end\nend\n",
        );
        let ty = extraction.registry.resource_type("db").unwrap();
        assert_eq!(ty.parameters.len(), 1);
        assert_eq!(
            extraction
                .diagnostics
                .with_code(DiagnosticCode::Undocumentable)
                .count(),
            1
        );
    }
}
