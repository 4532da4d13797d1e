//! `Puppet::ResourceApi.register_type`
//!
//! Resource API types are declared with a single call whose options carry
//! everything: the name, the docs and a hash of attribute definitions.
//!
//! ```ruby
//! Puppet::ResourceApi.register_type(
//!   name: 'apt_key',
//!   docs: 'Manages apt keys.',
//!   attributes: {
//!     ensure: { type: 'Enum[present, absent]', desc: '...', default: 'present' },
//!     id:     { type: 'String', behaviour: :namevar, desc: '...' },
//!   },
//!   features: ['canonicalize'],
//! )
//! ```

use crate::diagnostics::{DiagnosticCode, EtchResult};
use crate::handlers::docstring::DocSearch;
use crate::handlers::HandlerContext;
use crate::params::{Attribute, AttributeKind};
use crate::resolve::{hash_value, literal_list, literal_or_source, node_as_string};
use crate::resource_type::{Feature, ResourceType};
use crate::visibility::mark_public_unless_tagged;
use puppet_etch_syntax::ruby::{Call, Node, NodeKind};

pub(super) fn handle_register_type(
    ctx: &mut HandlerContext<'_>,
    node: &Node,
    call: &Call,
) -> EtchResult<()> {
    let Some(name_node) = call.option("name") else {
        return Err(ctx.undocumentable(
            node.line,
            "Expected a 'name' option to 'register_type'",
        ));
    };
    let name = node_as_string(name_node).ok_or_else(|| {
        ctx.undocumentable(
            node.line,
            format!(
                "Expected a symbol or string literal for the 'name' option but found '{}'",
                ctx.tree.text(name_node.span)
            ),
        )
    })?;
    let subject = format!("Puppet resource type '{}'", name);

    let mut ty = ResourceType::new(&name, ctx.location(node.line));
    let search = call.option("docs").map_or(DocSearch::NotFound, DocSearch::of_value);
    ty.docstring = ctx.docstring(search, &subject, node.line);

    match call.option("attributes").map(|a| &a.kind) {
        Some(NodeKind::Hash(entries)) => {
            for entry in entries {
                let NodeKind::Pair { key, value } = &entry.kind else {
                    let message = format!("Skipping malformed attribute '{}'.", ctx.tree.text(entry.span));
                    ctx.warn(DiagnosticCode::MalformedMetadata, entry.line, message);
                    continue;
                };
                let (kind, attribute) = read_attribute(ctx, key, value, &name);
                ty.add_attribute(kind, attribute);
            }
        }
        Some(_) => ctx.warn(
            DiagnosticCode::MalformedMetadata,
            node.line,
            format!("Expected a hash of attributes for Puppet resource type '{}'.", name),
        ),
        None => {}
    }

    if let Some(features) = call.option("features") {
        for feature in literal_list(ctx.tree, features) {
            ty.add_feature(Feature::new(feature, ""));
        }
    }

    mark_public_unless_tagged(&mut ty.docstring);
    ctx.register(ty);
    Ok(())
}

fn read_attribute(
    ctx: &mut HandlerContext<'_>,
    key: &Node,
    definition: &Node,
    type_name: &str,
) -> (AttributeKind, Attribute) {
    let name = literal_or_source(ctx.tree, key);
    let mut attribute = Attribute::named(&name);

    let behaviour = hash_value(definition, "behaviour")
        .or_else(|| hash_value(definition, "behavior"))
        .and_then(Node::symbol_name);
    let kind = match behaviour {
        Some("namevar") => {
            attribute.isnamevar = true;
            AttributeKind::Parameter
        }
        Some("parameter") | Some("init_only") => AttributeKind::Parameter,
        _ => AttributeKind::Property,
    };

    if let Some(data_type) = hash_value(definition, "type").map(|t| literal_or_source(ctx.tree, t)) {
        for value in enum_values(&data_type) {
            attribute.add_value(value);
        }
        attribute.data_type = Some(data_type);
    }

    let subject = format!("attribute '{}' of Puppet resource type '{}'", name, type_name);
    let search = hash_value(definition, "desc").map_or(DocSearch::NotFound, DocSearch::of_value);
    attribute.docstring = ctx.docstring_text(search, &subject, key.line);

    attribute.default = hash_value(definition, "default").map(|d| literal_or_source(ctx.tree, d));
    (kind, attribute)
}

/// Values of an `Enum[...]` type, optionally wrapped in `Optional[...]`
fn enum_values(data_type: &str) -> Vec<String> {
    let inner = data_type
        .strip_prefix("Optional[")
        .and_then(|t| t.strip_suffix(']'))
        .unwrap_or(data_type)
        .trim();
    let Some(values) = inner.strip_prefix("Enum[").and_then(|t| t.strip_suffix(']')) else {
        return Vec::new();
    };
    values
        .split(',')
        .map(|v| v.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
