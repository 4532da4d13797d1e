//! `Puppet::Type.type(:t).provide(:p)`

use super::{metadata, required_name, resource_type_name};
use crate::diagnostics::EtchResult;
use crate::handlers::docstring::{find_docstring, DocSearch};
use crate::handlers::HandlerContext;
use crate::provider::Provider;
use crate::visibility::mark_public_unless_tagged;
use puppet_etch_syntax::ruby::{Call, Node};

pub(super) fn handle_provider(
    ctx: &mut HandlerContext<'_>,
    node: &Node,
    type_call: &Call,
    call: &Call,
) -> EtchResult<()> {
    let type_name = resource_type_name(ctx, node, type_call, "provider")?;
    let name = required_name(ctx, node, call)?;
    let subject = format!("Puppet provider '{}' (resource type '{}')", name, type_name);

    let mut provider = Provider::new(&type_name, &name, ctx.location(node.line));
    let search = match &call.block {
        Some(block) => find_docstring(&block.body),
        None => DocSearch::NotFound,
    };
    provider.docstring = ctx.docstring(search, &subject, node.line);

    if let Some(block) = &call.block {
        metadata::populate(ctx, &mut provider, &block.body);
    }

    mark_public_unless_tagged(&mut provider.docstring);
    ctx.register(provider);
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::diagnostics::DiagnosticCode;
    use crate::test::extract_ruby;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_provider_with_docstring() {
        let extraction = extract_ruby(
            "Puppet::Type.type(:database).provide :linux do\n  desc 'An example provider on Linux.'\nend\n",
        );
        let provider = extraction.registry.provider("database", "linux").unwrap();
        assert_eq!(provider.type_name, "database");
        assert_eq!(provider.docstring.text(), "An example provider on Linux.");
        assert_eq!(provider.docstring.api(), Some("public"));
        assert_eq!(provider.location.line, 1);
    }

    #[test]
    fn test_setter_and_operator_symbols_in_body() {
        let extraction = extract_ruby(
            "Puppet::Type.type(:database).provide(:linux) do\n  desc 'Linux.'\n  alias_method :size=, :resize=\n  ACCESSORS = [:foo=, :a?]\n  def store(x)\n    x.send(:[]=, 1)\n    [:<=>].include?(:-@)\n  end\nend\n",
        );
        assert!(extraction.diagnostics.with_code(DiagnosticCode::Syntax).next().is_none());
        let provider = extraction.registry.provider("database", "linux").unwrap();
        assert_eq!(provider.docstring.text(), "Linux.");
    }

    #[test]
    fn test_private_provider_keeps_its_tag() {
        let extraction = extract_ruby(
            "Puppet::Type.type(:database).provide :linux do\n  desc \"Internal.\n@api private\"\nend\n",
        );
        let provider = extraction.registry.provider("database", "linux").unwrap();
        assert_eq!(provider.docstring.api(), Some("private"));
    }

    #[test]
    fn test_provide_without_arguments_is_undocumentable() {
        let extraction = extract_ruby("Puppet::Type.type(:database).provide do\nend\n");
        assert_eq!(extraction.registry.providers().count(), 0);
        let messages: Vec<&str> = extraction
            .diagnostics
            .with_code(DiagnosticCode::Undocumentable)
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(
            messages,
            vec!["Expected at least one parameter to 'provide' at t.rb:1."]
        );
    }

    #[test]
    fn test_non_literal_type_name_is_undocumentable() {
        let extraction =
            extract_ruby("Puppet::Type.type(type_name).provide(:linux) do\n  desc 'x'\nend\n");
        assert_eq!(extraction.registry.providers().count(), 0);
        let diagnostic = extraction
            .diagnostics
            .with_code(DiagnosticCode::Undocumentable)
            .next()
            .unwrap();
        assert_eq!(
            diagnostic.message,
            "Could not determine the resource type name for the provider defined at t.rb:1."
        );
    }

    #[test]
    fn test_missing_docstring_warns_and_registers() {
        let extraction = extract_ruby("Puppet::Type.type(:database).provide(:linux) do\nend\n");
        assert!(extraction.registry.provider("database", "linux").is_some());
        let diagnostic = extraction
            .diagnostics
            .with_code(DiagnosticCode::MissingDocstring)
            .next()
            .unwrap();
        assert_eq!(
            diagnostic.message,
            "Missing a description for Puppet provider 'linux' (resource type 'database') at t.rb:1."
        );
    }

    #[test]
    fn test_interpolated_docstring_is_unresolvable() {
        let extraction = extract_ruby(
            "Puppet::Type.type(:database).provide(:linux) do\n  desc \"Runs #{cmd}.\"\nend\n",
        );
        let provider = extraction.registry.provider("database", "linux").unwrap();
        assert_eq!(provider.docstring.text(), "");
        let diagnostic = extraction
            .diagnostics
            .with_code(DiagnosticCode::UnresolvableDocstring)
            .next()
            .unwrap();
        assert_eq!(
            diagnostic.message,
            "Failed to parse docstring for Puppet provider 'linux' (resource type 'database') near t.rb:2."
        );
    }
}
