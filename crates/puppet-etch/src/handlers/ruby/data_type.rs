//! `Puppet::DataTypes.create_type`

use super::required_name;
use crate::data_type::DataType;
use crate::diagnostics::EtchResult;
use crate::handlers::HandlerContext;
use crate::resolve::literal_or_source;
use crate::visibility::mark_public_unless_tagged;
use puppet_etch_syntax::ruby::{Call, Node};

pub(super) fn handle_create_type(
    ctx: &mut HandlerContext<'_>,
    node: &Node,
    call: &Call,
) -> EtchResult<()> {
    let name = required_name(ctx, node, call)?;
    let subject = format!("Puppet data type '{}'", name);

    let mut data_type = DataType::new(&name, ctx.location(node.line));
    data_type.docstring = ctx.comment_docstring(node.line, &subject);

    if let Some(block) = &call.block {
        data_type.interface = block
            .body
            .statements()
            .iter()
            .filter_map(Node::as_call)
            .find(|c| c.receiver.is_none() && c.method == "interface")
            .and_then(|c| c.positional_args().first())
            .map(|arg| literal_or_source(ctx.tree, arg).trim().to_string());
    }

    mark_public_unless_tagged(&mut data_type.docstring);
    ctx.register(data_type);
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::test::extract_ruby;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_type() {
        let extraction = extract_ruby(
            r#"# An example data type.
# @api private
Puppet::DataTypes.create_type('Mymod::Point') do
  interface <<-PUPPET
    attributes => {
      x => Integer,
      y => Integer,
    }
    PUPPET
end
"#,
        );
        let point = extraction.registry.data_types().next().unwrap();
        assert_eq!(point.name, "Mymod::Point");
        assert_eq!(point.docstring.text(), "An example data type.");
        assert_eq!(point.docstring.api(), Some("private"));
        assert!(point.interface.as_deref().unwrap().starts_with("attributes => {"));
    }
}
