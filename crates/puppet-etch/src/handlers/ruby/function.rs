//! Ruby functions: `Puppet::Functions.create_function` (4.x API) and
//! `newfunction` (3.x API)

use super::required_name;
use crate::diagnostics::EtchResult;
use crate::function::{Function, FunctionKind, Signature, SignatureParam};
use crate::handlers::docstring::DocSearch;
use crate::handlers::HandlerContext;
use crate::resolve::literal_or_source;
use crate::visibility::mark_public_unless_tagged;
use puppet_etch_syntax::ruby::{Block, Call, Node, NodeKind, ParamKind};
use puppet_etch_syntax::SyntaxTree;

const ANY: &str = "Any";

pub(super) fn handle_create_function(
    ctx: &mut HandlerContext<'_>,
    node: &Node,
    call: &Call,
) -> EtchResult<()> {
    let name = required_name(ctx, node, call)?;
    let subject = format!("Puppet function '{}'", name);

    let mut function = Function::new(&name, FunctionKind::Ruby4x, ctx.location(node.line));
    function.docstring = ctx.comment_docstring(node.line, &subject);

    if let Some(block) = &call.block {
        function.signatures = dispatch_signatures(ctx.tree, block);
        if function.signatures.is_empty() {
            let method = name.rsplit("::").next().unwrap_or(&name);
            function.signatures.extend(def_signature(block, method));
        }
    }

    mark_public_unless_tagged(&mut function.docstring);
    ctx.register(function);
    Ok(())
}

pub(super) fn handle_newfunction(
    ctx: &mut HandlerContext<'_>,
    node: &Node,
    call: &Call,
) -> EtchResult<()> {
    let name = required_name(ctx, node, call)?;
    let subject = format!("Puppet function '{}'", name);

    let mut function = Function::new(&name, FunctionKind::Ruby3x, ctx.location(node.line));
    let search = call.option("doc").map_or(DocSearch::NotFound, DocSearch::of_value);
    function.docstring = ctx.docstring(search, &subject, node.line);

    let rvalue = call
        .option("type")
        .and_then(Node::symbol_name)
        .is_some_and(|t| t == "rvalue");
    function.signatures.push(Signature {
        params: vec![SignatureParam::new("args", ANY).as_repeated()],
        return_type: Some(if rvalue { ANY } else { "Undef" }.to_string()),
    });

    mark_public_unless_tagged(&mut function.docstring);
    ctx.register(function);
    Ok(())
}

/// One signature per `dispatch` block
fn dispatch_signatures(tree: &SyntaxTree, block: &Block) -> Vec<Signature> {
    block
        .body
        .statements()
        .iter()
        .filter_map(Node::as_call)
        .filter(|c| c.receiver.is_none() && c.method == "dispatch")
        .filter_map(|c| c.block.as_ref())
        .map(|dispatch| {
            let mut signature = Signature::default();
            for statement in dispatch.body.statements() {
                let Some(call) = statement.as_call() else {
                    continue;
                };
                let args = call.positional_args();
                let typed = |optional: bool, repeated: bool| {
                    let (type_expr, name) = match args {
                        [type_expr, name, ..] => (literal_or_source(tree, type_expr), literal_or_source(tree, name)),
                        [name] => (ANY.to_string(), literal_or_source(tree, name)),
                        [] => return None,
                    };
                    let mut param = SignatureParam::new(name, type_expr);
                    param.optional = optional;
                    param.repeated = repeated;
                    Some(param)
                };
                let param = match call.method.as_str() {
                    "param" | "required_param" => typed(false, false),
                    "optional_param" => typed(true, false),
                    "repeated_param" | "optional_repeated_param" => typed(true, true),
                    "required_repeated_param" => typed(false, true),
                    "block_param" | "optional_block_param" => {
                        let (type_expr, name) = match args {
                            [type_expr, name, ..] => {
                                (literal_or_source(tree, type_expr), literal_or_source(tree, name))
                            }
                            [name] => ("Callable".to_string(), literal_or_source(tree, name)),
                            [] => ("Callable".to_string(), "block".to_string()),
                        };
                        let mut param = SignatureParam::new(format!("&{}", name), type_expr);
                        param.optional = call.method == "optional_block_param";
                        Some(param)
                    }
                    "return_type" => {
                        signature.return_type = args.first().map(|t| literal_or_source(tree, t));
                        None
                    }
                    _ => None,
                };
                signature.params.extend(param);
            }
            signature.return_type.get_or_insert_with(|| ANY.to_string());
            signature
        })
        .collect()
}

/// Signature of the method implementing a function without dispatches
fn def_signature(block: &Block, method: &str) -> Option<Signature> {
    let params = block.body.statements().iter().find_map(|s| match &s.kind {
        NodeKind::Def { name, params, .. } if name == method => Some(params),
        _ => None,
    })?;
    let params = params
        .iter()
        .filter_map(|p| match p.kind {
            ParamKind::Required | ParamKind::Keyword => Some(SignatureParam::new(&p.name, ANY)),
            ParamKind::Optional => Some(SignatureParam::new(&p.name, ANY).as_optional()),
            ParamKind::Rest => Some(SignatureParam::new(&p.name, ANY).as_repeated()),
            ParamKind::KeywordRest | ParamKind::Block => None,
        })
        .collect();
    Some(Signature {
        params,
        return_type: Some(ANY.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use crate::diagnostics::DiagnosticCode;
    use crate::function::FunctionKind;
    use crate::test::extract_ruby;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_function_with_dispatches() {
        let extraction = extract_ruby(
            r#"# Adds two integers or concatenates strings.
# @param a The first operand.
# @return [Integer] The sum.
Puppet::Functions.create_function(:'mymod::add') do
  dispatch :add_ints do
    param 'Integer', :a
    optional_param 'Integer', :b
    return_type 'Integer'
  end

  dispatch :add_strings do
    param 'String', :a
    repeated_param 'String', :rest
  end

  def add_ints(a, b = 0)
    a + b
  end
end
"#,
        );
        let function = extraction.registry.function("mymod::add").unwrap();
        assert_eq!(function.function_kind, FunctionKind::Ruby4x);
        assert_eq!(function.docstring.text(), "Adds two integers or concatenates strings.");
        assert_eq!(function.docstring.params().count(), 1);
        assert_eq!(function.signatures.len(), 2);
        assert_eq!(
            function.signatures[0].display(&function.name),
            "mymod::add(Integer $a, Integer $b = undef) >> Integer"
        );
        assert_eq!(
            function.signatures[1].display(&function.name),
            "mymod::add(String $a, String *$rest) >> Any"
        );
    }

    #[test]
    fn test_create_function_from_def() {
        let extraction = extract_ruby(
            "# Says hello.\nPuppet::Functions.create_function(:'mymod::hello') do\n  def hello(name, greeting = 'hi', *rest, &block)\n  end\nend\n",
        );
        let function = extraction.registry.function("mymod::hello").unwrap();
        assert_eq!(
            function.signatures[0].display(&function.name),
            "mymod::hello(Any $name, Any $greeting = undef, Any *$rest) >> Any"
        );
    }

    #[test]
    fn test_create_function_without_comment_warns() {
        let extraction = extract_ruby("Puppet::Functions.create_function(:bare) do\nend\n");
        assert!(extraction.registry.function("bare").is_some());
        assert_eq!(
            extraction
                .diagnostics
                .with_code(DiagnosticCode::MissingDocstring)
                .count(),
            1
        );
    }

    #[test]
    fn test_newfunction() {
        let extraction = extract_ruby(
            r#"module Puppet::Parser::Functions
  newfunction(:legacy, :type => :rvalue, :doc => <<-EOS
    Returns something.
    EOS
  ) do |args|
    args[0]
  end
end
"#,
        );
        let function = extraction.registry.function("legacy").unwrap();
        assert_eq!(function.function_kind, FunctionKind::Ruby3x);
        assert_eq!(function.docstring.text(), "Returns something.");
        assert_eq!(
            function.signatures[0].display(&function.name),
            "legacy(Any *$args) >> Any"
        );
    }

    #[test]
    fn test_statement_function_returns_undef() {
        let extraction =
            extract_ruby("newfunction(:notify_me, :doc => 'Logs.') do |args|\nend\n");
        let function = extraction.registry.function("notify_me").unwrap();
        assert_eq!(function.signatures[0].return_type.as_deref(), Some("Undef"));
    }
}
