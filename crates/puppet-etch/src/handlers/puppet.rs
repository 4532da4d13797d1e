//! Puppet language declarations
//!
//! Every declaration of a manifest is documented from the comment block
//! directly above it. `@param` tags document the declared parameters.

use super::HandlerContext;
use crate::class::{DefinedType, Plan, PuppetClass};
use crate::data_type::DataTypeAlias;
use crate::diagnostics::DiagnosticCode;
use crate::docstring::Docstring;
use crate::function::{Function, FunctionKind, Signature, SignatureParam};
use crate::params::PuppetParam;
use crate::visibility::mark_public_unless_tagged;
use puppet_etch_syntax::puppet::{Definition, DefinitionKind, Manifest};

/// Register every definition of `manifest`, nested ones included
pub fn process(ctx: &mut HandlerContext<'_>, manifest: &Manifest) {
    for definition in manifest.all_definitions() {
        handle(ctx, definition);
    }
}

fn noun(kind: DefinitionKind) -> &'static str {
    match kind {
        DefinitionKind::Class => "class",
        DefinitionKind::DefinedType => "defined type",
        DefinitionKind::Function => "function",
        DefinitionKind::TypeAlias => "type alias",
        DefinitionKind::Plan => "plan",
    }
}

fn handle(ctx: &mut HandlerContext<'_>, definition: &Definition) {
    let subject = format!("Puppet {} '{}'", noun(definition.kind), definition.name);
    let mut docstring = ctx.comment_docstring(definition.line, &subject);
    mark_public_unless_tagged(&mut docstring);
    let location = ctx.location(definition.line);

    tracing::trace!(
        file = %ctx.file(),
        line = definition.line,
        keyword = definition.kind.keyword(),
        name = %definition.name,
        "documenting puppet definition"
    );

    match definition.kind {
        DefinitionKind::Class => {
            let mut class = PuppetClass::new(&definition.name, location);
            class.parameters = documented_params(ctx, definition, &docstring);
            class.parent = definition.parent.clone();
            class.docstring = docstring;
            ctx.register(class);
        }
        DefinitionKind::DefinedType => {
            let mut defined_type = DefinedType::new(&definition.name, location);
            defined_type.parameters = documented_params(ctx, definition, &docstring);
            defined_type.docstring = docstring;
            ctx.register(defined_type);
        }
        DefinitionKind::Plan => {
            let mut plan = Plan::new(&definition.name, location);
            plan.parameters = documented_params(ctx, definition, &docstring);
            plan.docstring = docstring;
            ctx.register(plan);
        }
        DefinitionKind::Function => {
            let mut function = Function::new(&definition.name, FunctionKind::Puppet, location);
            documented_params(ctx, definition, &docstring);
            function.signatures.push(signature(definition));
            function.docstring = docstring;
            ctx.register(function);
        }
        DefinitionKind::TypeAlias => {
            let aliased = definition.aliased_type.clone().unwrap_or_default();
            let mut alias = DataTypeAlias::new(&definition.name, aliased, location);
            alias.docstring = docstring;
            ctx.register(alias);
        }
    }
}

/// Parameters with the text of their `@param` tags; undocumented parameters
/// and tags naming no parameter are warned about
fn documented_params(
    ctx: &mut HandlerContext<'_>,
    definition: &Definition,
    docstring: &Docstring,
) -> Vec<PuppetParam> {
    let mut params = Vec::with_capacity(definition.params.len());
    for param in &definition.params {
        let doc = docstring.param(&param.name).map(|t| t.text().to_string());
        if doc.is_none() && ctx.config.warn_missing_param_docs {
            let message = format!(
                "Missing @param tag for parameter '{}' near {}:{}.",
                param.name,
                ctx.file(),
                param.line
            );
            ctx.warn(DiagnosticCode::MissingParamDoc, param.line, message);
        }
        params.push(PuppetParam {
            name: param.name.clone(),
            type_expr: param.type_expr.clone(),
            default: param.default.clone(),
            docstring: doc,
        });
    }

    for tag in docstring.params() {
        let Some(name) = tag.subject.as_deref() else {
            continue;
        };
        if !definition.params.iter().any(|p| p.name == name) {
            let message = format!(
                "The @param tag for parameter '{}' has no matching parameter at {}:{}.",
                name,
                ctx.file(),
                definition.line
            );
            ctx.warn(DiagnosticCode::UnknownParamDoc, definition.line, message);
        }
    }
    params
}

fn signature(definition: &Definition) -> Signature {
    let params = definition
        .params
        .iter()
        .map(|p| {
            let mut param =
                SignatureParam::new(&p.name, p.type_expr.as_deref().unwrap_or("Any"));
            param.optional = p.default.is_some();
            param.repeated = p.captures_rest;
            param
        })
        .collect();
    Signature {
        params,
        return_type: Some(definition.return_type.clone().unwrap_or_else(|| "Any".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use crate::diagnostics::DiagnosticCode;
    use crate::test::extract_puppet;
    use pretty_assertions::assert_eq;

    const INIT: &str = r#"# An example class.
#
# @param package_name The package to install.
# @param ensure Whether to install it.
# @param ghost Not a parameter.
class example (
  String $package_name = 'example',
  Enum['present', 'absent'] $ensure = 'present',
  $service_name,
) inherits example::params {
  # A nested define.
  define example::instance (String $port) {
  }
}
"#;

    #[test]
    fn test_class_parameters_and_parent() {
        let extraction = extract_puppet(INIT);
        let class = extraction.registry.class("example").unwrap();
        assert_eq!(class.docstring.text(), "An example class.");
        assert_eq!(class.docstring.api(), Some("public"));
        assert_eq!(class.parent.as_deref(), Some("example::params"));

        let names: Vec<&str> = class.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["package_name", "ensure", "service_name"]);
        assert_eq!(
            class.parameters[0].docstring.as_deref(),
            Some("The package to install.")
        );
        assert_eq!(class.parameters[1].type_expr.as_deref(), Some("Enum['present', 'absent']"));
        assert_eq!(class.parameters[1].default.as_deref(), Some("'present'"));
        assert!(class.parameters[2].docstring.is_none());
    }

    #[test]
    fn test_summary_tag_followed_by_description() {
        let extraction = extract_puppet(
            "# @summary Installs the db.\n#\n# A longer description.\nclass db {}\n",
        );
        let class = extraction.registry.class("db").unwrap();
        assert_eq!(class.docstring.text(), "A longer description.");
        assert_eq!(
            class.docstring.summary().as_deref(),
            Some("Installs the db.")
        );
    }

    #[test]
    fn test_parameter_documentation_warnings() {
        let extraction = extract_puppet(INIT);
        let missing: Vec<&str> = extraction
            .diagnostics
            .with_code(DiagnosticCode::MissingParamDoc)
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(
            missing,
            vec![
                "Missing @param tag for parameter 'service_name' near init.pp:9.",
                "Missing @param tag for parameter 'port' near init.pp:12.",
            ]
        );
        assert_eq!(
            extraction
                .diagnostics
                .with_code(DiagnosticCode::UnknownParamDoc)
                .count(),
            1
        );
    }

    #[test]
    fn test_nested_define_is_registered() {
        let extraction = extract_puppet(INIT);
        let define = extraction.registry.defined_types().next().unwrap();
        assert_eq!(define.name, "example::instance");
        assert_eq!(define.docstring.text(), "A nested define.");
    }

    #[test]
    fn test_function_and_type_alias() {
        let extraction = extract_puppet(
            "# Joins names.\n# @param names The names.\nfunction example::join(Array[String] $names, String *$rest) >> String {\n  $names.join(',')\n}\n\n# A TCP port.\ntype Example::Port = Integer[1, 65535]\n",
        );
        let function = extraction.registry.function("example::join").unwrap();
        assert_eq!(
            function.signatures[0].display(&function.name),
            "example::join(Array[String] $names, String *$rest) >> String"
        );

        let alias = extraction.registry.data_type_aliases().next().unwrap();
        assert_eq!(alias.name, "Example::Port");
        assert_eq!(alias.alias_of, "Integer[1, 65535]");
        assert_eq!(alias.docstring.text(), "A TCP port.");
    }

    #[test]
    fn test_plan() {
        let extraction = extract_puppet("# Deploys.\n# @param targets Where.\nplan example::deploy(TargetSpec $targets) {\n}\n");
        let plan = extraction.registry.plans().next().unwrap();
        assert_eq!(plan.name, "example::deploy");
        assert_eq!(plan.parameters[0].docstring.as_deref(), Some("Where."));
        assert!(!extraction.diagnostics.has_errors());
    }
}
