//! Provider metadata populators
//!
//! A provider's body declares where it applies and what it supports through
//! a handful of class-level calls. Only direct statements of the body are
//! read; calls inside methods or nested blocks are runtime behavior.
//!
//! ```ruby
//! confine :osfamily => :debian
//! defaultfor 'os.family' => :debian
//! has_features :versionable, :install_options
//! commands :aptget => '/usr/bin/apt-get'
//! ```

use crate::diagnostics::DiagnosticCode;
use crate::handlers::HandlerContext;
use crate::provider::Provider;
use crate::resolve::{literal_list, literal_or_source};
use puppet_etch_syntax::ruby::{Call, Node, NodeKind};

/// A metadata call in a provider body
#[derive(Debug, Clone, Copy)]
pub enum ProviderCall<'a> {
    Confine(&'a Call),
    Features(&'a Call),
    DefaultFor(&'a Call),
    Commands(&'a Call),
    Other,
}

impl<'a> ProviderCall<'a> {
    pub fn classify(node: &'a Node) -> Self {
        let Some(call) = node.as_call() else {
            return ProviderCall::Other;
        };
        let receiverless = match call.receiver.as_deref() {
            None => true,
            Some(receiver) => matches!(receiver.kind, NodeKind::SelfRef),
        };
        if !receiverless {
            return ProviderCall::Other;
        }
        match call.method.as_str() {
            "confine" => ProviderCall::Confine(call),
            "has_feature" | "has_features" => ProviderCall::Features(call),
            "defaultfor" => ProviderCall::DefaultFor(call),
            "commands" => ProviderCall::Commands(call),
            _ => ProviderCall::Other,
        }
    }
}

/// Read the metadata calls among the direct statements of `body`
pub fn populate(ctx: &mut HandlerContext<'_>, provider: &mut Provider, body: &Node) {
    for statement in body.statements() {
        match ProviderCall::classify(statement) {
            ProviderCall::Confine(call) => {
                for (key, value) in mapping_pairs(ctx, statement, call) {
                    provider.add_confine(key, value);
                }
            }
            ProviderCall::DefaultFor(call) => {
                for (key, value) in mapping_pairs(ctx, statement, call) {
                    provider.add_default(key, value);
                }
            }
            ProviderCall::Commands(call) => {
                for (name, executable) in mapping_pairs(ctx, statement, call) {
                    provider.add_command(name, executable);
                }
            }
            ProviderCall::Features(call) => {
                for arg in &call.args {
                    for feature in literal_list(ctx.tree, arg) {
                        provider.add_feature(feature);
                    }
                }
            }
            ProviderCall::Other => {}
        }
    }
}

/// Key/value pairs of the mapping passed as first argument to `call`;
/// malformed entries and further arguments are skipped with a warning
fn mapping_pairs(ctx: &mut HandlerContext<'_>, node: &Node, call: &Call) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let Some((mapping, extra)) = call.args.split_first() else {
        malformed(
            ctx,
            node.line,
            format!("Expected a mapping argument to '{}'", call.method),
        );
        return pairs;
    };
    if !extra.is_empty() {
        let message = format!(
            "Ignoring {} extra argument(s) to '{}'",
            extra.len(),
            call.method
        );
        malformed(ctx, node.line, message);
    }

    match &mapping.kind {
        NodeKind::Hash(entries) => {
            for entry in entries {
                match &entry.kind {
                    NodeKind::Pair { key, value } => pairs.push((
                        literal_or_source(ctx.tree, key),
                        literal_or_source(ctx.tree, value),
                    )),
                    _ => {
                        let message = format!(
                            "Skipping malformed entry '{}' in '{}'",
                            ctx.tree.text(entry.span),
                            call.method
                        );
                        malformed(ctx, entry.line, message);
                    }
                }
            }
        }
        NodeKind::Array(entries) => {
            for entry in entries {
                match &entry.kind {
                    NodeKind::Array(pair) if pair.len() == 2 => pairs.push((
                        literal_or_source(ctx.tree, &pair[0]),
                        literal_or_source(ctx.tree, &pair[1]),
                    )),
                    _ => {
                        let message = format!(
                            "Skipping malformed entry '{}' in '{}'",
                            ctx.tree.text(entry.span),
                            call.method
                        );
                        malformed(ctx, entry.line, message);
                    }
                }
            }
        }
        _ => {
            let message = format!(
                "Expected a hash or an array of pairs for '{}' but found '{}'",
                call.method,
                ctx.tree.text(mapping.span)
            );
            malformed(ctx, node.line, message);
        }
    }
    pairs
}

fn malformed(ctx: &mut HandlerContext<'_>, line: usize, message: String) {
    let message = format!("{} at {}:{}.", message, ctx.file(), line);
    ctx.warn(DiagnosticCode::MalformedMetadata, line, message);
}

#[cfg(test)]
mod tests {
    use crate::diagnostics::DiagnosticCode;
    use crate::test::extract_ruby;
    use pretty_assertions::assert_eq;

    const APT: &str = r#"
Puppet::Type.type(:package).provide(:apt) do
  desc 'Package management via apt-get.'

  confine :osfamily => :debian
  confine exists: '/usr/bin/apt-get', true: Facter.value(:kernel) == 'Linux'
  defaultfor 'os.family' => [:debian, :ubuntu]
  has_feature :versionable
  has_features :install_options, :versionable, FEATURES
  commands :aptget => '/usr/bin/apt-get', :aptcache => '/usr/bin/apt-cache'

  def install
    confine :never => :read
  end
end
"#;

    #[test]
    fn test_provider_metadata() {
        let extraction = extract_ruby(APT);
        let apt = extraction.registry.provider("package", "apt").unwrap();

        let confines: Vec<(&str, &str)> = apt
            .confines
            .iter()
            .map(|c| (c.key.as_str(), c.value.as_str()))
            .collect();
        assert_eq!(
            confines,
            vec![
                ("osfamily", "debian"),
                ("exists", "/usr/bin/apt-get"),
                ("true", "Facter.value(:kernel) == 'Linux'"),
            ]
        );

        assert_eq!(apt.defaults.len(), 1);
        assert_eq!(apt.defaults[0].key, "os.family");
        assert_eq!(apt.defaults[0].value, "[:debian, :ubuntu]");

        assert_eq!(apt.features, vec!["versionable", "install_options", "FEATURES"]);

        let commands: Vec<(&str, &str)> = apt
            .commands
            .iter()
            .map(|c| (c.name.as_str(), c.executable.as_str()))
            .collect();
        assert_eq!(
            commands,
            vec![("aptget", "/usr/bin/apt-get"), ("aptcache", "/usr/bin/apt-cache")]
        );
    }

    #[test]
    fn test_malformed_pairs_are_skipped() {
        let extraction = extract_ruby(
            "Puppet::Type.type(:package).provide(:apt) do\n  desc 'x'\n  confine [[:a, 1], [:b], [:c, 3]]\n  confine :d => 4, **extra\nend\n",
        );
        let apt = extraction.registry.provider("package", "apt").unwrap();
        let keys: Vec<&str> = apt.confines.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "c", "d"]);
        assert_eq!(
            extraction
                .diagnostics
                .with_code(DiagnosticCode::MalformedMetadata)
                .count(),
            2
        );
    }

    #[test]
    fn test_extra_arguments_keep_the_first_mapping() {
        let extraction = extract_ruby(
            "Puppet::Type.type(:package).provide(:apt) do\n  desc 'x'\n  commands({ :aptget => '/usr/bin/apt-get' }, 'stray')\nend\n",
        );
        let apt = extraction.registry.provider("package", "apt").unwrap();
        assert_eq!(apt.commands.len(), 1);
        assert_eq!(apt.commands[0].name, "aptget");
        let messages: Vec<&str> = extraction
            .diagnostics
            .with_code(DiagnosticCode::MalformedMetadata)
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(
            messages,
            vec!["Ignoring 1 extra argument(s) to 'commands' at t.rb:3."]
        );
    }

    #[test]
    fn test_non_mapping_argument_warns() {
        let extraction = extract_ruby(
            "Puppet::Type.type(:package).provide(:apt) do\n  desc 'x'\n  commands 'apt-get'\nend\n",
        );
        let apt = extraction.registry.provider("package", "apt").unwrap();
        assert!(apt.commands.is_empty());
        assert_eq!(
            extraction
                .diagnostics
                .with_code(DiagnosticCode::MalformedMetadata)
                .count(),
            1
        );
    }
}
