//! Integration tests for extracting a whole module
//!
//! Covers:
//! - Files on disk, extracted in the order given
//! - Providers linked to their resource type
//! - Duplicate names within and across files
//! - Syntax errors limited to their own file
//! - Deterministic registry order

use pretty_assertions::assert_eq;
use puppet_etch::{DiagnosticCode, EtchConfig, Extraction, Extractor, ObjectKind};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const TYPE_DATABASE: &str = r#"
Puppet::Type.newtype(:database) do
  desc 'An example database server resource type.'

  ensurable

  newparam(:name) do
    desc 'The database name.'
  end
end
"#;

const TYPE_EXTRAS: &str = r#"
Puppet::Type.type(:database).newproperty(:file) do
  desc 'The database file to use.'
end
"#;

const PROVIDER_LINUX: &str = r#"
Puppet::Type.type(:database).provide :linux do
  desc 'An example provider on Linux.'
  confine kernel: 'Linux'
  confine osfamily: 'RedHat'
  defaultfor :kernel => 'Linux'
  defaultfor :osfamily => 'RedHat', :operatingsystemmajrelease => '7'
  has_feature :implements_some_feature
  has_feature :some_other_feature
  commands foo: '/usr/bin/foo'
end
"#;

const PROVIDER_DUPLICATE: &str = r#"
Puppet::Type.type(:database).provide :linux do
  desc 'Another provider with the same name.'
end
"#;

const INIT_PP: &str = r#"# The database module.
#
# @param version The version to install.
class database (String $version = 'latest') {
}
"#;

fn write_module(files: &[(&str, &str)]) -> (TempDir, Vec<PathBuf>) {
    let dir = tempfile::tempdir().unwrap();
    let paths = files
        .iter()
        .map(|(relative, source)| {
            let path = dir.path().join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, source).unwrap();
            path
        })
        .collect();
    (dir, paths)
}

fn extract_paths(paths: &[PathBuf]) -> Extraction {
    let mut extractor = Extractor::new(EtchConfig::default());
    extractor.extract_files(paths);
    extractor.finish()
}

fn relative(dir: &Path, file: &str) -> String {
    dir.join(file).display().to_string()
}

#[test]
fn test_module_on_disk() {
    let (dir, paths) = write_module(&[
        ("lib/puppet/type/database.rb", TYPE_DATABASE),
        ("lib/puppet/type/database_extras.rb", TYPE_EXTRAS),
        ("lib/puppet/provider/database/linux.rb", PROVIDER_LINUX),
        ("manifests/init.pp", INIT_PP),
        ("README.md", "# database\n"),
    ]);
    let extraction = extract_paths(&paths);
    let registry = &extraction.registry;

    let types: Vec<_> = registry.resource_types().collect();
    assert_eq!(types.len(), 1);
    let database = types[0];
    assert_eq!(database.docstring.text(), "An example database server resource type.");
    assert_eq!(database.location.file, relative(dir.path(), "lib/puppet/type/database.rb"));
    assert_eq!(database.location.line, 2);

    let properties: Vec<&str> = database.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(properties, vec!["ensure", "file"]);
    assert_eq!(database.property("file").unwrap().docstring, "The database file to use.");
    assert!(database.parameter("name").unwrap().isnamevar);
    assert_eq!(database.providers, vec!["linux"]);

    let linux = registry.provider("database", "linux").unwrap();
    assert_eq!(linux.docstring.text(), "An example provider on Linux.");
    assert_eq!(linux.docstring.api(), Some("public"));
    assert_eq!(linux.confines.len(), 2);
    let defaults: Vec<(&str, &str)> = linux
        .defaults
        .iter()
        .map(|d| (d.key.as_str(), d.value.as_str()))
        .collect();
    assert_eq!(
        defaults,
        vec![
            ("kernel", "Linux"),
            ("osfamily", "RedHat"),
            ("operatingsystemmajrelease", "7"),
        ]
    );
    assert_eq!(
        linux.features,
        vec!["implements_some_feature", "some_other_feature"]
    );
    assert_eq!(linux.commands[0].name, "foo");
    assert_eq!(linux.commands[0].executable, "/usr/bin/foo");

    let class = registry.class("database").unwrap();
    assert_eq!(class.parameters[0].docstring.as_deref(), Some("The version to install."));

    assert!(!extraction.diagnostics.has_errors());
    assert_eq!(
        extraction
            .diagnostics
            .with_code(DiagnosticCode::UnsupportedFile)
            .count(),
        1
    );
}

#[test]
fn test_provider_names_are_unique_per_type() {
    let (_dir, paths) = write_module(&[
        ("lib/puppet/provider/database/linux.rb", PROVIDER_LINUX),
        ("lib/puppet/provider/database/linux_copy.rb", PROVIDER_DUPLICATE),
    ]);
    let extraction = extract_paths(&paths);

    let providers: Vec<_> = extraction.registry.providers().collect();
    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0].docstring.text(), "An example provider on Linux.");

    let duplicates: Vec<&str> = extraction
        .diagnostics
        .with_code(DiagnosticCode::DuplicateName)
        .map(|d| d.message.as_str())
        .collect();
    assert_eq!(duplicates, vec!["provider 'database::linux' is already registered"]);
}

#[test]
fn test_same_provider_name_for_different_types() {
    let mut extractor = Extractor::new(EtchConfig::default());
    extractor
        .extract_source(
            "providers.rb",
            "Puppet::Type.type(:database).provide(:linux) do\n  desc 'a'\nend\nPuppet::Type.type(:service).provide(:linux) do\n  desc 'b'\nend\n",
        )
        .unwrap();
    let extraction = extractor.finish();
    assert_eq!(extraction.registry.all(ObjectKind::Provider).count(), 2);
    assert!(extraction.registry.get(ObjectKind::Provider, "service", "linux").is_some());
    assert!(extraction.registry.get(ObjectKind::Provider, "", "linux").is_none());
}

#[test]
fn test_duplicate_within_one_file() {
    let mut extractor = Extractor::new(EtchConfig::default());
    extractor
        .extract_source(
            "dup.rb",
            "Puppet::Type.newtype(:db) do\n  desc 'First.'\nend\nPuppet::Type.newtype(:db) do\n  desc 'Second.'\nend\n",
        )
        .unwrap();
    let extraction = extractor.finish();
    let db = extraction.registry.resource_type("db").unwrap();
    assert_eq!(db.docstring.text(), "First.");
    let duplicate = extraction
        .diagnostics
        .with_code(DiagnosticCode::DuplicateName)
        .next()
        .unwrap();
    assert_eq!(duplicate.line, Some(4));
}

#[test]
fn test_syntax_error_only_affects_its_file() {
    let (_dir, paths) = write_module(&[
        ("lib/puppet/type/broken.rb", "Puppet::Type.newtype(:broken) do\n  desc \"never closed\nend\n"),
        ("lib/puppet/type/database.rb", TYPE_DATABASE),
    ]);
    let mut extractor = Extractor::new(EtchConfig::default());
    let failed = extractor.extract_files(&paths);
    let extraction = extractor.finish();

    assert_eq!(failed, 1);
    assert!(extraction.registry.resource_type("broken").is_none());
    assert!(extraction.registry.resource_type("database").is_some());
    assert_eq!(extraction.diagnostics.error_count(), 1);
}

#[test]
fn test_undocumentable_construct_does_not_stop_siblings() {
    let mut extractor = Extractor::new(EtchConfig::default());
    extractor
        .extract_source(
            "mixed.rb",
            "Puppet::Type.type(:database).provide(name_from_somewhere) do\nend\n\nPuppet::Type.type(:database).provide(:fine) do\n  desc 'Fine.'\nend\n",
        )
        .unwrap();
    let extraction = extractor.finish();

    assert!(extraction.registry.provider("database", "fine").is_some());
    let messages: Vec<&str> = extraction
        .diagnostics
        .with_code(DiagnosticCode::Undocumentable)
        .map(|d| d.message.as_str())
        .collect();
    assert_eq!(
        messages,
        vec!["Expected a symbol or string literal for first parameter but found 'name_from_somewhere' at mixed.rb:1."]
    );
}

#[test]
fn test_constructs_inside_modules_and_conditionals() {
    let mut extractor = Extractor::new(EtchConfig::default());
    extractor
        .extract_source(
            "nested.rb",
            r#"
module PuppetX
  module Database
    if Puppet.features.root?
      Puppet::Type.type(:database).provide(:guarded) do
        desc 'Only as root.'
      end
    end
  end
end

def define_later
  Puppet::Type.type(:database).provide(:hidden) do
    desc 'Inside a method body.'
  end
end
"#,
        )
        .unwrap();
    let extraction = extractor.finish();
    assert!(extraction.registry.provider("database", "guarded").is_some());
    assert!(extraction.registry.provider("database", "hidden").is_none());
}

#[test]
fn test_extraction_is_deterministic() {
    let files = [
        ("manifests/init.pp", INIT_PP),
        ("lib/puppet/provider/database/linux.rb", PROVIDER_LINUX),
        ("lib/puppet/type/database.rb", TYPE_DATABASE),
        ("lib/puppet/type/database_extras.rb", TYPE_EXTRAS),
    ];
    let (_dir, paths) = write_module(&files);

    let first = extract_paths(&paths);
    let second = extract_paths(&paths);

    let order = |extraction: &Extraction| -> Vec<String> {
        extraction
            .registry
            .iter()
            .map(|object| object.qualified_name())
            .collect()
    };
    assert_eq!(order(&first), order(&second));
    assert_eq!(
        order(&first),
        vec!["database", "database::linux", "database"]
    );
    assert_eq!(
        first.registry.to_json().unwrap(),
        second.registry.to_json().unwrap()
    );
}

#[test]
fn test_config_disables_missing_doc_warnings() {
    let config = EtchConfig::from_toml_str("warn_missing_docs = false\nwarn_missing_param_docs = false\n").unwrap();
    let mut extractor = Extractor::new(config);
    extractor
        .extract_source("init.pp", "class undocumented ($x) {\n}\n")
        .unwrap();
    let extraction = extractor.finish();
    assert!(extraction.registry.class("undocumented").is_some());
    assert_eq!(extraction.diagnostics.warning_count(), 0);
}
