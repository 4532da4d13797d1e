//! Extraction configuration
//!
//! Settings are plain data with defaults and can be loaded from a TOML file:
//!
//! ```toml
//! warn_missing_docs = true
//! warn_missing_param_docs = false
//! ruby_extensions = ["rb"]
//! puppet_extensions = ["pp"]
//! colored_diagnostics = true
//! ```

use crate::diagnostics::{EtchError, EtchResult};
use puppet_etch_syntax::Grammar;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EtchConfig {
    /// Warn about objects without a description
    pub warn_missing_docs: bool,
    /// Warn about Puppet parameters without a `@param` tag
    pub warn_missing_param_docs: bool,
    /// File extensions parsed as Ruby
    pub ruby_extensions: Vec<String>,
    /// File extensions parsed as the Puppet language
    pub puppet_extensions: Vec<String>,
    /// Whether printed diagnostics use colors
    pub colored_diagnostics: bool,
}

impl Default for EtchConfig {
    fn default() -> Self {
        Self {
            warn_missing_docs: true,
            warn_missing_param_docs: true,
            ruby_extensions: vec!["rb".to_string()],
            puppet_extensions: vec!["pp".to_string()],
            colored_diagnostics: true,
        }
    }
}

impl EtchConfig {
    /// Create a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> EtchResult<Self> {
        toml::from_str(source).map_err(|e| EtchError::config(e.to_string()))
    }

    /// Load a TOML file
    pub fn load(path: impl AsRef<Path>) -> EtchResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
            .map_err(|e| EtchError::config(format!("{}: {}", path.display(), e)))
    }

    /// Grammar of a file, by its extension
    pub fn grammar_for(&self, path: &Path) -> Option<Grammar> {
        let extension = path.extension()?.to_str()?;
        if self.ruby_extensions.iter().any(|e| e == extension) {
            Some(Grammar::Ruby)
        } else if self.puppet_extensions.iter().any(|e| e == extension) {
            Some(Grammar::Puppet)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EtchConfig::default();
        assert!(config.warn_missing_docs);
        assert_eq!(config.grammar_for(Path::new("lib/puppet/type/db.rb")), Some(Grammar::Ruby));
        assert_eq!(config.grammar_for(Path::new("manifests/init.pp")), Some(Grammar::Puppet));
        assert_eq!(config.grammar_for(Path::new("README.md")), None);
        assert_eq!(config.grammar_for(Path::new("Rakefile")), None);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EtchConfig::from_toml_str("warn_missing_param_docs = false\nruby_extensions = [\"rb\", \"ruby\"]\n").unwrap();
        assert!(!config.warn_missing_param_docs);
        assert!(config.warn_missing_docs);
        assert_eq!(config.grammar_for(Path::new("x.ruby")), Some(Grammar::Ruby));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = EtchConfig::from_toml_str("warn_missing_docs = \"yes\"").unwrap_err();
        assert!(matches!(err, EtchError::Config(_)));

        let err = EtchConfig::from_toml_str("unknown_key = 1").unwrap_err();
        assert!(matches!(err, EtchError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("etch.toml");
        std::fs::write(&path, "colored_diagnostics = false\n").unwrap();
        let config = EtchConfig::load(&path).unwrap();
        assert!(!config.colored_diagnostics);
    }
}
