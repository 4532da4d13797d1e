//! Extractor - Documentation extraction orchestrator
//!
//! The Extractor coordinates a run over a module's source files: grammar
//! detection, parsing, construct handling into a per-file registry, merging
//! into the run registry, and the final cross-object pass.
//!
//! Files are processed one at a time in the order given. A syntax error
//! stops the file it occurs in; every other file is still extracted.

use crate::config::EtchConfig;
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticsCollector, EtchError, EtchResult};
use crate::handlers::{puppet, ruby, HandlerContext};
use crate::registry::Registry;
use puppet_etch_syntax::{SyntaxRoot, SyntaxTree};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Result of a finished run
#[derive(Debug)]
pub struct Extraction {
    /// Every documented object
    pub registry: Registry,
    /// Everything reported while extracting
    pub diagnostics: DiagnosticsCollector,
}

impl Extraction {
    /// Print the diagnostics and a summary line to stderr
    pub fn print(&self, colored: bool) -> io::Result<()> {
        self.diagnostics.print(colored)?;
        self.diagnostics.print_summary();
        Ok(())
    }
}

/// The extraction driver
///
/// ```no_run
/// use puppet_etch::{EtchConfig, Extractor};
///
/// let mut extractor = Extractor::new(EtchConfig::default());
/// extractor.extract_files(["lib/puppet/type/database.rb", "manifests/init.pp"]);
/// let extraction = extractor.finish();
/// println!("{}", extraction.registry.to_json().unwrap());
/// ```
pub struct Extractor {
    /// Configuration
    config: EtchConfig,
    /// Objects of every file merged so far
    registry: Registry,
    /// Diagnostics collector
    diagnostics: DiagnosticsCollector,
}

impl Extractor {
    /// Create a new Extractor with the given configuration
    pub fn new(config: EtchConfig) -> Self {
        Self {
            config,
            registry: Registry::new(),
            diagnostics: DiagnosticsCollector::new(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &EtchConfig {
        &self.config
    }

    /// Objects registered so far
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Get the diagnostics collector
    pub fn diagnostics(&self) -> &DiagnosticsCollector {
        &self.diagnostics
    }

    /// Extract the source text of one file.
    ///
    /// A file whose extension matches neither grammar is skipped with a
    /// warning. A syntax error is recorded and returned.
    pub fn extract_source(
        &mut self,
        path: impl Into<PathBuf>,
        text: impl Into<String>,
    ) -> EtchResult<()> {
        let path = path.into();
        let Some(grammar) = self.config.grammar_for(&path) else {
            self.skip_unsupported(&path);
            return Ok(());
        };

        match SyntaxTree::parse(path.clone(), text, grammar) {
            Ok(tree) => {
                self.extract_tree(&tree);
                Ok(())
            }
            Err(err) => {
                let err = EtchError::syntax(path, err);
                self.diagnostics.report(&err);
                Err(err)
            }
        }
    }

    /// Run the construct handlers over a parsed file and merge what they
    /// registered
    pub fn extract_tree(&mut self, tree: &SyntaxTree) {
        let mut partial = Registry::new();
        {
            let mut ctx = HandlerContext::new(
                tree,
                &self.config,
                &mut partial,
                &mut self.diagnostics,
            );
            match tree.root() {
                SyntaxRoot::Ruby(root) => ruby::process(&mut ctx, root),
                SyntaxRoot::Puppet(manifest) => puppet::process(&mut ctx, manifest),
            }
        }

        let found = partial.len();
        for err in self.registry.merge(partial) {
            self.diagnostics.report(&err);
        }
        debug!(
            path = %tree.path().display(),
            grammar = %tree.grammar(),
            objects = found,
            "extracted file"
        );
    }

    /// Print what has been reported so far, colored per configuration
    pub fn print_diagnostics(&self) -> io::Result<()> {
        self.diagnostics.print(self.config.colored_diagnostics)
    }

    /// Read and extract one file
    pub fn extract_file(&mut self, path: impl AsRef<Path>) -> EtchResult<()> {
        let path = path.as_ref();
        if self.config.grammar_for(path).is_none() {
            self.skip_unsupported(path);
            return Ok(());
        }

        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                self.diagnostics.add(
                    Diagnostic::error(format!("Failed to read {}: {}", path.display(), err))
                        .in_file(path)
                        .with_code(DiagnosticCode::Io),
                );
                return Err(err.into());
            }
        };
        self.extract_source(path, text)
    }

    /// Extract files sequentially, in the order given.
    ///
    /// Failures are recorded as diagnostics and do not stop the run.
    /// Returns the number of files that failed.
    pub fn extract_files<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        paths
            .into_iter()
            .filter(|path| self.extract_file(path).is_err())
            .count()
    }

    /// Resolve cross-object data and hand out the results
    pub fn finish(mut self) -> Extraction {
        for diagnostic in self.registry.finalize() {
            self.diagnostics.add(diagnostic);
        }
        info!(
            objects = self.registry.len(),
            errors = self.diagnostics.error_count(),
            warnings = self.diagnostics.warning_count(),
            "extraction finished"
        );
        Extraction {
            registry: self.registry,
            diagnostics: self.diagnostics,
        }
    }

    fn skip_unsupported(&mut self, path: &Path) {
        self.diagnostics.add(
            Diagnostic::warning(format!(
                "Skipping {}: not a Ruby or Puppet source file.",
                path.display()
            ))
            .in_file(path)
            .with_code(DiagnosticCode::UnsupportedFile),
        );
    }
}
