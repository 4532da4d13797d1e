//! Construct handlers
//!
//! Handlers recognize declaration idioms in parsed trees and register the
//! code objects they declare. A handler either declines a node (it is not
//! its idiom), registers an object, or fails with an error scoped to that
//! one construct; the walker reports the error and moves on to the next
//! sibling.

pub mod docstring;
pub mod puppet;
pub mod ruby;

use crate::config::EtchConfig;
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticsCollector, EtchError};
use crate::docstring::Docstring;
use crate::node::{CodeObject, Location};
use crate::registry::Registry;
use docstring::DocSearch;
use puppet_etch_syntax::SyntaxTree;

/// Everything a handler needs while processing one file
pub struct HandlerContext<'a> {
    pub tree: &'a SyntaxTree,
    pub config: &'a EtchConfig,
    pub registry: &'a mut Registry,
    pub diagnostics: &'a mut DiagnosticsCollector,
}

impl<'a> HandlerContext<'a> {
    pub fn new(
        tree: &'a SyntaxTree,
        config: &'a EtchConfig,
        registry: &'a mut Registry,
        diagnostics: &'a mut DiagnosticsCollector,
    ) -> Self {
        Self {
            tree,
            config,
            registry,
            diagnostics,
        }
    }

    /// Path of the file being processed, as displayed in messages
    pub fn file(&self) -> String {
        self.tree.path().display().to_string()
    }

    pub fn location(&self, line: usize) -> Location {
        Location::new(self.file(), line)
    }

    /// An error skipping the construct at `line`
    pub fn undocumentable(&self, line: usize, message: impl std::fmt::Display) -> EtchError {
        EtchError::undocumentable(
            format!("{} at {}:{}.", message, self.file(), line),
            self.tree.path(),
            line,
        )
    }

    /// Record a warning located in the current file
    pub fn warn(&mut self, code: DiagnosticCode, line: usize, message: impl Into<String>) {
        let diagnostic = Diagnostic::warning(message)
            .in_file(self.tree.path())
            .at_line(line)
            .with_code(code);
        self.diagnostics.add(diagnostic);
    }

    /// Register an object, reporting a duplicate name instead of failing
    pub fn register(&mut self, object: impl Into<CodeObject>) -> bool {
        match self.registry.register(object) {
            Ok(_) => true,
            Err(err) => {
                self.diagnostics.report(&err);
                false
            }
        }
    }

    /// Turn a docstring search into text, warning when nothing usable was found
    pub fn docstring_text(&mut self, search: DocSearch, subject: &str, line: usize) -> String {
        match search {
            DocSearch::Found { text, .. } => text,
            DocSearch::Unresolvable { line } => {
                let message = format!(
                    "Failed to parse docstring for {} near {}:{}.",
                    subject,
                    self.file(),
                    line
                );
                self.warn(DiagnosticCode::UnresolvableDocstring, line, message);
                String::new()
            }
            DocSearch::NotFound => {
                self.missing_docstring(subject, line);
                String::new()
            }
        }
    }

    /// Like [`docstring_text`](Self::docstring_text), parsed into a docstring with tags
    pub fn docstring(&mut self, search: DocSearch, subject: &str, line: usize) -> Docstring {
        Docstring::parse(&self.docstring_text(search, subject, line))
    }

    /// Docstring from the comment block directly above `line`
    pub fn comment_docstring(&mut self, line: usize, subject: &str) -> Docstring {
        match self.tree.comment_block_before(line) {
            Some(block) => Docstring::parse(&block.text),
            None => {
                self.missing_docstring(subject, line);
                Docstring::new()
            }
        }
    }

    fn missing_docstring(&mut self, subject: &str, line: usize) {
        if self.config.warn_missing_docs {
            let message = format!("Missing a description for {} at {}:{}.", subject, self.file(), line);
            self.warn(DiagnosticCode::MissingDocstring, line, message);
        }
    }
}
