//! Error types and diagnostics
//!
//! This module provides error handling and diagnostic reporting
//! for the extraction engine. Errors scoped to a single construct or file
//! are turned into diagnostics so that a run always completes.

use crate::node::ObjectKind;
use puppet_etch_syntax::SyntaxError;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use thiserror::Error;

/// Result type for puppet-etch operations
pub type EtchResult<T> = Result<T, EtchError>;

/// Main error type for puppet-etch
#[derive(Debug, Error)]
pub enum EtchError {
    /// A required literal of a recognized construct could not be resolved
    #[error("{message}")]
    Undocumentable {
        message: String,
        file: PathBuf,
        line: usize,
    },

    /// An object with the same kind, namespace and name already exists
    #[error("{kind} '{}' is already registered", qualified(namespace, name))]
    DuplicateName {
        kind: ObjectKind,
        namespace: String,
        name: String,
        file: PathBuf,
        line: usize,
    },

    /// The file could not be parsed
    #[error("Syntax error in {}: {source}", file.display())]
    Syntax {
        file: PathBuf,
        #[source]
        source: SyntaxError,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn qualified(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", namespace, name)
    }
}

impl EtchError {
    /// Create an undocumentable-construct error
    pub fn undocumentable(message: impl Into<String>, file: impl Into<PathBuf>, line: usize) -> Self {
        EtchError::Undocumentable {
            message: message.into(),
            file: file.into(),
            line,
        }
    }

    /// Create a duplicate-name error
    pub fn duplicate(
        kind: ObjectKind,
        namespace: impl Into<String>,
        name: impl Into<String>,
        file: impl Into<PathBuf>,
        line: usize,
    ) -> Self {
        EtchError::DuplicateName {
            kind,
            namespace: namespace.into(),
            name: name.into(),
            file: file.into(),
            line,
        }
    }

    /// Create a syntax error for a file
    pub fn syntax(file: impl Into<PathBuf>, source: SyntaxError) -> Self {
        EtchError::Syntax {
            file: file.into(),
            source,
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        EtchError::Config(message.into())
    }

    /// The diagnostic code matching this error
    pub fn code(&self) -> DiagnosticCode {
        match self {
            EtchError::Undocumentable { .. } => DiagnosticCode::Undocumentable,
            EtchError::DuplicateName { .. } => DiagnosticCode::DuplicateName,
            EtchError::Syntax { .. } => DiagnosticCode::Syntax,
            EtchError::Io(_) => DiagnosticCode::Io,
            EtchError::Config(_) => DiagnosticCode::Config,
            EtchError::Serialization(_) => DiagnosticCode::Internal,
        }
    }

    /// Convert into a diagnostic carrying this error's location.
    ///
    /// Undocumentable constructs are reported as warnings, everything else
    /// as an error.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = match self {
            EtchError::Undocumentable { .. } => Diagnostic::warning(self.to_string()),
            _ => Diagnostic::error(self.to_string()),
        }
        .with_code(self.code());

        match self {
            EtchError::Undocumentable { file, line, .. }
            | EtchError::DuplicateName { file, line, .. } => diagnostic.in_file(file).at_line(*line),
            EtchError::Syntax { file, source } => {
                diagnostic.in_file(file).at(source.line, source.col)
            }
            _ => diagnostic,
        }
    }
}

/// Categories of diagnostics emitted during extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    Undocumentable,
    DuplicateName,
    MissingDocstring,
    UnresolvableDocstring,
    MalformedMetadata,
    MissingParamDoc,
    UnknownParamDoc,
    UndeclaredType,
    UnsupportedFile,
    Syntax,
    Io,
    Config,
    Internal,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::Undocumentable => "undocumentable",
            DiagnosticCode::DuplicateName => "duplicate-name",
            DiagnosticCode::MissingDocstring => "missing-docstring",
            DiagnosticCode::UnresolvableDocstring => "unresolvable-docstring",
            DiagnosticCode::MalformedMetadata => "malformed-metadata",
            DiagnosticCode::MissingParamDoc => "missing-param-doc",
            DiagnosticCode::UnknownParamDoc => "unknown-param-doc",
            DiagnosticCode::UndeclaredType => "undeclared-type",
            DiagnosticCode::UnsupportedFile => "unsupported-file",
            DiagnosticCode::Syntax => "syntax",
            DiagnosticCode::Io => "io",
            DiagnosticCode::Config => "config",
            DiagnosticCode::Internal => "internal",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<DiagnosticCode> for String {
    fn from(code: DiagnosticCode) -> Self {
        code.as_str().to_string()
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticSeverity {
    /// Error - the construct or file was skipped
    Error,
    /// Warning - extraction continues
    Warning,
    /// Info - informational message
    Info,
}

impl DiagnosticSeverity {
    /// Get display string
    pub fn display(&self) -> &'static str {
        match self {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
            DiagnosticSeverity::Info => "info",
        }
    }

    /// Get terminal color
    pub fn color(&self) -> Color {
        match self {
            DiagnosticSeverity::Error => Color::Red,
            DiagnosticSeverity::Warning => Color::Yellow,
            DiagnosticSeverity::Info => Color::Blue,
        }
    }
}

/// A diagnostic message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity level
    pub severity: DiagnosticSeverity,
    /// Message
    pub message: String,
    /// Source file
    pub file: Option<PathBuf>,
    /// Line number (1-indexed)
    pub line: Option<usize>,
    /// Column number (0-indexed)
    pub col: Option<usize>,
    /// Diagnostic code (for categorization)
    pub code: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(severity: DiagnosticSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            file: None,
            line: None,
            col: None,
            code: None,
        }
    }

    /// Create an error diagnostic
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Error, message)
    }

    /// Create a warning diagnostic
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Warning, message)
    }

    /// Create an info diagnostic
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(DiagnosticSeverity::Info, message)
    }

    /// Set the source file
    pub fn in_file(mut self, file: impl AsRef<Path>) -> Self {
        self.file = Some(file.as_ref().to_path_buf());
        self
    }

    /// Set the location
    pub fn at(mut self, line: usize, col: usize) -> Self {
        self.line = Some(line);
        self.col = Some(col);
        self
    }

    /// Set the line only
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Set the diagnostic code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    fn location(&self) -> Option<String> {
        let file = self.file.as_ref()?;
        let mut result = file.display().to_string();
        if let Some(line) = self.line {
            result.push(':');
            result.push_str(&line.to_string());
            if let Some(col) = self.col {
                result.push(':');
                result.push_str(&col.to_string());
            }
        }
        Some(result)
    }

    /// Format the diagnostic for display
    pub fn format(&self) -> String {
        let mut result = String::new();

        if let Some(location) = self.location() {
            result.push_str(&location);
            result.push_str(": ");
        }

        result.push_str(self.severity.display());

        if let Some(ref code) = self.code {
            result.push('[');
            result.push_str(code);
            result.push(']');
        }

        result.push_str(": ");
        result.push_str(&self.message);

        result
    }

    /// Write the diagnostic with colors to a terminal stream
    pub fn write_colored(&self, out: &mut dyn WriteColor) -> io::Result<()> {
        let mut dimmed = ColorSpec::new();
        dimmed.set_dimmed(true);

        if let Some(location) = self.location() {
            out.set_color(&dimmed)?;
            write!(out, "{}", location)?;
            out.reset()?;
            write!(out, ": ")?;
        }

        out.set_color(ColorSpec::new().set_fg(Some(self.severity.color())).set_bold(true))?;
        write!(out, "{}", self.severity.display())?;
        out.reset()?;

        if let Some(ref code) = self.code {
            out.set_color(&dimmed)?;
            write!(out, "[{}]", code)?;
            out.reset()?;
        }

        writeln!(out, ": {}", self.message)
    }

    /// Mirror the diagnostic to the tracing subscriber
    fn trace(&self) {
        let file = self
            .file
            .as_ref()
            .map(|f| f.display().to_string())
            .unwrap_or_default();
        let line = self.line.unwrap_or(0);
        let code = self.code.as_deref().unwrap_or("");
        match self.severity {
            DiagnosticSeverity::Error => {
                tracing::error!(file = %file, line, code, "{}", self.message)
            }
            DiagnosticSeverity::Warning => {
                tracing::warn!(file = %file, line, code, "{}", self.message)
            }
            DiagnosticSeverity::Info => tracing::info!(file = %file, line, code, "{}", self.message),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

/// Collector for diagnostics during extraction
#[derive(Debug, Default, Clone)]
pub struct DiagnosticsCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticsCollector {
    /// Create a new collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic
    pub fn add(&mut self, diagnostic: Diagnostic) {
        diagnostic.trace();
        self.diagnostics.push(diagnostic);
    }

    /// Add the diagnostic for an error
    pub fn report(&mut self, error: &EtchError) {
        self.add(error.to_diagnostic());
    }

    /// Add an error
    pub fn error(&mut self, message: impl Into<String>) {
        self.add(Diagnostic::error(message));
    }

    /// Add a warning
    pub fn warning(&mut self, message: impl Into<String>) {
        self.add(Diagnostic::warning(message));
    }

    /// Add an info message
    pub fn info(&mut self, message: impl Into<String>) {
        self.add(Diagnostic::info(message));
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == DiagnosticSeverity::Error)
    }

    /// Get all diagnostics
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics carrying `code`
    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.code.as_deref() == Some(code.as_str()))
    }

    /// Get error count
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
            .count()
    }

    /// Get warning count
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Warning)
            .count()
    }

    /// Print all diagnostics to stderr
    pub fn print(&self, colored: bool) -> io::Result<()> {
        let choice = if colored {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        let mut stderr = StandardStream::stderr(choice);
        for diagnostic in &self.diagnostics {
            diagnostic.write_colored(&mut stderr)?;
        }
        Ok(())
    }

    /// Print summary
    pub fn print_summary(&self) {
        let errors = self.error_count();
        let warnings = self.warning_count();

        if errors > 0 || warnings > 0 {
            eprintln!("\n{} error(s), {} warning(s)", errors, warnings);
        }
    }
}
