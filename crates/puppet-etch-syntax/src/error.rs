//! Syntax errors reported by the parsers
//!
//! A syntax error is fatal for the file being parsed. The parsers are
//! tolerant of constructs they do not model, so these are reserved for
//! structural damage: unterminated literals and unbalanced blocks.

use thiserror::Error;

/// What went wrong
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unterminated heredoc '{0}'")]
    UnterminatedHeredoc(String),

    #[error("unterminated regular expression")]
    UnterminatedRegex,

    #[error("unterminated comment")]
    UnterminatedComment,

    #[error("unexpected end of file, expected {0}")]
    UnexpectedEof(String),

    #[error("unexpected '{found}', expected {expected}")]
    Unexpected { found: String, expected: String },

    #[error("unbalanced '{0}'")]
    Unbalanced(String),
}

/// A syntax error with its location
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at line {line}, column {col}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    /// 1-indexed line
    pub line: usize,
    /// 0-indexed column
    pub col: usize,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, line: usize, col: usize) -> Self {
        Self { kind, line, col }
    }
}

/// Result alias for parser entry points
pub type SyntaxResult<T> = Result<T, SyntaxError>;
