//! Syntax front-end for Puppet modules
//!
//! Parses the two grammars found in a Puppet module into immutable trees:
//!
//! - Ruby (`lib/puppet/**/*.rb`): resource types, providers, functions and
//!   data types are declared through method calls with blocks, so the Ruby
//!   tree models calls, arguments, blocks and literals in detail.
//! - The Puppet language (`manifests/*.pp`, `functions/*.pp`, `types/*.pp`,
//!   `plans/*.pp`): only declarations and their parameter lists are
//!   modelled; everything else is skipped with brackets kept balanced.
//!
//! Both front-ends collect `#` comments so that documentation blocks can be
//! looked up by the line of the declaration they precede.

pub mod comment;
pub mod error;
pub mod puppet;
pub mod ruby;
pub mod span;
pub mod tree;

pub use comment::{Comment, CommentBlock, Comments};
pub use error::{SyntaxError, SyntaxErrorKind, SyntaxResult};
pub use span::{LineIndex, Span};
pub use tree::{Grammar, SourceFile, SyntaxRoot, SyntaxTree};
