//! Parsed files
//!
//! A [`SyntaxTree`] bundles the source text of one file with its parsed
//! root, its comments, and the grammar it was parsed with.

use crate::comment::{CommentBlock, Comments};
use crate::error::SyntaxResult;
use crate::span::{LineIndex, Span};
use crate::{puppet, ruby};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// The grammars understood by the front-end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grammar {
    Ruby,
    Puppet,
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ruby => write!(f, "ruby"),
            Self::Puppet => write!(f, "puppet"),
        }
    }
}

/// Source text of a file with its line index
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: PathBuf,
    text: String,
    line_index: LineIndex,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let text = text.into();
        let line_index = LineIndex::new(&text);
        Self {
            path: path.into(),
            text,
            line_index,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    /// Source text covered by `span`
    pub fn slice(&self, span: Span) -> &str {
        self.text.get(span.as_range()).unwrap_or_default()
    }
}

/// Root of a parsed file
#[derive(Debug, Clone)]
pub enum SyntaxRoot {
    Ruby(ruby::Node),
    Puppet(puppet::Manifest),
}

/// A parsed file
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: SourceFile,
    root: SyntaxRoot,
    comments: Comments,
}

impl SyntaxTree {
    /// Parse `text` with the given grammar
    pub fn parse(
        path: impl Into<PathBuf>,
        text: impl Into<String>,
        grammar: Grammar,
    ) -> SyntaxResult<Self> {
        let source = SourceFile::new(path, text);
        let (root, comments) = match grammar {
            Grammar::Ruby => {
                let (node, comments) = ruby::parse(source.text(), source.line_index())?;
                (SyntaxRoot::Ruby(node), comments)
            }
            Grammar::Puppet => {
                let (manifest, comments) = puppet::parse(source.text(), source.line_index())?;
                (SyntaxRoot::Puppet(manifest), comments)
            }
        };
        tracing::trace!(
            path = %source.path().display(),
            %grammar,
            comments = comments.len(),
            "parsed source file"
        );
        Ok(Self {
            source,
            root,
            comments,
        })
    }

    pub fn parse_ruby(path: impl Into<PathBuf>, text: impl Into<String>) -> SyntaxResult<Self> {
        Self::parse(path, text, Grammar::Ruby)
    }

    pub fn parse_puppet(path: impl Into<PathBuf>, text: impl Into<String>) -> SyntaxResult<Self> {
        Self::parse(path, text, Grammar::Puppet)
    }

    pub fn grammar(&self) -> Grammar {
        match self.root {
            SyntaxRoot::Ruby(_) => Grammar::Ruby,
            SyntaxRoot::Puppet(_) => Grammar::Puppet,
        }
    }

    pub fn path(&self) -> &Path {
        self.source.path()
    }

    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    pub fn root(&self) -> &SyntaxRoot {
        &self.root
    }

    pub fn comments(&self) -> &Comments {
        &self.comments
    }

    /// The documentation comment block directly above `line`
    pub fn comment_block_before(&self, line: usize) -> Option<CommentBlock> {
        self.comments.block_before(line)
    }

    /// Source text covered by `span`
    pub fn text(&self, span: Span) -> &str {
        self.source.slice(span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dispatches_on_grammar() {
        let tree = SyntaxTree::parse_ruby("lib/foo.rb", "# doc\nfoo(:a)\n").unwrap();
        assert_eq!(tree.grammar(), Grammar::Ruby);
        assert_eq!(tree.comments().len(), 1);
        assert_eq!(tree.comment_block_before(2).unwrap().text, "doc");

        let tree = SyntaxTree::parse_puppet("manifests/init.pp", "class foo {}\n").unwrap();
        assert_eq!(tree.grammar(), Grammar::Puppet);
        let SyntaxRoot::Puppet(manifest) = tree.root() else {
            panic!("expected manifest");
        };
        assert_eq!(manifest.definitions[0].name, "foo");
    }

    #[test]
    fn test_text_slices_source() {
        let tree = SyntaxTree::parse_ruby("a.rb", "confine :true => x\n").unwrap();
        assert_eq!(tree.text(Span::new(8, 13)), ":true");
        assert_eq!(tree.text(Span::new(100, 120)), "");
    }
}
