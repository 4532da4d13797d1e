//! Line comments and documentation comment blocks
//!
//! Both grammars use `#` line comments. A documentation block is a run of
//! comments that each sit alone on their line, on consecutive lines, ending
//! on the line directly above a declaration.

/// A single `#` comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// 1-indexed line of the comment
    pub line: usize,
    /// Text after the `#` marker (one leading space removed)
    pub text: String,
    /// Whether the comment is the only thing on its line
    pub own_line: bool,
}

impl Comment {
    /// Build a comment from its raw source, including the `#` marker
    pub fn from_source(raw: &str, line: usize, own_line: bool) -> Self {
        let body = raw.strip_prefix('#').unwrap_or(raw);
        let body = body.strip_prefix(' ').unwrap_or(body);
        Self {
            line,
            text: body.trim_end().to_string(),
            own_line,
        }
    }
}

/// A contiguous block of own-line comments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBlock {
    pub start_line: usize,
    pub end_line: usize,
    /// Comment texts joined with newlines
    pub text: String,
}

/// All comments of a file in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comments {
    comments: Vec<Comment>,
}

impl Comments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, comment: Comment) {
        self.comments.push(comment);
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Comment> {
        self.comments.iter()
    }

    /// The documentation block ending on the line directly above `line`
    pub fn block_before(&self, line: usize) -> Option<CommentBlock> {
        let target = line.checked_sub(1)?;
        let end_idx = self
            .comments
            .iter()
            .rposition(|c| c.own_line && c.line == target)?;

        let mut start_idx = end_idx;
        while start_idx > 0 {
            let prev = &self.comments[start_idx - 1];
            let current = &self.comments[start_idx];
            if prev.own_line && prev.line + 1 == current.line {
                start_idx -= 1;
            } else {
                break;
            }
        }

        let block = &self.comments[start_idx..=end_idx];
        Some(CommentBlock {
            start_line: block[0].line,
            end_line: target,
            text: block
                .iter()
                .map(|c| c.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        })
    }
}
