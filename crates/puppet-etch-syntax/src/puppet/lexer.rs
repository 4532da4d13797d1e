//! Lexer for the Puppet language
//!
//! Only the tokens needed to find declarations and balance brackets are
//! distinguished. Strings, heredocs, regular expressions and block comments
//! are scanned by hand so that brackets inside them are never counted.

use crate::comment::{Comment, Comments};
use crate::error::{SyntaxError, SyntaxErrorKind, SyntaxResult};
use crate::span::{LineIndex, Span};
use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum PuppetToken {
    #[regex(r"#[^\n]*")]
    Comment,
    #[token("/*")]
    BlockCommentStart,

    #[token("class")]
    Class,
    #[token("define")]
    Define,
    #[token("function")]
    Function,
    #[token("type")]
    Type,
    #[token("plan")]
    Plan,
    #[token("inherits")]
    Inherits,

    #[regex(r"\$(::)?[a-z_][A-Za-z0-9_]*(::[a-z_][A-Za-z0-9_]*)*")]
    Variable,
    #[regex(r"(::)?[a-z_][A-Za-z0-9_]*(::[a-z_][A-Za-z0-9_]*)*")]
    Name,
    #[regex(r"(::)?[A-Z][A-Za-z0-9_]*(::[A-Z][A-Za-z0-9_]*)*")]
    TypeName,
    #[regex(r"[0-9][A-Za-z0-9_.]*")]
    Number,

    #[token("'")]
    SingleQuote,
    #[token("\"")]
    DoubleQuote,
    #[regex(r"@\([^)\n]*\)")]
    HeredocStart,
    /// A complete string or heredoc (produced by the lexer)
    Str,
    /// A complete regular expression (produced by the lexer)
    Regex,

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token("=")]
    Assign,
    #[token("=>")]
    FatArrow,
    #[token(">>")]
    ReturnArrow,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[regex(r"[-+%<>!|&.?@^~:;]")]
    Operator,

    Unknown,
    Eof,
}

impl PuppetToken {
    const fn ends_value(&self) -> bool {
        matches!(
            self,
            Self::Variable
                | Self::Name
                | Self::TypeName
                | Self::Number
                | Self::Str
                | Self::Regex
                | Self::RParen
                | Self::RBracket
                | Self::RBrace
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: PuppetToken,
    pub span: Span,
}

pub struct Lexer<'source> {
    source: &'source str,
    index: &'source LineIndex,
    position: usize,
    tokens: Vec<Token>,
    comments: Comments,
    /// Byte ranges of heredoc bodies, skipped when reached
    heredoc_bodies: Vec<(usize, usize)>,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str, index: &'source LineIndex) -> Self {
        Self {
            source,
            index,
            position: 0,
            tokens: Vec::new(),
            comments: Comments::new(),
            heredoc_bodies: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> SyntaxResult<(Vec<Token>, Comments)> {
        while self.position < self.source.len() {
            let remaining = &self.source[self.position..];
            let mut logos_lexer = PuppetToken::lexer(remaining);
            let Some(result) = logos_lexer.next() else {
                break;
            };
            let range = logos_lexer.span();
            let start = self.position + range.start;
            let end = self.position + range.end;

            if let Some(&(_, body_end)) = self
                .heredoc_bodies
                .iter()
                .find(|(body_start, body_end)| start >= *body_start && start < *body_end)
            {
                self.position = body_end;
                continue;
            }

            self.position = end;
            match result {
                Ok(PuppetToken::Comment) => {
                    let own_line = self.source[..start]
                        .rsplit('\n')
                        .next()
                        .map_or(true, |prefix| prefix.trim().is_empty());
                    self.comments.push(Comment::from_source(
                        &self.source[start..end],
                        self.index.line(start),
                        own_line,
                    ));
                }
                Ok(PuppetToken::BlockCommentStart) => {
                    let close = self.source[end..]
                        .find("*/")
                        .ok_or_else(|| self.error(SyntaxErrorKind::UnterminatedComment, start))?;
                    self.position = end + close + 2;
                }
                Ok(PuppetToken::SingleQuote) => {
                    let after = self.scan_string(start, end, '\'')?;
                    self.push(PuppetToken::Str, start, after);
                }
                Ok(PuppetToken::DoubleQuote) => {
                    let after = self.scan_string(start, end, '"')?;
                    self.push(PuppetToken::Str, start, after);
                }
                Ok(PuppetToken::HeredocStart) => {
                    self.register_heredoc(start, end)?;
                    self.push(PuppetToken::Str, start, end);
                }
                Ok(PuppetToken::Slash) if self.regex_allowed() => {
                    let after = self.scan_regex(start, end)?;
                    self.push(PuppetToken::Regex, start, after);
                }
                Ok(kind) => self.push(kind, start, end),
                Err(()) => {
                    let width = self.source[start..]
                        .chars()
                        .next()
                        .map_or(1, char::len_utf8);
                    self.push(PuppetToken::Unknown, start, start + width);
                }
            }
        }

        let eof = self.source.len();
        self.tokens.push(Token {
            kind: PuppetToken::Eof,
            span: Span::new(eof, eof),
        });
        Ok((self.tokens, self.comments))
    }

    fn push(&mut self, kind: PuppetToken, start: usize, end: usize) {
        self.tokens.push(Token {
            kind,
            span: Span::new(start, end),
        });
        self.position = end;
    }

    fn regex_allowed(&self) -> bool {
        self.tokens.last().map_or(true, |t| !t.kind.ends_value())
    }

    /// Find the body of the heredoc whose header is at `start..end`
    fn register_heredoc(&mut self, start: usize, end: usize) -> SyntaxResult<()> {
        let header = &self.source[start + 2..end - 1];
        let tag = header
            .split([':', '/'])
            .next()
            .unwrap_or_default()
            .trim()
            .trim_matches('"')
            .to_string();

        let mut body_start = self.source[end..]
            .find('\n')
            .map_or(self.source.len(), |i| end + i + 1);
        while let Some(&(_, previous_end)) =
            self.heredoc_bodies.iter().find(|(s, _)| *s == body_start)
        {
            body_start = previous_end;
        }

        let mut offset = body_start;
        while offset < self.source.len() {
            let line_end = self.source[offset..]
                .find('\n')
                .map_or(self.source.len(), |i| offset + i);
            let line = self.source[offset..line_end].trim();
            let marker = line.trim_start_matches('|').trim_start();
            let marker = marker.trim_start_matches('-').trim_start();
            if marker == tag {
                let body_end = (line_end + 1).min(self.source.len());
                self.heredoc_bodies.push((body_start, body_end));
                return Ok(());
            }
            offset = line_end + 1;
        }
        Err(self.error(SyntaxErrorKind::UnterminatedHeredoc(tag), start))
    }

    fn scan_string(&self, start: usize, body_start: usize, quote: char) -> SyntaxResult<usize> {
        let mut chars = self.source[body_start..].char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    chars.next();
                }
                '$' if quote == '"' && chars.peek().map(|(_, c)| *c) == Some('{') => {
                    chars.next();
                    let mut depth = 1usize;
                    for (_, inner) in chars.by_ref() {
                        match inner {
                            '{' => depth += 1,
                            '}' => {
                                depth -= 1;
                                if depth == 0 {
                                    break;
                                }
                            }
                            _ => {}
                        }
                    }
                }
                c if c == quote => return Ok(body_start + i + 1),
                _ => {}
            }
        }
        Err(self.error(SyntaxErrorKind::UnterminatedString, start))
    }

    fn scan_regex(&self, start: usize, body_start: usize) -> SyntaxResult<usize> {
        let mut chars = self.source[body_start..].char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    chars.next();
                }
                '\n' => break,
                '/' => return Ok(body_start + i + 1),
                _ => {}
            }
        }
        Err(self.error(SyntaxErrorKind::UnterminatedRegex, start))
    }

    fn error(&self, kind: SyntaxErrorKind, offset: usize) -> SyntaxError {
        let (line, col) = self.index.line_col(offset);
        SyntaxError::new(kind, line, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<PuppetToken> {
        let index = LineIndex::new(source);
        let (tokens, _) = Lexer::new(source, &index).tokenize().unwrap();
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_declaration_header() {
        assert_eq!(
            kinds("class mymod::foo(String $x = 'a') inherits mymod {}"),
            vec![
                PuppetToken::Class,
                PuppetToken::Name,
                PuppetToken::LParen,
                PuppetToken::TypeName,
                PuppetToken::Variable,
                PuppetToken::Assign,
                PuppetToken::Str,
                PuppetToken::RParen,
                PuppetToken::Inherits,
                PuppetToken::Name,
                PuppetToken::LBrace,
                PuppetToken::RBrace,
                PuppetToken::Eof,
            ]
        );
    }

    #[test]
    fn test_braces_in_strings_and_heredocs_are_hidden() {
        let source = "$a = \"${b} }\"\n$c = @(END)\n  { not a brace\n  | END\n$d = 1\n";
        let all = kinds(source);
        assert!(!all.contains(&PuppetToken::RBrace));
        assert!(!all.contains(&PuppetToken::LBrace));
        assert_eq!(all.iter().filter(|k| **k == PuppetToken::Variable).count(), 3);
    }

    #[test]
    fn test_regex_versus_division() {
        assert!(kinds("$x =~ /a{2}/").contains(&PuppetToken::Regex));
        assert!(kinds("$x / 2").contains(&PuppetToken::Slash));
    }

    #[test]
    fn test_block_comment_is_skipped() {
        assert_eq!(
            kinds("/* { */ class"),
            vec![PuppetToken::Class, PuppetToken::Eof]
        );
    }

    #[test]
    fn test_unterminated_heredoc() {
        let source = "$c = @(END)\nnever closed\n";
        let index = LineIndex::new(source);
        let err = Lexer::new(source, &index).tokenize().unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnterminatedHeredoc("END".to_string()));
    }
}
