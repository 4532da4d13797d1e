//! Lexer for the Ruby grammar
//!
//! Plain tokens come from logos. String-like literals are scanned by hand:
//! logos reports the opening delimiter, then the lexer walks the source to
//! the closing delimiter and emits a single literal token. Heredoc bodies
//! are read when the line holding their opening marker ends.

use super::ast::StrLit;
use super::token::TokenKind;
use crate::comment::{Comment, Comments};
use crate::error::{SyntaxError, SyntaxErrorKind, SyntaxResult};
use crate::span::{LineIndex, Span};
use logos::Logos;

/// A token with its kind, span, and decoded literal value
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// Whether whitespace directly precedes the token
    pub space_before: bool,
    /// Decoded value of string-like tokens
    pub literal: Option<StrLit>,
    /// Entries of `%w` / `%i` lists
    pub words: Vec<String>,
}

impl Token {
    fn new(kind: TokenKind, span: Span, space_before: bool) -> Self {
        Self {
            kind,
            span,
            space_before,
            literal: None,
            words: Vec::new(),
        }
    }
}

/// How the body of a delimited literal is decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decoding {
    /// Single-quote rules: only the delimiters and `\\` are escapes
    Raw,
    /// Double-quote rules: escapes and `#{}` interpolation
    Interpolating,
}

#[derive(Debug)]
struct PendingHeredoc {
    token: usize,
    tag: String,
    indented_terminator: bool,
    squiggly: bool,
    decoding: Decoding,
}

/// The Ruby lexer
pub struct Lexer<'source> {
    source: &'source str,
    index: &'source LineIndex,
    position: usize,
    tokens: Vec<Token>,
    comments: Comments,
    pending_heredocs: Vec<PendingHeredoc>,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str, index: &'source LineIndex) -> Self {
        Self {
            source,
            index,
            position: 0,
            tokens: Vec::new(),
            comments: Comments::new(),
            pending_heredocs: Vec::new(),
        }
    }

    /// Tokenize the whole source. The last token is always `Eof`.
    pub fn tokenize(mut self) -> SyntaxResult<(Vec<Token>, Comments)> {
        loop {
            if self.at_line_start() {
                let rest = &self.source[self.position..];
                if rest.starts_with("=begin") {
                    self.skip_embedded_doc()?;
                    continue;
                }
                let data_marker = matches!(
                    rest.strip_prefix("__END__"),
                    Some(tail) if tail.is_empty() || tail.starts_with('\n') || tail.starts_with("\r\n")
                );
                if data_marker {
                    break;
                }
            }
            if self.position >= self.source.len() {
                break;
            }

            let remaining = &self.source[self.position..];
            let mut logos_lexer = TokenKind::lexer(remaining);
            let Some(result) = logos_lexer.next() else {
                self.position = self.source.len();
                break;
            };
            let range = logos_lexer.span();
            let start = self.position + range.start;
            let end = self.position + range.end;

            match result {
                Ok(kind) => self.handle(kind, start, end)?,
                Err(()) => {
                    let width = self.source[start..]
                        .chars()
                        .next()
                        .map(char::len_utf8)
                        .unwrap_or(1);
                    self.push(TokenKind::Unknown, start, start + width);
                    self.position = start + width;
                }
            }
        }

        if let Some(pending) = self.pending_heredocs.first() {
            let span = self.tokens[pending.token].span;
            return Err(self.error(
                SyntaxErrorKind::UnterminatedHeredoc(pending.tag.clone()),
                span.start,
            ));
        }

        let eof = self.source.len();
        self.tokens
            .push(Token::new(TokenKind::Eof, Span::new(eof, eof), true));
        Ok((self.tokens, self.comments))
    }

    fn handle(&mut self, kind: TokenKind, start: usize, end: usize) -> SyntaxResult<()> {
        self.position = end;
        match kind {
            TokenKind::Newline => {
                self.push(kind, start, end);
                if !self.pending_heredocs.is_empty() {
                    self.read_heredoc_bodies()?;
                }
            }
            TokenKind::Comment => {
                let line = self.index.line(start);
                let own_line = self.source[..start]
                    .rsplit('\n')
                    .next()
                    .map_or(true, |prefix| prefix.trim().is_empty());
                self.comments.push(Comment::from_source(
                    &self.source[start..end],
                    line,
                    own_line,
                ));
            }
            TokenKind::SingleQuote => {
                let (value, after) = self.scan_literal(start, end, None, '\'', Decoding::Raw)?;
                self.push_literal(TokenKind::Str, start, after, value);
            }
            TokenKind::DoubleQuote => {
                let (value, after) =
                    self.scan_literal(start, end, None, '"', Decoding::Interpolating)?;
                self.push_literal(TokenKind::Str, start, after, value);
            }
            TokenKind::Backtick => {
                let (value, after) =
                    self.scan_literal(start, end, None, '`', Decoding::Interpolating)?;
                self.push_literal(TokenKind::XStr, start, after, value);
            }
            TokenKind::SymbolQuote => {
                let quote = if self.source[start..end].ends_with('\'') {
                    ('\'', Decoding::Raw)
                } else {
                    ('"', Decoding::Interpolating)
                };
                let (value, after) = self.scan_literal(start, end, None, quote.0, quote.1)?;
                self.push_literal(TokenKind::QuotedSymbol, start, after, value);
            }
            TokenKind::PercentStart => self.handle_percent(start, end)?,
            TokenKind::HeredocStart => self.handle_heredoc_start(start, end),
            TokenKind::Slash => {
                if self.value_may_start(start) {
                    let after = self.scan_regex(start, end)?;
                    self.push(TokenKind::Regex, start, after);
                    self.position = after;
                } else {
                    self.push(kind, start, end);
                }
            }
            TokenKind::Symbol => {
                let end = self.setter_symbol_end(start, end);
                self.push(kind, start, end);
                self.position = end;
            }
            TokenKind::Ident | TokenKind::Constant => self.push_name(kind, start, end),
            k if k.is_keyword() => self.push_name(kind, start, end),
            _ => self.push(kind, start, end),
        }
        Ok(())
    }

    /// End of a symbol, extended over a trailing `=` for setter names
    /// (`:value=`) but not for `:key=>`, `:a==` or `:a=~`
    fn setter_symbol_end(&self, start: usize, end: usize) -> usize {
        let bytes = self.source.as_bytes();
        let plain_name = bytes[end - 1].is_ascii_alphanumeric() || bytes[end - 1] == b'_';
        let setter = plain_name
            && bytes.get(start + 1) != Some(&b'@')
            && bytes.get(end) == Some(&b'=')
            && !matches!(bytes.get(end + 1), Some(b'>' | b'=' | b'~'));
        if setter {
            end + 1
        } else {
            end
        }
    }

    /// Names directly followed by a single `:` are hash labels
    fn push_name(&mut self, kind: TokenKind, start: usize, end: usize) {
        let bytes = self.source.as_bytes();
        let is_label = bytes.get(end) == Some(&b':')
            && bytes.get(end + 1) != Some(&b':')
            && !matches!(
                self.last_kind(),
                Some(TokenKind::Question | TokenKind::Dot | TokenKind::SafeNav)
            );
        if is_label {
            self.push(TokenKind::Label, start, end + 1);
            self.position = end + 1;
        } else {
            self.push(kind, start, end);
        }
    }

    fn handle_percent(&mut self, start: usize, end: usize) -> SyntaxResult<()> {
        if !self.value_may_start(start) {
            self.push(TokenKind::Operator, start, start + 1);
            self.position = start + 1;
            return Ok(());
        }

        let marker = &self.source[start + 1..end];
        let (flavor, open) = match marker.chars().count() {
            1 => ('Q', marker.chars().next().unwrap_or('(')),
            _ => {
                let mut chars = marker.chars();
                let flavor = chars.next().unwrap_or('Q');
                (flavor, chars.next().unwrap_or('('))
            }
        };
        let close = match open {
            '(' => ')',
            '[' => ']',
            '{' => '}',
            '<' => '>',
            other => other,
        };
        let nesting = (open != close).then_some(open);

        match flavor {
            'w' | 'W' | 'i' | 'I' => {
                let (value, after) = self.scan_literal(start, end, nesting, close, Decoding::Raw)?;
                let kind = if matches!(flavor, 'w' | 'W') {
                    TokenKind::Words
                } else {
                    TokenKind::SymbolWords
                };
                let mut token = Token::new(kind, Span::new(start, after), self.space_before(start));
                token.words = value.value.split_whitespace().map(str::to_string).collect();
                self.tokens.push(token);
                self.position = after;
            }
            'r' => {
                let (_, after) =
                    self.scan_literal(start, end, nesting, close, Decoding::Interpolating)?;
                let flags_end = after
                    + self.source[after..]
                        .bytes()
                        .take_while(u8::is_ascii_alphabetic)
                        .count();
                self.push(TokenKind::Regex, start, flags_end);
                self.position = flags_end;
            }
            'q' => {
                let (value, after) = self.scan_literal(start, end, nesting, close, Decoding::Raw)?;
                self.push_literal(TokenKind::Str, start, after, value);
            }
            _ => {
                let (value, after) =
                    self.scan_literal(start, end, nesting, close, Decoding::Interpolating)?;
                self.push_literal(TokenKind::Str, start, after, value);
            }
        }
        Ok(())
    }

    fn handle_heredoc_start(&mut self, start: usize, end: usize) {
        if !self.value_may_start(start) {
            self.push(TokenKind::Operator, start, start + 2);
            self.position = start + 2;
            return;
        }

        let mut marker = &self.source[start + 2..end];
        let squiggly = marker.starts_with('~');
        let indented_terminator = squiggly || marker.starts_with('-');
        if indented_terminator {
            marker = &marker[1..];
        }
        let (tag, decoding) = if let Some(inner) = marker.strip_prefix('\'') {
            (inner.trim_end_matches('\''), Decoding::Raw)
        } else if let Some(inner) = marker.strip_prefix('"') {
            (inner.trim_end_matches('"'), Decoding::Interpolating)
        } else {
            (marker, Decoding::Interpolating)
        };

        self.pending_heredocs.push(PendingHeredoc {
            token: self.tokens.len(),
            tag: tag.to_string(),
            indented_terminator,
            squiggly,
            decoding,
        });
        self.push_literal(
            TokenKind::Str,
            start,
            end,
            StrLit {
                value: String::new(),
                interpolated: false,
            },
        );
    }

    /// Read the bodies of all heredocs opened on the line that just ended
    fn read_heredoc_bodies(&mut self) -> SyntaxResult<()> {
        let pending = std::mem::take(&mut self.pending_heredocs);
        for heredoc in pending {
            let mut lines: Vec<&str> = Vec::new();
            loop {
                if self.position >= self.source.len() {
                    let span = self.tokens[heredoc.token].span;
                    return Err(self.error(
                        SyntaxErrorKind::UnterminatedHeredoc(heredoc.tag.clone()),
                        span.start,
                    ));
                }
                let line_end = self.source[self.position..]
                    .find('\n')
                    .map_or(self.source.len(), |i| self.position + i);
                let line = self.source[self.position..line_end].trim_end_matches('\r');
                self.position = (line_end + 1).min(self.source.len());

                let terminated = if heredoc.indented_terminator {
                    line.trim() == heredoc.tag
                } else {
                    line == heredoc.tag
                };
                if terminated {
                    break;
                }
                lines.push(line);
            }

            let lines = if heredoc.squiggly {
                dedent(&lines)
            } else {
                lines.iter().map(|l| l.to_string()).collect()
            };
            let mut body = lines.join("\n");
            if !lines.is_empty() {
                body.push('\n');
            }
            let value = match heredoc.decoding {
                Decoding::Raw => StrLit {
                    value: body,
                    interpolated: false,
                },
                Decoding::Interpolating => decode_interpolating(&body),
            };
            self.tokens[heredoc.token].literal = Some(value);
        }
        Ok(())
    }

    /// Scan a delimited literal whose opening delimiter ends at `body_start`.
    /// Returns the decoded value and the offset just past the closing delimiter.
    fn scan_literal(
        &self,
        start: usize,
        body_start: usize,
        open: Option<char>,
        close: char,
        decoding: Decoding,
    ) -> SyntaxResult<(StrLit, usize)> {
        let mut depth = 0usize;
        let mut chars = self.source[body_start..].char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    chars.next();
                }
                '#' if decoding == Decoding::Interpolating
                    && chars.peek().map(|(_, c)| *c) == Some('{') =>
                {
                    chars.next();
                    let mut braces = 1usize;
                    for (_, inner) in chars.by_ref() {
                        match inner {
                            '{' => braces += 1,
                            '}' => {
                                braces -= 1;
                                if braces == 0 {
                                    break;
                                }
                            }
                            _ => {}
                        }
                    }
                }
                c if Some(c) == open => depth += 1,
                c if c == close => {
                    if depth == 0 {
                        let body = &self.source[body_start..body_start + i];
                        let value = match decoding {
                            Decoding::Raw => decode_raw(body, open, close),
                            Decoding::Interpolating => decode_interpolating(body),
                        };
                        return Ok((value, body_start + i + c.len_utf8()));
                    }
                    depth -= 1;
                }
                _ => {}
            }
        }
        Err(self.error(SyntaxErrorKind::UnterminatedString, start))
    }

    fn scan_regex(&self, start: usize, body_start: usize) -> SyntaxResult<usize> {
        let mut in_class = false;
        let mut chars = self.source[body_start..].char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    chars.next();
                }
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => {
                    let after = body_start + i + 1;
                    let flags = self.source[after..]
                        .bytes()
                        .take_while(u8::is_ascii_alphabetic)
                        .count();
                    return Ok(after + flags);
                }
                _ => {}
            }
        }
        Err(self.error(SyntaxErrorKind::UnterminatedRegex, start))
    }

    fn skip_embedded_doc(&mut self) -> SyntaxResult<()> {
        let start = self.position;
        let mut offset = self.position;
        loop {
            let line_end = self.source[offset..]
                .find('\n')
                .map_or(self.source.len(), |i| offset + i);
            if offset != start && self.source[offset..line_end].starts_with("=end") {
                self.position = (line_end + 1).min(self.source.len());
                return Ok(());
            }
            if line_end >= self.source.len() {
                return Err(self.error(SyntaxErrorKind::UnterminatedComment, start));
            }
            offset = line_end + 1;
        }
    }

    /// Whether a literal may begin at `start`, judged from the previous token
    fn value_may_start(&self, start: usize) -> bool {
        match self.tokens.last() {
            None => true,
            Some(prev) if prev.kind.ends_value() => {
                // `foo /re/` and `foo %w[a]` are command arguments
                prev.kind == TokenKind::Ident
                    && self.space_before(start)
                    && !self.source[start + 1..].starts_with([' ', '='])
            }
            Some(_) => true,
        }
    }

    fn at_line_start(&self) -> bool {
        self.position == 0 || self.source.as_bytes().get(self.position - 1) == Some(&b'\n')
    }

    fn space_before(&self, start: usize) -> bool {
        start == 0
            || matches!(
                self.source.as_bytes()[start - 1],
                b' ' | b'\t' | b'\n' | b'\r' | b'\\'
            )
    }

    fn last_kind(&self) -> Option<TokenKind> {
        self.tokens.last().map(|t| t.kind)
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        let token = Token::new(kind, Span::new(start, end), self.space_before(start));
        self.tokens.push(token);
    }

    fn push_literal(&mut self, kind: TokenKind, start: usize, end: usize, value: StrLit) {
        let mut token = Token::new(kind, Span::new(start, end), self.space_before(start));
        token.literal = Some(value);
        self.tokens.push(token);
        self.position = end;
    }

    fn error(&self, kind: SyntaxErrorKind, offset: usize) -> SyntaxError {
        let (line, col) = self.index.line_col(offset);
        SyntaxError::new(kind, line, col)
    }
}

/// Decode a single-quoted body: only `\\` and escaped delimiters are escapes
fn decode_raw(body: &str, open: Option<char>, close: char) -> StrLit {
    let mut value = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek().copied() {
                Some(next) if next == '\\' || next == close || Some(next) == open => {
                    value.push(next);
                    chars.next();
                }
                _ => value.push(c),
            }
        } else {
            value.push(c);
        }
    }
    StrLit {
        value,
        interpolated: false,
    }
}

/// Decode a double-quoted body, flagging any interpolation
fn decode_interpolating(body: &str) -> StrLit {
    let mut value = String::with_capacity(body.len());
    let mut interpolated = false;
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some('r') => value.push('\r'),
                Some('s') => value.push(' '),
                Some('0') => value.push('\0'),
                Some('e') => value.push('\u{1b}'),
                Some('a') => value.push('\u{07}'),
                Some('b') => value.push('\u{08}'),
                Some('f') => value.push('\u{0c}'),
                Some('v') => value.push('\u{0b}'),
                Some('\n') => {}
                Some(other) => value.push(other),
                None => value.push('\\'),
            },
            '#' if matches!(chars.peek(), Some('{') | Some('@') | Some('$')) => {
                interpolated = true;
                value.push(c);
            }
            _ => value.push(c),
        }
    }
    StrLit {
        value,
        interpolated,
    }
}

/// Remove the common leading indentation of non-blank lines (`<<~`)
fn dedent(lines: &[&str]) -> Vec<String> {
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| {
            if l.len() >= indent {
                l[indent..].to_string()
            } else {
                String::new()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        let index = LineIndex::new(source);
        let (tokens, _) = Lexer::new(source, &index).tokenize().unwrap();
        tokens
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_scope_and_symbols() {
        assert_eq!(
            kinds("Puppet::Type.type(:database)"),
            vec![
                TokenKind::Constant,
                TokenKind::ColonColon,
                TokenKind::Constant,
                TokenKind::Dot,
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::Symbol,
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_old_style_hash_symbol_key() {
        assert_eq!(
            kinds(":osfamily=>:redhat"),
            vec![
                TokenKind::Symbol,
                TokenKind::FatArrow,
                TokenKind::Symbol,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_setter_and_operator_symbols() {
        let source = "[:value=, :a?, :[]=, :<=>, :-@, :+, :==]";
        let tokens = lex(source);
        let symbols: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Symbol)
            .map(|t| &source[t.span.as_range()])
            .collect();
        assert_eq!(
            symbols,
            vec![":value=", ":a?", ":[]=", ":<=>", ":-@", ":+", ":=="]
        );
        assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::Comma).count(), 6);
    }

    #[test]
    fn test_symbol_before_fat_arrow_is_not_a_setter() {
        assert_eq!(
            kinds(":ensure=>:present"),
            vec![
                TokenKind::Symbol,
                TokenKind::FatArrow,
                TokenKind::Symbol,
                TokenKind::Eof
            ]
        );
        assert_eq!(
            kinds(":a==:b"),
            vec![
                TokenKind::Symbol,
                TokenKind::Operator,
                TokenKind::Symbol,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_labels() {
        let tokens = lex("confine osfamily: 'RedHat'");
        assert_eq!(tokens[1].kind, TokenKind::Label);
        assert_eq!(tokens[2].kind, TokenKind::Str);
    }

    #[test]
    fn test_single_and_double_quoted_strings() {
        let tokens = lex(r#"'it\'s' "tab\there" "x#{y}""#);
        assert_eq!(tokens[0].literal.as_ref().unwrap().value, "it's");
        assert_eq!(tokens[1].literal.as_ref().unwrap().value, "tab\there");
        assert!(!tokens[1].literal.as_ref().unwrap().interpolated);
        assert!(tokens[2].literal.as_ref().unwrap().interpolated);
    }

    #[test]
    fn test_heredoc_bodies() {
        let source = "desc <<-EOT\n  Manages things.\n  EOT\nfoo";
        let tokens = lex(source);
        assert_eq!(tokens[1].kind, TokenKind::Str);
        assert_eq!(
            tokens[1].literal.as_ref().unwrap().value,
            "  Manages things.\n"
        );
        assert_eq!(tokens[2].kind, TokenKind::Newline);
        assert_eq!(tokens[3].kind, TokenKind::Ident);
    }

    #[test]
    fn test_squiggly_heredoc_dedents() {
        let tokens = lex("x = <<~EOT\n    a\n      b\n  EOT\n");
        assert_eq!(tokens[2].literal.as_ref().unwrap().value, "a\n  b\n");
    }

    #[test]
    fn test_unterminated_heredoc_is_an_error() {
        let index = LineIndex::new("desc <<-EOT\nnever closed\n");
        let result = Lexer::new("desc <<-EOT\nnever closed\n", &index).tokenize();
        assert!(matches!(
            result.unwrap_err().kind,
            SyntaxErrorKind::UnterminatedHeredoc(_)
        ));
    }

    #[test]
    fn test_regex_versus_division() {
        assert_eq!(kinds("a / b")[1], TokenKind::Slash);
        assert_eq!(kinds("x = /ab+c/i")[2], TokenKind::Regex);
    }

    #[test]
    fn test_percent_words() {
        let tokens = lex("%w[a b c]");
        assert_eq!(tokens[0].kind, TokenKind::Words);
        assert_eq!(tokens[0].words, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_comments_are_collected() {
        let index = LineIndex::new("# doc\nfoo # trailing\n");
        let (_, comments) = Lexer::new("# doc\nfoo # trailing\n", &index)
            .tokenize()
            .unwrap();
        let all: Vec<_> = comments.iter().collect();
        assert_eq!(all.len(), 2);
        assert!(all[0].own_line);
        assert!(!all[1].own_line);
    }

    #[test]
    fn test_embedded_document_is_skipped() {
        assert_eq!(
            kinds("=begin\nignored\n=end\nfoo"),
            vec![TokenKind::Ident, TokenKind::Eof]
        );
    }
}
