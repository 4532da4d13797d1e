//! Declaration parser for Puppet manifests
//!
//! Statements other than declarations are skipped token by token while
//! keeping brackets balanced, so declarations nested in class bodies are
//! still found.

use super::ast::{Definition, DefinitionKind, Manifest, Parameter};
use super::lexer::{PuppetToken, Token};
use crate::error::{SyntaxError, SyntaxErrorKind, SyntaxResult};
use crate::span::{LineIndex, Span};

pub struct Parser<'source> {
    source: &'source str,
    index: &'source LineIndex,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'source> Parser<'source> {
    pub fn new(source: &'source str, index: &'source LineIndex, tokens: Vec<Token>) -> Self {
        Self {
            source,
            index,
            tokens,
            pos: 0,
        }
    }

    pub fn parse_manifest(mut self) -> SyntaxResult<Manifest> {
        let definitions = self.parse_items(None)?;
        Ok(Manifest { definitions })
    }

    fn peek(&self) -> Token {
        self.nth(0)
    }

    fn nth(&self, n: usize) -> Token {
        self.tokens[(self.pos + n).min(self.tokens.len() - 1)]
    }

    fn at(&self, kind: PuppetToken) -> bool {
        self.peek().kind == kind
    }

    fn bump(&mut self) -> Token {
        let token = self.peek();
        if token.kind != PuppetToken::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: PuppetToken) -> bool {
        let found = self.at(kind);
        if found {
            self.bump();
        }
        found
    }

    fn expect(&mut self, kind: PuppetToken, expected: &str) -> SyntaxResult<Token> {
        if self.at(kind) {
            return Ok(self.bump());
        }
        let token = self.peek();
        let error = if token.kind == PuppetToken::Eof {
            SyntaxErrorKind::UnexpectedEof(expected.to_string())
        } else {
            SyntaxErrorKind::Unexpected {
                found: self.text(token.span).to_string(),
                expected: expected.to_string(),
            }
        };
        Err(self.error(error, token.span.start))
    }

    fn text(&self, span: Span) -> &'source str {
        &self.source[span.as_range()]
    }

    fn prev_end(&self) -> usize {
        self.pos.checked_sub(1).map_or(0, |i| self.tokens[i].span.end)
    }

    fn error(&self, kind: SyntaxErrorKind, offset: usize) -> SyntaxError {
        let (line, col) = self.index.line_col(offset);
        SyntaxError::new(kind, line, col)
    }

    /// Walk statements until end of file, or until the `}` closing the body
    /// opened by `opener` (left unconsumed)
    fn parse_items(&mut self, opener: Option<Token>) -> SyntaxResult<Vec<Definition>> {
        let mut definitions = Vec::new();
        let mut open: Vec<Token> = Vec::new();
        loop {
            let token = self.peek();
            match token.kind {
                PuppetToken::Eof => {
                    if let Some(unclosed) = open.last().or(opener.as_ref()) {
                        return Err(self.error(
                            SyntaxErrorKind::UnexpectedEof(format!(
                                "closing bracket for '{}'",
                                self.text(unclosed.span)
                            )),
                            unclosed.span.start,
                        ));
                    }
                    break;
                }
                PuppetToken::LBrace | PuppetToken::LParen | PuppetToken::LBracket => {
                    open.push(self.bump());
                }
                PuppetToken::RBrace | PuppetToken::RParen | PuppetToken::RBracket => {
                    match open.last().map(|t| t.kind) {
                        Some(last) if closes(last, token.kind) => {
                            open.pop();
                            self.bump();
                        }
                        None if opener.is_some() && token.kind == PuppetToken::RBrace => break,
                        _ => {
                            return Err(self.error(
                                SyntaxErrorKind::Unbalanced(self.text(token.span).to_string()),
                                token.span.start,
                            ))
                        }
                    }
                }
                PuppetToken::Class
                | PuppetToken::Define
                | PuppetToken::Function
                | PuppetToken::Plan
                | PuppetToken::Type
                    if open.is_empty() && self.declaration_follows() =>
                {
                    definitions.push(self.parse_definition()?);
                }
                _ => {
                    self.bump();
                }
            }
        }
        Ok(definitions)
    }

    fn declaration_follows(&self) -> bool {
        match self.peek().kind {
            PuppetToken::Type => {
                self.nth(1).kind == PuppetToken::TypeName && self.nth(2).kind == PuppetToken::Assign
            }
            _ => self.nth(1).kind == PuppetToken::Name,
        }
    }

    fn parse_definition(&mut self) -> SyntaxResult<Definition> {
        let keyword = self.bump();
        let start = keyword.span.start;
        let kind = match keyword.kind {
            PuppetToken::Class => DefinitionKind::Class,
            PuppetToken::Define => DefinitionKind::DefinedType,
            PuppetToken::Function => DefinitionKind::Function,
            PuppetToken::Plan => DefinitionKind::Plan,
            _ => DefinitionKind::TypeAlias,
        };
        let mut definition = Definition {
            kind,
            name: String::new(),
            params: Vec::new(),
            parent: None,
            return_type: None,
            aliased_type: None,
            span: keyword.span,
            line: self.index.line(start),
            nested: Vec::new(),
        };

        if kind == DefinitionKind::TypeAlias {
            let name = self.expect(PuppetToken::TypeName, "type name")?;
            definition.name = self.text(name.span).to_string();
            self.expect(PuppetToken::Assign, "'='")?;
            definition.aliased_type = Some(self.parse_type_expr()?);
            definition.span = Span::new(start, self.prev_end());
            return Ok(definition);
        }

        let name = self.expect(PuppetToken::Name, "name")?;
        definition.name = self.text(name.span).trim_start_matches("::").to_string();
        if self.at(PuppetToken::LParen) {
            definition.params = self.parse_params()?;
        }
        if self.eat(PuppetToken::Inherits) {
            let parent = self.bump();
            definition.parent = Some(self.text(parent.span).to_string());
        }
        if self.eat(PuppetToken::ReturnArrow) {
            definition.return_type = Some(self.parse_type_expr()?);
        }
        let lbrace = self.expect(PuppetToken::LBrace, "'{'")?;
        definition.nested = self.parse_items(Some(lbrace))?;
        self.expect(PuppetToken::RBrace, "'}'")?;
        definition.span = Span::new(start, self.prev_end());
        Ok(definition)
    }

    /// A type name with optional bracketed parameters, as written
    fn parse_type_expr(&mut self) -> SyntaxResult<String> {
        let start = self.bump().span.start;
        if self.at(PuppetToken::LBracket) {
            self.skip_balanced()?;
        }
        Ok(self.source[start..self.prev_end()].to_string())
    }

    /// Skip a bracketed group starting at the current opening token
    fn skip_balanced(&mut self) -> SyntaxResult<()> {
        let mut open = vec![self.bump()];
        while let Some(last) = open.last().copied() {
            let token = self.bump();
            match token.kind {
                PuppetToken::Eof => {
                    return Err(self.error(
                        SyntaxErrorKind::UnexpectedEof("closing bracket".to_string()),
                        last.span.start,
                    ))
                }
                PuppetToken::LBrace | PuppetToken::LParen | PuppetToken::LBracket => {
                    open.push(token)
                }
                PuppetToken::RBrace | PuppetToken::RParen | PuppetToken::RBracket => {
                    if !closes(last.kind, token.kind) {
                        return Err(self.error(
                            SyntaxErrorKind::Unbalanced(self.text(token.span).to_string()),
                            token.span.start,
                        ));
                    }
                    open.pop();
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn parse_params(&mut self) -> SyntaxResult<Vec<Parameter>> {
        self.expect(PuppetToken::LParen, "'('")?;
        let mut params = Vec::new();
        loop {
            if self.eat(PuppetToken::RParen) {
                break;
            }
            let line = self.index.line(self.peek().span.start);
            let type_expr = if self.at(PuppetToken::TypeName) {
                Some(self.parse_type_expr()?)
            } else {
                None
            };
            let captures_rest = self.eat(PuppetToken::Star);
            let variable = self.expect(PuppetToken::Variable, "parameter name")?;
            let name = self.text(variable.span)[1..].to_string();
            let default = if self.eat(PuppetToken::Assign) {
                Some(self.parse_default()?)
            } else {
                None
            };
            params.push(Parameter {
                name,
                type_expr,
                default,
                captures_rest,
                line,
            });
            if !self.eat(PuppetToken::Comma) && !self.at(PuppetToken::RParen) {
                let token = self.peek();
                return Err(self.error(
                    SyntaxErrorKind::Unexpected {
                        found: self.text(token.span).to_string(),
                        expected: "',' or ')'".to_string(),
                    },
                    token.span.start,
                ));
            }
        }
        Ok(params)
    }

    /// Default value text up to the next top-level `,` or `)`
    fn parse_default(&mut self) -> SyntaxResult<String> {
        let start = self.peek().span.start;
        loop {
            match self.peek().kind {
                PuppetToken::Comma | PuppetToken::RParen => break,
                PuppetToken::LBrace | PuppetToken::LParen | PuppetToken::LBracket => {
                    self.skip_balanced()?
                }
                PuppetToken::Eof => {
                    return Err(self.error(
                        SyntaxErrorKind::UnexpectedEof("')'".to_string()),
                        start,
                    ))
                }
                _ => {
                    self.bump();
                }
            }
        }
        Ok(self.source[start..self.prev_end().max(start)].trim().to_string())
    }
}

fn closes(open: PuppetToken, close: PuppetToken) -> bool {
    matches!(
        (open, close),
        (PuppetToken::LBrace, PuppetToken::RBrace)
            | (PuppetToken::LParen, PuppetToken::RParen)
            | (PuppetToken::LBracket, PuppetToken::RBracket)
    )
}
