//! Recursive descent parser for the Ruby grammar
//!
//! The parser is tolerant: tokens it cannot place in an expression become
//! opaque nodes and parsing continues. Only structural damage (an `end` or
//! closing bracket without an opener, or a file that ends inside a block)
//! is reported as a syntax error.

use super::ast::{Block, Call, NamespaceKind, Node, NodeKind, Param, ParamKind, StrLit};
use super::lexer::Token;
use super::token::TokenKind;
use crate::error::{SyntaxError, SyntaxErrorKind, SyntaxResult};
use crate::span::{LineIndex, Span};

pub struct Parser<'source> {
    source: &'source str,
    index: &'source LineIndex,
    tokens: Vec<Token>,
    pos: usize,
    /// Non-zero while a `do` must not bind to the innermost call
    no_do: usize,
}

impl<'source> Parser<'source> {
    pub fn new(source: &'source str, index: &'source LineIndex, tokens: Vec<Token>) -> Self {
        Self {
            source,
            index,
            tokens,
            pos: 0,
            no_do: 0,
        }
    }

    /// Parse a whole file into a statements node
    pub fn parse_program(mut self) -> SyntaxResult<Node> {
        let program = self.parse_statements(&[])?;
        if !self.at(TokenKind::Eof) {
            let token = self.peek().clone();
            return Err(self.error(
                SyntaxErrorKind::Unbalanced(self.text(&token).to_string()),
                token.span.start,
            ));
        }
        Ok(program)
    }

    // ========== Token helpers ==========

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn nth(&self, n: usize) -> &Token {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)]
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn bump_text(&mut self) -> &'source str {
        let token = self.bump();
        self.text(&token)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> SyntaxResult<Token> {
        if self.at(kind) {
            return Ok(self.bump());
        }
        let token = self.peek().clone();
        let kind = if token.kind == TokenKind::Eof {
            SyntaxErrorKind::UnexpectedEof(expected.to_string())
        } else {
            SyntaxErrorKind::Unexpected {
                found: self.text(&token).to_string(),
                expected: expected.to_string(),
            }
        };
        Err(self.error(kind, token.span.start))
    }

    fn skip_newlines(&mut self) {
        while self.at(TokenKind::Newline) {
            self.bump();
        }
    }

    fn skip_terms(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Semicolon) {
            self.bump();
        }
    }

    fn text(&self, token: &Token) -> &'source str {
        &self.source[token.span.as_range()]
    }

    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .map_or(0, |i| self.tokens[i].span.end)
    }

    fn node(&self, kind: NodeKind, start: usize) -> Node {
        let end = self.prev_end().max(start);
        Node::new(kind, Span::new(start, end), self.index.line(start))
    }

    fn error(&self, kind: SyntaxErrorKind, offset: usize) -> SyntaxError {
        let (line, col) = self.index.line_col(offset);
        SyntaxError::new(kind, line, col)
    }

    /// Run `f` in a bracketed context where `do` binds normally again
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> SyntaxResult<T>) -> SyntaxResult<T> {
        let saved = std::mem::replace(&mut self.no_do, 0);
        let result = f(self);
        self.no_do = saved;
        result
    }

    /// Run `f` with `do` blocks held back for an enclosing construct
    fn without_do<T>(&mut self, f: impl FnOnce(&mut Self) -> SyntaxResult<T>) -> SyntaxResult<T> {
        self.no_do += 1;
        let result = f(self);
        self.no_do -= 1;
        result
    }

    // ========== Statements ==========

    fn parse_statements(&mut self, terminators: &[TokenKind]) -> SyntaxResult<Node> {
        let start = self.peek().span.start;
        let mut statements = Vec::new();
        loop {
            self.skip_terms();
            let kind = self.peek_kind();
            if kind == TokenKind::Eof || terminators.contains(&kind) {
                break;
            }
            statements.push(self.parse_statement()?);
        }
        Ok(self.node(NodeKind::Statements(statements), start))
    }

    /// Statements of a `def`, `class`, `module`, `begin` or `do` body, with
    /// optional `rescue`/`else`/`ensure` clauses. Stops before `end`.
    fn parse_body(&mut self) -> SyntaxResult<Node> {
        use TokenKind::*;
        let start = self.peek().span.start;
        let body = self.parse_statements(&[Rescue, Else, Ensure, End])?;
        if !matches!(self.peek_kind(), Rescue | Else | Ensure) {
            return Ok(body);
        }

        let mut children = vec![body];
        while self.eat(Rescue) {
            let clause_start = self.prev_end();
            let mut parts = Vec::new();
            while !matches!(self.peek_kind(), Newline | Semicolon | Then | FatArrow | Eof) {
                parts.push(self.parse_ternary()?);
                if !self.eat(Comma) {
                    break;
                }
                self.skip_newlines();
            }
            if self.eat(FatArrow) {
                parts.push(self.parse_primary()?);
            }
            self.eat(Then);
            parts.push(self.parse_statements(&[Rescue, Else, Ensure, End])?);
            children.push(self.node(NodeKind::Opaque(parts), clause_start));
        }
        if self.eat(Else) {
            children.push(self.parse_statements(&[Ensure, End])?);
        }
        if self.eat(Ensure) {
            children.push(self.parse_statements(&[End])?);
        }
        Ok(self.node(
            NodeKind::Control {
                keyword: "begin".to_string(),
                children,
            },
            start,
        ))
    }

    fn parse_statement(&mut self) -> SyntaxResult<Node> {
        let start = self.peek().span.start;
        let mut statement = self.parse_expression_statement()?;
        loop {
            let keyword = match self.peek_kind() {
                TokenKind::If => "if",
                TokenKind::Unless => "unless",
                TokenKind::While => "while",
                TokenKind::Until => "until",
                TokenKind::Rescue => "rescue",
                _ => break,
            };
            self.bump();
            let condition = self.parse_expression_statement()?;
            statement = self.node(
                NodeKind::Control {
                    keyword: keyword.to_string(),
                    children: vec![statement, condition],
                },
                start,
            );
        }
        Ok(statement)
    }

    /// `not`, `and`, `or`
    fn parse_expression_statement(&mut self) -> SyntaxResult<Node> {
        let start = self.peek().span.start;
        let mut lhs = self.parse_not()?;
        while matches!(self.peek_kind(), TokenKind::And | TokenKind::Or) {
            let op = self.bump_text().to_string();
            self.skip_newlines();
            let rhs = self.parse_not()?;
            lhs = self.node(
                NodeKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                start,
            );
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> SyntaxResult<Node> {
        if self.at(TokenKind::Not) {
            let start = self.bump().span.start;
            let operand = self.parse_not()?;
            return Ok(self.node(
                NodeKind::Unary {
                    op: "not".to_string(),
                    operand: Box::new(operand),
                },
                start,
            ));
        }
        self.parse_expr()
    }

    // ========== Expressions ==========

    /// Assignment and everything below it
    fn parse_expr(&mut self) -> SyntaxResult<Node> {
        let start = self.peek().span.start;
        let target = self.parse_ternary()?;
        match self.peek_kind() {
            TokenKind::Assign if is_assignable(&target) => {
                self.bump();
                self.skip_newlines();
                let value = self.parse_assigned_value()?;
                Ok(self.node(
                    NodeKind::Assign {
                        target: Box::new(target),
                        value: Box::new(value),
                    },
                    start,
                ))
            }
            TokenKind::OpAssign if is_assignable(&target) => {
                let token = self.bump();
                let op = self.text(&token).to_string();
                self.skip_newlines();
                let value = self.parse_assigned_value()?;
                Ok(self.node(
                    NodeKind::OpAssign {
                        op,
                        target: Box::new(target),
                        value: Box::new(value),
                    },
                    start,
                ))
            }
            _ => Ok(target),
        }
    }

    fn parse_assigned_value(&mut self) -> SyntaxResult<Node> {
        let start = self.peek().span.start;
        let first = self.parse_expr()?;
        if !self.at(TokenKind::Comma) {
            return Ok(first);
        }
        // `a = 1, 2` builds an array
        let mut items = vec![first];
        while self.eat(TokenKind::Comma) {
            self.skip_newlines();
            items.push(self.parse_arg()?);
        }
        Ok(self.node(NodeKind::Array(items), start))
    }

    fn parse_ternary(&mut self) -> SyntaxResult<Node> {
        let start = self.peek().span.start;
        let condition = self.parse_binary(0)?;
        if !self.at(TokenKind::Question) {
            return Ok(condition);
        }
        self.bump();
        self.skip_newlines();
        let then_branch = self.parse_ternary()?;
        self.skip_newlines();
        let mut children = vec![condition, then_branch];
        if self.eat(TokenKind::Colon) {
            self.skip_newlines();
            children.push(self.parse_ternary()?);
        } else if self.at(TokenKind::Symbol) {
            // `a ? b :c` lexes the else branch as a symbol
            let token = self.bump();
            let name = self.text(&token)[1..].to_string();
            children.push(self.node(NodeKind::Ident(name), token.span.start + 1));
        }
        Ok(self.node(
            NodeKind::Control {
                keyword: "?".to_string(),
                children,
            },
            start,
        ))
    }

    /// Operator precedence and associativity of the next token, if binary
    fn binary_operator(&self) -> Option<(u8, bool)> {
        let token = self.peek();
        let prec = match token.kind {
            TokenKind::Range => 1,
            TokenKind::OrOr => 2,
            TokenKind::AndAnd => 3,
            TokenKind::Lt => 5,
            TokenKind::Pipe => 6,
            TokenKind::Amp => 7,
            TokenKind::Plus | TokenKind::Minus => 9,
            TokenKind::Star | TokenKind::Slash => 10,
            TokenKind::DoubleStar => return Some((12, true)),
            TokenKind::Operator => match self.text(token) {
                "==" | "!=" | "=~" | "!~" | "===" | "<=>" => 4,
                ">" | "<=" | ">=" => 5,
                "^" => 6,
                "<<" | ">>" => 8,
                "%" => 10,
                _ => return None,
            },
            _ => return None,
        };
        Some((prec, false))
    }

    fn parse_binary(&mut self, min_prec: u8) -> SyntaxResult<Node> {
        let start = self.peek().span.start;
        let mut lhs = self.parse_unary()?;
        while let Some((prec, right_assoc)) = self.binary_operator() {
            if prec < min_prec {
                break;
            }
            let token = self.bump();
            let op = self.text(&token).to_string();
            self.skip_newlines();
            let next_min = if right_assoc { prec } else { prec + 1 };
            let rhs = self.parse_binary(next_min)?;
            lhs = self.node(
                NodeKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                start,
            );
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> SyntaxResult<Node> {
        let start = self.peek().span.start;
        match self.peek_kind() {
            TokenKind::Bang | TokenKind::Plus => {
                let op = self.bump_text().to_string();
                let operand = self.parse_unary()?;
                Ok(self.unary(op, operand, start))
            }
            TokenKind::Operator if self.text(self.peek()) == "~" => {
                self.bump();
                let operand = self.parse_unary()?;
                Ok(self.unary("~".to_string(), operand, start))
            }
            TokenKind::Minus => {
                self.bump();
                if self.at(TokenKind::Number) && !self.peek().space_before {
                    let number = self.bump();
                    let text = format!("-{}", self.text(&number));
                    let literal = self.node(NodeKind::Number(text), start);
                    return self.parse_postfix(literal);
                }
                let operand = self.parse_unary()?;
                Ok(self.unary("-".to_string(), operand, start))
            }
            TokenKind::Star | TokenKind::DoubleStar => {
                let double = self.bump().kind == TokenKind::DoubleStar;
                let value = self.parse_unary()?;
                Ok(self.node(
                    NodeKind::Splat {
                        double,
                        value: Some(Box::new(value)),
                    },
                    start,
                ))
            }
            _ => {
                let primary = self.parse_primary()?;
                self.parse_postfix(primary)
            }
        }
    }

    fn unary(&self, op: String, operand: Node, start: usize) -> Node {
        self.node(
            NodeKind::Unary {
                op,
                operand: Box::new(operand),
            },
            start,
        )
    }

    // ========== Postfix: method chains, indexing, blocks ==========

    fn parse_postfix(&mut self, mut node: Node) -> SyntaxResult<Node> {
        let start = node.span.start;
        loop {
            match self.peek_kind() {
                TokenKind::Dot | TokenKind::SafeNav => {
                    self.bump();
                    self.skip_newlines();
                    node = self.parse_method_call(node, start)?;
                }
                TokenKind::Newline if self.continues_on_next_line() => {
                    self.skip_newlines();
                }
                TokenKind::ColonColon => {
                    self.bump();
                    if self.at(TokenKind::Constant) && !self.followed_by_paren(1) {
                        let name = self.bump_text().to_string();
                        node = self.node(
                            NodeKind::Const {
                                scope: Some(Box::new(node)),
                                name,
                            },
                            start,
                        );
                    } else {
                        node = self.parse_method_call(node, start)?;
                    }
                }
                TokenKind::LBracket if !self.peek().space_before => {
                    self.bump();
                    let args = self.nested(|p| p.parse_arg_list(TokenKind::RBracket))?;
                    self.expect(TokenKind::RBracket, "']'")?;
                    node = self.call(Some(node), "[]".to_string(), args, true, None, start);
                }
                TokenKind::LBrace if accepts_brace_block(&node) => {
                    let block = self.parse_block()?;
                    node = attach_block(node, block, self.prev_end());
                }
                TokenKind::Do if self.no_do == 0 && accepts_do_block(&node) => {
                    let block = self.parse_block()?;
                    node = attach_block(node, block, self.prev_end());
                }
                _ => break,
            }
        }
        Ok(node)
    }

    /// Whether a newline is followed by a `.method` continuation
    fn continues_on_next_line(&self) -> bool {
        let mut n = 0;
        while self.nth(n).kind == TokenKind::Newline {
            n += 1;
        }
        matches!(self.nth(n).kind, TokenKind::Dot | TokenKind::SafeNav)
    }

    fn followed_by_paren(&self, n: usize) -> bool {
        let token = self.nth(n);
        token.kind == TokenKind::LParen && !token.space_before
    }

    /// The method name and arguments after `.` or `::`
    fn parse_method_call(&mut self, receiver: Node, start: usize) -> SyntaxResult<Node> {
        let token = self.peek().clone();
        let method = match token.kind {
            TokenKind::Ident | TokenKind::Constant => self.text(&token).to_string(),
            kind if kind.is_keyword() => self.text(&token).to_string(),
            TokenKind::Label => self.text(&token).trim_end_matches(':').to_string(),
            // `.()` is `.call()`
            TokenKind::LParen => {
                let args = self.parse_paren_args()?;
                return Ok(self.call(Some(receiver), "call".to_string(), args, true, None, start));
            }
            TokenKind::Operator
            | TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::Lt
            | TokenKind::Bang => self.text(&token).to_string(),
            _ => {
                return Err(self.error(
                    SyntaxErrorKind::Unexpected {
                        found: self.text(&token).to_string(),
                        expected: "method name".to_string(),
                    },
                    token.span.start,
                ))
            }
        };
        self.bump();

        if self.followed_by_paren(0) {
            let args = self.parse_paren_args()?;
            Ok(self.call(Some(receiver), method, args, true, None, start))
        } else if self.command_arg_start() {
            let args = self.parse_command_args()?;
            Ok(self.call(Some(receiver), method, args, false, None, start))
        } else {
            Ok(self.call(Some(receiver), method, Vec::new(), false, None, start))
        }
    }

    fn call(
        &self,
        receiver: Option<Node>,
        method: String,
        args: Vec<Node>,
        parens: bool,
        block: Option<Block>,
        start: usize,
    ) -> Node {
        self.node(
            NodeKind::Call(Box::new(Call {
                receiver: receiver.map(Box::new),
                method,
                args,
                parens,
                block,
            })),
            start,
        )
    }

    fn parse_block(&mut self) -> SyntaxResult<Block> {
        let open = self.bump();
        let (closer, expected) = if open.kind == TokenKind::Do {
            (TokenKind::End, "'end'")
        } else {
            (TokenKind::RBrace, "'}'")
        };
        let (params, body) = self.nested(|p| {
            let params = if p.eat(TokenKind::Pipe) {
                let params = p.parse_params(&[TokenKind::Pipe])?;
                p.expect(TokenKind::Pipe, "'|'")?;
                params
            } else {
                p.eat(TokenKind::OrOr);
                Vec::new()
            };
            let body = if closer == TokenKind::End {
                p.parse_body()?
            } else {
                p.parse_statements(&[TokenKind::RBrace])?
            };
            Ok((params, body))
        })?;
        self.expect(closer, expected)?;
        Ok(Block {
            params,
            body: Box::new(body),
            span: Span::new(open.span.start, self.prev_end()),
            line: self.index.line(open.span.start),
        })
    }

    // ========== Arguments ==========

    /// Whether the next token starts an argument of a call written without
    /// parentheses
    fn command_arg_start(&self) -> bool {
        let token = self.peek();
        if !token.space_before {
            return false;
        }
        let tight = !self.nth(1).space_before;
        match token.kind {
            TokenKind::Str
            | TokenKind::XStr
            | TokenKind::Symbol
            | TokenKind::QuotedSymbol
            | TokenKind::Number
            | TokenKind::Constant
            | TokenKind::Ident
            | TokenKind::IVar
            | TokenKind::CVar
            | TokenKind::GVar
            | TokenKind::Label
            | TokenKind::Regex
            | TokenKind::Words
            | TokenKind::SymbolWords
            | TokenKind::Nil
            | TokenKind::True
            | TokenKind::False
            | TokenKind::SelfKw
            | TokenKind::Arrow
            | TokenKind::Defined
            | TokenKind::Def
            | TokenKind::LParen => true,
            TokenKind::Minus
            | TokenKind::Star
            | TokenKind::DoubleStar
            | TokenKind::Amp
            | TokenKind::LBracket
            | TokenKind::ColonColon
            | TokenKind::Bang => tight,
            _ => false,
        }
    }

    fn parse_command_args(&mut self) -> SyntaxResult<Vec<Node>> {
        let args = self.without_do(|p| {
            let mut args = vec![p.parse_arg()?];
            while p.eat(TokenKind::Comma) {
                p.skip_newlines();
                args.push(p.parse_arg()?);
            }
            Ok(args)
        })?;
        Ok(self.group_trailing_pairs(args))
    }

    fn parse_paren_args(&mut self) -> SyntaxResult<Vec<Node>> {
        self.expect(TokenKind::LParen, "'('")?;
        let args = self.nested(|p| p.parse_arg_list(TokenKind::RParen))?;
        self.expect(TokenKind::RParen, "')'")?;
        Ok(self.group_trailing_pairs(args))
    }

    /// Comma separated arguments up to (not including) `closer`
    fn parse_arg_list(&mut self, closer: TokenKind) -> SyntaxResult<Vec<Node>> {
        let mut args = Vec::new();
        loop {
            self.skip_newlines();
            if self.at(closer) || self.at(TokenKind::Eof) {
                break;
            }
            args.push(self.parse_arg()?);
            self.skip_newlines();
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.skip_newlines();
        Ok(args)
    }

    fn parse_arg(&mut self) -> SyntaxResult<Node> {
        let start = self.peek().span.start;
        match self.peek_kind() {
            TokenKind::Amp => {
                self.bump();
                let value = if matches!(
                    self.peek_kind(),
                    TokenKind::Comma | TokenKind::RParen | TokenKind::Newline
                ) {
                    None
                } else {
                    Some(Box::new(self.parse_ternary()?))
                };
                Ok(self.node(NodeKind::BlockPass(value), start))
            }
            TokenKind::Label => {
                let label = self.bump();
                let key = self.label_key(&label);
                self.skip_newlines();
                let value = if matches!(
                    self.peek_kind(),
                    TokenKind::Comma | TokenKind::RParen | TokenKind::RBrace | TokenKind::Eof
                ) {
                    // `f(x:)` shorthand
                    let name = key.symbol_name().unwrap_or_default().to_string();
                    Node::new(NodeKind::Ident(name), key.span, key.line)
                } else {
                    self.parse_not()?
                };
                Ok(self.pair(key, value, start))
            }
            TokenKind::Str if self.nth(1).kind == TokenKind::Colon && !self.nth(1).space_before => {
                // `"key": value`
                let token = self.bump();
                self.bump();
                let key = Node::new(
                    NodeKind::DynSymbol(token.literal.clone().unwrap_or_else(empty_literal)),
                    token.span,
                    self.index.line(token.span.start),
                );
                self.skip_newlines();
                let value = self.parse_not()?;
                Ok(self.pair(key, value, start))
            }
            _ => {
                let value = self.parse_not()?;
                if self.eat(TokenKind::FatArrow) {
                    self.skip_newlines();
                    let rhs = self.parse_not()?;
                    Ok(self.pair(value, rhs, start))
                } else {
                    Ok(value)
                }
            }
        }
    }

    fn label_key(&self, label: &Token) -> Node {
        let name = self.text(label).trim_end_matches(':').to_string();
        Node::new(
            NodeKind::Symbol(name),
            Span::new(label.span.start, label.span.end - 1),
            self.index.line(label.span.start),
        )
    }

    fn pair(&self, key: Node, value: Node, start: usize) -> Node {
        self.node(
            NodeKind::Pair {
                key: Box::new(key),
                value: Box::new(value),
            },
            start,
        )
    }

    /// Collect trailing `key => value` arguments into one hash argument
    fn group_trailing_pairs(&self, mut args: Vec<Node>) -> Vec<Node> {
        let block_pass = match args.last() {
            Some(last) if matches!(last.kind, NodeKind::BlockPass(_)) => args.pop(),
            _ => None,
        };
        let first_pair = args
            .iter()
            .rposition(|a| !is_hash_entry(a))
            .map_or(0, |i| i + 1);
        if first_pair < args.len() {
            let entries: Vec<Node> = args.drain(first_pair..).collect();
            let span = entries[0].span.merge(entries[entries.len() - 1].span);
            let line = entries[0].line;
            args.push(Node::new(NodeKind::Hash(entries), span, line));
        }
        args.extend(block_pass);
        args
    }

    // ========== Parameters ==========

    fn parse_params(&mut self, closers: &[TokenKind]) -> SyntaxResult<Vec<Param>> {
        let multiline = closers.contains(&TokenKind::RParen);
        let mut params = Vec::new();
        loop {
            if multiline {
                self.skip_newlines();
            }
            let kind = self.peek_kind();
            if closers.contains(&kind) || kind == TokenKind::Eof {
                break;
            }
            let start = self.peek().span.start;
            let param = match kind {
                TokenKind::Star | TokenKind::DoubleStar | TokenKind::Amp => {
                    self.bump();
                    let name = if self.at(TokenKind::Ident) {
                        self.bump_text().to_string()
                    } else {
                        String::new()
                    };
                    let kind = match kind {
                        TokenKind::Star => ParamKind::Rest,
                        TokenKind::DoubleStar => ParamKind::KeywordRest,
                        _ => ParamKind::Block,
                    };
                    Some((name, kind, None))
                }
                TokenKind::Label => {
                    let label = self.bump();
                    let name = self.text(&label).trim_end_matches(':').to_string();
                    let default = if matches!(
                        self.peek_kind(),
                        TokenKind::Comma | TokenKind::Newline | TokenKind::Semicolon
                    ) || closers.contains(&self.peek_kind())
                    {
                        None
                    } else {
                        Some(self.parse_unary()?)
                    };
                    Some((name, ParamKind::Keyword, default))
                }
                TokenKind::Ident => {
                    let name = self.bump_text().to_string();
                    if self.eat(TokenKind::Assign) {
                        let default = if multiline {
                            self.parse_ternary()?
                        } else {
                            self.parse_unary()?
                        };
                        Some((name, ParamKind::Optional, Some(default)))
                    } else {
                        Some((name, ParamKind::Required, None))
                    }
                }
                TokenKind::LParen => {
                    // destructuring parameter
                    self.skip_balanced(TokenKind::LParen, TokenKind::RParen)?;
                    Some((self.source[start..self.prev_end()].to_string(), ParamKind::Required, None))
                }
                _ => {
                    self.bump();
                    None
                }
            };
            if let Some((name, kind, default)) = param {
                params.push(Param {
                    name,
                    kind,
                    default,
                    span: Span::new(start, self.prev_end()),
                });
            }
            if multiline {
                self.skip_newlines();
            }
            if !self.eat(TokenKind::Comma) && !self.eat(TokenKind::Semicolon) {
                let kind = self.peek_kind();
                if closers.contains(&kind) || kind == TokenKind::Eof {
                    break;
                }
            }
        }
        Ok(params)
    }

    fn skip_balanced(&mut self, open: TokenKind, close: TokenKind) -> SyntaxResult<()> {
        let start = self.expect(open, "opening bracket")?.span.start;
        let mut depth = 1usize;
        while depth > 0 {
            let token = self.bump();
            match token.kind {
                TokenKind::Eof => {
                    return Err(self.error(SyntaxErrorKind::UnexpectedEof("')'".into()), start))
                }
                k if k == open => depth += 1,
                k if k == close => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }

    // ========== Primary expressions ==========

    fn parse_primary(&mut self) -> SyntaxResult<Node> {
        let token = self.peek().clone();
        let start = token.span.start;
        match token.kind {
            TokenKind::Ident => {
                self.bump();
                let name = self.text(&token).to_string();
                if self.followed_by_paren(0) {
                    let args = self.parse_paren_args()?;
                    Ok(self.call(None, name, args, true, None, start))
                } else if self.command_arg_start() {
                    let args = self.parse_command_args()?;
                    Ok(self.call(None, name, args, false, None, start))
                } else {
                    Ok(self.node(NodeKind::Ident(name), start))
                }
            }
            TokenKind::Constant => {
                self.bump();
                let name = self.text(&token).to_string();
                if self.followed_by_paren(0) {
                    let args = self.parse_paren_args()?;
                    Ok(self.call(None, name, args, true, None, start))
                } else {
                    Ok(self.node(NodeKind::Const { scope: None, name }, start))
                }
            }
            TokenKind::ColonColon => {
                // `::Name` refers to the top-level constant
                self.bump();
                let name = self.expect(TokenKind::Constant, "constant")?;
                let name = self.text(&name).to_string();
                Ok(self.node(NodeKind::Const { scope: None, name }, start))
            }
            TokenKind::IVar => self.leaf(NodeKind::IVar(self.text(&token).to_string())),
            TokenKind::CVar => self.leaf(NodeKind::CVar(self.text(&token).to_string())),
            TokenKind::GVar => self.leaf(NodeKind::GVar(self.text(&token).to_string())),
            TokenKind::Number => self.leaf(NodeKind::Number(self.text(&token).to_string())),
            TokenKind::Symbol => self.leaf(NodeKind::Symbol(self.text(&token)[1..].to_string())),
            TokenKind::Label => {
                let name = self.text(&token).trim_end_matches(':').to_string();
                self.leaf(NodeKind::Symbol(name))
            }
            TokenKind::QuotedSymbol => {
                let literal = token.literal.clone().unwrap_or_else(empty_literal);
                self.leaf(NodeKind::DynSymbol(literal))
            }
            TokenKind::XStr => {
                let literal = token.literal.clone().unwrap_or_else(empty_literal);
                self.leaf(NodeKind::XStr(literal))
            }
            TokenKind::Regex => self.leaf(NodeKind::Regex(self.text(&token).to_string())),
            TokenKind::Str => self.parse_string(),
            TokenKind::Words | TokenKind::SymbolWords => {
                self.bump();
                let line = self.index.line(start);
                let items = token
                    .words
                    .iter()
                    .map(|word| {
                        let kind = if token.kind == TokenKind::Words {
                            NodeKind::Str(StrLit {
                                value: word.clone(),
                                interpolated: false,
                            })
                        } else {
                            NodeKind::Symbol(word.clone())
                        };
                        Node::new(kind, token.span, line)
                    })
                    .collect();
                Ok(self.node(NodeKind::Array(items), start))
            }
            TokenKind::Nil => self.leaf(NodeKind::Nil),
            TokenKind::True => self.leaf(NodeKind::True),
            TokenKind::False => self.leaf(NodeKind::False),
            TokenKind::SelfKw => self.leaf(NodeKind::SelfRef),
            TokenKind::LParen => {
                self.bump();
                let inner = self.nested(|p| p.parse_statements(&[TokenKind::RParen]))?;
                self.expect(TokenKind::RParen, "')'")?;
                match inner.kind {
                    NodeKind::Statements(mut nodes) if nodes.len() == 1 => Ok(nodes.remove(0)),
                    kind => Ok(self.node(kind, start)),
                }
            }
            TokenKind::LBracket => {
                self.bump();
                let items = self.nested(|p| p.parse_arg_list(TokenKind::RBracket))?;
                self.expect(TokenKind::RBracket, "']'")?;
                Ok(self.node(NodeKind::Array(items), start))
            }
            TokenKind::LBrace => self.parse_hash(),
            TokenKind::Arrow => self.parse_lambda(),
            TokenKind::Def => self.parse_def(),
            TokenKind::Class => self.parse_class(),
            TokenKind::Module => {
                self.bump();
                let name = self.parse_unary()?;
                let body = self.parse_body()?;
                self.expect(TokenKind::End, "'end'")?;
                Ok(self.node(
                    NodeKind::Namespace {
                        keyword: NamespaceKind::Module,
                        name: Some(Box::new(name)),
                        superclass: None,
                        body: Box::new(body),
                    },
                    start,
                ))
            }
            TokenKind::If | TokenKind::Unless => self.parse_if(),
            TokenKind::While | TokenKind::Until => {
                let keyword = self.bump_text().to_string();
                let condition = self.without_do(|p| p.parse_expression_statement())?;
                self.eat(TokenKind::Do);
                let body = self.parse_statements(&[TokenKind::End])?;
                self.expect(TokenKind::End, "'end'")?;
                Ok(self.control(keyword, vec![condition, body], start))
            }
            TokenKind::For => {
                self.bump();
                let mut children = Vec::new();
                while !matches!(self.peek_kind(), TokenKind::In | TokenKind::Eof) {
                    children.push(self.parse_primary()?);
                    self.eat(TokenKind::Comma);
                }
                self.expect(TokenKind::In, "'in'")?;
                children.push(self.without_do(|p| p.parse_expression_statement())?);
                self.eat(TokenKind::Do);
                children.push(self.parse_statements(&[TokenKind::End])?);
                self.expect(TokenKind::End, "'end'")?;
                Ok(self.control("for".to_string(), children, start))
            }
            TokenKind::Case => self.parse_case(),
            TokenKind::Begin => {
                self.bump();
                let body = self.parse_body()?;
                self.expect(TokenKind::End, "'end'")?;
                Ok(self.control("begin".to_string(), vec![body], start))
            }
            TokenKind::Return | TokenKind::Break | TokenKind::Next | TokenKind::Redo | TokenKind::Retry => {
                self.bump();
                let keyword = self.text(&token).to_string();
                let args = if self.jump_has_value() {
                    self.parse_command_args()?
                } else {
                    Vec::new()
                };
                Ok(self.node(NodeKind::Jump { keyword, args }, start))
            }
            TokenKind::Yield | TokenKind::Super => {
                self.bump();
                let keyword = self.text(&token).to_string();
                let args = if self.followed_by_paren(0) {
                    self.parse_paren_args()?
                } else if self.command_arg_start() {
                    self.parse_command_args()?
                } else {
                    Vec::new()
                };
                Ok(self.node(NodeKind::Jump { keyword, args }, start))
            }
            TokenKind::Defined => {
                self.bump();
                let args = if self.at(TokenKind::LParen) {
                    self.parse_paren_args()?
                } else {
                    vec![self.parse_unary()?]
                };
                Ok(self.call(None, "defined?".to_string(), args, true, None, start))
            }
            TokenKind::Alias => {
                self.bump();
                let mut names = Vec::new();
                for _ in 0..2 {
                    let name = self.bump();
                    names.push(self.node(NodeKind::Ident(self.text(&name).to_string()), name.span.start));
                }
                Ok(self.node(NodeKind::Opaque(names), start))
            }
            TokenKind::Undef => {
                self.bump();
                let mut names = vec![self.parse_primary()?];
                while self.eat(TokenKind::Comma) {
                    names.push(self.parse_primary()?);
                }
                Ok(self.node(NodeKind::Opaque(names), start))
            }
            TokenKind::Not => self.parse_not(),
            TokenKind::Bang
            | TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::DoubleStar => self.parse_unary(),
            TokenKind::End
            | TokenKind::RParen
            | TokenKind::RBracket
            | TokenKind::RBrace => Err(self.error(
                SyntaxErrorKind::Unbalanced(self.text(&token).to_string()),
                start,
            )),
            TokenKind::Eof => Err(self.error(
                SyntaxErrorKind::UnexpectedEof("expression".to_string()),
                start,
            )),
            _ => {
                // not modelled; keep going
                self.bump();
                Ok(self.node(NodeKind::Opaque(Vec::new()), start))
            }
        }
    }

    fn leaf(&mut self, kind: NodeKind) -> SyntaxResult<Node> {
        let token = self.bump();
        Ok(Node::new(kind, token.span, self.index.line(token.span.start)))
    }

    fn control(&self, keyword: String, children: Vec<Node>, start: usize) -> Node {
        self.node(NodeKind::Control { keyword, children }, start)
    }

    fn jump_has_value(&self) -> bool {
        !matches!(
            self.peek_kind(),
            TokenKind::Newline
                | TokenKind::Semicolon
                | TokenKind::End
                | TokenKind::RBrace
                | TokenKind::RParen
                | TokenKind::If
                | TokenKind::Unless
                | TokenKind::While
                | TokenKind::Until
                | TokenKind::Eof
        )
    }

    /// A string literal, joined with directly adjacent string literals
    fn parse_string(&mut self) -> SyntaxResult<Node> {
        let first = self.bump();
        let start = first.span.start;
        let mut literal = first.literal.unwrap_or_else(empty_literal);
        while self.at(TokenKind::Str) && !self.is_string_key() {
            let next = self.bump();
            let next = next.literal.unwrap_or_else(empty_literal);
            literal.value.push_str(&next.value);
            literal.interpolated |= next.interpolated;
        }
        Ok(self.node(NodeKind::Str(literal), start))
    }

    fn is_string_key(&self) -> bool {
        let next = self.nth(1);
        next.kind == TokenKind::Colon && !next.space_before
    }

    fn parse_hash(&mut self) -> SyntaxResult<Node> {
        let start = self.bump().span.start;
        let entries = self.nested(|p| {
            let mut entries = Vec::new();
            loop {
                p.skip_newlines();
                if p.at(TokenKind::RBrace) || p.at(TokenKind::Eof) {
                    break;
                }
                entries.push(p.parse_arg()?);
                p.skip_newlines();
                if !p.eat(TokenKind::Comma) {
                    break;
                }
            }
            p.skip_newlines();
            Ok(entries)
        })?;
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(self.node(NodeKind::Hash(entries), start))
    }

    fn parse_lambda(&mut self) -> SyntaxResult<Node> {
        let start = self.bump().span.start;
        let params = if self.at(TokenKind::LParen) {
            self.bump();
            let params = self.parse_params(&[TokenKind::RParen])?;
            self.expect(TokenKind::RParen, "')'")?;
            params
        } else {
            self.parse_params(&[TokenKind::LBrace, TokenKind::Do])?
        };
        let body = if self.eat(TokenKind::Do) {
            let body = self.nested(|p| p.parse_body())?;
            self.expect(TokenKind::End, "'end'")?;
            body
        } else {
            self.expect(TokenKind::LBrace, "'{'")?;
            let body = self.nested(|p| p.parse_statements(&[TokenKind::RBrace]))?;
            self.expect(TokenKind::RBrace, "'}'")?;
            body
        };
        Ok(self.node(
            NodeKind::Lambda {
                params,
                body: Box::new(body),
            },
            start,
        ))
    }

    fn parse_def(&mut self) -> SyntaxResult<Node> {
        let start = self.bump().span.start;
        let mut singleton = false;
        if matches!(
            self.peek_kind(),
            TokenKind::SelfKw | TokenKind::Constant | TokenKind::Ident
        ) && self.nth(1).kind == TokenKind::Dot
        {
            self.bump();
            self.bump();
            singleton = true;
        }

        let token = self.bump();
        let mut name = match token.kind {
            TokenKind::LBracket => {
                self.expect(TokenKind::RBracket, "']'")?;
                "[]".to_string()
            }
            TokenKind::Eof => {
                return Err(self.error(
                    SyntaxErrorKind::UnexpectedEof("method name".to_string()),
                    start,
                ))
            }
            _ => self.text(&token).trim_end_matches(':').to_string(),
        };
        // setter: `def value=(v)`
        if self.at(TokenKind::Assign) && !self.peek().space_before && self.followed_by_paren(1) {
            self.bump();
            name.push('=');
        }

        let params = if self.at(TokenKind::LParen) {
            self.bump();
            let params = self.parse_params(&[TokenKind::RParen])?;
            self.expect(TokenKind::RParen, "')'")?;
            params
        } else if matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Semicolon) {
            Vec::new()
        } else if self.at(TokenKind::Assign) {
            Vec::new()
        } else {
            self.parse_params(&[TokenKind::Newline, TokenKind::Semicolon])?
        };

        let body = if self.eat(TokenKind::Assign) {
            // endless method
            self.skip_newlines();
            self.parse_statement()?
        } else {
            let body = self.nested(|p| p.parse_body())?;
            self.expect(TokenKind::End, "'end'")?;
            body
        };

        Ok(self.node(
            NodeKind::Def {
                name,
                singleton,
                params,
                body: Box::new(body),
            },
            start,
        ))
    }

    fn parse_class(&mut self) -> SyntaxResult<Node> {
        let start = self.bump().span.start;
        let (keyword, name, superclass) =
            if self.at(TokenKind::Operator) && self.text(self.peek()) == "<<" {
                self.bump();
                let target = self.parse_expr()?;
                (NamespaceKind::SingletonClass, target, None)
            } else {
                let name = self.parse_unary()?;
                let superclass = if self.eat(TokenKind::Lt) {
                    Some(Box::new(self.parse_expr()?))
                } else {
                    None
                };
                (NamespaceKind::Class, name, superclass)
            };
        let body = self.nested(|p| p.parse_body())?;
        self.expect(TokenKind::End, "'end'")?;
        Ok(self.node(
            NodeKind::Namespace {
                keyword,
                name: Some(Box::new(name)),
                superclass,
                body: Box::new(body),
            },
            start,
        ))
    }

    fn parse_if(&mut self) -> SyntaxResult<Node> {
        let token = self.bump();
        let start = token.span.start;
        let keyword = self.text(&token).to_string();
        let mut children = Vec::new();
        children.push(self.parse_expression_statement()?);
        self.eat(TokenKind::Then);
        self.skip_terms();
        self.eat(TokenKind::Then);
        children.push(self.parse_statements(&[TokenKind::Elsif, TokenKind::Else, TokenKind::End])?);
        while self.eat(TokenKind::Elsif) {
            children.push(self.parse_expression_statement()?);
            self.eat(TokenKind::Then);
            children.push(self.parse_statements(&[TokenKind::Elsif, TokenKind::Else, TokenKind::End])?);
        }
        if self.eat(TokenKind::Else) {
            children.push(self.parse_statements(&[TokenKind::End])?);
        }
        self.expect(TokenKind::End, "'end'")?;
        Ok(self.control(keyword, children, start))
    }

    fn parse_case(&mut self) -> SyntaxResult<Node> {
        let start = self.bump().span.start;
        let mut children = Vec::new();
        if !matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Semicolon) {
            children.push(self.parse_expression_statement()?);
        }
        self.skip_terms();
        while matches!(self.peek_kind(), TokenKind::When | TokenKind::In) {
            self.bump();
            let mut values = vec![self.parse_arg()?];
            while self.eat(TokenKind::Comma) {
                self.skip_newlines();
                values.push(self.parse_arg()?);
            }
            children.extend(values);
            self.eat(TokenKind::Then);
            children.push(self.parse_statements(&[
                TokenKind::When,
                TokenKind::In,
                TokenKind::Else,
                TokenKind::End,
            ])?);
        }
        if self.eat(TokenKind::Else) {
            children.push(self.parse_statements(&[TokenKind::End])?);
        }
        self.expect(TokenKind::End, "'end'")?;
        Ok(self.control("case".to_string(), children, start))
    }
}

fn empty_literal() -> StrLit {
    StrLit {
        value: String::new(),
        interpolated: false,
    }
}

fn is_assignable(node: &Node) -> bool {
    match &node.kind {
        NodeKind::Ident(_)
        | NodeKind::IVar(_)
        | NodeKind::CVar(_)
        | NodeKind::GVar(_)
        | NodeKind::Const { .. }
        | NodeKind::Splat { .. } => true,
        NodeKind::Call(call) => call.receiver.is_some() && call.block.is_none() && (call.args.is_empty() || call.method == "[]"),
        _ => false,
    }
}

fn is_hash_entry(node: &Node) -> bool {
    matches!(
        node.kind,
        NodeKind::Pair { .. } | NodeKind::Splat { double: true, .. }
    )
}

fn accepts_brace_block(node: &Node) -> bool {
    match &node.kind {
        NodeKind::Ident(_) => true,
        NodeKind::Call(call) => call.block.is_none() && (call.parens || call.args.is_empty()),
        _ => false,
    }
}

fn accepts_do_block(node: &Node) -> bool {
    match &node.kind {
        NodeKind::Ident(_) => true,
        NodeKind::Call(call) => call.block.is_none(),
        _ => false,
    }
}

/// Attach `block` to a call, turning a bare identifier into a call first
fn attach_block(node: Node, block: Block, end: usize) -> Node {
    let span = Span::new(node.span.start, end);
    let line = node.line;
    let call = match node.kind {
        NodeKind::Ident(method) => Call {
            receiver: None,
            method,
            args: Vec::new(),
            parens: false,
            block: Some(block),
        },
        NodeKind::Call(mut call) => {
            call.block = Some(block);
            *call
        }
        kind => return Node::new(kind, span, line),
    };
    Node::new(NodeKind::Call(Box::new(call)), span, line)
}
