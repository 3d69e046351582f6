//! Node Parser - pull interface over the token stream
//!
//! LL(1) over tokens from the [`Tokenizer`]: the first token of each node
//! selects the production and the parser commits to it, no backtracking.
//!
//! ```
//! use tagstream::reader::parser::Parser;
//! use tagstream::reader::node::NodeKind;
//!
//! let mut parser = Parser::new(b"<tag>text</tag>");
//! let kinds: Vec<NodeKind> = parser.by_ref().map(|node| node.kind).collect();
//! assert_eq!(kinds, [NodeKind::ElementBegin, NodeKind::Text, NodeKind::ElementEnd]);
//! assert!(parser.is_done());
//! assert!(!parser.is_errored());
//! ```
//!
//! Two sticky flags govern the stream. `done` is set once the end of input
//! has been pulled; `errored` once any diagnostic has been recorded. After
//! either, every pull returns an `Invalid` node without scanning.
//!
//! A lexical error ends the token stream and so sets both flags. A syntax
//! error such as `</>` sets only `errored`, so stop on `errored` rather than
//! waiting for `done`.

use super::lookahead::Lookahead;
use super::node::{Node, NodeKind};
use crate::core::attributes::Attribute;
use crate::core::slice::Slice;
use crate::core::tokenizer::{Token, TokenKind, Tokenizer};
use crate::error::ParseError;

/// Pull parser producing one [`Node`] at a time
pub struct Parser<'a> {
    name: String,
    input: &'a [u8],
    tokens: Lookahead<'a, Tokenizer<'a>>,
    /// Last consumed token
    token: Token<'a>,
    node: Node<'a>,
    attributes: Vec<Attribute<'a>>,
    errors: Vec<ParseError>,
    depth: usize,
    done: bool,
    errored: bool,
}

impl<'a> Parser<'a> {
    /// Create a parser whose diagnostics name the source `input`
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_name("input", input)
    }

    /// Create a parser whose diagnostics carry `name`
    pub fn with_name(name: impl Into<String>, input: &'a [u8]) -> Self {
        let name = name.into();
        Parser {
            tokens: Lookahead::new(Tokenizer::with_name(name.clone(), input)),
            name,
            input,
            token: Token::default(),
            node: Node::INVALID,
            attributes: Vec::new(),
            errors: Vec::new(),
            depth: 0,
            done: false,
            errored: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn input(&self) -> &'a [u8] {
        self.input
    }

    /// Advance to the next node and return it.
    ///
    /// Returns [`Node::INVALID`] at end of input and on any error; check
    /// [`is_errored`](Self::is_errored) to tell the two apart.
    pub fn next_node(&mut self) -> Node<'a> {
        self.attributes.clear();
        let node = match self.read_node() {
            Some(node) if !self.errored => node,
            _ => {
                self.attributes.clear();
                Node::INVALID
            }
        };
        self.node = node;
        node
    }

    /// The current node
    #[inline]
    pub fn node(&self) -> &Node<'a> {
        &self.node
    }

    #[inline]
    pub fn node_kind(&self) -> NodeKind {
        self.node.kind
    }

    #[inline]
    pub fn node_line(&self) -> usize {
        self.node.line
    }

    #[inline]
    pub fn node_column_start(&self) -> usize {
        self.node.column_start
    }

    #[inline]
    pub fn node_offset(&self) -> usize {
        self.node.offset
    }

    #[inline]
    pub fn node_text(&self) -> Slice<'a> {
        self.node.text
    }

    #[inline]
    pub fn node_self_closing(&self) -> bool {
        self.node.self_closing
    }

    /// Attributes of the current node
    pub fn attributes(&self) -> &[Attribute<'a>] {
        &self.attributes
    }

    /// Check if the end of input has been reached
    #[inline]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Check if any diagnostic has been recorded
    #[inline]
    pub fn is_errored(&self) -> bool {
        self.errored
    }

    /// Every diagnostic recorded so far, in order
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// The first diagnostic, if any
    pub fn error(&self) -> Option<&ParseError> {
        self.errors.first()
    }

    /// Current element nesting depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Look at the next token without consuming it.
    ///
    /// A lexical error is recorded and reported as the end marker.
    pub fn peek_token(&mut self) -> Token<'a> {
        if self.errored {
            return Token::end(self.token.position());
        }
        match self.tokens.peek() {
            Ok(token) => token,
            Err(err) => {
                let at = err.position;
                self.record(err);
                Token::end(at)
            }
        }
    }

    /// Consume the next token. Pulling the end marker sets `done`.
    pub fn next_token(&mut self) -> Token<'a> {
        let token = if self.errored {
            Token::end(self.token.position())
        } else {
            match self.tokens.next() {
                Ok(token) => token,
                Err(err) => {
                    let at = err.position;
                    self.record(err);
                    Token::end(at)
                }
            }
        };
        if token.kind.is_end() {
            self.done = true;
        }
        self.token = token;
        token
    }

    fn record(&mut self, err: ParseError) {
        tracing::debug!(
            source = %err.source_name,
            line = err.position.line,
            column = err.position.column,
            message = %err.message,
            "parse error"
        );
        self.errored = true;
        self.errors.push(err);
    }

    /// Check `token` against `kind`, recording a syntax error on mismatch.
    /// The end marker that follows a lexical error is not reported twice.
    fn expect(&mut self, token: Token<'a>, kind: TokenKind) -> bool {
        if token.kind == kind {
            return true;
        }
        if token.kind.is_end() && self.errored {
            return false;
        }
        let message = if token.kind.is_end() {
            format!("Expected {}", kind.describe())
        } else {
            format!("Expected {} but got {}", kind.describe(), token.kind.describe())
        };
        let err = ParseError::syntax(&self.name, token.position(), message);
        self.record(err);
        false
    }

    fn read_node(&mut self) -> Option<Node<'a>> {
        if self.done || self.errored {
            return None;
        }

        let start = self.next_token();
        match start.kind {
            TokenKind::XmlStart => self.parse_xml_header(start),
            TokenKind::CloseTagStart => self.parse_element_end(start),
            TokenKind::LeftAngle => self.parse_element_begin(start),
            TokenKind::CommentStart => self.parse_comment(start),
            TokenKind::Invalid => None,
            _ => self.parse_text(start),
        }
    }

    /// `<?` name attributes `?>`
    fn parse_xml_header(&mut self, start: Token<'a>) -> Option<Node<'a>> {
        let name = self.parse_name()?;
        let end = self.scan_tag_body(true)?;
        if !self.expect(end, TokenKind::XmlEnd) {
            return None;
        }

        Some(Node {
            kind: NodeKind::XmlHeader,
            line: start.line,
            column_start: start.column_start,
            column_end: end.column_end,
            offset: start.offset,
            depth: self.depth,
            attribute_count: self.attributes.len(),
            text: name,
            ..Node::INVALID
        })
    }

    /// `<` name attributes (`>` | `/>`)
    fn parse_element_begin(&mut self, start: Token<'a>) -> Option<Node<'a>> {
        let name = self.parse_name()?;
        let end = self.scan_tag_body(true)?;
        let self_closing = end.kind == TokenKind::SelfClose;
        if !self_closing && !self.expect(end, TokenKind::RightAngle) {
            return None;
        }

        let node = Node {
            kind: NodeKind::ElementBegin,
            line: start.line,
            column_start: start.column_start,
            column_end: end.column_end,
            offset: start.offset,
            depth: self.depth,
            self_closing,
            attribute_count: self.attributes.len(),
            text: name,
            ..Node::INVALID
        };
        if !self_closing {
            self.depth += 1;
        }
        Some(node)
    }

    /// `</` name `>`
    fn parse_element_end(&mut self, start: Token<'a>) -> Option<Node<'a>> {
        let name = self.parse_name()?;
        let end = self.scan_tag_body(false)?;
        if !self.expect(end, TokenKind::RightAngle) {
            return None;
        }

        // Unbalanced end tags bottom out at zero
        self.depth = self.depth.saturating_sub(1);
        Some(Node {
            kind: NodeKind::ElementEnd,
            line: start.line,
            column_start: start.column_start,
            column_end: end.column_end,
            offset: start.offset,
            depth: self.depth,
            text: name,
            ..Node::INVALID
        })
    }

    fn parse_text(&mut self, token: Token<'a>) -> Option<Node<'a>> {
        if !self.expect(token, TokenKind::Text) {
            return None;
        }
        Some(Node {
            kind: NodeKind::Text,
            line: token.line,
            column_start: token.column_start,
            column_end: token.column_end,
            offset: token.offset,
            depth: self.depth,
            text: token.text,
            ..Node::INVALID
        })
    }

    /// `<!--` [text] `-->`
    fn parse_comment(&mut self, start: Token<'a>) -> Option<Node<'a>> {
        let mut token = self.next_token();
        let mut body = Slice::EMPTY;
        if token.kind == TokenKind::Text {
            body = token.text;
            token = self.next_token();
        }
        if !self.expect(token, TokenKind::CommentEnd) {
            return None;
        }

        Some(Node {
            kind: NodeKind::Comment,
            line: start.line,
            column_start: start.column_start,
            column_end: token.column_end,
            offset: start.offset,
            depth: self.depth,
            text: body,
            ..Node::INVALID
        })
    }

    /// Identifier, required
    fn parse_name(&mut self) -> Option<Slice<'a>> {
        let first = self.next_token();
        if !self.expect(first, TokenKind::Identifier) {
            return None;
        }
        self.qualified_name(first)
    }

    /// Extend an identifier through any `:identifier` parts.
    /// The result is one contiguous slice of the input; a colon with no
    /// identifier after it ends the name.
    fn qualified_name(&mut self, first: Token<'a>) -> Option<Slice<'a>> {
        let mut end = first.offset + first.text.len();
        while self.peek_token().kind == TokenKind::Colon {
            let colon = self.next_token();
            end = colon.offset + colon.text.len();
            if self.peek_token().kind == TokenKind::Identifier {
                let part = self.next_token();
                end = part.offset + part.text.len();
            }
        }
        Slice::from_range(self.input, first.offset, end)
    }

    /// Consume tag contents up to the token that leaves tag mode (or the end
    /// marker) and return that token. With `collect`, `name [= value]` pairs
    /// are gathered into the attribute buffer; a missing value reads as empty
    /// and other stray tokens are skipped.
    fn scan_tag_body(&mut self, collect: bool) -> Option<Token<'a>> {
        loop {
            let token = self.next_token();
            match token.kind {
                TokenKind::RightAngle
                | TokenKind::SelfClose
                | TokenKind::XmlEnd
                | TokenKind::Invalid => return Some(token),
                TokenKind::Identifier if collect => {
                    let name = self.qualified_name(token)?;
                    let mut value = Slice::EMPTY;
                    if self.peek_token().kind == TokenKind::Equals {
                        self.next_token();
                        if self.peek_token().kind == TokenKind::Value {
                            value = self.next_token().text;
                        }
                    }
                    self.attributes.push(Attribute::new(name, value));
                }
                _ => {}
            }
        }
    }
}

/// Yields nodes until the first `Invalid` node
impl<'a> Iterator for Parser<'a> {
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Node<'a>> {
        let node = self.next_node();
        node.is_valid().then_some(node)
    }
}

/// Parse a whole buffer, failing on the first diagnostic
pub fn parse_nodes(input: &[u8]) -> Result<Vec<Node<'_>>, ParseError> {
    let mut parser = Parser::new(input);
    let nodes: Vec<Node<'_>> = parser.by_ref().collect();
    match parser.errors.first() {
        Some(err) => Err(err.clone()),
        None => Ok(nodes),
    }
}
