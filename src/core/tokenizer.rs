//! Markup Tokenizer - State machine for token extraction
//!
//! Splits a byte buffer into tokens under three lexer modes:
//! - `Out`: free text between tags, plus the tag openers `<`, `</`, `<?`, `<!--`
//! - `Tag`: inside `< ... >`: identifiers, quoted values, `=`, `:`, `>`, `/>`, `?>`
//! - `Comment`: the body of a comment up to `-->`
//!
//! Whitespace inside tags is skipped, never tokenized. Tokens borrow the
//! input; nothing is copied or decoded.

use super::scanner::{classify, ByteClass, Position, Scanner};
use super::slice::Slice;
use crate::error::ParseError;

/// Current lexer mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexerMode {
    /// Between tags
    #[default]
    Out,
    /// Inside a markup construct (<...>)
    Tag,
    /// Inside a comment body
    Comment,
}

/// Type of token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenKind {
    /// End of input; also returned in place of a token after an error
    #[default]
    Invalid,
    /// `<`
    LeftAngle,
    /// `>`
    RightAngle,
    /// `=`
    Equals,
    /// `:`
    Colon,
    /// `</`
    CloseTagStart,
    /// `<?`
    XmlStart,
    /// `?>`
    XmlEnd,
    /// `/>`
    SelfClose,
    Identifier,
    /// Quoted value, quotes included
    Value,
    /// Text between tags, or a comment body
    Text,
    /// `<!--`
    CommentStart,
    /// `-->`
    CommentEnd,
}

impl TokenKind {
    /// How diagnostics spell this kind
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Invalid => "INVALID",
            TokenKind::LeftAngle => "'<'",
            TokenKind::RightAngle => "'>'",
            TokenKind::Equals => "'='",
            TokenKind::Colon => "':'",
            TokenKind::CloseTagStart => "'</'",
            TokenKind::XmlStart => "'<?'",
            TokenKind::XmlEnd => "'?>'",
            TokenKind::SelfClose => "'/>'",
            TokenKind::Identifier => "identifier",
            TokenKind::Value => "value",
            TokenKind::Text => "text",
            TokenKind::CommentStart => "'<!--'",
            TokenKind::CommentEnd => "'-->'",
        }
    }

    /// Check if this is the end-of-input marker
    #[inline]
    pub fn is_end(self) -> bool {
        self == TokenKind::Invalid
    }
}

/// A lexed token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub line: usize,
    pub column_start: usize,
    /// Column just past the token (on the token's last line)
    pub column_end: usize,
    /// Byte offset from the start of the buffer
    pub offset: usize,
    /// Identifier, value and text tokens only
    pub text: Slice<'a>,
}

impl Token<'_> {
    /// End-of-input marker at `position`
    pub fn end(position: Position) -> Self {
        Token {
            kind: TokenKind::Invalid,
            line: position.line,
            column_start: position.column,
            column_end: position.column,
            offset: position.offset,
            text: Slice::EMPTY,
        }
    }

    #[inline]
    pub fn position(&self) -> Position {
        Position { line: self.line, column: self.column_start, offset: self.offset }
    }
}

/// Pull tokenizer over a byte buffer
pub struct Tokenizer<'a> {
    scanner: Scanner<'a>,
    mode: LexerMode,
    name: String,
    finished: bool,
}

impl<'a> Tokenizer<'a> {
    /// Create a new tokenizer; diagnostics name the source `input`
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_name("input", input)
    }

    /// Create a new tokenizer whose diagnostics carry `name`
    pub fn with_name(name: impl Into<String>, input: &'a [u8]) -> Self {
        Tokenizer {
            scanner: Scanner::new(input),
            mode: LexerMode::Out,
            name: name.into(),
            finished: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the current lexer mode
    pub fn mode(&self) -> LexerMode {
        self.mode
    }

    /// Get the current position in the input
    pub fn position(&self) -> Position {
        self.scanner.mark()
    }

    /// Get the next token.
    ///
    /// At end of input this returns a [`TokenKind::Invalid`] token, repeatedly.
    /// Lexical errors leave the cursor on the offending byte.
    pub fn next_token(&mut self) -> Result<Token<'a>, ParseError> {
        loop {
            let start = self.scanner.mark();
            let Some(c) = self.scanner.peek() else {
                return Ok(Token::end(start));
            };

            return match self.mode {
                LexerMode::Tag => match classify(c) {
                    ByteClass::Whitespace => {
                        self.scanner.advance(1);
                        continue;
                    }
                    ByteClass::Newline => {
                        self.scanner.newline();
                        continue;
                    }
                    ByteClass::OneChar => Ok(self.lex_one_char(c, start)),
                    ByteClass::TwoCharEnd => self.lex_two_char_end(c, start),
                    ByteClass::Identifier => {
                        let text = self.scanner.read_identifier();
                        Ok(self.token(TokenKind::Identifier, start, Slice::new(text)))
                    }
                    ByteClass::Value => self.lex_value(c, start),
                    ByteClass::Invalid => Err(self.error(
                        start,
                        format!("Invalid character '{}'", c.escape_ascii()),
                    )),
                },
                LexerMode::Out => {
                    if c == b'<' {
                        self.lex_tag_open(start)
                    } else {
                        Ok(self.lex_text(start))
                    }
                }
                LexerMode::Comment => Ok(self.lex_comment(start)),
            };
        }
    }

    fn token(&self, kind: TokenKind, start: Position, text: Slice<'a>) -> Token<'a> {
        Token {
            kind,
            line: start.line,
            column_start: start.column,
            column_end: self.scanner.column(),
            offset: start.offset,
            text,
        }
    }

    fn error(&self, at: Position, message: String) -> ParseError {
        ParseError::lexical(&self.name, at, message)
    }

    fn lex_one_char(&mut self, c: u8, start: Position) -> Token<'a> {
        let kind = match c {
            b'<' => TokenKind::LeftAngle,
            b'>' => TokenKind::RightAngle,
            b'=' => TokenKind::Equals,
            _ => TokenKind::Colon,
        };
        self.scanner.advance(1);
        if kind == TokenKind::RightAngle {
            self.mode = LexerMode::Out;
        }
        self.token(kind, start, Slice::EMPTY)
    }

    /// `/>` or `?>`
    fn lex_two_char_end(&mut self, c: u8, start: Position) -> Result<Token<'a>, ParseError> {
        match self.scanner.peek_at(1) {
            Some(b'>') => {
                let kind = if c == b'/' { TokenKind::SelfClose } else { TokenKind::XmlEnd };
                self.scanner.advance(2);
                self.mode = LexerMode::Out;
                Ok(self.token(kind, start, Slice::EMPTY))
            }
            Some(c2) => Err(self.error(
                start,
                format!(
                    "Didn't expect '{}' to be followed by '{}'",
                    c.escape_ascii(),
                    c2.escape_ascii()
                ),
            )),
            None => Err(self.error(
                start,
                format!("Didn't expect '{}' at end of input", c.escape_ascii()),
            )),
        }
    }

    /// Quoted value from the opening quote through the first identical quote
    fn lex_value(&mut self, quote: u8, start: Position) -> Result<Token<'a>, ParseError> {
        let Some(close) = self.scanner.find_byte_after(quote, 1) else {
            return Err(self.error(start, "Unterminated value".to_string()));
        };
        let end = close + 1;
        self.scanner.advance_to(end);
        let text = Slice::new(self.scanner.slice(start.offset, end));
        Ok(self.token(TokenKind::Value, start, text))
    }

    fn lex_tag_open(&mut self, start: Position) -> Result<Token<'a>, ParseError> {
        let kind = match self.scanner.peek_at(1) {
            Some(b'/') => TokenKind::CloseTagStart,
            Some(b'?') => TokenKind::XmlStart,
            Some(b'!') => {
                if !self.scanner.starts_with(b"<!--") {
                    return Err(self.error(start, "Malformed comment start".to_string()));
                }
                self.scanner.advance(4);
                self.mode = LexerMode::Comment;
                return Ok(self.token(TokenKind::CommentStart, start, Slice::EMPTY));
            }
            _ => {
                self.scanner.advance(1);
                self.mode = LexerMode::Tag;
                return Ok(self.token(TokenKind::LeftAngle, start, Slice::EMPTY));
            }
        };
        self.scanner.advance(2);
        self.mode = LexerMode::Tag;
        Ok(self.token(kind, start, Slice::EMPTY))
    }

    /// Text up to (not including) the next `<`
    fn lex_text(&mut self, start: Position) -> Token<'a> {
        let end = self.scanner.find_tag_start().unwrap_or(self.scanner.input().len());
        self.scanner.advance_to(end);
        let text = Slice::new(self.scanner.slice(start.offset, end));
        self.token(TokenKind::Text, start, text)
    }

    /// Comment body up to the first `-->`, or the terminator itself
    fn lex_comment(&mut self, start: Position) -> Token<'a> {
        if self.scanner.starts_with(b"-->") {
            self.scanner.advance(3);
            self.mode = LexerMode::Out;
            return self.token(TokenKind::CommentEnd, start, Slice::EMPTY);
        }
        let end = self.scanner.find_sequence(b"-->").unwrap_or(self.scanner.input().len());
        self.scanner.advance_to(end);
        let text = Slice::new(self.scanner.slice(start.offset, end));
        self.token(TokenKind::Text, start, text)
    }
}

/// Yields tokens until the end of input or the first error
impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Token<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_token() {
            Ok(token) if token.kind.is_end() => {
                self.finished = true;
                None
            }
            Ok(token) => Some(Ok(token)),
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}
