//! One-token lookahead over a token source

use crate::core::tokenizer::{Token, Tokenizer};
use crate::error::ParseError;

/// Anything that produces tokens on demand
pub trait TokenSource<'a> {
    /// Produce the next token; the end marker once input is exhausted
    fn next_token(&mut self) -> Result<Token<'a>, ParseError>;
}

impl<'a> TokenSource<'a> for Tokenizer<'a> {
    #[inline]
    fn next_token(&mut self) -> Result<Token<'a>, ParseError> {
        Tokenizer::next_token(self)
    }
}

/// A token source with at most one buffered token
pub struct Lookahead<'a, S: TokenSource<'a>> {
    source: S,
    peeked: Option<Token<'a>>,
}

impl<'a, S: TokenSource<'a>> Lookahead<'a, S> {
    pub fn new(source: S) -> Self {
        Lookahead { source, peeked: None }
    }

    /// Compute the next token without consuming it.
    ///
    /// Errors are not buffered: the next call asks the source again.
    pub fn peek(&mut self) -> Result<Token<'a>, ParseError> {
        if let Some(token) = self.peeked {
            return Ok(token);
        }
        let token = self.source.next_token()?;
        self.peeked = Some(token);
        Ok(token)
    }

    /// Consume the buffered token, or compute a fresh one
    pub fn next(&mut self) -> Result<Token<'a>, ParseError> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.source.next_token(),
        }
    }

    /// Check if a token is buffered
    pub fn has_peeked(&self) -> bool {
        self.peeked.is_some()
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
