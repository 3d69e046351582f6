//! Error Types
//!
//! Parse diagnostics are plain values: the tokenizer and parser return them,
//! the parser collects them, and the caller decides how to render them.
//! `Display` keeps the classic `<source>:<line>:<column> - <message>` shape.

use crate::core::scanner::Position;
use std::path::PathBuf;

/// Category of a parse diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Byte-level failure inside the tokenizer (bad character, unterminated value)
    Lexical,
    /// Token-level failure inside the node parser (missing identifier or terminator)
    Syntax,
}

/// A positioned parse diagnostic
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}:{}:{} - {}", .source_name, .position.line, .position.column, .message)]
pub struct ParseError {
    pub kind: ErrorKind,
    /// Name the source was opened with
    pub source_name: String,
    /// Where the offending token starts
    pub position: Position,
    pub message: String,
}

impl ParseError {
    pub fn new(
        kind: ErrorKind,
        source_name: impl Into<String>,
        position: Position,
        message: impl Into<String>,
    ) -> Self {
        ParseError {
            kind,
            source_name: source_name.into(),
            position,
            message: message.into(),
        }
    }

    pub fn lexical(source_name: &str, position: Position, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Lexical, source_name, position, message)
    }

    pub fn syntax(source_name: &str, position: Position, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, source_name, position, message)
    }

    #[inline]
    pub fn line(&self) -> usize {
        self.position.line
    }

    #[inline]
    pub fn column(&self) -> usize {
        self.position.column
    }
}

/// Failure to acquire a source buffer
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Could not open file: {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not memory map file: {}", .path.display())]
    Map {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not read source: {name}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid source range: offset {offset}, length {length:?}, available {available}")]
    Range {
        offset: usize,
        length: Option<usize>,
        available: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::lexical(
            "test",
            Position { line: 3, column: 7, offset: 41 },
            "Invalid character '@'",
        );
        assert_eq!(err.to_string(), "test:3:7 - Invalid character '@'");
        assert_eq!(err.kind, ErrorKind::Lexical);
        assert_eq!(err.line(), 3);
        assert_eq!(err.column(), 7);
    }

    #[test]
    fn test_source_error_display() {
        let err = SourceError::Open {
            path: PathBuf::from("missing.xml"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.to_string(), "Could not open file: missing.xml");

        let err = SourceError::Range { offset: 10, length: Some(4), available: 8 };
        assert!(err.to_string().contains("offset 10"));
    }
}
