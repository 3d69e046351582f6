//! Byte cursor with position tracking
//!
//! Wraps the input slice with a read position plus the line/column pair the
//! diagnostics need. Text runs are skipped with memchr (SIMD where the
//! target supports it) and newline bookkeeping is done per run instead of
//! per byte.
//!
//! Also home to the two 256-entry byte classification tables used by the
//! tokenizer while inside a tag.

use memchr::{memchr, memchr_iter, memmem, memrchr};

/// A point in the input: 1-based line and column, 0-based byte offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    /// Line 1, column 1, offset 0
    pub const START: Position = Position { line: 1, column: 1, offset: 0 };

    /// Recompute the position of `offset` by walking `input` from the start
    pub fn locate(input: &[u8], offset: usize) -> Position {
        let prefix = &input[..offset.min(input.len())];
        let line = 1 + memchr_iter(b'\n', prefix).count();
        let column = match memrchr(b'\n', prefix) {
            Some(nl) => prefix.len() - nl,
            None => prefix.len() + 1,
        };
        Position { line, column, offset }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::START
    }
}

/// Classification of the first byte of a token inside a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteClass {
    Invalid,
    /// `<`, `>`, `=`, `:`
    OneChar,
    /// Lead byte of `/>` or `?>`
    TwoCharEnd,
    Whitespace,
    Newline,
    /// Quote opening an attribute value
    Value,
    /// Letters, `_` and any byte >= 0x80 (opaque UTF-8)
    Identifier,
}

/// Tag-mode classification of every byte value
pub static TAG_CLASSES: [ByteClass; 256] = build_tag_classes();

/// Bytes allowed after the first byte of an identifier
pub static IDENTIFIER_BYTES: [bool; 256] = build_identifier_bytes();

const fn build_tag_classes() -> [ByteClass; 256] {
    let mut table = [ByteClass::Invalid; 256];

    let mut i = 0x80;
    while i < 256 {
        table[i] = ByteClass::Identifier;
        i += 1;
    }
    let mut c = b'a';
    while c <= b'z' {
        table[c as usize] = ByteClass::Identifier;
        table[(c - b'a' + b'A') as usize] = ByteClass::Identifier;
        c += 1;
    }
    table[b'_' as usize] = ByteClass::Identifier;

    table[b' ' as usize] = ByteClass::Whitespace;
    table[b'\r' as usize] = ByteClass::Whitespace;
    table[b'\t' as usize] = ByteClass::Whitespace;
    table[b'\n' as usize] = ByteClass::Newline;
    table[b'\'' as usize] = ByteClass::Value;
    table[b'"' as usize] = ByteClass::Value;
    table[b'<' as usize] = ByteClass::OneChar;
    table[b'>' as usize] = ByteClass::OneChar;
    table[b'=' as usize] = ByteClass::OneChar;
    table[b':' as usize] = ByteClass::OneChar;
    table[b'/' as usize] = ByteClass::TwoCharEnd;
    table[b'?' as usize] = ByteClass::TwoCharEnd;
    table
}

const fn build_identifier_bytes() -> [bool; 256] {
    let mut table = [false; 256];

    let mut i = 0x80;
    while i < 256 {
        table[i] = true;
        i += 1;
    }
    let mut c = b'a';
    while c <= b'z' {
        table[c as usize] = true;
        table[(c - b'a' + b'A') as usize] = true;
        c += 1;
    }
    let mut d = b'0';
    while d <= b'9' {
        table[d as usize] = true;
        d += 1;
    }
    table[b'-' as usize] = true;
    table[b'_' as usize] = true;
    table[b'.' as usize] = true;
    table
}

/// Classify a byte for tag mode
#[inline]
pub fn classify(b: u8) -> ByteClass {
    TAG_CLASSES[b as usize]
}

/// Check if byte may continue an identifier
#[inline]
pub fn is_identifier_byte(b: u8) -> bool {
    IDENTIFIER_BYTES[b as usize]
}

/// Cursor over the input that keeps line and column in step with the offset
pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given input
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Scanner { input, pos: 0, line: 1, column: 1 }
    }

    /// Get the whole input
    #[inline]
    pub fn input(&self) -> &'a [u8] {
        self.input
    }

    /// Get the current byte offset
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn line(&self) -> usize {
        self.line
    }

    #[inline]
    pub fn column(&self) -> usize {
        self.column
    }

    /// Snapshot of line, column and offset
    #[inline]
    pub fn mark(&self) -> Position {
        Position { line: self.line, column: self.column, offset: self.pos }
    }

    /// Check if we've reached the end
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Get remaining bytes
    #[inline]
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    /// Get a slice from start to end positions
    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> &'a [u8] {
        &self.input[start..end]
    }

    /// Peek at current byte without advancing
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Peek at byte at offset from current position
    #[inline]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Check if input starts with a byte sequence at current position
    #[inline]
    pub fn starts_with(&self, needle: &[u8]) -> bool {
        self.remaining().starts_with(needle)
    }

    /// Advance by n bytes that contain no newline
    #[inline]
    pub fn advance(&mut self, n: usize) {
        debug_assert!(self.pos + n <= self.input.len());
        self.pos += n;
        self.column += n;
    }

    /// Consume a single newline byte
    #[inline]
    pub fn newline(&mut self) {
        self.pos += 1;
        self.line += 1;
        self.column = 1;
    }

    /// Advance to `end`, counting any newlines in between
    pub fn advance_to(&mut self, end: usize) {
        let run = &self.input[self.pos..end];
        match memrchr(b'\n', run) {
            Some(last) => {
                self.line += memchr_iter(b'\n', run).count();
                self.column = run.len() - last;
            }
            None => self.column += run.len(),
        }
        self.pos = end;
    }

    /// Find next '<' (tag start) using SIMD
    #[inline]
    pub fn find_tag_start(&self) -> Option<usize> {
        self.find_byte(b'<')
    }

    /// Find next occurrence of a specific byte
    #[inline]
    pub fn find_byte(&self, byte: u8) -> Option<usize> {
        memchr(byte, self.remaining()).map(|i| self.pos + i)
    }

    /// Find next occurrence of a specific byte, starting `skip` bytes ahead
    #[inline]
    pub fn find_byte_after(&self, byte: u8, skip: usize) -> Option<usize> {
        let from = (self.pos + skip).min(self.input.len());
        memchr(byte, &self.input[from..]).map(|i| from + i)
    }

    /// Find next occurrence of a byte sequence
    #[inline]
    pub fn find_sequence(&self, needle: &[u8]) -> Option<usize> {
        memmem::find(self.remaining(), needle).map(|i| self.pos + i)
    }

    /// Read a run of identifier bytes starting at the current position
    pub fn read_identifier(&mut self) -> &'a [u8] {
        let start = self.pos;
        let len = self.remaining()
            .iter()
            .position(|&b| !is_identifier_byte(b))
            .unwrap_or(self.input.len() - start);
        self.advance(len);
        &self.input[start..start + len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_tag_start() {
        let scanner = Scanner::new(b"hello <world>");
        assert_eq!(scanner.find_tag_start(), Some(6));
    }

    #[test]
    fn test_read_identifier() {
        let mut scanner = Scanner::new(b"element-name.v2>");
        assert_eq!(scanner.read_identifier(), b"element-name.v2");
        assert_eq!(scanner.position(), 15);
        assert_eq!(scanner.column(), 16);
    }

    #[test]
    fn test_read_identifier_utf8() {
        let input = "ñame>".as_bytes();
        let mut scanner = Scanner::new(input);
        assert_eq!(scanner.read_identifier(), "ñame".as_bytes());
        // Columns count bytes, not characters
        assert_eq!(scanner.column(), 6);
    }

    #[test]
    fn test_advance_to_tracks_newlines() {
        let mut scanner = Scanner::new(b"ab\ncd\nefg<");
        scanner.advance_to(9);
        assert_eq!(scanner.line(), 3);
        assert_eq!(scanner.column(), 4);
        assert_eq!(scanner.mark(), Position::locate(b"ab\ncd\nefg<", 9));
    }

    #[test]
    fn test_newline_resets_column() {
        let mut scanner = Scanner::new(b" \n x");
        scanner.advance(1);
        scanner.newline();
        assert_eq!((scanner.line(), scanner.column()), (2, 1));
        scanner.advance(1);
        assert_eq!(scanner.mark(), Position { line: 2, column: 2, offset: 3 });
    }

    #[test]
    fn test_locate() {
        let input = b"<a>\n  <b/>\n</a>";
        assert_eq!(Position::locate(input, 0), Position::START);
        assert_eq!(Position::locate(input, 6), Position { line: 2, column: 3, offset: 6 });
        assert_eq!(Position::locate(input, 11), Position { line: 3, column: 1, offset: 11 });
    }

    #[test]
    fn test_classification_tables() {
        assert_eq!(classify(b'a'), ByteClass::Identifier);
        assert_eq!(classify(b'Z'), ByteClass::Identifier);
        assert_eq!(classify(b'_'), ByteClass::Identifier);
        assert_eq!(classify(0xC3), ByteClass::Identifier);
        // Digits continue identifiers but cannot start one
        assert_eq!(classify(b'7'), ByteClass::Invalid);
        assert!(is_identifier_byte(b'7'));
        assert_eq!(classify(b'\n'), ByteClass::Newline);
        assert_eq!(classify(b'\r'), ByteClass::Whitespace);
        assert_eq!(classify(b'"'), ByteClass::Value);
        assert_eq!(classify(b'='), ByteClass::OneChar);
        assert_eq!(classify(b'?'), ByteClass::TwoCharEnd);
        assert_eq!(classify(b'@'), ByteClass::Invalid);
        assert!(!is_identifier_byte(b':'));
        assert!(is_identifier_byte(b'.'));
    }

    #[test]
    fn test_find_sequence() {
        let scanner = Scanner::new(b"a--b-->");
        assert_eq!(scanner.find_sequence(b"-->"), Some(4));
    }
}
