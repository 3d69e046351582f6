//! Source acquisition
//!
//! A [`Source`] owns (or borrows) the bytes a [`Parser`] reads. Three
//! backings:
//! - borrowed: a window into a caller-owned buffer
//! - owned: a private copy, e.g. everything read from an `io::Read`
//! - mapped: a read-only memory map of a file window
//!
//! Windows restart line and column at 1:1 and report offsets relative to the
//! window start.

use super::parser::Parser;
use crate::error::SourceError;
use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Byte window into a buffer or file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceRange {
    pub offset: usize,
    /// `None` means "to the end"; for files `Some(0)` does too
    pub length: Option<usize>,
}

impl SourceRange {
    /// The whole buffer or file
    pub const fn full() -> Self {
        SourceRange { offset: 0, length: None }
    }

    pub const fn new(offset: usize, length: usize) -> Self {
        SourceRange { offset, length: Some(length) }
    }

    /// From `offset` to the end
    pub const fn from_offset(offset: usize) -> Self {
        SourceRange { offset, length: None }
    }

    /// Resolve against `available` bytes, returning `(start, end)`
    fn resolve(&self, available: usize) -> Result<(usize, usize), SourceError> {
        let out_of_range = || SourceError::Range {
            offset: self.offset,
            length: self.length,
            available,
        };
        if self.offset > available {
            return Err(out_of_range());
        }
        let end = match self.length {
            None => available,
            Some(length) => self.offset.checked_add(length).ok_or_else(out_of_range)?,
        };
        if end > available {
            return Err(out_of_range());
        }
        Ok((self.offset, end))
    }
}

enum Backing<'a> {
    Borrowed(&'a [u8]),
    Owned(Vec<u8>),
    Mapped(Mmap),
}

/// An open input
pub struct Source<'a> {
    name: String,
    backing: Backing<'a>,
}

impl<'a> Source<'a> {
    /// Borrow a window of `bytes`
    pub fn from_bytes(
        name: impl Into<String>,
        bytes: &'a [u8],
        range: SourceRange,
    ) -> Result<Self, SourceError> {
        let (start, end) = range.resolve(bytes.len())?;
        let source = Source { name: name.into(), backing: Backing::Borrowed(&bytes[start..end]) };
        source.log_open();
        Ok(source)
    }
}

impl Source<'static> {
    /// Take a private copy of a window of `bytes`
    pub fn copy_from_bytes(
        name: impl Into<String>,
        bytes: &[u8],
        range: SourceRange,
    ) -> Result<Self, SourceError> {
        let (start, end) = range.resolve(bytes.len())?;
        let source = Source { name: name.into(), backing: Backing::Owned(bytes[start..end].to_vec()) };
        source.log_open();
        Ok(source)
    }

    /// Read `reader` to the end into a private buffer
    pub fn from_reader<R: Read>(name: impl Into<String>, mut reader: R) -> Result<Self, SourceError> {
        let name = name.into();
        let mut buffer = Vec::new();
        if let Err(source) = reader.read_to_end(&mut buffer) {
            return Err(SourceError::Read { name, source });
        }
        let source = Source { name, backing: Backing::Owned(buffer) };
        source.log_open();
        Ok(source)
    }

    /// Memory-map a window of the file at `path`, read-only.
    ///
    /// A length of `None` or `Some(0)` maps to the end of the file. The source
    /// is named after the path.
    pub fn open_file(path: impl AsRef<Path>, range: SourceRange) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let name = path.display().to_string();

        let file = File::open(path).map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let file_len = file
            .metadata()
            .map_err(|source| SourceError::Open { path: path.to_path_buf(), source })?
            .len();
        let file_len = usize::try_from(file_len).map_err(|_| SourceError::Range {
            offset: range.offset,
            length: range.length,
            available: usize::MAX,
        })?;

        let range = match range.length {
            Some(0) => SourceRange::from_offset(range.offset),
            _ => range,
        };
        let (start, end) = range.resolve(file_len)?;

        // Zero-length maps are rejected by the OS
        if start == end {
            let source = Source { name, backing: Backing::Owned(Vec::new()) };
            source.log_open();
            return Ok(source);
        }

        // SAFETY: the map is read-only; the file must not be truncated or
        // modified by other processes while the source is alive.
        let map = unsafe { MmapOptions::new().offset(start as u64).len(end - start).map(&file) }
            .map_err(|source| SourceError::Map { path: path.to_path_buf(), source })?;

        let source = Source { name, backing: Backing::Mapped(map) };
        source.log_open();
        Ok(source)
    }
}

impl Source<'_> {
    /// Name used in diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The window's bytes
    pub fn bytes(&self) -> &[u8] {
        match &self.backing {
            Backing::Borrowed(bytes) => bytes,
            Backing::Owned(buffer) => buffer,
            Backing::Mapped(map) => map,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }

    /// Check if the bytes come from a memory map
    pub fn is_mapped(&self) -> bool {
        matches!(self.backing, Backing::Mapped(_))
    }

    /// Start a parser over this source
    pub fn parser(&self) -> Parser<'_> {
        Parser::with_name(self.name.clone(), self.bytes())
    }

    fn backing_kind(&self) -> &'static str {
        match self.backing {
            Backing::Borrowed(_) => "borrowed",
            Backing::Owned(_) => "owned",
            Backing::Mapped(_) => "mapped",
        }
    }

    fn log_open(&self) {
        tracing::debug!(
            source = %self.name,
            bytes = self.len(),
            backing = self.backing_kind(),
            "source opened"
        );
    }
}

impl Drop for Source<'_> {
    fn drop(&mut self) {
        if self.is_mapped() {
            tracing::debug!(source = %self.name, bytes = self.len(), "source unmapped");
        }
    }
}

impl std::fmt::Debug for Source<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("name", &self.name)
            .field("backing", &self.backing_kind())
            .field("len", &self.len())
            .finish()
    }
}
