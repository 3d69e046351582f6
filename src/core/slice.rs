//! Slice - a non-owning view into input bytes
//!
//! Every token and node the parser hands out carries a `Slice` pointing
//! straight into the caller's buffer (or the memory-mapped file). Nothing here
//! allocates; copies go through [`Slice::dup_in`] or [`Slice::to_zstring`].

use crate::memory::alloc::Allocator;
use crate::memory::array::GrowArray;
use memchr::{memchr, memrchr};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;

/// A non-owning view over bytes.
///
/// The empty slice doubles as "absent": a node without text and a node with
/// zero-length text look the same.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slice<'a> {
    bytes: &'a [u8],
}

impl<'a> Slice<'a> {
    /// The empty slice
    pub const EMPTY: Slice<'static> = Slice { bytes: &[] };

    /// Wrap a byte slice
    #[inline]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Slice { bytes }
    }

    /// View `input[start..end]`, or `None` if the range is out of bounds
    #[inline]
    pub fn from_range(input: &'a [u8], start: usize, end: usize) -> Option<Self> {
        input.get(start..end).map(Slice::new)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Get the bytes as a string if they are valid UTF-8
    #[inline]
    pub fn as_str(&self) -> Option<&'a str> {
        std::str::from_utf8(self.bytes).ok()
    }

    /// Lossy UTF-8 conversion
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(self.bytes).into_owned()
    }

    /// Everything from `index` on
    #[inline]
    pub fn from_index(&self, index: usize) -> Slice<'a> {
        self.sub(index, self.len())
    }

    /// Everything up to and including `index`
    #[inline]
    pub fn until_index(&self, index: usize) -> Slice<'a> {
        self.sub(0, index.saturating_add(1))
    }

    /// Everything after `index`
    #[inline]
    pub fn after_index(&self, index: usize) -> Slice<'a> {
        self.sub(index.saturating_add(1), self.len())
    }

    /// Everything before `index`
    #[inline]
    pub fn before_index(&self, index: usize) -> Slice<'a> {
        self.sub(0, index)
    }

    /// Bytes strictly between `after` and `before`
    #[inline]
    pub fn between(&self, after: usize, before: usize) -> Slice<'a> {
        self.sub(after.saturating_add(1), before)
    }

    fn sub(&self, start: usize, end: usize) -> Slice<'a> {
        let end = end.min(self.len());
        if start >= end {
            return Slice::EMPTY;
        }
        Slice::new(&self.bytes[start..end])
    }

    /// Index of the first `byte` at or after `after`
    #[inline]
    pub fn find_first(&self, byte: u8, after: usize) -> Option<usize> {
        let tail = self.bytes.get(after..)?;
        memchr(byte, tail).map(|i| after + i)
    }

    /// Index of the last `byte` at or after `after`
    #[inline]
    pub fn find_last(&self, byte: u8, after: usize) -> Option<usize> {
        let tail = self.bytes.get(after..)?;
        memrchr(byte, tail).map(|i| after + i)
    }

    /// Lexicographic byte comparison
    #[inline]
    pub fn compare(&self, other: &Slice<'_>) -> Ordering {
        self.bytes.cmp(other.bytes)
    }

    /// Exact-length equality against raw bytes
    #[inline]
    pub fn eq_bytes(&self, other: &[u8]) -> bool {
        self.bytes == other
    }

    /// Parse as an unsigned decimal `i32`.
    ///
    /// Every byte must be `0-9`: `"12a"` and `""` are rejected outright rather
    /// than truncated. No sign, whitespace or overflow handling.
    pub fn parse_int(&self) -> Option<i32> {
        if self.is_empty() {
            return None;
        }
        let mut result: i32 = 0;
        for &b in self.bytes {
            if !b.is_ascii_digit() {
                return None;
            }
            result = result.wrapping_mul(10).wrapping_add(i32::from(b - b'0'));
        }
        Some(result)
    }

    /// [`parse_int`](Self::parse_int) with a fallback
    #[inline]
    pub fn parse_int_or(&self, default: i32) -> i32 {
        self.parse_int().unwrap_or(default)
    }

    /// 64-bit variant of [`parse_int`](Self::parse_int)
    pub fn parse_i64(&self) -> Option<i64> {
        if self.is_empty() {
            return None;
        }
        let mut result: i64 = 0;
        for &b in self.bytes {
            if !b.is_ascii_digit() {
                return None;
            }
            result = result.wrapping_mul(10).wrapping_add(i64::from(b - b'0'));
        }
        Some(result)
    }

    #[inline]
    pub fn parse_i64_or(&self, default: i64) -> i64 {
        self.parse_i64().unwrap_or(default)
    }

    /// Copy into storage from `alloc`, NUL-terminated. The NUL sits just past
    /// the array's length.
    #[inline]
    pub fn dup_in<A: Allocator>(&self, alloc: A) -> GrowArray<u8, A> {
        GrowArray::from_bytes_nul(self.bytes, alloc)
    }

    /// Heap copy with a trailing NUL byte
    pub fn to_zstring(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len() + 1);
        out.extend_from_slice(self.bytes);
        out.push(0);
        out
    }
}

impl Deref for Slice<'_> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        self.bytes
    }
}

impl<'a> From<&'a [u8]> for Slice<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Slice::new(bytes)
    }
}

impl<'a> From<&'a str> for Slice<'a> {
    fn from(s: &'a str) -> Self {
        Slice::new(s.as_bytes())
    }
}

impl PartialEq<[u8]> for Slice<'_> {
    fn eq(&self, other: &[u8]) -> bool {
        self.bytes == other
    }
}

impl PartialEq<&[u8]> for Slice<'_> {
    fn eq(&self, other: &&[u8]) -> bool {
        self.bytes == *other
    }
}

impl PartialEq<str> for Slice<'_> {
    fn eq(&self, other: &str) -> bool {
        self.bytes == other.as_bytes()
    }
}

impl PartialEq<&str> for Slice<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.bytes == other.as_bytes()
    }
}

impl fmt::Debug for Slice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slice({:?})", String::from_utf8_lossy(self.bytes))
    }
}

impl fmt::Display for Slice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.bytes))
    }
}
