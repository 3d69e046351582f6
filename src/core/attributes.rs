//! Attribute values
//!
//! Element and header tags collect `name = value` pairs as they are scanned.
//! Names and values stay as slices into the input; values lose their quotes
//! but are otherwise raw (no entity or escape processing).

use super::slice::Slice;
use memchr::memchr;

/// A parsed attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Attribute<'a> {
    /// Attribute name (may include a prefix: `xlink:href`)
    pub name: Slice<'a>,
    /// Attribute value without quotes; empty for a bare name
    pub value: Slice<'a>,
    /// Reserved, always empty
    pub namespace: Slice<'a>,
}

impl<'a> Attribute<'a> {
    /// Create an attribute from a name and a raw value token (quotes included)
    pub fn new(name: Slice<'a>, raw_value: Slice<'a>) -> Self {
        Attribute { name, value: unquote(raw_value), namespace: Slice::EMPTY }
    }

    /// Get the name as a string
    pub fn name_str(&self) -> Option<&'a str> {
        self.name.as_str()
    }

    /// Get the value as a string
    pub fn value_str(&self) -> Option<&'a str> {
        self.value.as_str()
    }

    /// Prefix before the first colon, if any
    pub fn prefix(&self) -> Option<Slice<'a>> {
        split_name(self.name.as_bytes()).0.map(Slice::new)
    }

    /// Name after the first colon, or the whole name
    pub fn local_name(&self) -> Slice<'a> {
        Slice::new(split_name(self.name.as_bytes()).1)
    }
}

/// Split a name into prefix and local name at the colon
pub fn split_name(name: &[u8]) -> (Option<&[u8]>, &[u8]) {
    if let Some(colon_pos) = memchr(b':', name) {
        (Some(&name[..colon_pos]), &name[colon_pos + 1..])
    } else {
        (None, name)
    }
}

/// Strip one pair of matching quotes
pub fn unquote(raw: Slice<'_>) -> Slice<'_> {
    match raw.as_bytes() {
        [open, .., close] if open == close && matches!(open, b'"' | b'\'') => {
            raw.between(0, raw.len() - 1)
        }
        _ => raw,
    }
}
