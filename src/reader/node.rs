//! Node Types
//!
//! The structural units the pull parser hands out, one at a time.

use crate::core::slice::Slice;
use std::fmt;

/// Kind of a parsed node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeKind {
    /// No more nodes, or the parse failed
    #[default]
    Invalid,
    /// Start of an element: `<name attrs...>` or `<name attrs.../>`
    ElementBegin,
    /// End of an element: `</name>`
    ElementEnd,
    /// Text content between tags, verbatim
    Text,
    /// Declaration: `<?xml version="1.0"?>`
    XmlHeader,
    /// Comment body: `<!--...-->`
    Comment,
}

impl NodeKind {
    /// Short lowercase name for the kind
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Invalid => "invalid",
            NodeKind::ElementBegin => "begin",
            NodeKind::ElementEnd => "end",
            NodeKind::Text => "text",
            NodeKind::XmlHeader => "xml_header",
            NodeKind::Comment => "comment",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed node.
///
/// `depth` counts the elements open around the node: an `ElementBegin`
/// reports the depth before entering the element, an `ElementEnd` the depth
/// after leaving it, so matching pairs agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Node<'a> {
    pub kind: NodeKind,
    pub line: usize,
    pub column_start: usize,
    /// Column just past the node's closing token
    pub column_end: usize,
    /// Byte offset of the node's first token
    pub offset: usize,
    pub depth: usize,
    /// `<name/>`; such an element has no `ElementEnd`
    pub self_closing: bool,
    /// Attributes collected for this node (begin and header nodes)
    pub attribute_count: usize,
    /// Tag name for elements and headers, body for text and comments
    pub text: Slice<'a>,
    /// Reserved, always empty
    pub namespace: Slice<'a>,
}

impl Node<'_> {
    /// The `Invalid` node
    pub const INVALID: Node<'static> = Node {
        kind: NodeKind::Invalid,
        line: 0,
        column_start: 0,
        column_end: 0,
        offset: 0,
        depth: 0,
        self_closing: false,
        attribute_count: 0,
        text: Slice::EMPTY,
        namespace: Slice::EMPTY,
    };

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.kind != NodeKind::Invalid
    }
}

impl fmt::Display for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: [{}] ", self.line, self.column_start, self.depth)?;
        match self.kind {
            NodeKind::ElementBegin if self.self_closing => write!(f, "Begin: '{}' self-closing", self.text),
            NodeKind::ElementBegin => write!(f, "Begin: '{}'", self.text),
            NodeKind::ElementEnd => write!(f, "End: '{}'", self.text),
            NodeKind::Text => write!(f, "Text: '{}'", self.text),
            NodeKind::Comment => write!(f, "Comment: '{}'", self.text),
            NodeKind::XmlHeader => write!(f, "XML header '{}'", self.text),
            NodeKind::Invalid => f.write_str("Invalid"),
        }
    }
}
