//! tagstream - Streaming, zero-copy markup node parser
//!
//! Layers, leaves first:
//! - `core`: slices, byte scanner, three-mode tokenizer, attribute values
//! - `reader`: sources (memory, file map, stream) and the node pull parser
//! - `memory`: arena allocator with temp sections and a growable array
//!
//! Nodes and tokens borrow the source bytes; copy what must outlive the
//! source into an [`Arena`](memory::arena::Arena).
//!
//! ```
//! use tagstream::{NodeKind, Source, SourceRange};
//!
//! let doc = b"<tag>text<!--note--></tag>";
//! let source = Source::from_bytes("doc", doc, SourceRange::full()).unwrap();
//! let mut parser = source.parser();
//! while parser.next_node().is_valid() {
//!     if parser.node_kind() == NodeKind::Comment {
//!         assert_eq!(parser.node_text(), "note");
//!     }
//! }
//! assert!(parser.is_done() && !parser.is_errored());
//! ```
//!
//! Features:
//! - `mimalloc` (default): arenas draw blocks from mimalloc instead of the
//!   system allocator
//! - `memory_tracking`: per-arena count of requested bytes

pub mod core;
pub mod error;
pub mod memory;
pub mod reader;

pub use crate::core::attributes::Attribute;
pub use crate::core::scanner::Position;
pub use crate::core::slice::Slice;
pub use crate::core::tokenizer::{Token, TokenKind, Tokenizer};
pub use error::{ErrorKind, ParseError, SourceError};
pub use memory::arena::{Arena, ArenaStats, TempSection};
pub use memory::array::GrowArray;
pub use reader::node::{Node, NodeKind};
pub use reader::parser::{parse_nodes, Parser};
pub use reader::source::{Source, SourceRange};
